//! Recurring sync schedule of a shop
//!
//! At most one schedule per shop. A new schedule counts its creation as the
//! last run, so the first scheduled sync happens one interval later.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSchedule {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub interval_secs: i64,
    pub enabled: bool,
    pub last_run_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SyncSchedule {
    pub fn new(shop_id: Uuid, interval_secs: i64, enabled: bool) -> Self {
        let now = Utc::now();
        Self { id: Uuid::now_v7(), shop_id, interval_secs, enabled, last_run_at: Some(now), created_at: now, updated_at: now }
    }

    pub fn interval(&self) -> Duration { Duration::seconds(self.interval_secs.max(1)) }

    /// `None` while disabled.
    pub fn next_run_at(&self) -> Option<DateTime<Utc>> {
        if !self.enabled { return None; }
        Some(self.last_run_at.map_or(self.created_at, |last| last + self.interval()))
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool { self.next_run_at().is_some_and(|next| now >= next) }
}
