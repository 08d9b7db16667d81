//! Connected WooCommerce shop

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::value_objects::ShopStatus;

#[derive(Clone, Serialize, Deserialize)]
pub struct Shop {
    pub id: Uuid,
    pub name: String,
    pub base_url: String,
    pub consumer_key: String,
    #[serde(skip_serializing)]
    pub consumer_secret: String,
    pub is_active: bool,
    pub status: ShopStatus,
    pub last_ping: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Shop {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), name: name.into(), base_url: base_url.into(),
            consumer_key: consumer_key.into(), consumer_secret: consumer_secret.into(),
            is_active: true, status: ShopStatus::Unknown, last_ping: None, created_at: now, updated_at: now,
        }
    }

    /// Root of the WooCommerce v3 REST API for this shop.
    pub fn api_root(&self) -> String { format!("{}/wp-json/wc/v3", self.base_url.trim_end_matches('/')) }
}

impl std::fmt::Debug for Shop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shop")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}
