//! Import Batch Aggregate
//!
//! Bookkeeping for one CSV import or store sync. Engines mutate it in memory
//! and persist it at chunk boundaries; pollers only ever read it.
//!
//! Invariants kept by every method:
//! - `successful_rows + error_rows == processed_rows <= total_rows`
//! - status only moves `pending -> processing -> {completed, failed}` (or
//!   `pending -> failed` when cancelled before start); terminal states are final.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::events::{BatchEvent, DomainEvent};
use crate::domain::value_objects::{ImportKind, ImportStatus};

pub const CANCELLED_BY_USER: &str = "Import cancelled by user";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCounters {
    pub total_rows: i32,
    pub processed_rows: i32,
    pub successful_rows: i32,
    pub error_rows: i32,
}

impl BatchCounters {
    pub fn is_consistent(&self) -> bool {
        self.successful_rows + self.error_rows == self.processed_rows && self.processed_rows <= self.total_rows
    }
}

/// One entry of the batch's `errors` json array.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchErrorEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_number: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub message: String,
}

impl BatchErrorEntry {
    pub fn general(message: impl Into<String>) -> Self { Self { row_number: None, sku: None, message: message.into() } }
}

/// Persisted shape of a batch, as stored in `import_batches`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub filename: String,
    pub file_size: Option<i64>,
    pub kind: ImportKind,
    pub status: ImportStatus,
    #[serde(flatten)]
    pub counters: BatchCounters,
    pub errors: Vec<BatchErrorEntry>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct ImportBatch {
    record: BatchRecord,
    events: Vec<DomainEvent>,
}

impl Serialize for ImportBatch {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> { self.record.serialize(serializer) }
}

impl ImportBatch {
    pub fn new(shop_id: Uuid, filename: impl Into<String>, kind: ImportKind) -> Self {
        let now = Utc::now();
        Self {
            record: BatchRecord {
                id: Uuid::now_v7(), shop_id, filename: filename.into(), file_size: None, kind,
                status: ImportStatus::Pending, counters: BatchCounters::default(), errors: vec![],
                started_at: None, completed_at: None, created_at: now, updated_at: now,
            },
            events: vec![],
        }
    }

    pub fn with_file_size(mut self, bytes: i64) -> Self { self.record.file_size = Some(bytes); self }

    /// Rehydrates a batch loaded from the store.
    pub fn restore(record: BatchRecord) -> Self { Self { record, events: vec![] } }

    pub fn id(&self) -> Uuid { self.record.id }
    pub fn shop_id(&self) -> Uuid { self.record.shop_id }
    pub fn kind(&self) -> ImportKind { self.record.kind }
    pub fn status(&self) -> ImportStatus { self.record.status }
    pub fn counters(&self) -> &BatchCounters { &self.record.counters }
    pub fn errors(&self) -> &[BatchErrorEntry] { &self.record.errors }
    pub fn record(&self) -> &BatchRecord { &self.record }

    pub fn start(&mut self) -> Result<(), BatchStateError> {
        self.transition(ImportStatus::Processing)?;
        self.record.started_at = Some(Utc::now());
        self.raise_event(BatchEvent::Started { batch_id: self.record.id, kind: self.record.kind });
        Ok(())
    }

    /// Sets the expected row count. Never drops below what was already processed.
    pub fn set_total(&mut self, total: i32) -> Result<(), BatchStateError> {
        self.ensure_processing()?;
        self.record.counters.total_rows = total.max(self.record.counters.processed_rows);
        self.touch();
        Ok(())
    }

    pub fn record_success(&mut self) -> Result<(), BatchStateError> {
        self.ensure_processing()?;
        let c = &mut self.record.counters;
        c.processed_rows += 1;
        c.successful_rows += 1;
        c.total_rows = c.total_rows.max(c.processed_rows);
        self.touch();
        Ok(())
    }

    pub fn record_failure(&mut self, entry: BatchErrorEntry) -> Result<(), BatchStateError> {
        self.ensure_processing()?;
        let c = &mut self.record.counters;
        c.processed_rows += 1;
        c.error_rows += 1;
        c.total_rows = c.total_rows.max(c.processed_rows);
        self.raise_event(BatchEvent::RowFailed {
            batch_id: self.record.id,
            row_number: entry.row_number.unwrap_or(self.record.counters.processed_rows),
            message: entry.message.clone(),
        });
        self.record.errors.push(entry);
        self.touch();
        Ok(())
    }

    /// Records a batch-level problem that is not tied to a counted row.
    pub fn note_error(&mut self, entry: BatchErrorEntry) -> Result<(), BatchStateError> {
        self.ensure_processing()?;
        self.record.errors.push(entry);
        self.touch();
        Ok(())
    }

    pub fn complete(&mut self) -> Result<(), BatchStateError> {
        self.transition(ImportStatus::Completed)?;
        self.record.completed_at = Some(Utc::now());
        let c = self.record.counters;
        self.raise_event(BatchEvent::Completed { batch_id: self.record.id, successful: c.successful_rows, errors: c.error_rows });
        Ok(())
    }

    /// Aborts the run; the error list collapses to the single reason.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), BatchStateError> {
        let reason = reason.into();
        self.transition(ImportStatus::Failed)?;
        self.record.completed_at = Some(Utc::now());
        self.record.errors = vec![BatchErrorEntry::general(reason.clone())];
        self.raise_event(BatchEvent::Failed { batch_id: self.record.id, reason });
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), BatchStateError> {
        self.transition(ImportStatus::Failed)?;
        self.record.completed_at = Some(Utc::now());
        self.record.errors = vec![BatchErrorEntry::general(CANCELLED_BY_USER)];
        self.raise_event(BatchEvent::Cancelled { batch_id: self.record.id });
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }

    fn transition(&mut self, to: ImportStatus) -> Result<(), BatchStateError> {
        let from = self.record.status;
        let allowed = matches!(
            (from, to),
            (ImportStatus::Pending, ImportStatus::Processing)
                | (ImportStatus::Pending, ImportStatus::Failed)
                | (ImportStatus::Processing, ImportStatus::Completed)
                | (ImportStatus::Processing, ImportStatus::Failed)
        );
        if !allowed { return Err(BatchStateError::InvalidTransition { from, to }); }
        self.record.status = to;
        self.touch();
        Ok(())
    }

    fn ensure_processing(&self) -> Result<(), BatchStateError> {
        match self.record.status {
            ImportStatus::Processing => Ok(()),
            other => Err(BatchStateError::NotProcessing(other)),
        }
    }

    fn raise_event(&mut self, e: BatchEvent) { self.events.push(DomainEvent::Batch(e)); }
    fn touch(&mut self) { self.record.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchStateError {
    #[error("import batch cannot move from {from} to {to}")]
    InvalidTransition { from: ImportStatus, to: ImportStatus },
    #[error("import batch is {0}, not processing")]
    NotProcessing(ImportStatus),
}
