//! Domain events
use crate::domain::value_objects::ImportKind;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq)]
pub enum DomainEvent {
    Batch(BatchEvent),
}

#[derive(Clone, Debug, PartialEq)]
pub enum BatchEvent {
    Started { batch_id: Uuid, kind: ImportKind },
    RowFailed { batch_id: Uuid, row_number: i32, message: String },
    Completed { batch_id: Uuid, successful: i32, errors: i32 },
    Failed { batch_id: Uuid, reason: String },
    Cancelled { batch_id: Uuid },
}

impl DomainEvent {
    /// Emits the event on the current tracing span.
    pub fn log(&self) {
        match self {
            Self::Batch(BatchEvent::Started { batch_id, kind }) => tracing::info!(%batch_id, %kind, "import batch started"),
            Self::Batch(BatchEvent::RowFailed { batch_id, row_number, message }) => tracing::debug!(%batch_id, row_number, %message, "row failed"),
            Self::Batch(BatchEvent::Completed { batch_id, successful, errors }) => tracing::info!(%batch_id, successful, errors, "import batch completed"),
            Self::Batch(BatchEvent::Failed { batch_id, reason }) => tracing::warn!(%batch_id, %reason, "import batch failed"),
            Self::Batch(BatchEvent::Cancelled { batch_id }) => tracing::info!(%batch_id, "import batch cancelled"),
        }
    }
}
