//! WooCommerce Catalog Sync
//!
//! Bulk synchronization between WooCommerce stores and a local Postgres mirror.
//!
//! ## Features
//! - CSV import of parent products and variations, tracked as import batches
//! - Paginated, capped catalog sync with idempotent upserts
//! - Cross-store transfer of mirrored or master products
//! - Per-row error capture with partial-failure recovery and cancellation
//! - Interval-based scheduled syncs with a per-shop sync history

pub mod api;
pub mod config;
pub mod domain;
pub mod import;
pub mod remote;
pub mod schedule;
pub mod service;
pub mod store;
pub mod sync;
pub mod transfer;

use thiserror::Error;
use uuid::Uuid;
use crate::domain::aggregates::BatchStateError;
use crate::domain::value_objects::ErrorCategory;
use crate::remote::RemoteError;

pub use config::Settings;
pub use service::CatalogService;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Shop not found: {0}")]
    ShopNotFound(Uuid),

    #[error("Import batch not found: {0}")]
    BatchNotFound(Uuid),

    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("No sync schedule for shop {0}")]
    ScheduleNotFound(Uuid),

    #[error("{0}")]
    Validation(String),

    #[error("Could not connect to shop {0}")]
    Connectivity(Uuid),

    #[error("Could not parse import file: {0}")]
    Parse(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    BatchState(#[from] BatchStateError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl CatalogError {
    /// Category recorded when this error is charged to a single row.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) | Self::Parse(_) | Self::ProductNotFound(_) => ErrorCategory::Validation,
            Self::Remote(err) => err.category(),
            Self::Connectivity(_) => ErrorCategory::Network,
            Self::ShopNotFound(_) | Self::BatchNotFound(_) | Self::ScheduleNotFound(_) | Self::BatchState(_) | Self::Config(_) | Self::Storage(_) => ErrorCategory::Database,
        }
    }
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self { Self::Storage(err.to_string()) }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
