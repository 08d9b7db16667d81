//! Catalog Store
//!
//! Persistence seam shared by every engine. Upserts target the natural keys
//! (`(shop_id, remote_id)`, `sku`, `(master_product_id, shop_id)`) so that
//! repeated or concurrent runs converge instead of duplicating rows.

pub mod pg;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::aggregates::{
    ImportBatch, ListingUpsert, MasterProduct, MasterUpsert, Product, ProductUpsert, Shop, ShopListing, SyncSchedule, Variation,
    VariationUpsert,
};
use crate::domain::value_objects::{ErrorCategory, ImportKind, ImportStatus, ShopStatus};
use crate::Result;

pub use pg::PgCatalogStore;

/// Row-level failure about to be appended to `import_errors`.
#[derive(Clone, Debug, PartialEq)]
pub struct NewImportError {
    pub batch_id: Uuid,
    pub row_number: i32,
    pub sku: Option<String>,
    pub category: ErrorCategory,
    pub message: String,
    pub row_data: serde_json::Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImportErrorRecord {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub row_number: i32,
    pub sku: Option<String>,
    pub category: ErrorCategory,
    pub message: String,
    pub row_data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl ImportErrorRecord {
    pub fn from_new(error: NewImportError) -> Self {
        Self {
            id: Uuid::now_v7(), batch_id: error.batch_id, row_number: error.row_number, sku: error.sku,
            category: error.category, message: error.message, row_data: error.row_data, created_at: Utc::now(),
        }
    }
}

/// Persists `batch` if its stored status is still `expected`, then logs the
/// events it raised. Returns `false` when the batch was moved by someone else.
pub async fn commit_batch(store: &dyn CatalogStore, batch: &mut ImportBatch, expected: ImportStatus) -> Result<bool> {
    let saved = store.save_batch(batch, expected).await?;
    for event in batch.take_events() { event.log(); }
    Ok(saved)
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_shop(&self, id: Uuid) -> Result<Option<Shop>>;
    async fn update_shop_liveness(&self, id: Uuid, status: ShopStatus, at: DateTime<Utc>) -> Result<()>;

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>>;
    async fn find_product(&self, shop_id: Uuid, remote_id: i64) -> Result<Option<Product>>;
    /// Most recently updated mirror row with this SKU in the shop.
    async fn find_product_by_sku(&self, shop_id: Uuid, sku: &str) -> Result<Option<Product>>;
    /// Returns the stored row and whether it was newly inserted.
    async fn upsert_product(&self, upsert: ProductUpsert) -> Result<(Product, bool)>;
    async fn touch_product(&self, id: Uuid, at: DateTime<Utc>) -> Result<()>;

    async fn find_variation(&self, shop_id: Uuid, remote_id: i64) -> Result<Option<Variation>>;
    async fn find_variation_by_sku(&self, shop_id: Uuid, sku: &str) -> Result<Option<Variation>>;
    async fn upsert_variation(&self, upsert: VariationUpsert) -> Result<(Variation, bool)>;
    async fn variations_for_product(&self, product_id: Uuid) -> Result<Vec<Variation>>;

    async fn get_master(&self, id: Uuid) -> Result<Option<MasterProduct>>;
    async fn upsert_master(&self, upsert: MasterUpsert) -> Result<MasterProduct>;
    async fn upsert_listing(&self, upsert: ListingUpsert) -> Result<ShopListing>;
    async fn find_listing(&self, master_product_id: Uuid, shop_id: Uuid) -> Result<Option<ShopListing>>;

    async fn create_batch(&self, batch: &ImportBatch) -> Result<()>;
    async fn get_batch(&self, id: Uuid) -> Result<Option<ImportBatch>>;
    /// Writes the batch only if its stored status still equals `expected`.
    /// Returns `false` when another writer (a cancel) got there first.
    async fn save_batch(&self, batch: &ImportBatch, expected: ImportStatus) -> Result<bool>;
    async fn insert_import_error(&self, error: NewImportError) -> Result<()>;
    async fn list_import_errors(&self, batch_id: Uuid, limit: i64) -> Result<Vec<ImportErrorRecord>>;
    /// A shop's batches, newest first, optionally of one kind.
    async fn list_batches(&self, shop_id: Uuid, kind: Option<ImportKind>, limit: i64) -> Result<Vec<ImportBatch>>;

    /// Replaces the set of variations selected for transfer.
    async fn replace_selected_variations(&self, product_id: Uuid, variation_ids: &[Uuid]) -> Result<()>;
    async fn selected_variations(&self, product_id: Uuid) -> Result<Vec<Uuid>>;

    /// Inserts or, for a shop that already has one, updates interval and
    /// `enabled` while keeping the existing id and `last_run_at`.
    async fn upsert_schedule(&self, schedule: &SyncSchedule) -> Result<SyncSchedule>;
    async fn get_schedule(&self, shop_id: Uuid) -> Result<Option<SyncSchedule>>;
    /// Returns `false` when the shop had no schedule.
    async fn delete_schedule(&self, shop_id: Uuid) -> Result<bool>;
    async fn list_enabled_schedules(&self) -> Result<Vec<SyncSchedule>>;
    async fn mark_schedule_run(&self, shop_id: Uuid, at: DateTime<Utc>) -> Result<()>;
}
