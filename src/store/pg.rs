//! Postgres implementation of [`CatalogStore`].
//!
//! Status columns are plain `varchar`s; rows are read into `*Row` structs and
//! converted through the enums' `FromStr`, so an unexpected value surfaces as a
//! storage error instead of a panic.

use std::str::FromStr;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;
use crate::domain::aggregates::{
    BatchCounters, BatchErrorEntry, BatchRecord, ImportBatch, ListingFields, ListingUpsert, MasterProduct, MasterUpsert,
    Product, ProductFields, ProductUpsert, Shop, ShopListing, SyncSchedule, Variation, VariationFields, VariationUpsert,
};
use crate::domain::attachments::{AttributeRef, CategoryRef, ImageRef, TagRef, VariationAttribute};
use crate::domain::value_objects::{ImportKind, ImportStatus, ShopStatus, UnknownVariant};
use crate::{CatalogError, Result};
use super::{CatalogStore, ImportErrorRecord, NewImportError};

#[derive(Clone)]
pub struct PgCatalogStore {
    db: PgPool,
}

impl PgCatalogStore {
    pub fn new(db: PgPool) -> Self { Self { db } }
    pub fn pool(&self) -> &PgPool { &self.db }
}

fn parse<T: FromStr<Err = UnknownVariant>>(value: &str) -> Result<T> {
    value.parse().map_err(|e: UnknownVariant| CatalogError::Storage(e.to_string()))
}

// =============================================================================
// Row types
// =============================================================================

#[derive(sqlx::FromRow)]
struct ShopRow {
    id: Uuid, name: String, base_url: String, consumer_key: String, consumer_secret: String,
    is_active: bool, status: String, last_ping: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl TryFrom<ShopRow> for Shop {
    type Error = CatalogError;
    fn try_from(r: ShopRow) -> Result<Self> {
        Ok(Shop {
            id: r.id, name: r.name, base_url: r.base_url, consumer_key: r.consumer_key, consumer_secret: r.consumer_secret,
            is_active: r.is_active, status: parse(&r.status)?, last_ping: r.last_ping, created_at: r.created_at, updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid, shop_id: Uuid, remote_id: i64, sku: Option<String>, name: String, slug: String,
    product_type: String, status: String, description: Option<String>, short_description: Option<String>,
    price: Option<Decimal>, regular_price: Option<Decimal>, sale_price: Option<Decimal>,
    stock_status: String, stock_quantity: Option<i32>, manage_stock: bool,
    categories: Json<Vec<CategoryRef>>, tags: Json<Vec<TagRef>>, images: Json<Vec<ImageRef>>, attributes: Json<Vec<AttributeRef>>,
    variation_ids: Vec<i64>, date_created: Option<DateTime<Utc>>, date_modified: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
    #[sqlx(default)]
    inserted: bool,
}

impl TryFrom<ProductRow> for Product {
    type Error = CatalogError;
    fn try_from(r: ProductRow) -> Result<Self> {
        Ok(Product {
            id: r.id, shop_id: r.shop_id, remote_id: r.remote_id,
            fields: ProductFields {
                sku: r.sku, name: r.name, slug: r.slug, product_type: parse(&r.product_type)?, status: parse(&r.status)?,
                description: r.description, short_description: r.short_description,
                price: r.price, regular_price: r.regular_price, sale_price: r.sale_price,
                stock_status: parse(&r.stock_status)?, stock_quantity: r.stock_quantity, manage_stock: r.manage_stock,
                categories: r.categories.0, tags: r.tags.0, images: r.images.0, attributes: r.attributes.0,
                variation_ids: r.variation_ids, date_created: r.date_created, date_modified: r.date_modified,
            },
            created_at: r.created_at, updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct VariationRow {
    id: Uuid, shop_id: Uuid, product_id: Uuid, remote_id: i64, remote_parent_id: i64,
    sku: Option<String>, status: String, description: Option<String>,
    price: Option<Decimal>, regular_price: Option<Decimal>, sale_price: Option<Decimal>,
    stock_status: String, stock_quantity: Option<i32>, manage_stock: bool,
    attributes: Json<Vec<VariationAttribute>>, image: Option<Json<ImageRef>>,
    date_created: Option<DateTime<Utc>>, date_modified: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
    #[sqlx(default)]
    inserted: bool,
}

impl TryFrom<VariationRow> for Variation {
    type Error = CatalogError;
    fn try_from(r: VariationRow) -> Result<Self> {
        Ok(Variation {
            id: r.id, shop_id: r.shop_id, product_id: r.product_id, remote_id: r.remote_id, remote_parent_id: r.remote_parent_id,
            fields: VariationFields {
                sku: r.sku, status: parse(&r.status)?, description: r.description,
                price: r.price, regular_price: r.regular_price, sale_price: r.sale_price,
                stock_status: parse(&r.stock_status)?, stock_quantity: r.stock_quantity, manage_stock: r.manage_stock,
                attributes: r.attributes.0, image: r.image.map(|j| j.0),
                date_created: r.date_created, date_modified: r.date_modified,
            },
            created_at: r.created_at, updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MasterRow { id: Uuid, sku: String, name: String, description: Option<String>, created_at: DateTime<Utc>, updated_at: DateTime<Utc> }

impl From<MasterRow> for MasterProduct {
    fn from(r: MasterRow) -> Self {
        MasterProduct { id: r.id, sku: r.sku, name: r.name, description: r.description, created_at: r.created_at, updated_at: r.updated_at }
    }
}

#[derive(sqlx::FromRow)]
struct ListingRow {
    id: Uuid, master_product_id: Uuid, shop_id: Uuid, price: Option<Decimal>, category: Option<String>,
    stock_quantity: Option<i32>, stock_status: String, is_active: bool, created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl TryFrom<ListingRow> for ShopListing {
    type Error = CatalogError;
    fn try_from(r: ListingRow) -> Result<Self> {
        Ok(ShopListing {
            id: r.id, master_product_id: r.master_product_id, shop_id: r.shop_id,
            fields: ListingFields { price: r.price, category: r.category, stock_quantity: r.stock_quantity, stock_status: parse(&r.stock_status)?, is_active: r.is_active },
            created_at: r.created_at, updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BatchRow {
    id: Uuid, shop_id: Uuid, filename: String, file_size: Option<i64>, kind: String, status: String,
    total_rows: i32, processed_rows: i32, successful_rows: i32, error_rows: i32, errors: Json<Vec<BatchErrorEntry>>,
    started_at: Option<DateTime<Utc>>, completed_at: Option<DateTime<Utc>>, created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl TryFrom<BatchRow> for ImportBatch {
    type Error = CatalogError;
    fn try_from(r: BatchRow) -> Result<Self> {
        Ok(ImportBatch::restore(BatchRecord {
            id: r.id, shop_id: r.shop_id, filename: r.filename, file_size: r.file_size, kind: parse(&r.kind)?, status: parse(&r.status)?,
            counters: BatchCounters { total_rows: r.total_rows, processed_rows: r.processed_rows, successful_rows: r.successful_rows, error_rows: r.error_rows },
            errors: r.errors.0, started_at: r.started_at, completed_at: r.completed_at, created_at: r.created_at, updated_at: r.updated_at,
        }))
    }
}

#[derive(sqlx::FromRow)]
struct ImportErrorRow {
    id: Uuid, batch_id: Uuid, row_number: i32, sku: Option<String>, category: String, message: String,
    row_data: serde_json::Value, created_at: DateTime<Utc>,
}

impl TryFrom<ImportErrorRow> for ImportErrorRecord {
    type Error = CatalogError;
    fn try_from(r: ImportErrorRow) -> Result<Self> {
        Ok(ImportErrorRecord {
            id: r.id, batch_id: r.batch_id, row_number: r.row_number, sku: r.sku, category: parse(&r.category)?,
            message: r.message, row_data: r.row_data, created_at: r.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ScheduleRow {
    id: Uuid, shop_id: Uuid, interval_secs: i64, enabled: bool, last_run_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl From<ScheduleRow> for SyncSchedule {
    fn from(r: ScheduleRow) -> Self {
        SyncSchedule {
            id: r.id, shop_id: r.shop_id, interval_secs: r.interval_secs, enabled: r.enabled, last_run_at: r.last_run_at,
            created_at: r.created_at, updated_at: r.updated_at,
        }
    }
}

// =============================================================================
// Queries
// =============================================================================

const UPSERT_PRODUCT: &str = "INSERT INTO products (id, shop_id, remote_id, sku, name, slug, product_type, status, description, short_description, \
    price, regular_price, sale_price, stock_status, stock_quantity, manage_stock, categories, tags, images, attributes, variation_ids, \
    date_created, date_modified, created_at, updated_at) \
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, NOW(), NOW()) \
    ON CONFLICT (shop_id, remote_id) DO UPDATE SET sku = EXCLUDED.sku, name = EXCLUDED.name, slug = EXCLUDED.slug, \
    product_type = EXCLUDED.product_type, status = EXCLUDED.status, description = EXCLUDED.description, \
    short_description = EXCLUDED.short_description, price = EXCLUDED.price, regular_price = EXCLUDED.regular_price, \
    sale_price = EXCLUDED.sale_price, stock_status = EXCLUDED.stock_status, stock_quantity = EXCLUDED.stock_quantity, \
    manage_stock = EXCLUDED.manage_stock, categories = EXCLUDED.categories, tags = EXCLUDED.tags, images = EXCLUDED.images, \
    attributes = EXCLUDED.attributes, variation_ids = EXCLUDED.variation_ids, date_created = EXCLUDED.date_created, \
    date_modified = EXCLUDED.date_modified, updated_at = NOW() \
    RETURNING *, (xmax = 0) AS inserted";

const UPSERT_VARIATION: &str = "INSERT INTO product_variations (id, shop_id, product_id, remote_id, remote_parent_id, sku, status, description, \
    price, regular_price, sale_price, stock_status, stock_quantity, manage_stock, attributes, image, date_created, date_modified, created_at, updated_at) \
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, NOW(), NOW()) \
    ON CONFLICT (shop_id, remote_id) DO UPDATE SET product_id = EXCLUDED.product_id, remote_parent_id = EXCLUDED.remote_parent_id, \
    sku = EXCLUDED.sku, status = EXCLUDED.status, description = EXCLUDED.description, price = EXCLUDED.price, \
    regular_price = EXCLUDED.regular_price, sale_price = EXCLUDED.sale_price, stock_status = EXCLUDED.stock_status, \
    stock_quantity = EXCLUDED.stock_quantity, manage_stock = EXCLUDED.manage_stock, attributes = EXCLUDED.attributes, \
    image = EXCLUDED.image, date_created = EXCLUDED.date_created, date_modified = EXCLUDED.date_modified, updated_at = NOW() \
    RETURNING *, (xmax = 0) AS inserted";

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn get_shop(&self, id: Uuid) -> Result<Option<Shop>> {
        sqlx::query_as::<_, ShopRow>("SELECT * FROM shops WHERE id = $1")
            .bind(id).fetch_optional(&self.db).await?
            .map(Shop::try_from).transpose()
    }

    async fn update_shop_liveness(&self, id: Uuid, status: ShopStatus, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE shops SET status = $2, last_ping = $3, updated_at = NOW() WHERE id = $1")
            .bind(id).bind(status.as_str()).bind(at).execute(&self.db).await?;
        Ok(())
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>> {
        sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1")
            .bind(id).fetch_optional(&self.db).await?
            .map(Product::try_from).transpose()
    }

    async fn find_product(&self, shop_id: Uuid, remote_id: i64) -> Result<Option<Product>> {
        sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE shop_id = $1 AND remote_id = $2")
            .bind(shop_id).bind(remote_id).fetch_optional(&self.db).await?
            .map(Product::try_from).transpose()
    }

    async fn find_product_by_sku(&self, shop_id: Uuid, sku: &str) -> Result<Option<Product>> {
        sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE shop_id = $1 AND sku = $2 ORDER BY updated_at DESC LIMIT 1")
            .bind(shop_id).bind(sku).fetch_optional(&self.db).await?
            .map(Product::try_from).transpose()
    }

    async fn upsert_product(&self, upsert: ProductUpsert) -> Result<(Product, bool)> {
        let p = Product::insert(upsert);
        let f = &p.fields;
        let row = sqlx::query_as::<_, ProductRow>(UPSERT_PRODUCT)
            .bind(p.id).bind(p.shop_id).bind(p.remote_id).bind(&f.sku).bind(&f.name).bind(&f.slug)
            .bind(f.product_type.as_str()).bind(f.status.as_str()).bind(&f.description).bind(&f.short_description)
            .bind(f.price).bind(f.regular_price).bind(f.sale_price)
            .bind(f.stock_status.as_str()).bind(f.stock_quantity).bind(f.manage_stock)
            .bind(Json(&f.categories)).bind(Json(&f.tags)).bind(Json(&f.images)).bind(Json(&f.attributes))
            .bind(&f.variation_ids).bind(f.date_created).bind(f.date_modified)
            .fetch_one(&self.db).await?;
        let inserted = row.inserted;
        Ok((Product::try_from(row)?, inserted))
    }

    async fn touch_product(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE products SET date_modified = $2, updated_at = $2 WHERE id = $1")
            .bind(id).bind(at).execute(&self.db).await?;
        Ok(())
    }

    async fn find_variation(&self, shop_id: Uuid, remote_id: i64) -> Result<Option<Variation>> {
        sqlx::query_as::<_, VariationRow>("SELECT * FROM product_variations WHERE shop_id = $1 AND remote_id = $2")
            .bind(shop_id).bind(remote_id).fetch_optional(&self.db).await?
            .map(Variation::try_from).transpose()
    }

    async fn find_variation_by_sku(&self, shop_id: Uuid, sku: &str) -> Result<Option<Variation>> {
        sqlx::query_as::<_, VariationRow>("SELECT * FROM product_variations WHERE shop_id = $1 AND sku = $2 ORDER BY updated_at DESC LIMIT 1")
            .bind(shop_id).bind(sku).fetch_optional(&self.db).await?
            .map(Variation::try_from).transpose()
    }

    async fn upsert_variation(&self, upsert: VariationUpsert) -> Result<(Variation, bool)> {
        let v = Variation::insert(upsert);
        let f = &v.fields;
        let row = sqlx::query_as::<_, VariationRow>(UPSERT_VARIATION)
            .bind(v.id).bind(v.shop_id).bind(v.product_id).bind(v.remote_id).bind(v.remote_parent_id)
            .bind(&f.sku).bind(f.status.as_str()).bind(&f.description)
            .bind(f.price).bind(f.regular_price).bind(f.sale_price)
            .bind(f.stock_status.as_str()).bind(f.stock_quantity).bind(f.manage_stock)
            .bind(Json(&f.attributes)).bind(f.image.as_ref().map(Json))
            .bind(f.date_created).bind(f.date_modified)
            .fetch_one(&self.db).await?;
        let inserted = row.inserted;
        Ok((Variation::try_from(row)?, inserted))
    }

    async fn variations_for_product(&self, product_id: Uuid) -> Result<Vec<Variation>> {
        sqlx::query_as::<_, VariationRow>("SELECT * FROM product_variations WHERE product_id = $1 ORDER BY remote_id")
            .bind(product_id).fetch_all(&self.db).await?
            .into_iter().map(Variation::try_from).collect()
    }

    async fn get_master(&self, id: Uuid) -> Result<Option<MasterProduct>> {
        let row = sqlx::query_as::<_, MasterRow>("SELECT * FROM master_products WHERE id = $1")
            .bind(id).fetch_optional(&self.db).await?;
        Ok(row.map(MasterProduct::from))
    }

    async fn upsert_master(&self, upsert: MasterUpsert) -> Result<MasterProduct> {
        let m = MasterProduct::insert(upsert);
        let row = sqlx::query_as::<_, MasterRow>(
            "INSERT INTO master_products (id, sku, name, description, created_at, updated_at) VALUES ($1, $2, $3, $4, NOW(), NOW()) \
             ON CONFLICT (sku) DO UPDATE SET name = EXCLUDED.name, description = EXCLUDED.description, updated_at = NOW() RETURNING *")
            .bind(m.id).bind(&m.sku).bind(&m.name).bind(&m.description)
            .fetch_one(&self.db).await?;
        Ok(row.into())
    }

    async fn upsert_listing(&self, upsert: ListingUpsert) -> Result<ShopListing> {
        let l = ShopListing::insert(upsert);
        let f = &l.fields;
        sqlx::query_as::<_, ListingRow>(
            "INSERT INTO shop_listings (id, master_product_id, shop_id, price, category, stock_quantity, stock_status, is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW()) \
             ON CONFLICT (master_product_id, shop_id) DO UPDATE SET price = EXCLUDED.price, category = EXCLUDED.category, \
             stock_quantity = EXCLUDED.stock_quantity, stock_status = EXCLUDED.stock_status, is_active = EXCLUDED.is_active, updated_at = NOW() \
             RETURNING *")
            .bind(l.id).bind(l.master_product_id).bind(l.shop_id).bind(f.price).bind(&f.category)
            .bind(f.stock_quantity).bind(f.stock_status.as_str()).bind(f.is_active)
            .fetch_one(&self.db).await?
            .try_into()
    }

    async fn find_listing(&self, master_product_id: Uuid, shop_id: Uuid) -> Result<Option<ShopListing>> {
        sqlx::query_as::<_, ListingRow>("SELECT * FROM shop_listings WHERE master_product_id = $1 AND shop_id = $2")
            .bind(master_product_id).bind(shop_id).fetch_optional(&self.db).await?
            .map(ShopListing::try_from).transpose()
    }

    async fn create_batch(&self, batch: &ImportBatch) -> Result<()> {
        let r = batch.record();
        sqlx::query(
            "INSERT INTO import_batches (id, shop_id, filename, file_size, kind, status, total_rows, processed_rows, successful_rows, error_rows, \
             errors, started_at, completed_at, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)")
            .bind(r.id).bind(r.shop_id).bind(&r.filename).bind(r.file_size).bind(r.kind.as_str()).bind(r.status.as_str())
            .bind(r.counters.total_rows).bind(r.counters.processed_rows).bind(r.counters.successful_rows).bind(r.counters.error_rows)
            .bind(Json(&r.errors)).bind(r.started_at).bind(r.completed_at).bind(r.created_at).bind(r.updated_at)
            .execute(&self.db).await?;
        Ok(())
    }

    async fn get_batch(&self, id: Uuid) -> Result<Option<ImportBatch>> {
        sqlx::query_as::<_, BatchRow>("SELECT * FROM import_batches WHERE id = $1")
            .bind(id).fetch_optional(&self.db).await?
            .map(ImportBatch::try_from).transpose()
    }

    async fn save_batch(&self, batch: &ImportBatch, expected: ImportStatus) -> Result<bool> {
        let r = batch.record();
        let result = sqlx::query(
            "UPDATE import_batches SET status = $2, total_rows = $3, processed_rows = $4, successful_rows = $5, error_rows = $6, \
             errors = $7, started_at = $8, completed_at = $9, updated_at = $10 WHERE id = $1 AND status = $11")
            .bind(r.id).bind(r.status.as_str())
            .bind(r.counters.total_rows).bind(r.counters.processed_rows).bind(r.counters.successful_rows).bind(r.counters.error_rows)
            .bind(Json(&r.errors)).bind(r.started_at).bind(r.completed_at).bind(r.updated_at).bind(expected.as_str())
            .execute(&self.db).await?;
        Ok(result.rows_affected() == 1)
    }

    async fn insert_import_error(&self, error: NewImportError) -> Result<()> {
        let e = ImportErrorRecord::from_new(error);
        sqlx::query(
            "INSERT INTO import_errors (id, batch_id, row_number, sku, category, message, row_data, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)")
            .bind(e.id).bind(e.batch_id).bind(e.row_number).bind(&e.sku).bind(e.category.as_str())
            .bind(&e.message).bind(&e.row_data).bind(e.created_at)
            .execute(&self.db).await?;
        Ok(())
    }

    async fn list_import_errors(&self, batch_id: Uuid, limit: i64) -> Result<Vec<ImportErrorRecord>> {
        sqlx::query_as::<_, ImportErrorRow>("SELECT * FROM import_errors WHERE batch_id = $1 ORDER BY row_number, created_at LIMIT $2")
            .bind(batch_id).bind(limit).fetch_all(&self.db).await?
            .into_iter().map(ImportErrorRecord::try_from).collect()
    }

    async fn list_batches(&self, shop_id: Uuid, kind: Option<ImportKind>, limit: i64) -> Result<Vec<ImportBatch>> {
        sqlx::query_as::<_, BatchRow>(
            "SELECT * FROM import_batches WHERE shop_id = $1 AND ($2::varchar IS NULL OR kind = $2) ORDER BY created_at DESC LIMIT $3")
            .bind(shop_id).bind(kind.map(|k| k.as_str())).bind(limit).fetch_all(&self.db).await?
            .into_iter().map(ImportBatch::try_from).collect()
    }

    async fn replace_selected_variations(&self, product_id: Uuid, variation_ids: &[Uuid]) -> Result<()> {
        let mut tx = self.db.begin().await?;
        sqlx::query("DELETE FROM product_shop_variants WHERE product_id = $1").bind(product_id).execute(&mut *tx).await?;
        for variation_id in variation_ids {
            sqlx::query("INSERT INTO product_shop_variants (product_id, variation_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                .bind(product_id).bind(variation_id).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn selected_variations(&self, product_id: Uuid) -> Result<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as("SELECT variation_id FROM product_shop_variants WHERE product_id = $1 ORDER BY variation_id")
            .bind(product_id).fetch_all(&self.db).await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn upsert_schedule(&self, schedule: &SyncSchedule) -> Result<SyncSchedule> {
        let row = sqlx::query_as::<_, ScheduleRow>(
            "INSERT INTO sync_schedules (id, shop_id, interval_secs, enabled, last_run_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $6) \
             ON CONFLICT (shop_id) DO UPDATE SET interval_secs = EXCLUDED.interval_secs, enabled = EXCLUDED.enabled, updated_at = NOW() \
             RETURNING *")
            .bind(schedule.id).bind(schedule.shop_id).bind(schedule.interval_secs).bind(schedule.enabled)
            .bind(schedule.last_run_at).bind(schedule.created_at)
            .fetch_one(&self.db).await?;
        Ok(row.into())
    }

    async fn get_schedule(&self, shop_id: Uuid) -> Result<Option<SyncSchedule>> {
        let row = sqlx::query_as::<_, ScheduleRow>("SELECT * FROM sync_schedules WHERE shop_id = $1")
            .bind(shop_id).fetch_optional(&self.db).await?;
        Ok(row.map(SyncSchedule::from))
    }

    async fn delete_schedule(&self, shop_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sync_schedules WHERE shop_id = $1").bind(shop_id).execute(&self.db).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_enabled_schedules(&self) -> Result<Vec<SyncSchedule>> {
        let rows = sqlx::query_as::<_, ScheduleRow>("SELECT * FROM sync_schedules WHERE enabled ORDER BY last_run_at NULLS FIRST")
            .fetch_all(&self.db).await?;
        Ok(rows.into_iter().map(SyncSchedule::from).collect())
    }

    async fn mark_schedule_run(&self, shop_id: Uuid, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE sync_schedules SET last_run_at = $2, updated_at = NOW() WHERE shop_id = $1")
            .bind(shop_id).bind(at).execute(&self.db).await?;
        Ok(())
    }
}
