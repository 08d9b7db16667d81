//! Local mirror of a remote WooCommerce product
//!
//! A mirror row is identified by `(shop_id, remote_id)`. Upserts may rewrite
//! every other column but never that pair.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::attachments::{AttributeRef, CategoryRef, ImageRef, TagRef};
use crate::domain::value_objects::{ProductStatus, ProductType, StockStatus};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub remote_id: i64,
    #[serde(flatten)]
    pub fields: ProductFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything on a mirror row besides its identity and local timestamps.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductFields {
    pub sku: Option<String>,
    pub name: String,
    pub slug: String,
    pub product_type: ProductType,
    pub status: ProductStatus,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub price: Option<Decimal>,
    pub regular_price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    pub stock_status: StockStatus,
    pub stock_quantity: Option<i32>,
    pub manage_stock: bool,
    pub categories: Vec<CategoryRef>,
    pub tags: Vec<TagRef>,
    pub images: Vec<ImageRef>,
    pub attributes: Vec<AttributeRef>,
    pub variation_ids: Vec<i64>,
    pub date_created: Option<DateTime<Utc>>,
    pub date_modified: Option<DateTime<Utc>>,
}

/// Input to an upsert keyed by `(shop_id, remote_id)`.
#[derive(Clone, Debug, PartialEq)]
pub struct ProductUpsert {
    pub shop_id: Uuid,
    pub remote_id: i64,
    pub fields: ProductFields,
}

impl Product {
    /// Materialises a fresh row from an upsert; stores call this on insert.
    pub fn insert(upsert: ProductUpsert) -> Self {
        let now = Utc::now();
        Self { id: Uuid::now_v7(), shop_id: upsert.shop_id, remote_id: upsert.remote_id, fields: upsert.fields, created_at: now, updated_at: now }
    }

    pub fn sku(&self) -> Option<&str> { self.fields.sku.as_deref() }
    pub fn name(&self) -> &str { &self.fields.name }
    pub fn is_variable(&self) -> bool { self.fields.product_type == ProductType::Variable }
}
