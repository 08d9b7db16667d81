//! Local mirror of a product variation

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::attachments::{ImageRef, VariationAttribute};
use crate::domain::value_objects::{ProductStatus, StockStatus};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Variation {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub product_id: Uuid,
    pub remote_id: i64,
    pub remote_parent_id: i64,
    #[serde(flatten)]
    pub fields: VariationFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VariationFields {
    pub sku: Option<String>,
    pub status: ProductStatus,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub regular_price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    pub stock_status: StockStatus,
    pub stock_quantity: Option<i32>,
    pub manage_stock: bool,
    pub attributes: Vec<VariationAttribute>,
    pub image: Option<ImageRef>,
    pub date_created: Option<DateTime<Utc>>,
    pub date_modified: Option<DateTime<Utc>>,
}

/// Input to an upsert keyed by `(shop_id, remote_id)`.
#[derive(Clone, Debug, PartialEq)]
pub struct VariationUpsert {
    pub shop_id: Uuid,
    pub product_id: Uuid,
    pub remote_id: i64,
    pub remote_parent_id: i64,
    pub fields: VariationFields,
}

impl Variation {
    pub fn insert(upsert: VariationUpsert) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), shop_id: upsert.shop_id, product_id: upsert.product_id,
            remote_id: upsert.remote_id, remote_parent_id: upsert.remote_parent_id,
            fields: upsert.fields, created_at: now, updated_at: now,
        }
    }

    pub fn sku(&self) -> Option<&str> { self.fields.sku.as_deref() }
}
