//! Master products and their per-shop listings
//!
//! A master product is the shop-independent identity of a SKU. Each shop it
//! is sold in gets one listing, unique on `(master_product_id, shop_id)`, with
//! the shop-specific price, category and availability.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::value_objects::{Sku, StockStatus};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MasterProduct {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MasterUpsert {
    pub sku: Sku,
    pub name: String,
    pub description: Option<String>,
}

impl MasterProduct {
    pub fn insert(upsert: MasterUpsert) -> Self {
        let now = Utc::now();
        Self { id: Uuid::now_v7(), sku: upsert.sku.into_inner(), name: upsert.name, description: upsert.description, created_at: now, updated_at: now }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShopListing {
    pub id: Uuid,
    pub master_product_id: Uuid,
    pub shop_id: Uuid,
    #[serde(flatten)]
    pub fields: ListingFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingFields {
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub stock_quantity: Option<i32>,
    pub stock_status: StockStatus,
    pub is_active: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListingUpsert {
    pub master_product_id: Uuid,
    pub shop_id: Uuid,
    pub fields: ListingFields,
}

impl ShopListing {
    pub fn insert(upsert: ListingUpsert) -> Self {
        let now = Utc::now();
        Self { id: Uuid::now_v7(), master_product_id: upsert.master_product_id, shop_id: upsert.shop_id, fields: upsert.fields, created_at: now, updated_at: now }
    }
}
