//! WooCommerce REST v3 resources, as read from and written to the wire.
//!
//! Only the fields the mirror keeps are modelled; serde ignores the rest.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use crate::domain::aggregates::{Product, ProductFields, ProductUpsert, VariationFields, VariationUpsert};
use crate::domain::attachments::{AttributeRef, CategoryRef, ImageRef, TagRef, VariationAttribute};
use crate::domain::value_objects::{price_or_none, ProductStatus, ProductType, StockStatus};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RemoteProduct {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(rename = "type", default)]
    pub product_type: ProductType,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub regular_price: String,
    #[serde(default)]
    pub sale_price: String,
    #[serde(default)]
    pub stock_status: StockStatus,
    #[serde(default)]
    pub stock_quantity: Option<i32>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub manage_stock: bool,
    #[serde(default)]
    pub categories: Vec<CategoryRef>,
    #[serde(default)]
    pub tags: Vec<TagRef>,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    #[serde(default)]
    pub attributes: Vec<AttributeRef>,
    #[serde(default)]
    pub variations: Vec<i64>,
    #[serde(default)]
    pub date_created: Option<NaiveDateTime>,
    #[serde(default)]
    pub date_modified: Option<NaiveDateTime>,
}

impl RemoteProduct {
    /// The remote response is authoritative: every mirror field is taken from it.
    pub fn to_upsert(&self, shop_id: Uuid) -> ProductUpsert {
        ProductUpsert {
            shop_id,
            remote_id: self.id,
            fields: ProductFields {
                sku: non_empty(&self.sku),
                name: self.name.clone(),
                slug: self.slug.clone(),
                product_type: self.product_type,
                status: self.status,
                description: non_empty(&self.description),
                short_description: non_empty(&self.short_description),
                price: price_or_none(&self.price),
                regular_price: price_or_none(&self.regular_price),
                sale_price: price_or_none(&self.sale_price),
                stock_status: self.stock_status,
                stock_quantity: self.stock_quantity,
                manage_stock: self.manage_stock,
                categories: self.categories.clone(),
                tags: self.tags.clone(),
                images: self.images.clone(),
                attributes: self.attributes.clone(),
                variation_ids: self.variations.clone(),
                date_created: utc(self.date_created),
                date_modified: utc(self.date_modified),
            },
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RemoteVariation {
    pub id: i64,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub regular_price: String,
    #[serde(default)]
    pub sale_price: String,
    #[serde(default)]
    pub stock_status: StockStatus,
    #[serde(default)]
    pub stock_quantity: Option<i32>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub manage_stock: bool,
    #[serde(default)]
    pub attributes: Vec<VariationAttribute>,
    #[serde(default)]
    pub image: Option<ImageRef>,
    #[serde(default)]
    pub date_created: Option<NaiveDateTime>,
    #[serde(default)]
    pub date_modified: Option<NaiveDateTime>,
}

impl RemoteVariation {
    pub fn to_upsert(&self, parent: &Product) -> VariationUpsert {
        VariationUpsert {
            shop_id: parent.shop_id,
            product_id: parent.id,
            remote_id: self.id,
            remote_parent_id: parent.remote_id,
            fields: VariationFields {
                sku: non_empty(&self.sku),
                status: self.status,
                description: non_empty(&self.description),
                price: price_or_none(&self.price),
                regular_price: price_or_none(&self.regular_price),
                sale_price: price_or_none(&self.sale_price),
                stock_status: self.stock_status,
                stock_quantity: self.stock_quantity,
                manage_stock: self.manage_stock,
                attributes: self.attributes.clone(),
                image: self.image.clone(),
                date_created: utc(self.date_created),
                date_modified: utc(self.date_modified),
            },
        }
    }
}

/// Body of `POST /products` and `PUT /products/{id}`. Absent fields are left unchanged remotely.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ProductPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub product_type: Option<ProductType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProductStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regular_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_status: Option<StockStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manage_stock: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<CategoryRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<AttributeRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variations: Option<Vec<VariationPayload>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct VariationPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regular_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_status: Option<StockStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<VariationAttribute>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
}

/// Query for `GET /products`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub per_page: u32,
    pub status: Option<ProductStatus>,
    pub sku: Option<String>,
}

impl ListQuery {
    pub fn page(page: u32, per_page: u32) -> Self { Self { page, per_page, status: None, sku: None } }

    pub fn published(page: u32, per_page: u32) -> Self { Self { status: Some(ProductStatus::Publish), ..Self::page(page, per_page) } }

    pub fn by_sku(sku: &str) -> Self { Self { sku: Some(sku.to_string()), ..Self::page(1, 10) } }

    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string()), ("per_page", self.per_page.to_string())];
        if let Some(status) = self.status { pairs.push(("status", status.to_string())); }
        if let Some(sku) = &self.sku { pairs.push(("sku", sku.clone())); }
        pairs
    }
}

#[derive(Clone, Debug, Default)]
pub struct ProductPage {
    pub items: Vec<RemoteProduct>,
    pub total_pages: u32,
    pub total_count: u64,
}

impl ProductPage {
    pub fn empty() -> Self { Self { items: vec![], total_pages: 0, total_count: 0 } }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn utc(value: Option<NaiveDateTime>) -> Option<DateTime<Utc>> { value.map(|v| v.and_utc()) }

/// WooCommerce sends `manage_stock` as a bool on products but may send
/// `"parent"` on variations that inherit stock management.
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    })
}
