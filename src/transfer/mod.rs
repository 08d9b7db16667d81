//! Cross-Store Transfer Engine
//!
//! Pushes locally held products into a target shop and mirrors whatever the
//! target returns. Products are independent: one rejection is reported and
//! the rest still go through.

use std::sync::Arc;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::aggregates::{MasterProduct, Product, ProductFields, Shop, ShopListing, Variation};
use crate::domain::attachments::{AttributeRef, CategoryRef, VariationAttribute};
use crate::domain::value_objects::format_price;
use crate::remote::{ListQuery, ProductPayload, RemoteCatalog, RemoteProduct, VariationPayload};
use crate::store::CatalogStore;
use crate::Result;

/// A product as loaded for transfer, either from a shop mirror or from the master catalog.
#[derive(Clone, Debug, PartialEq)]
pub struct TransferProduct {
    pub source_id: Uuid,
    /// Shop the product is attached to; `None` for master products.
    pub shop_id: Option<Uuid>,
    pub remote_id: Option<i64>,
    pub fields: ProductFields,
    pub variations: Vec<Variation>,
    /// Explicit subset of `variations` to send. Overrides any stored selection.
    pub selected_variation_ids: Option<Vec<Uuid>>,
}

impl TransferProduct {
    pub fn from_mirror(product: &Product, variations: &[Variation]) -> Self {
        Self {
            source_id: product.id,
            shop_id: Some(product.shop_id),
            remote_id: Some(product.remote_id),
            fields: product.fields.clone(),
            variations: variations.to_vec(),
            selected_variation_ids: None,
        }
    }

    /// Master products are unattached: they are always created in the target.
    pub fn from_master(master: &MasterProduct, listing: Option<&ShopListing>) -> Self {
        let mut fields = ProductFields {
            sku: Some(master.sku.clone()),
            name: master.name.clone(),
            description: master.description.clone(),
            ..ProductFields::default()
        };
        if let Some(listing) = listing {
            fields.regular_price = listing.fields.price;
            fields.stock_quantity = listing.fields.stock_quantity;
            fields.stock_status = listing.fields.stock_status;
            fields.categories = listing.fields.category.as_deref().map(CategoryRef::named).into_iter().collect();
        }
        Self { source_id: master.id, shop_id: None, remote_id: None, fields, variations: vec![], selected_variation_ids: None }
    }

    pub fn with_selection(mut self, variation_ids: Vec<Uuid>) -> Self {
        self.selected_variation_ids = Some(variation_ids);
        self
    }

    pub fn name(&self) -> &str { &self.fields.name }

    fn is_attached(&self) -> bool { self.shop_id.is_some() && self.remote_id.is_some() }

    /// Payload for the target shop. Shop-local ids (categories, images,
    /// attributes) are dropped so the target resolves them by name.
    pub fn payload(&self, variations: &[&Variation]) -> ProductPayload {
        let f = &self.fields;
        ProductPayload {
            name: Some(f.name.clone()),
            product_type: f.product_type.known(),
            status: f.status.known(),
            sku: f.sku.clone(),
            regular_price: f.regular_price.map(|p| format_price(Some(p))),
            sale_price: f.sale_price.map(|p| format_price(Some(p))),
            description: f.description.clone(),
            short_description: f.short_description.clone(),
            stock_status: f.stock_status.known(),
            stock_quantity: f.stock_quantity,
            manage_stock: Some(f.manage_stock),
            categories: Some(f.categories.iter().map(CategoryRef::portable).collect()),
            images: Some(f.images.iter().map(|i| i.portable()).collect()),
            attributes: Some(f.attributes.iter().map(|a| AttributeRef { id: None, ..a.clone() }).collect()),
            variations: (!variations.is_empty()).then(|| variations.iter().map(|v| variation_payload(v)).collect()),
            ..ProductPayload::default()
        }
    }
}

fn variation_payload(v: &Variation) -> VariationPayload {
    let f = &v.fields;
    VariationPayload {
        sku: f.sku.clone(),
        description: f.description.clone(),
        regular_price: f.regular_price.map(|p| format_price(Some(p))),
        sale_price: f.sale_price.map(|p| format_price(Some(p))),
        stock_status: f.stock_status.known(),
        stock_quantity: f.stock_quantity,
        attributes: Some(f.attributes.iter().map(|a| VariationAttribute { id: None, ..a.clone() }).collect()),
        image: f.image.as_ref().map(|i| i.portable()),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSuccess {
    pub product_id: Uuid,
    pub remote_id: i64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferFailure {
    pub product_id: Uuid,
    pub name: String,
    pub error: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReport {
    pub transferred: Vec<TransferSuccess>,
    pub failed: Vec<TransferFailure>,
}

#[derive(Clone)]
pub struct TransferEngine {
    store: Arc<dyn CatalogStore>,
}

impl TransferEngine {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self { Self { store } }

    #[tracing::instrument(skip_all, fields(target_shop_id = %target.id, products = products.len()))]
    pub async fn run(&self, remote: &dyn RemoteCatalog, target: &Shop, source_shop_id: Option<Uuid>, products: Vec<TransferProduct>) -> TransferReport {
        let mut report = TransferReport::default();
        let mut touched = Vec::new();

        for product in &products {
            match self.transfer_one(remote, target, product).await {
                Ok(created) => {
                    tracing::info!(product_id = %product.source_id, remote_id = created.id, "product transferred");
                    if product.shop_id.is_some() && product.shop_id == source_shop_id { touched.push(product.source_id); }
                    report.transferred.push(TransferSuccess { product_id: product.source_id, remote_id: created.id, name: created.name });
                }
                Err(err) => {
                    tracing::warn!(product_id = %product.source_id, error = %err, "product transfer failed");
                    report.failed.push(TransferFailure { product_id: product.source_id, name: product.name().to_string(), error: err.to_string() });
                }
            }
        }

        if source_shop_id.is_some_and(|source| source != target.id) {
            let now = Utc::now();
            for product_id in touched {
                if let Err(err) = self.store.touch_product(product_id, now).await {
                    tracing::warn!(%product_id, error = %err, "could not stamp transferred source product");
                }
            }
        }
        report
    }

    async fn transfer_one(&self, remote: &dyn RemoteCatalog, target: &Shop, product: &TransferProduct) -> Result<RemoteProduct> {
        let selected = self.resolve_selection(product).await?;
        let payload = product.payload(&selected);

        let existing = match (&product.fields.sku, product.is_attached()) {
            (Some(sku), true) => remote.list_products(&ListQuery::by_sku(sku)).await?.items.into_iter().next(),
            _ => None,
        };
        let pushed = match existing {
            Some(found) => remote.update_product(found.id, &payload).await?,
            None => remote.create_product(&payload).await?,
        };
        self.store.upsert_product(pushed.to_upsert(target.id)).await?;
        Ok(pushed)
    }

    /// Explicit ids win, then the stored selection, then every variation.
    async fn resolve_selection<'a>(&self, product: &'a TransferProduct) -> Result<Vec<&'a Variation>> {
        let ids = match &product.selected_variation_ids {
            Some(ids) => ids.clone(),
            None => self.store.selected_variations(product.source_id).await?,
        };
        if ids.is_empty() {
            return Ok(product.variations.iter().collect());
        }
        Ok(product.variations.iter().filter(|v| ids.contains(&v.id)).collect())
    }
}
