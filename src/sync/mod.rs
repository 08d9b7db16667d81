//! Catalog Sync Engine
//!
//! Pulls a shop's published catalog page by page into the local mirror. Each
//! run is capped at `max_products`; `has_more` tells the caller whether
//! another run would find more. Re-running is safe: every write is an upsert
//! on `(shop_id, remote_id)`.

use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;
use crate::domain::aggregates::{BatchErrorEntry, ImportBatch, ListingFields, ListingUpsert, MasterUpsert, Product, Shop};
use crate::domain::value_objects::{ImportKind, ImportStatus, ProductStatus, ShopStatus, Sku};
use crate::remote::{ListQuery, RemoteCatalog, RemoteProduct};
use crate::store::{commit_batch, CatalogStore, NewImportError};
use crate::{CatalogError, Result};

pub const SYNC_FILENAME: &str = "woocommerce-sync";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncOptions {
    /// Page size requested from WooCommerce (at most 100).
    pub batch_size: u32,
    pub max_products: u32,
    pub page_delay: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self { Self { batch_size: 50, max_products: 500, page_delay: Duration::from_secs(1) } }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub batch_id: Uuid,
    pub processed: u32,
    pub created: u32,
    pub updated: u32,
    pub variations_created: u32,
    pub variations_updated: u32,
    pub has_more: bool,
}

#[derive(Clone)]
pub struct SyncEngine {
    store: Arc<dyn CatalogStore>,
    options: SyncOptions,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn CatalogStore>, options: SyncOptions) -> Self {
        Self { store, options: SyncOptions { batch_size: options.batch_size.clamp(1, 100), max_products: options.max_products.max(1), ..options } }
    }

    pub fn options(&self) -> &SyncOptions { &self.options }

    #[tracing::instrument(skip_all, fields(shop_id = %shop.id))]
    pub async fn run(&self, remote: &dyn RemoteCatalog, shop: &Shop) -> Result<SyncReport> {
        if !remote.test_connection().await {
            tracing::warn!("shop unreachable, sync not started");
            self.store.update_shop_liveness(shop.id, ShopStatus::Offline, Utc::now()).await?;
            return Err(CatalogError::Connectivity(shop.id));
        }

        let mut batch = ImportBatch::new(shop.id, SYNC_FILENAME, ImportKind::Sync);
        self.store.create_batch(&batch).await?;
        batch.start()?;
        commit_batch(self.store.as_ref(), &mut batch, ImportStatus::Pending).await?;

        let mut report = SyncReport { batch_id: batch.id(), ..SyncReport::default() };
        match self.paginate(remote, shop, &mut batch, &mut report).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::info!(batch_id = %batch.id(), processed = report.processed, "sync stopped: batch was cancelled");
                return Ok(report);
            }
            Err(err) => {
                tracing::error!(batch_id = %batch.id(), error = %err, "sync aborted");
                let previous = batch.status();
                if !previous.is_terminal() && batch.fail(err.to_string()).is_ok() {
                    if let Err(save_err) = commit_batch(self.store.as_ref(), &mut batch, previous).await {
                        tracing::warn!(error = %save_err, "could not mark aborted sync as failed");
                    }
                }
                return Err(err);
            }
        }

        batch.set_total(report.processed as i32)?;
        batch.complete()?;
        commit_batch(self.store.as_ref(), &mut batch, ImportStatus::Processing).await?;
        self.store.update_shop_liveness(shop.id, ShopStatus::Online, Utc::now()).await?;
        tracing::info!(
            batch_id = %report.batch_id, processed = report.processed, created = report.created, updated = report.updated,
            has_more = report.has_more, "sync finished"
        );
        Ok(report)
    }

    /// Walks pages until the cap, an empty page or a fetch failure.
    /// Returns `false` if the batch was cancelled underneath the run.
    async fn paginate(&self, remote: &dyn RemoteCatalog, shop: &Shop, batch: &mut ImportBatch, report: &mut SyncReport) -> Result<bool> {
        let max = self.options.max_products;
        let mut page = 1u32;
        let mut total_pages = 0u32;
        let mut total_count = 0u64;
        let mut leftovers = false;

        while report.processed < max {
            if page > 1 && !self.options.page_delay.is_zero() {
                tokio::time::sleep(self.options.page_delay).await;
            }
            let listing = match remote.list_products(&ListQuery::published(page, self.options.batch_size)).await {
                Ok(listing) => listing,
                Err(err) => {
                    tracing::warn!(page, error = %err, "page fetch failed, keeping what was synced");
                    batch.note_error(BatchErrorEntry::general(format!("Failed to fetch page {page}: {err}")))?;
                    break;
                }
            };
            total_pages = listing.total_pages;
            total_count = listing.total_count;
            if listing.items.is_empty() { break; }
            if page == 1 {
                batch.set_total(total_count.min(u64::from(max)) as i32)?;
            }

            let remaining = (max - report.processed) as usize;
            leftovers = listing.items.len() > remaining;
            for item in listing.items.iter().take(remaining) {
                report.processed += 1;
                match self.sync_item(remote, shop, item, batch, report).await {
                    Ok(true) => { report.created += 1; batch.record_success()?; }
                    Ok(false) => { report.updated += 1; batch.record_success()?; }
                    Err(err) => self.record_item_failure(batch, report.processed as i32, item, err).await?,
                }
            }

            if !commit_batch(self.store.as_ref(), batch, ImportStatus::Processing).await? {
                return Ok(false);
            }
            tracing::debug!(page, processed = report.processed, "page synced");
            if report.processed >= max { break; }
            page += 1;
        }

        report.has_more = report.processed >= max && (leftovers || page < total_pages || u64::from(report.processed) < total_count);
        Ok(true)
    }

    /// Mirrors one remote product with its variations and master listing.
    /// Returns whether the mirror row was newly created.
    ///
    /// A variation that cannot be fetched or stored is noted on the batch and
    /// skipped; the product itself still counts as synced.
    async fn sync_item(
        &self,
        remote: &dyn RemoteCatalog,
        shop: &Shop,
        item: &RemoteProduct,
        batch: &mut ImportBatch,
        report: &mut SyncReport,
    ) -> Result<bool> {
        let (product, created) = self.store.upsert_product(item.to_upsert(shop.id)).await?;

        if product.is_variable() {
            for &variation_id in &item.variations {
                let stored = match remote.get_variation(item.id, variation_id).await {
                    Ok(variation) => self.store.upsert_variation(variation.to_upsert(&product)).await,
                    Err(err) => Err(err.into()),
                };
                match stored {
                    Ok((_, true)) => report.variations_created += 1,
                    Ok((_, false)) => report.variations_updated += 1,
                    Err(err) => {
                        tracing::warn!(product_id = item.id, variation_id, error = %err, "skipping variation");
                        batch.note_error(BatchErrorEntry {
                            row_number: None,
                            sku: (!item.sku.is_empty()).then(|| item.sku.clone()),
                            message: format!("Variation {variation_id} of product {} skipped: {err}", item.id),
                        })?;
                    }
                }
            }
        }

        self.upsert_listing(shop, &product).await?;
        Ok(created)
    }

    async fn upsert_listing(&self, shop: &Shop, product: &Product) -> Result<()> {
        let f = &product.fields;
        let sku = f.sku.as_deref().and_then(|s| Sku::new(s).ok()).unwrap_or_else(|| Sku::for_remote_id(product.remote_id));
        let master = self.store.upsert_master(MasterUpsert { sku, name: f.name.clone(), description: f.description.clone() }).await?;
        self.store
            .upsert_listing(ListingUpsert {
                master_product_id: master.id,
                shop_id: shop.id,
                fields: ListingFields {
                    price: f.price.or(f.regular_price),
                    category: f.categories.first().and_then(|c| c.name.clone()),
                    stock_quantity: f.stock_quantity,
                    stock_status: f.stock_status,
                    is_active: f.status == ProductStatus::Publish,
                },
            })
            .await?;
        Ok(())
    }

    async fn record_item_failure(&self, batch: &mut ImportBatch, row_number: i32, item: &RemoteProduct, err: CatalogError) -> Result<()> {
        let sku = (!item.sku.is_empty()).then(|| item.sku.clone());
        tracing::warn!(remote_id = item.id, category = %err.category(), error = %err, "sync item failed");
        self.store
            .insert_import_error(NewImportError {
                batch_id: batch.id(),
                row_number,
                sku: sku.clone(),
                category: err.category(),
                message: err.to_string(),
                row_data: serde_json::to_value(item).unwrap_or_default(),
            })
            .await?;
        batch.record_failure(BatchErrorEntry { row_number: Some(row_number), sku, message: err.to_string() })?;
        Ok(())
    }
}
