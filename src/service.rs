//! Engine entry points.
//!
//! `CatalogService` resolves shops, obtains a remote handle per shop and
//! hands both to the engines. Hosts (the HTTP layer, tests) only talk to this.

use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use crate::domain::aggregates::{ImportBatch, Shop, SyncSchedule};
use crate::domain::value_objects::{ImportKind, ShopStatus};
use crate::import::{ImportEngine, ImportOptions, ImportSource};
use crate::remote::{RemoteCatalog, RemoteCatalogFactory};
use crate::store::{CatalogStore, ImportErrorRecord};
use crate::sync::{SyncEngine, SyncOptions, SyncReport};
use crate::transfer::{TransferEngine, TransferProduct, TransferReport};
use crate::{CatalogError, Result};

/// Outcome of one scheduled sync.
#[derive(Debug)]
pub struct ScheduledRun {
    pub shop_id: Uuid,
    pub outcome: Result<SyncReport>,
}

/// A batch together with the first of its row errors.
#[derive(Clone, Debug, Serialize)]
pub struct BatchDetails {
    pub batch: ImportBatch,
    pub errors: Vec<ImportErrorRecord>,
}

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    remotes: Arc<dyn RemoteCatalogFactory>,
    import: ImportOptions,
    sync: SyncOptions,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>, remotes: Arc<dyn RemoteCatalogFactory>, import: ImportOptions, sync: SyncOptions) -> Self {
        Self { store, remotes, import, sync }
    }

    pub fn store(&self) -> &Arc<dyn CatalogStore> { &self.store }

    async fn shop(&self, id: Uuid) -> Result<Shop> {
        self.store.get_shop(id).await?.ok_or(CatalogError::ShopNotFound(id))
    }

    fn connect(&self, shop: &Shop) -> Result<Box<dyn RemoteCatalog>> { Ok(self.remotes.connect(shop)?) }

    fn importer(&self) -> ImportEngine { ImportEngine::new(self.store.clone(), self.import) }

    /// Creates and fully processes an import, returning the batch id.
    pub async fn run_import(&self, shop_id: Uuid, kind: ImportKind, filename: &str, source: ImportSource) -> Result<Uuid> {
        let batch = self.start_import(shop_id, kind, filename, source.size()).await?;
        let id = batch.id();
        self.process_import(id, source).await?;
        Ok(id)
    }

    pub async fn start_import(&self, shop_id: Uuid, kind: ImportKind, filename: &str, file_size: Option<i64>) -> Result<ImportBatch> {
        let shop = self.shop(shop_id).await?;
        self.importer().start(&shop, kind, filename, file_size).await
    }

    /// Processes a pending batch. If its shop cannot be resolved or
    /// connected to, the batch is failed rather than left pending.
    pub async fn process_import(&self, batch_id: Uuid, source: ImportSource) -> Result<ImportBatch> {
        let mut batch = self.store.get_batch(batch_id).await?.ok_or(CatalogError::BatchNotFound(batch_id))?;
        let importer = self.importer();
        let resolved = match self.shop(batch.shop_id()).await {
            Ok(shop) => self.connect(&shop).map(|remote| (shop, remote)),
            Err(err) => Err(err),
        };
        let (shop, remote) = match resolved {
            Ok(pair) => pair,
            Err(err) => {
                importer.abort(&mut batch, &err).await;
                return Err(err);
            }
        };
        importer.process(remote.as_ref(), &shop, batch, source).await
    }

    /// Fails a pending or processing batch with the cancellation message.
    /// A running engine notices at its next chunk boundary.
    pub async fn cancel_import(&self, batch_id: Uuid) -> Result<ImportBatch> {
        loop {
            let mut batch = self.store.get_batch(batch_id).await?.ok_or(CatalogError::BatchNotFound(batch_id))?;
            let previous = batch.status();
            batch.cancel()?;
            if self.store.save_batch(&batch, previous).await? {
                for event in batch.take_events() { event.log(); }
                return Ok(batch);
            }
            tracing::debug!(%batch_id, "batch moved while cancelling, retrying");
        }
    }

    pub async fn run_sync(&self, shop_id: Uuid, batch_size: Option<u32>, max_products: Option<u32>) -> Result<SyncReport> {
        let shop = self.shop(shop_id).await?;
        let remote = self.connect(&shop)?;
        let options = SyncOptions {
            batch_size: batch_size.unwrap_or(self.sync.batch_size),
            max_products: max_products.unwrap_or(self.sync.max_products),
            ..self.sync
        };
        SyncEngine::new(self.store.clone(), options).run(remote.as_ref(), &shop).await
    }

    pub async fn run_transfer(&self, target_shop_id: Uuid, source_shop_id: Option<Uuid>, products: Vec<TransferProduct>) -> Result<TransferReport> {
        let target = self.shop(target_shop_id).await?;
        let remote = self.connect(&target)?;
        Ok(TransferEngine::new(self.store.clone()).run(remote.as_ref(), &target, source_shop_id, products).await)
    }

    /// Loads a mirrored product (with its variations) or, failing that, a
    /// master product with its listing in `source_shop_id`.
    pub async fn load_transfer_product(&self, id: Uuid, source_shop_id: Option<Uuid>) -> Result<TransferProduct> {
        if let Some(product) = self.store.get_product(id).await? {
            let variations = self.store.variations_for_product(product.id).await?;
            return Ok(TransferProduct::from_mirror(&product, &variations));
        }
        let master = self.store.get_master(id).await?.ok_or(CatalogError::ProductNotFound(id))?;
        let listing = match source_shop_id {
            Some(shop_id) => self.store.find_listing(master.id, shop_id).await?,
            None => None,
        };
        Ok(TransferProduct::from_master(&master, listing.as_ref()))
    }

    /// Probes the shop and records the outcome as its liveness.
    pub async fn test_shop_connection(&self, shop_id: Uuid) -> Result<bool> {
        let shop = self.shop(shop_id).await?;
        let online = self.connect(&shop)?.test_connection().await;
        let status = if online { ShopStatus::Online } else { ShopStatus::Offline };
        self.store.update_shop_liveness(shop.id, status, Utc::now()).await?;
        tracing::info!(%shop_id, %status, "shop connection tested");
        Ok(online)
    }

    /// Replaces which of a product's variations are sent on transfer.
    pub async fn select_variations(&self, product_id: Uuid, variation_ids: Vec<Uuid>) -> Result<()> {
        self.store.get_product(product_id).await?.ok_or(CatalogError::ProductNotFound(product_id))?;
        let known = self.store.variations_for_product(product_id).await?;
        if let Some(stray) = variation_ids.iter().find(|id| !known.iter().any(|v| v.id == **id)) {
            return Err(CatalogError::Validation(format!("variation {stray} does not belong to product {product_id}")));
        }
        self.store.replace_selected_variations(product_id, &variation_ids).await
    }

    pub async fn batch_with_errors(&self, batch_id: Uuid, limit: i64) -> Result<BatchDetails> {
        let batch = self.store.get_batch(batch_id).await?.ok_or(CatalogError::BatchNotFound(batch_id))?;
        let errors = self.store.list_import_errors(batch_id, limit).await?;
        Ok(BatchDetails { batch, errors })
    }

    /// Creates or updates the shop's recurring sync. Updating keeps the
    /// time of the last run, so a shorter interval can make it due at once.
    pub async fn set_sync_schedule(&self, shop_id: Uuid, interval_secs: i64, enabled: bool) -> Result<SyncSchedule> {
        if interval_secs <= 0 {
            return Err(CatalogError::Validation("sync interval must be positive".into()));
        }
        let shop = self.shop(shop_id).await?;
        let schedule = self.store.upsert_schedule(&SyncSchedule::new(shop.id, interval_secs, enabled)).await?;
        tracing::info!(%shop_id, interval_secs, enabled, "sync schedule saved");
        Ok(schedule)
    }

    pub async fn sync_schedule(&self, shop_id: Uuid) -> Result<SyncSchedule> {
        self.store.get_schedule(shop_id).await?.ok_or(CatalogError::ScheduleNotFound(shop_id))
    }

    pub async fn remove_sync_schedule(&self, shop_id: Uuid) -> Result<()> {
        if !self.store.delete_schedule(shop_id).await? {
            return Err(CatalogError::ScheduleNotFound(shop_id));
        }
        tracing::info!(%shop_id, "sync schedule removed");
        Ok(())
    }

    /// Runs every enabled schedule that is due at `now`, one shop at a time.
    ///
    /// The run is recorded before the sync starts, so a shop that keeps
    /// failing is retried once per interval rather than on every tick.
    /// Inactive shops are skipped without touching their schedule.
    pub async fn run_due_syncs(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledRun>> {
        let mut runs = Vec::new();
        for schedule in self.store.list_enabled_schedules().await? {
            if !schedule.is_due(now) { continue; }
            let shop_id = schedule.shop_id;
            match self.store.get_shop(shop_id).await? {
                Some(shop) if shop.is_active => {}
                _ => {
                    tracing::debug!(%shop_id, "scheduled sync skipped: shop missing or inactive");
                    continue;
                }
            }
            self.store.mark_schedule_run(shop_id, now).await?;
            let outcome = self.run_sync(shop_id, None, None).await;
            match &outcome {
                Ok(report) => tracing::info!(%shop_id, batch_id = %report.batch_id, processed = report.processed, "scheduled sync finished"),
                Err(err) => tracing::warn!(%shop_id, error = %err, "scheduled sync failed"),
            }
            runs.push(ScheduledRun { shop_id, outcome });
        }
        Ok(runs)
    }

    /// The shop's sync runs, newest first.
    pub async fn sync_history(&self, shop_id: Uuid, limit: i64) -> Result<Vec<ImportBatch>> {
        let shop = self.shop(shop_id).await?;
        self.store.list_batches(shop.id, Some(ImportKind::Sync), limit).await
    }
}
