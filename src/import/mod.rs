//! Batch Import Engine
//!
//! Turns an uploaded CSV (parent products or variations) into remote creates
//! and updates, mirroring each result locally. Rows are isolated from each
//! other: a failing row is recorded against the batch and the run moves on.
//! Work happens in chunks; between chunks the engine commits counters and
//! re-reads the batch so a cancel from another request stops it.

pub mod rows;

use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use crate::domain::aggregates::{BatchErrorEntry, ImportBatch, Shop};
use crate::domain::value_objects::{ImportKind, ImportStatus, ShopStatus};
use crate::remote::RemoteCatalog;
use crate::store::{commit_batch, CatalogStore, NewImportError};
use crate::{CatalogError, Result};

pub use rows::{parse_csv, ParentRow, RawRow, RowError, VariationRow};

impl From<RowError> for CatalogError {
    fn from(err: RowError) -> Self { CatalogError::Validation(err.to_string()) }
}

/// What to import: raw file bytes or rows parsed elsewhere.
#[derive(Clone, Debug)]
pub enum ImportSource {
    Csv(Vec<u8>),
    Rows(Vec<RawRow>),
}

impl ImportSource {
    pub fn size(&self) -> Option<i64> {
        match self { Self::Csv(bytes) => Some(bytes.len() as i64), Self::Rows(_) => None }
    }

    fn into_rows(self) -> Result<Vec<RawRow>> {
        match self {
            Self::Csv(bytes) => parse_csv(&bytes).map_err(|e| CatalogError::Parse(e.to_string())),
            Self::Rows(rows) => Ok(rows),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImportOptions {
    pub chunk_size: usize,
    pub chunk_pause: Duration,
}

impl Default for ImportOptions {
    fn default() -> Self { Self { chunk_size: 100, chunk_pause: Duration::from_millis(500) } }
}

#[derive(Clone)]
pub struct ImportEngine {
    store: Arc<dyn CatalogStore>,
    options: ImportOptions,
}

impl ImportEngine {
    pub fn new(store: Arc<dyn CatalogStore>, options: ImportOptions) -> Self {
        Self { store, options: ImportOptions { chunk_size: options.chunk_size.max(1), ..options } }
    }

    /// Creates the batch in `pending`. Processing is a separate step.
    pub async fn start(&self, shop: &Shop, kind: ImportKind, filename: &str, file_size: Option<i64>) -> Result<ImportBatch> {
        if kind == ImportKind::Sync {
            return Err(CatalogError::Validation("sync runs are not file imports".into()));
        }
        let mut batch = ImportBatch::new(shop.id, filename, kind);
        if let Some(bytes) = file_size { batch = batch.with_file_size(bytes); }
        self.store.create_batch(&batch).await?;
        tracing::info!(batch_id = %batch.id(), shop_id = %shop.id, %kind, filename, "import batch created");
        Ok(batch)
    }

    /// Runs a pending batch to a terminal state and returns it as stored.
    ///
    /// Row failures never abort the run. An unreachable shop or a store
    /// failure on the batch itself does: the batch is then marked failed
    /// (best effort) and the error returned.
    #[tracing::instrument(skip_all, fields(batch_id = %batch.id(), shop_id = %shop.id, kind = %batch.kind()))]
    pub async fn process(&self, remote: &dyn RemoteCatalog, shop: &Shop, mut batch: ImportBatch, source: ImportSource) -> Result<ImportBatch> {
        if let Err(err) = self.drive(remote, shop, &mut batch, source).await {
            self.abort(&mut batch, &err).await;
            return Err(err);
        }
        self.reload(batch.id()).await
    }

    /// Marks a batch that cannot run any further as failed with `err`.
    /// Best effort: a batch already terminal, or moved by a cancel, is left alone.
    pub async fn abort(&self, batch: &mut ImportBatch, err: &CatalogError) {
        tracing::error!(batch_id = %batch.id(), error = %err, "import aborted");
        let previous = batch.status();
        if previous.is_terminal() || batch.fail(err.to_string()).is_err() {
            return;
        }
        if let Err(save_err) = self.commit(batch, previous).await {
            tracing::warn!(batch_id = %batch.id(), error = %save_err, "could not mark aborted batch as failed");
        }
    }

    async fn drive(&self, remote: &dyn RemoteCatalog, shop: &Shop, batch: &mut ImportBatch, source: ImportSource) -> Result<()> {
        batch.start()?;
        if !self.commit(batch, ImportStatus::Pending).await? {
            return Ok(());
        }

        if !remote.test_connection().await {
            tracing::warn!("shop unreachable, import not started");
            self.store.update_shop_liveness(shop.id, ShopStatus::Offline, Utc::now()).await?;
            return Err(CatalogError::Connectivity(shop.id));
        }

        let rows = match source.into_rows() {
            Ok(rows) => rows,
            Err(err) => {
                tracing::warn!(error = %err, "import file rejected");
                batch.fail(err.to_string())?;
                self.commit(batch, ImportStatus::Processing).await?;
                return Ok(());
            }
        };

        batch.set_total(rows.len() as i32)?;
        if !self.commit(batch, ImportStatus::Processing).await? {
            return Ok(());
        }

        let chunk_size = self.options.chunk_size;
        for (index, chunk) in rows.chunks(chunk_size).enumerate() {
            if index > 0 && !self.options.chunk_pause.is_zero() {
                tokio::time::sleep(self.options.chunk_pause).await;
            }
            if !self.still_processing(batch.id()).await? {
                tracing::info!(chunk = index, "import stopped: batch no longer processing");
                return Ok(());
            }

            for (offset, row) in chunk.iter().enumerate() {
                let row_number = (index * chunk_size + offset + 1) as i32;
                match self.process_row(remote, shop, batch.kind(), row).await {
                    Ok(()) => batch.record_success()?,
                    Err(err) => self.record_row_failure(batch, row_number, row, err).await?,
                }
            }

            if !self.commit(batch, ImportStatus::Processing).await? {
                tracing::info!(chunk = index, "import stopped: batch was cancelled");
                return Ok(());
            }
            tracing::debug!(chunk = index, processed = batch.counters().processed_rows, "chunk committed");
        }

        batch.complete()?;
        self.commit(batch, ImportStatus::Processing).await?;
        Ok(())
    }

    async fn process_row(&self, remote: &dyn RemoteCatalog, shop: &Shop, kind: ImportKind, row: &RawRow) -> Result<()> {
        match kind {
            ImportKind::Parent => self.import_parent(remote, shop, row).await,
            ImportKind::Variations => self.import_variation(remote, shop, row).await,
            ImportKind::Sync => Err(CatalogError::Validation("sync runs are not file imports".into())),
        }
    }

    async fn import_parent(&self, remote: &dyn RemoteCatalog, shop: &Shop, row: &RawRow) -> Result<()> {
        let parsed = ParentRow::parse(row)?;
        let existing = self.store.find_product_by_sku(shop.id, parsed.sku.as_str()).await?;
        let product = match existing {
            Some(local) => remote.update_product(local.remote_id, &parsed.payload).await?,
            None => remote.create_product(&parsed.payload).await?,
        };
        let (mirror, created) = self.store.upsert_product(product.to_upsert(shop.id)).await?;
        tracing::debug!(sku = %parsed.sku, remote_id = mirror.remote_id, created, "parent row imported");
        Ok(())
    }

    async fn import_variation(&self, remote: &dyn RemoteCatalog, shop: &Shop, row: &RawRow) -> Result<()> {
        let parsed = VariationRow::parse(row)?;
        let parent = self
            .store
            .find_product_by_sku(shop.id, parsed.parent_sku.as_str())
            .await?
            .ok_or_else(|| CatalogError::Validation(format!("Parent product not found: {}", parsed.parent_sku)))?;
        let existing = self.store.find_variation_by_sku(shop.id, parsed.sku.as_str()).await?;
        let variation = match existing {
            Some(local) => remote.update_variation(parent.remote_id, local.remote_id, &parsed.payload).await?,
            None => remote.create_variation(parent.remote_id, &parsed.payload).await?,
        };
        let (mirror, created) = self.store.upsert_variation(variation.to_upsert(&parent)).await?;
        tracing::debug!(sku = %parsed.sku, remote_id = mirror.remote_id, created, "variation row imported");
        Ok(())
    }

    async fn record_row_failure(&self, batch: &mut ImportBatch, row_number: i32, row: &RawRow, err: CatalogError) -> Result<()> {
        let sku = row.sku();
        let message = err.to_string();
        tracing::warn!(row = row_number, sku = sku.as_deref().unwrap_or(""), category = %err.category(), error = %message, "import row failed");
        self.store
            .insert_import_error(NewImportError {
                batch_id: batch.id(),
                row_number,
                sku: sku.clone(),
                category: err.category(),
                message: message.clone(),
                row_data: row.to_json(),
            })
            .await?;
        batch.record_failure(BatchErrorEntry { row_number: Some(row_number), sku, message })?;
        Ok(())
    }

    async fn still_processing(&self, batch_id: uuid::Uuid) -> Result<bool> {
        Ok(matches!(self.store.get_batch(batch_id).await?, Some(b) if b.status() == ImportStatus::Processing))
    }

    async fn commit(&self, batch: &mut ImportBatch, expected: ImportStatus) -> Result<bool> {
        commit_batch(self.store.as_ref(), batch, expected).await
    }

    async fn reload(&self, batch_id: uuid::Uuid) -> Result<ImportBatch> {
        self.store.get_batch(batch_id).await?.ok_or(CatalogError::BatchNotFound(batch_id))
    }
}
