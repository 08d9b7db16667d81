//! Shared fixtures for the engine integration tests.
//!
//! `MemoryStore` is an in-memory `CatalogStore` that enforces the same unique
//! keys as the migration and records every committed batch snapshot.
//! `FakeRemote` is a scripted WooCommerce catalog with failure injection.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use woo_catalog_sync::domain::aggregates::{
    BatchCounters, BatchRecord, ImportBatch, ListingUpsert, MasterProduct, MasterUpsert, Product, ProductUpsert, Shop, ShopListing,
    SyncSchedule, Variation, VariationUpsert,
};
use woo_catalog_sync::domain::value_objects::{ImportKind, ImportStatus, ProductStatus, ProductType, ShopStatus};
use woo_catalog_sync::import::ImportOptions;
use woo_catalog_sync::remote::{
    ListQuery, ProductPage, ProductPayload, RemoteCatalog, RemoteCatalogFactory, RemoteError, RemoteProduct, RemoteVariation,
    VariationPayload,
};
use woo_catalog_sync::store::{CatalogStore, ImportErrorRecord, NewImportError};
use woo_catalog_sync::sync::SyncOptions;
use woo_catalog_sync::{CatalogError, CatalogService, Result};

// =============================================================================
// In-memory store
// =============================================================================

#[derive(Default)]
struct Tables {
    shops: HashMap<Uuid, Shop>,
    products: Vec<Product>,
    variations: Vec<Variation>,
    masters: Vec<MasterProduct>,
    listings: Vec<ShopListing>,
    batches: HashMap<Uuid, BatchRecord>,
    errors: Vec<ImportErrorRecord>,
    selections: HashMap<Uuid, Vec<Uuid>>,
    snapshots: Vec<(ImportStatus, BatchCounters)>,
    failing_remote_ids: HashSet<i64>,
    failing_variation_ids: HashSet<i64>,
    touched: Vec<Uuid>,
    schedules: HashMap<Uuid, SyncSchedule>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn with<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> T {
        let mut tables = self.tables.lock().expect("store lock");
        f(&mut tables)
    }

    pub fn add_shop(&self, shop: Shop) { self.with(|t| t.shops.insert(shop.id, shop)); }
    pub fn shop(&self, id: Uuid) -> Shop { self.with(|t| t.shops[&id].clone()) }
    pub fn products(&self, shop_id: Uuid) -> Vec<Product> { self.with(|t| t.products.iter().filter(|p| p.shop_id == shop_id).cloned().collect()) }
    pub fn variations(&self, shop_id: Uuid) -> Vec<Variation> { self.with(|t| t.variations.iter().filter(|v| v.shop_id == shop_id).cloned().collect()) }
    pub fn masters(&self) -> Vec<MasterProduct> { self.with(|t| t.masters.clone()) }
    pub fn listings(&self) -> Vec<ShopListing> { self.with(|t| t.listings.clone()) }
    pub fn import_errors(&self, batch_id: Uuid) -> Vec<ImportErrorRecord> { self.with(|t| t.errors.iter().filter(|e| e.batch_id == batch_id).cloned().collect()) }
    pub fn batches(&self) -> Vec<BatchRecord> { self.with(|t| t.batches.values().cloned().collect()) }
    pub fn batch(&self, id: Uuid) -> BatchRecord { self.with(|t| t.batches[&id].clone()) }
    /// Every `(status, counters)` pair a successful `save_batch` wrote, in order.
    pub fn snapshots(&self) -> Vec<(ImportStatus, BatchCounters)> { self.with(|t| t.snapshots.clone()) }
    pub fn touched(&self) -> Vec<Uuid> { self.with(|t| t.touched.clone()) }
    pub fn schedule(&self, shop_id: Uuid) -> Option<SyncSchedule> { self.with(|t| t.schedules.get(&shop_id).cloned()) }

    /// Rewrites a schedule's last run, e.g. to make it due.
    pub fn set_last_run(&self, shop_id: Uuid, at: Option<DateTime<Utc>>) {
        self.with(|t| {
            if let Some(s) = t.schedules.get_mut(&shop_id) { s.last_run_at = at; }
        });
    }

    pub fn set_shop_active(&self, shop_id: Uuid, active: bool) {
        self.with(|t| {
            if let Some(shop) = t.shops.get_mut(&shop_id) { shop.is_active = active; }
        });
    }

    /// Makes `upsert_product` fail for this remote id.
    pub fn fail_upserts_for(&self, remote_id: i64) { self.with(|t| t.failing_remote_ids.insert(remote_id)); }

    /// Makes `upsert_variation` fail for this remote variation id.
    pub fn fail_variation_upserts_for(&self, remote_id: i64) { self.with(|t| t.failing_variation_ids.insert(remote_id)); }

    pub fn seed_product(&self, upsert: ProductUpsert) -> Product {
        let product = Product::insert(upsert);
        self.with(|t| t.products.push(product.clone()));
        product
    }

    pub fn seed_variation(&self, upsert: VariationUpsert) -> Variation {
        let variation = Variation::insert(upsert);
        self.with(|t| t.variations.push(variation.clone()));
        variation
    }

    /// Cancels a batch synchronously, as a concurrent request would.
    pub fn cancel_now(&self, batch_id: Uuid) {
        self.with(|t| {
            let mut batch = ImportBatch::restore(t.batches[&batch_id].clone());
            batch.cancel().expect("cancellable");
            t.batches.insert(batch_id, batch.record().clone());
        });
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn get_shop(&self, id: Uuid) -> Result<Option<Shop>> { Ok(self.with(|t| t.shops.get(&id).cloned())) }

    async fn update_shop_liveness(&self, id: Uuid, status: ShopStatus, at: DateTime<Utc>) -> Result<()> {
        self.with(|t| {
            if let Some(shop) = t.shops.get_mut(&id) {
                shop.status = status;
                shop.last_ping = Some(at);
            }
        });
        Ok(())
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>> { Ok(self.with(|t| t.products.iter().find(|p| p.id == id).cloned())) }

    async fn find_product(&self, shop_id: Uuid, remote_id: i64) -> Result<Option<Product>> {
        Ok(self.with(|t| t.products.iter().find(|p| p.shop_id == shop_id && p.remote_id == remote_id).cloned()))
    }

    async fn find_product_by_sku(&self, shop_id: Uuid, sku: &str) -> Result<Option<Product>> {
        Ok(self.with(|t| t.products.iter().filter(|p| p.shop_id == shop_id && p.sku() == Some(sku)).max_by_key(|p| p.updated_at).cloned()))
    }

    async fn upsert_product(&self, upsert: ProductUpsert) -> Result<(Product, bool)> {
        self.with(|t| {
            if t.failing_remote_ids.contains(&upsert.remote_id) {
                return Err(CatalogError::Storage(format!("insert into products failed for remote id {}", upsert.remote_id)));
            }
            match t.products.iter_mut().find(|p| p.shop_id == upsert.shop_id && p.remote_id == upsert.remote_id) {
                Some(existing) => {
                    existing.fields = upsert.fields;
                    existing.updated_at = Utc::now();
                    Ok((existing.clone(), false))
                }
                None => {
                    let product = Product::insert(upsert);
                    t.products.push(product.clone());
                    Ok((product, true))
                }
            }
        })
    }

    async fn touch_product(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        self.with(|t| {
            if let Some(p) = t.products.iter_mut().find(|p| p.id == id) {
                p.fields.date_modified = Some(at);
                p.updated_at = at;
                t.touched.push(id);
            }
        });
        Ok(())
    }

    async fn find_variation(&self, shop_id: Uuid, remote_id: i64) -> Result<Option<Variation>> {
        Ok(self.with(|t| t.variations.iter().find(|v| v.shop_id == shop_id && v.remote_id == remote_id).cloned()))
    }

    async fn find_variation_by_sku(&self, shop_id: Uuid, sku: &str) -> Result<Option<Variation>> {
        Ok(self.with(|t| t.variations.iter().filter(|v| v.shop_id == shop_id && v.sku() == Some(sku)).max_by_key(|v| v.updated_at).cloned()))
    }

    async fn upsert_variation(&self, upsert: VariationUpsert) -> Result<(Variation, bool)> {
        self.with(|t| {
            if t.failing_variation_ids.contains(&upsert.remote_id) {
                return Err(CatalogError::Storage(format!("insert into product_variations failed for remote id {}", upsert.remote_id)));
            }
            match t.variations.iter_mut().find(|v| v.shop_id == upsert.shop_id && v.remote_id == upsert.remote_id) {
                Some(existing) => {
                    existing.product_id = upsert.product_id;
                    existing.remote_parent_id = upsert.remote_parent_id;
                    existing.fields = upsert.fields;
                    existing.updated_at = Utc::now();
                    Ok((existing.clone(), false))
                }
                None => {
                    let variation = Variation::insert(upsert);
                    t.variations.push(variation.clone());
                    Ok((variation, true))
                }
            }
        })
    }

    async fn variations_for_product(&self, product_id: Uuid) -> Result<Vec<Variation>> {
        Ok(self.with(|t| t.variations.iter().filter(|v| v.product_id == product_id).cloned().collect()))
    }

    async fn get_master(&self, id: Uuid) -> Result<Option<MasterProduct>> { Ok(self.with(|t| t.masters.iter().find(|m| m.id == id).cloned())) }

    async fn upsert_master(&self, upsert: MasterUpsert) -> Result<MasterProduct> {
        Ok(self.with(|t| match t.masters.iter_mut().find(|m| m.sku == upsert.sku.as_str()) {
            Some(existing) => {
                existing.name = upsert.name;
                existing.description = upsert.description;
                existing.updated_at = Utc::now();
                existing.clone()
            }
            None => {
                let master = MasterProduct::insert(upsert);
                t.masters.push(master.clone());
                master
            }
        }))
    }

    async fn upsert_listing(&self, upsert: ListingUpsert) -> Result<ShopListing> {
        Ok(self.with(|t| match t.listings.iter_mut().find(|l| l.master_product_id == upsert.master_product_id && l.shop_id == upsert.shop_id) {
            Some(existing) => {
                existing.fields = upsert.fields;
                existing.updated_at = Utc::now();
                existing.clone()
            }
            None => {
                let listing = ShopListing::insert(upsert);
                t.listings.push(listing.clone());
                listing
            }
        }))
    }

    async fn find_listing(&self, master_product_id: Uuid, shop_id: Uuid) -> Result<Option<ShopListing>> {
        Ok(self.with(|t| t.listings.iter().find(|l| l.master_product_id == master_product_id && l.shop_id == shop_id).cloned()))
    }

    async fn create_batch(&self, batch: &ImportBatch) -> Result<()> {
        self.with(|t| t.batches.insert(batch.id(), batch.record().clone()));
        Ok(())
    }

    async fn get_batch(&self, id: Uuid) -> Result<Option<ImportBatch>> {
        Ok(self.with(|t| t.batches.get(&id).cloned().map(ImportBatch::restore)))
    }

    async fn save_batch(&self, batch: &ImportBatch, expected: ImportStatus) -> Result<bool> {
        Ok(self.with(|t| match t.batches.get(&batch.id()) {
            Some(stored) if stored.status == expected => {
                t.snapshots.push((batch.status(), *batch.counters()));
                t.batches.insert(batch.id(), batch.record().clone());
                true
            }
            _ => false,
        }))
    }

    async fn insert_import_error(&self, error: NewImportError) -> Result<()> {
        self.with(|t| t.errors.push(ImportErrorRecord::from_new(error)));
        Ok(())
    }

    async fn list_import_errors(&self, batch_id: Uuid, limit: i64) -> Result<Vec<ImportErrorRecord>> {
        Ok(self.with(|t| t.errors.iter().filter(|e| e.batch_id == batch_id).take(limit as usize).cloned().collect()))
    }

    async fn list_batches(&self, shop_id: Uuid, kind: Option<ImportKind>, limit: i64) -> Result<Vec<ImportBatch>> {
        Ok(self.with(|t| {
            let mut batches: Vec<&BatchRecord> =
                t.batches.values().filter(|b| b.shop_id == shop_id && kind.map_or(true, |k| b.kind == k)).collect();
            batches.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
            batches.into_iter().take(limit as usize).cloned().map(ImportBatch::restore).collect()
        }))
    }

    async fn replace_selected_variations(&self, product_id: Uuid, variation_ids: &[Uuid]) -> Result<()> {
        self.with(|t| t.selections.insert(product_id, variation_ids.to_vec()));
        Ok(())
    }

    async fn selected_variations(&self, product_id: Uuid) -> Result<Vec<Uuid>> {
        Ok(self.with(|t| t.selections.get(&product_id).cloned().unwrap_or_default()))
    }

    async fn upsert_schedule(&self, schedule: &SyncSchedule) -> Result<SyncSchedule> {
        Ok(self.with(|t| {
            let stored = t.schedules.entry(schedule.shop_id).or_insert_with(|| schedule.clone());
            stored.interval_secs = schedule.interval_secs;
            stored.enabled = schedule.enabled;
            stored.updated_at = Utc::now();
            stored.clone()
        }))
    }

    async fn get_schedule(&self, shop_id: Uuid) -> Result<Option<SyncSchedule>> { Ok(self.schedule(shop_id)) }

    async fn delete_schedule(&self, shop_id: Uuid) -> Result<bool> { Ok(self.with(|t| t.schedules.remove(&shop_id).is_some())) }

    async fn list_enabled_schedules(&self) -> Result<Vec<SyncSchedule>> {
        Ok(self.with(|t| t.schedules.values().filter(|s| s.enabled).cloned().collect()))
    }

    async fn mark_schedule_run(&self, shop_id: Uuid, at: DateTime<Utc>) -> Result<()> {
        self.set_last_run(shop_id, Some(at));
        Ok(())
    }
}

// =============================================================================
// Scripted remote catalog
// =============================================================================

type WriteHook = Arc<dyn Fn(&str) + Send + Sync>;

pub struct RemoteState {
    pub online: bool,
    pub products: BTreeMap<i64, RemoteProduct>,
    pub variations: BTreeMap<i64, RemoteVariation>,
    pub next_id: i64,
    pub reject_skus: HashSet<String>,
    pub failing_pages: HashSet<u32>,
    pub missing_variations: HashSet<i64>,
    pub calls: Vec<String>,
    /// Called with the SKU of every product or variation write, before it is applied.
    pub on_write: Option<WriteHook>,
}

impl Default for RemoteState {
    fn default() -> Self {
        Self {
            online: true, products: BTreeMap::new(), variations: BTreeMap::new(), next_id: 1000,
            reject_skus: HashSet::new(), failing_pages: HashSet::new(), missing_variations: HashSet::new(),
            calls: vec![], on_write: None,
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeRemote {
    state: Arc<Mutex<RemoteState>>,
}

fn rejected(sku: &str) -> RemoteError {
    RemoteError::Status { status: 400, code: Some("product_invalid_sku".into()), message: format!("Invalid or duplicated SKU: {sku}") }
}

fn not_found(what: &str, id: i64) -> RemoteError {
    RemoteError::Status { status: 404, code: Some("woocommerce_rest_invalid_id".into()), message: format!("Invalid {what} ID {id}") }
}

fn apply_product(target: &mut RemoteProduct, payload: &ProductPayload) {
    if let Some(v) = &payload.name { target.name = v.clone(); }
    if let Some(v) = &payload.slug { target.slug = v.clone(); }
    if let Some(v) = payload.product_type { target.product_type = v; }
    if let Some(v) = payload.status { target.status = v; }
    if let Some(v) = &payload.sku { target.sku = v.clone(); }
    if let Some(v) = &payload.regular_price { target.regular_price = v.clone(); target.price = v.clone(); }
    if let Some(v) = &payload.sale_price { target.sale_price = v.clone(); }
    if let Some(v) = &payload.description { target.description = v.clone(); }
    if let Some(v) = payload.stock_status { target.stock_status = v; }
    if let Some(v) = payload.stock_quantity { target.stock_quantity = Some(v); }
    if let Some(v) = &payload.categories { target.categories = v.clone(); }
    if let Some(v) = &payload.images { target.images = v.clone(); }
    if let Some(v) = &payload.attributes { target.attributes = v.clone(); }
}

fn apply_variation(target: &mut RemoteVariation, payload: &VariationPayload) {
    if let Some(v) = &payload.sku { target.sku = v.clone(); }
    if let Some(v) = &payload.regular_price { target.regular_price = v.clone(); target.price = v.clone(); }
    if let Some(v) = payload.stock_status { target.stock_status = v; }
    if let Some(v) = &payload.attributes { target.attributes = v.clone(); }
    if payload.image.is_some() { target.image = payload.image.clone(); }
}

impl FakeRemote {
    pub fn state(&self) -> std::sync::MutexGuard<'_, RemoteState> { self.state.lock().expect("remote lock") }

    /// Seeds a published product and returns its id.
    pub fn add_product(&self, sku: &str, name: &str, price: &str) -> i64 {
        let mut s = self.state();
        s.next_id += 1;
        let id = s.next_id;
        s.products.insert(id, RemoteProduct {
            id, name: name.into(), slug: name.to_lowercase(), sku: sku.into(), price: price.into(), regular_price: price.into(),
            status: ProductStatus::Publish, ..RemoteProduct::default()
        });
        id
    }

    /// Seeds a variable product with one variation per SKU; returns the parent id.
    pub fn add_variable_product(&self, sku: &str, name: &str, variation_skus: &[&str]) -> i64 {
        let parent = self.add_product(sku, name, "");
        let mut s = self.state();
        let mut ids = vec![];
        for v in variation_skus {
            s.next_id += 1;
            let id = s.next_id;
            s.variations.insert(id, RemoteVariation { id, sku: (*v).into(), regular_price: "5".into(), price: "5".into(), ..RemoteVariation::default() });
            ids.push(id);
        }
        let product = s.products.get_mut(&parent).expect("parent");
        product.product_type = ProductType::Variable;
        product.variations = ids;
        parent
    }

    pub fn calls(&self) -> Vec<String> { self.state().calls.clone() }
    pub fn product_by_sku(&self, sku: &str) -> Option<RemoteProduct> { self.state().products.values().find(|p| p.sku == sku).cloned() }

    fn hook(&self, sku: &str) {
        let hook = self.state().on_write.clone();
        if let Some(hook) = hook { hook(sku); }
    }

    fn log(&self, call: String) { self.state().calls.push(call); }
}

#[async_trait]
impl RemoteCatalog for FakeRemote {
    async fn test_connection(&self) -> bool {
        self.log("GET /system_status".into());
        self.state().online
    }

    async fn list_products(&self, query: &ListQuery) -> std::result::Result<ProductPage, RemoteError> {
        self.log(format!("GET /products page={} per_page={}", query.page, query.per_page));
        let s = self.state();
        if s.failing_pages.contains(&query.page) {
            return Err(RemoteError::Timeout);
        }
        let matching: Vec<&RemoteProduct> = s
            .products
            .values()
            .filter(|p| query.status.map_or(true, |st| p.status == st))
            .filter(|p| query.sku.as_deref().map_or(true, |sku| p.sku == sku))
            .collect();
        let per_page = query.per_page.max(1) as usize;
        let items = matching.iter().skip((query.page.max(1) as usize - 1) * per_page).take(per_page).map(|p| (*p).clone()).collect();
        Ok(ProductPage { items, total_pages: matching.len().div_ceil(per_page) as u32, total_count: matching.len() as u64 })
    }

    async fn get_product(&self, id: i64) -> std::result::Result<RemoteProduct, RemoteError> {
        self.state().products.get(&id).cloned().ok_or_else(|| not_found("product", id))
    }

    async fn get_variation(&self, product_id: i64, variation_id: i64) -> std::result::Result<RemoteVariation, RemoteError> {
        self.log(format!("GET /products/{product_id}/variations/{variation_id}"));
        let s = self.state();
        if s.missing_variations.contains(&variation_id) {
            return Err(not_found("variation", variation_id));
        }
        s.variations.get(&variation_id).cloned().ok_or_else(|| not_found("variation", variation_id))
    }

    async fn create_product(&self, payload: &ProductPayload) -> std::result::Result<RemoteProduct, RemoteError> {
        let sku = payload.sku.clone().unwrap_or_default();
        self.log(format!("POST /products sku={sku}"));
        self.hook(&sku);
        let mut s = self.state();
        if s.reject_skus.contains(&sku) {
            return Err(rejected(&sku));
        }
        s.next_id += 1;
        let mut product = RemoteProduct { id: s.next_id, ..RemoteProduct::default() };
        apply_product(&mut product, payload);
        for variation in payload.variations.iter().flatten() {
            s.next_id += 1;
            let mut created = RemoteVariation { id: s.next_id, ..RemoteVariation::default() };
            apply_variation(&mut created, variation);
            product.variations.push(created.id);
            s.variations.insert(created.id, created);
        }
        s.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: i64, payload: &ProductPayload) -> std::result::Result<RemoteProduct, RemoteError> {
        let sku = payload.sku.clone().unwrap_or_default();
        self.log(format!("PUT /products/{id} sku={sku}"));
        self.hook(&sku);
        let mut s = self.state();
        if s.reject_skus.contains(&sku) {
            return Err(rejected(&sku));
        }
        let product = s.products.get_mut(&id).ok_or_else(|| not_found("product", id))?;
        apply_product(product, payload);
        Ok(product.clone())
    }

    async fn delete_product(&self, id: i64, _force: bool) -> std::result::Result<RemoteProduct, RemoteError> {
        self.log(format!("DELETE /products/{id}"));
        self.state().products.remove(&id).ok_or_else(|| not_found("product", id))
    }

    async fn create_variation(&self, product_id: i64, payload: &VariationPayload) -> std::result::Result<RemoteVariation, RemoteError> {
        let sku = payload.sku.clone().unwrap_or_default();
        self.log(format!("POST /products/{product_id}/variations sku={sku}"));
        self.hook(&sku);
        let mut s = self.state();
        if s.reject_skus.contains(&sku) {
            return Err(rejected(&sku));
        }
        if !s.products.contains_key(&product_id) {
            return Err(not_found("product", product_id));
        }
        s.next_id += 1;
        let mut variation = RemoteVariation { id: s.next_id, ..RemoteVariation::default() };
        apply_variation(&mut variation, payload);
        s.variations.insert(variation.id, variation.clone());
        if let Some(parent) = s.products.get_mut(&product_id) { parent.variations.push(variation.id); }
        Ok(variation)
    }

    async fn update_variation(&self, product_id: i64, variation_id: i64, payload: &VariationPayload) -> std::result::Result<RemoteVariation, RemoteError> {
        let sku = payload.sku.clone().unwrap_or_default();
        self.log(format!("PUT /products/{product_id}/variations/{variation_id} sku={sku}"));
        self.hook(&sku);
        let mut s = self.state();
        let variation = s.variations.get_mut(&variation_id).ok_or_else(|| not_found("variation", variation_id))?;
        apply_variation(variation, payload);
        Ok(variation.clone())
    }
}

pub struct FakeFactory {
    pub remote: FakeRemote,
}

impl RemoteCatalogFactory for FakeFactory {
    fn connect(&self, _shop: &Shop) -> std::result::Result<Box<dyn RemoteCatalog>, RemoteError> { Ok(Box::new(self.remote.clone())) }
}

/// Refuses to build a client, as a shop with unusable credentials would.
pub struct BrokenFactory;

impl RemoteCatalogFactory for BrokenFactory {
    fn connect(&self, shop: &Shop) -> std::result::Result<Box<dyn RemoteCatalog>, RemoteError> {
        Err(RemoteError::Config(format!("bad consumer key for {}", shop.name)))
    }
}

// =============================================================================
// Harness
// =============================================================================

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub remote: FakeRemote,
    pub service: CatalogService,
    pub shop: Shop,
}

pub fn fast_import() -> ImportOptions { ImportOptions { chunk_size: 2, chunk_pause: Duration::ZERO } }
pub fn fast_sync() -> SyncOptions { SyncOptions { batch_size: 50, max_products: 500, page_delay: Duration::ZERO } }

pub fn harness() -> Harness {
    let remote = FakeRemote::default();
    harness_with(remote.clone(), Arc::new(FakeFactory { remote }))
}

/// Harness whose service obtains remote handles from `factory`.
pub fn harness_with(remote: FakeRemote, factory: Arc<dyn RemoteCatalogFactory>) -> Harness {
    let store = Arc::new(MemoryStore::default());
    let shop = Shop::new("Main", "https://main.example.com", "ck_main", "cs_main");
    store.add_shop(shop.clone());
    let service = CatalogService::new(store.clone(), factory, fast_import(), fast_sync());
    Harness { store, remote, service, shop }
}

impl Harness {
    pub fn add_shop(&self, name: &str) -> Shop {
        let shop = Shop::new(name, format!("https://{}.example.com", name.to_lowercase()), "ck", "cs");
        self.store.add_shop(shop.clone());
        shop
    }
}
