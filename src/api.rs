//! HTTP surface over [`CatalogService`].

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;
use validator::Validate;
use crate::domain::aggregates::{ImportBatch, SyncSchedule};
use crate::domain::value_objects::ImportKind;
use crate::import::ImportSource;
use crate::service::{BatchDetails, CatalogService};
use crate::sync::SyncReport;
use crate::transfer::TransferReport;
use crate::CatalogError;

const ERRORS_PER_BATCH: i64 = 100;
const SYNC_HISTORY_LIMIT: i64 = 50;

#[derive(Clone)]
pub struct AppState {
    pub service: CatalogService,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "woo-catalog-sync"})) }))
        .route("/api/v1/shops/:id/test", post(test_shop))
        .route("/api/v1/shops/:id/sync-schedule", get(get_schedule).post(set_schedule).delete(delete_schedule))
        .route("/api/v1/shops/:id/syncs", get(sync_history))
        .route("/api/v1/imports", post(create_import))
        .route("/api/v1/imports/:id", get(get_import))
        .route("/api/v1/imports/:id/cancel", post(cancel_import))
        .route("/api/v1/products/sync", post(sync_products))
        .route("/api/v1/products/transfer", post(transfer_products))
        .route("/api/v1/product-shop-variants", post(select_variations))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug)]
pub enum ApiError {
    Catalog(CatalogError),
    Invalid(String),
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self { Self::Catalog(err) }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self { Self::Invalid(err.to_string()) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Catalog(err) => match err {
                CatalogError::ShopNotFound(_)
                | CatalogError::BatchNotFound(_)
                | CatalogError::ProductNotFound(_)
                | CatalogError::ScheduleNotFound(_) => StatusCode::NOT_FOUND,
                CatalogError::Validation(_) | CatalogError::Parse(_) => StatusCode::BAD_REQUEST,
                CatalogError::BatchState(_) => StatusCode::CONFLICT,
                CatalogError::Connectivity(_) | CatalogError::Remote(_) => StatusCode::BAD_GATEWAY,
                CatalogError::Config(_) | CatalogError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        };
        let message = match self { Self::Invalid(m) => m, Self::Catalog(e) => e.to_string() };
        if status.is_server_error() { tracing::error!(%status, error = %message, "request failed"); }
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

async fn test_shop(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<serde_json::Value>> {
    let online = s.service.test_shop_connection(id).await?;
    Ok(Json(serde_json::json!({"shop_id": id, "online": online})))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ScheduleRequest {
    /// Seconds between runs; at least a minute, at most a week.
    #[validate(range(min = 60, max = 604800))]
    pub interval_secs: i64,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool { true }

async fn get_schedule(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<SyncSchedule>> {
    Ok(Json(s.service.sync_schedule(id).await?))
}

async fn set_schedule(State(s): State<AppState>, Path(id): Path<Uuid>, Json(r): Json<ScheduleRequest>) -> ApiResult<Json<SyncSchedule>> {
    r.validate()?;
    Ok(Json(s.service.set_sync_schedule(id, r.interval_secs, r.enabled).await?))
}

async fn delete_schedule(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    s.service.remove_sync_schedule(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams { pub limit: Option<i64> }

async fn sync_history(State(s): State<AppState>, Path(id): Path<Uuid>, Query(p): Query<HistoryParams>) -> ApiResult<Json<Vec<ImportBatch>>> {
    let limit = p.limit.unwrap_or(SYNC_HISTORY_LIMIT).clamp(1, 200);
    Ok(Json(s.service.sync_history(id, limit).await?))
}

#[derive(Debug, Deserialize)]
pub struct ImportParams { pub shop_id: Uuid, pub kind: ImportKind, pub filename: Option<String> }

/// Accepts a CSV body, answers with the pending batch and processes it in the background.
async fn create_import(State(s): State<AppState>, Query(p): Query<ImportParams>, body: Bytes) -> ApiResult<(StatusCode, Json<ImportBatch>)> {
    if body.is_empty() { return Err(ApiError::Invalid("import file is empty".into())); }
    let filename = p.filename.unwrap_or_else(|| format!("{}.csv", p.kind));
    let batch = s.service.start_import(p.shop_id, p.kind, &filename, Some(body.len() as i64)).await?;

    let service = s.service.clone();
    let batch_id = batch.id();
    tokio::spawn(async move {
        if let Err(err) = service.process_import(batch_id, ImportSource::Csv(body.to_vec())).await {
            tracing::error!(%batch_id, error = %err, "background import failed");
        }
    });
    Ok((StatusCode::ACCEPTED, Json(batch)))
}

async fn get_import(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<BatchDetails>> {
    Ok(Json(s.service.batch_with_errors(id, ERRORS_PER_BATCH).await?))
}

async fn cancel_import(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<ImportBatch>> {
    Ok(Json(s.service.cancel_import(id).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SyncRequest {
    pub shop_id: Uuid,
    #[validate(range(min = 1, max = 100))]
    pub batch_size: Option<u32>,
    #[validate(range(min = 1, max = 10000))]
    pub max_products: Option<u32>,
}

async fn sync_products(State(s): State<AppState>, Json(r): Json<SyncRequest>) -> ApiResult<Json<SyncReport>> {
    r.validate()?;
    Ok(Json(s.service.run_sync(r.shop_id, r.batch_size, r.max_products).await?))
}

#[derive(Debug, Deserialize, serde::Serialize)]
pub struct TransferItem { pub product_id: Uuid, pub selected_variation_ids: Option<Vec<Uuid>> }

#[derive(Debug, Deserialize, Validate)]
pub struct TransferRequest {
    pub target_shop_id: Uuid,
    pub source_shop_id: Option<Uuid>,
    #[validate(length(min = 1, message = "at least one product is required"))]
    pub products: Vec<TransferItem>,
}

async fn transfer_products(State(s): State<AppState>, Json(r): Json<TransferRequest>) -> ApiResult<Json<TransferReport>> {
    r.validate()?;
    let mut products = Vec::with_capacity(r.products.len());
    for item in r.products {
        let product = s.service.load_transfer_product(item.product_id, r.source_shop_id).await?;
        products.push(match item.selected_variation_ids {
            Some(ids) => product.with_selection(ids),
            None => product,
        });
    }
    Ok(Json(s.service.run_transfer(r.target_shop_id, r.source_shop_id, products).await?))
}

#[derive(Debug, Deserialize)]
pub struct SelectVariationsRequest { pub product_id: Uuid, pub variation_ids: Vec<Uuid> }

async fn select_variations(State(s): State<AppState>, Json(r): Json<SelectVariationsRequest>) -> ApiResult<StatusCode> {
    s.service.select_variations(r.product_id, r.variation_ids).await?;
    Ok(StatusCode::NO_CONTENT)
}
