//! WooCommerce REST client built on reqwest.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use crate::domain::aggregates::Shop;
use super::retry::{with_backoff, RetryPolicy};
use super::types::{ListQuery, ProductPage, ProductPayload, RemoteProduct, RemoteVariation, VariationPayload};
use super::{RemoteCatalog, RemoteConfig, RemoteError};

const INVALID_PAGE: &str = "rest_post_invalid_page_number";

/// Immutable handle to one shop. Cloning shares the connection pool.
#[derive(Clone, Debug)]
pub struct WooClient {
    http: Client,
    api_root: String,
    retry: RetryPolicy,
}

#[derive(Deserialize)]
struct WooErrorBody {
    code: Option<String>,
    message: Option<String>,
}

impl WooClient {
    pub fn for_shop(shop: &Shop, config: &RemoteConfig) -> Result<Self, RemoteError> {
        Self::new(shop.api_root(), &shop.consumer_key, &shop.consumer_secret, config)
    }

    pub fn new(api_root: impl Into<String>, consumer_key: &str, consumer_secret: &str, config: &RemoteConfig) -> Result<Self, RemoteError> {
        let token = STANDARD.encode(format!("{consumer_key}:{consumer_secret}"));
        let mut auth = HeaderValue::from_str(&format!("Basic {token}")).map_err(|e| RemoteError::Config(e.to_string()))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder().timeout(config.timeout).default_headers(headers).build()?;
        Ok(Self { http, api_root: api_root.into().trim_end_matches('/').to_string(), retry: config.retry })
    }

    fn url(&self, path: &str) -> String { format!("{}{}", self.api_root, path) }

    async fn send_once(&self, method: Method, url: &str, query: &[(&'static str, String)], body: Option<&Value>) -> Result<Response, RemoteError> {
        let mut request = self.http.request(method, url).query(query);
        if let Some(body) = body { request = request.json(body); }
        let response = request.send().await?;
        ensure_success(response).await
    }

    async fn call<T: DeserializeOwned>(&self, method: Method, path: &str, query: &[(&'static str, String)], body: Option<&Value>) -> Result<T, RemoteError> {
        let url = self.url(path);
        let label = format!("{method} {path}");
        with_backoff(&self.retry, &label, RemoteError::is_retryable, |_| {
            let method = method.clone();
            let url = url.as_str();
            async move { decode(self.send_once(method, url, query, body).await?).await }
        })
        .await
    }

    async fn list_once(&self, url: &str, query: &ListQuery) -> Result<ProductPage, RemoteError> {
        let response = match self.send_once(Method::GET, url, &query.to_pairs(), None).await {
            Ok(response) => response,
            Err(err) if err.code() == Some(INVALID_PAGE) => return Ok(ProductPage::empty()),
            Err(err) => return Err(err),
        };
        let total_pages = header_number(&response, "x-wp-totalpages").unwrap_or(1) as u32;
        let total_count = header_number(&response, "x-wp-total").unwrap_or(0);
        let items: Vec<RemoteProduct> = decode(response).await?;
        Ok(ProductPage { items, total_pages, total_count })
    }
}

#[async_trait]
impl RemoteCatalog for WooClient {
    async fn test_connection(&self) -> bool {
        match self.call::<Value>(Method::GET, "/system_status", &[], None).await {
            Ok(_) => true,
            Err(err) => {
                tracing::info!(api_root = %self.api_root, error = %err, "shop connection test failed");
                false
            }
        }
    }

    async fn list_products(&self, query: &ListQuery) -> Result<ProductPage, RemoteError> {
        let url = self.url("/products");
        with_backoff(&self.retry, "GET /products", RemoteError::is_retryable, |_| self.list_once(&url, query)).await
    }

    async fn get_product(&self, id: i64) -> Result<RemoteProduct, RemoteError> {
        self.call(Method::GET, &format!("/products/{id}"), &[], None).await
    }

    async fn get_variation(&self, product_id: i64, variation_id: i64) -> Result<RemoteVariation, RemoteError> {
        self.call(Method::GET, &format!("/products/{product_id}/variations/{variation_id}"), &[], None).await
    }

    async fn create_product(&self, payload: &ProductPayload) -> Result<RemoteProduct, RemoteError> {
        let body = to_body(payload)?;
        self.call(Method::POST, "/products", &[], Some(&body)).await
    }

    async fn update_product(&self, id: i64, payload: &ProductPayload) -> Result<RemoteProduct, RemoteError> {
        let body = to_body(payload)?;
        self.call(Method::PUT, &format!("/products/{id}"), &[], Some(&body)).await
    }

    async fn delete_product(&self, id: i64, force: bool) -> Result<RemoteProduct, RemoteError> {
        self.call(Method::DELETE, &format!("/products/{id}"), &[("force", force.to_string())], None).await
    }

    async fn create_variation(&self, product_id: i64, payload: &VariationPayload) -> Result<RemoteVariation, RemoteError> {
        let body = to_body(payload)?;
        self.call(Method::POST, &format!("/products/{product_id}/variations"), &[], Some(&body)).await
    }

    async fn update_variation(&self, product_id: i64, variation_id: i64, payload: &VariationPayload) -> Result<RemoteVariation, RemoteError> {
        let body = to_body(payload)?;
        self.call(Method::PUT, &format!("/products/{product_id}/variations/{variation_id}"), &[], Some(&body)).await
    }
}

fn to_body<T: Serialize>(payload: &T) -> Result<Value, RemoteError> {
    serde_json::to_value(payload).map_err(|e| RemoteError::Config(e.to_string()))
}

async fn ensure_success(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() { return Ok(response); }
    let text = response.text().await.unwrap_or_default();
    Err(status_error(status, &text))
}

fn status_error(status: StatusCode, text: &str) -> RemoteError {
    let (code, message) = match serde_json::from_str::<WooErrorBody>(text) {
        Ok(body) => (body.code, body.message.unwrap_or_else(|| status.to_string())),
        Err(_) if text.trim().is_empty() => (None, status.to_string()),
        Err(_) => (None, text.chars().take(200).collect()),
    };
    RemoteError::Status { status: status.as_u16(), code, message }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| RemoteError::Decode(e.to_string()))
}

fn header_number(response: &Response, name: &str) -> Option<u64> {
    response.headers().get(name)?.to_str().ok()?.trim().parse().ok()
}
