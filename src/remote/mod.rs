//! Remote Catalog Client
//!
//! Authenticated, retrying access to one shop's WooCommerce REST API. Engines
//! never build clients themselves: they ask a [`RemoteCatalogFactory`] for a
//! handle per shop, which lets tests swap in a scripted catalog.

pub mod client;
pub mod retry;
pub mod types;

use std::time::Duration;
use async_trait::async_trait;
use crate::domain::aggregates::Shop;
use crate::domain::value_objects::ErrorCategory;

pub use client::WooClient;
pub use retry::{with_backoff, RetryPolicy};
pub use types::{ListQuery, ProductPage, ProductPayload, RemoteProduct, RemoteVariation, VariationPayload};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("WooCommerce responded {status}: {message}")]
    Status { status: u16, code: Option<String>, message: String },
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("unreadable response: {0}")]
    Decode(String),
    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl RemoteError {
    pub fn is_retryable(&self) -> bool { matches!(self, Self::Status { .. } | Self::Timeout | Self::Network(_)) }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Timeout | Self::Network(_) => ErrorCategory::Network,
            Self::Status { .. } | Self::Decode(_) | Self::Config(_) => ErrorCategory::WooCommerce,
        }
    }

    /// WooCommerce error code, e.g. `woocommerce_rest_product_invalid_id`.
    pub fn code(&self) -> Option<&str> {
        match self { Self::Status { code, .. } => code.as_deref(), _ => None }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { Self::Timeout }
        else if err.is_decode() { Self::Decode(err.to_string()) }
        else if err.is_builder() { Self::Config(err.to_string()) }
        else { Self::Network(err.to_string()) }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemoteConfig {
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for RemoteConfig {
    fn default() -> Self { Self { timeout: Duration::from_secs(30), retry: RetryPolicy::default() } }
}

/// Operations the engines need from a remote WooCommerce catalog.
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    /// Liveness probe. Any failure reads as `false`.
    async fn test_connection(&self) -> bool;
    async fn list_products(&self, query: &ListQuery) -> Result<ProductPage, RemoteError>;
    async fn get_product(&self, id: i64) -> Result<RemoteProduct, RemoteError>;
    async fn get_variation(&self, product_id: i64, variation_id: i64) -> Result<RemoteVariation, RemoteError>;
    async fn create_product(&self, payload: &ProductPayload) -> Result<RemoteProduct, RemoteError>;
    async fn update_product(&self, id: i64, payload: &ProductPayload) -> Result<RemoteProduct, RemoteError>;
    async fn delete_product(&self, id: i64, force: bool) -> Result<RemoteProduct, RemoteError>;
    async fn create_variation(&self, product_id: i64, payload: &VariationPayload) -> Result<RemoteVariation, RemoteError>;
    async fn update_variation(&self, product_id: i64, variation_id: i64, payload: &VariationPayload) -> Result<RemoteVariation, RemoteError>;
}

/// Builds a client handle for one shop.
pub trait RemoteCatalogFactory: Send + Sync {
    fn connect(&self, shop: &Shop) -> Result<Box<dyn RemoteCatalog>, RemoteError>;
}

#[derive(Clone, Debug, Default)]
pub struct WooClientFactory {
    config: RemoteConfig,
}

impl WooClientFactory {
    pub fn new(config: RemoteConfig) -> Self { Self { config } }
}

impl RemoteCatalogFactory for WooClientFactory {
    fn connect(&self, shop: &Shop) -> Result<Box<dyn RemoteCatalog>, RemoteError> {
        Ok(Box::new(WooClient::for_shop(shop, &self.config)?))
    }
}
