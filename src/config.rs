//! Runtime settings read from the environment (after `.env` is loaded).

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use crate::import::ImportOptions;
use crate::remote::{RemoteConfig, RetryPolicy};
use crate::sync::SyncOptions;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub port: u16,
    pub database_max_connections: u32,
    pub remote: RemoteConfig,
    pub import: ImportOptions,
    pub sync: SyncOptions,
    /// How often the scheduler looks for due syncs.
    pub scheduler_tick: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> { Self::from_lookup(|key| std::env::var(key).ok()) }

    /// Builds settings from any key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &'static str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        Ok(Self {
            database_url,
            port: parse_or(get("PORT"), "PORT", 8083)?,
            database_max_connections: parse_or(get("DATABASE_MAX_CONNECTIONS"), "DATABASE_MAX_CONNECTIONS", 10)?,
            remote: RemoteConfig {
                timeout: Duration::from_secs(parse_or(get("WOO_HTTP_TIMEOUT_SECS"), "WOO_HTTP_TIMEOUT_SECS", 30)?),
                retry: RetryPolicy::new(
                    parse_or(get("WOO_RETRY_ATTEMPTS"), "WOO_RETRY_ATTEMPTS", 3)?,
                    Duration::from_millis(parse_or(get("WOO_RETRY_BASE_DELAY_MS"), "WOO_RETRY_BASE_DELAY_MS", 1000)?),
                ),
            },
            import: ImportOptions {
                chunk_size: parse_or(get("IMPORT_CHUNK_SIZE"), "IMPORT_CHUNK_SIZE", 100usize)?.max(1),
                chunk_pause: Duration::from_millis(parse_or(get("IMPORT_CHUNK_PAUSE_MS"), "IMPORT_CHUNK_PAUSE_MS", 500)?),
            },
            sync: SyncOptions {
                batch_size: parse_or(get("SYNC_BATCH_SIZE"), "SYNC_BATCH_SIZE", 50u32)?.clamp(1, 100),
                max_products: parse_or(get("SYNC_MAX_PRODUCTS"), "SYNC_MAX_PRODUCTS", 500u32)?.max(1),
                page_delay: Duration::from_millis(parse_or(get("SYNC_PAGE_DELAY_MS"), "SYNC_PAGE_DELAY_MS", 1000)?),
            },
            scheduler_tick: Duration::from_secs(parse_or(get("SYNC_SCHEDULER_TICK_SECS"), "SYNC_SCHEDULER_TICK_SECS", 30u64)?.max(1)),
        })
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { key, value }),
    }
}
