#![deny(warnings)]

//! Persistence layer: local key/value storage, worksheet snapshots and the
//! reference price cache.
//!
//! Every value is a whole JSON document stored under a single key and
//! overwritten wholesale on save. Callers treat every error here as
//! non-fatal.

mod snapshot;
mod store;

pub use snapshot::{PriceCacheEntry, Snapshot};
pub use store::{FileStore, KeyValueStore, MemoryStore};

use thiserror::Error;
use tracing::debug;

/// Key of the worksheet snapshot.
pub const SNAPSHOT_KEY: &str = "zakat-calculator-data";
/// Key of the reference price cache.
pub const PRICE_CACHE_KEY: &str = "zakat-silver-price";
/// A cached price is reused while younger than this (one hour).
pub const PRICE_CACHE_MAX_AGE_MS: i64 = 60 * 60 * 1000;

/// Errors produced by the storage layer.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// The stored document parsed but has the wrong shape.
    #[error("corrupt document under {key}: {reason}")]
    Corrupt { key: String, reason: String },
    /// Keys double as file names and are limited to `[A-Za-z0-9_-]`.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Directory used for local saves when nothing else is configured.
pub fn default_storage_dir() -> &'static str {
    "saves"
}

/// Read the worksheet snapshot. `Ok(None)` when nothing was saved yet.
pub fn load_snapshot(store: &dyn KeyValueStore) -> Result<Option<Snapshot>, PersistenceError> {
    match store.get(SNAPSHOT_KEY)? {
        Some(text) => Snapshot::from_json(&text).map(Some),
        None => Ok(None),
    }
}

/// Overwrite the worksheet snapshot.
pub fn save_snapshot(store: &dyn KeyValueStore, snapshot: &Snapshot) -> Result<(), PersistenceError> {
    let text = serde_json::to_string(snapshot)?;
    store.set(SNAPSHOT_KEY, &text)?;
    debug!(fields = snapshot.data.len(), "snapshot saved");
    Ok(())
}

/// Forget the worksheet snapshot. The price cache is left alone.
pub fn clear_snapshot(store: &dyn KeyValueStore) -> Result<(), PersistenceError> {
    store.remove(SNAPSHOT_KEY)
}

/// Read the cached reference price, if any.
pub fn load_price_cache(
    store: &dyn KeyValueStore,
) -> Result<Option<PriceCacheEntry>, PersistenceError> {
    match store.get(PRICE_CACHE_KEY)? {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

/// Overwrite the cached reference price.
pub fn save_price_cache(
    store: &dyn KeyValueStore,
    entry: &PriceCacheEntry,
) -> Result<(), PersistenceError> {
    let text = serde_json::to_string(entry)?;
    store.set(PRICE_CACHE_KEY, &text)
}
