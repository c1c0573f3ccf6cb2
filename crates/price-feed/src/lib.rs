#![deny(warnings)]

//! Reference price acquisition for the Nisab threshold.
//!
//! Looks up the silver spot price (currency per troy ounce), converts it to a
//! per-gram figure and caches it locally. A fresh cache entry short-circuits
//! the network. Every failure degrades to [`Acquisition::Unavailable`]; the
//! caller decides whether and how to apply a result.

use async_trait::async_trait;
use persistence::{load_price_cache, save_price_cache, KeyValueStore, PriceCacheEntry};
use reqwest::Client;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Grams in one troy ounce.
pub const TROY_OUNCE_GRAMS: Decimal = Decimal::from_parts(311_035, 0, 0, false, 4);

/// Public spot endpoint returning `[{"silver": <usd per oz>, ...}]`.
pub const DEFAULT_SOURCE_URL: &str = "https://api.metals.live/v1/spot";

/// Errors produced while looking up a spot price.
#[derive(Debug, Error)]
pub enum FeedError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("price source returned status {0}")]
    Status(u16),

    /// Payload did not contain a usable price
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// Anything that can quote silver in currency per troy ounce.
#[async_trait]
pub trait SpotSource: Send + Sync {
    async fn silver_per_ounce(&self) -> Result<Decimal, FeedError>;
}

/// Spot source backed by a single HTTP GET.
#[derive(Clone, Debug)]
pub struct HttpSpotSource {
    client: Client,
    url: String,
}

impl HttpSpotSource {
    /// Build a source for `url`. No timeout is applied unless one is given.
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, FeedError> {
        let mut builder = Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            client: builder.build()?,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SpotSource for HttpSpotSource {
    async fn silver_per_ounce(&self) -> Result<Decimal, FeedError> {
        debug!(url = %self.url, "requesting spot price");
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(FeedError::Status(response.status().as_u16()));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| FeedError::MalformedPayload(e.to_string()))?;
        extract_silver_per_ounce(&body)
    }
}

/// Pull the silver quote out of a payload that is either an object or an
/// array whose first element is that object.
pub fn extract_silver_per_ounce(payload: &Value) -> Result<Decimal, FeedError> {
    let quote = match payload {
        Value::Array(items) => items.first(),
        other => Some(other),
    }
    .and_then(|obj| obj.get("silver"))
    .ok_or_else(|| FeedError::MalformedPayload("missing silver field".into()))?;

    let Value::Number(n) = quote else {
        return Err(FeedError::MalformedPayload("silver is not a number".into()));
    };
    let text = n.to_string();
    let per_ounce = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|e| FeedError::MalformedPayload(e.to_string()))?;
    if per_ounce <= Decimal::ZERO {
        return Err(FeedError::MalformedPayload(format!(
            "non-positive silver price {per_ounce}"
        )));
    }
    Ok(per_ounce)
}

/// Convert a per-ounce quote to per-gram, rounded to four decimals.
///
/// Example:
/// assert_eq!(price_per_gram(Decimal::new(311035, 4)), Decimal::ONE);
pub fn price_per_gram(per_ounce: Decimal) -> Decimal {
    (per_ounce / TROY_OUNCE_GRAMS).round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}

/// Outcome of one acquisition attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum Acquisition {
    /// Reused a fresh cache entry; no network call was made.
    Cached(Decimal),
    /// Fetched from the source and written to the cache.
    Fetched(Decimal),
    /// Nothing usable; the reason is for logs only.
    Unavailable(String),
}

impl Acquisition {
    /// Per-gram price, if any.
    pub fn price(&self) -> Option<Decimal> {
        match self {
            Acquisition::Cached(p) | Acquisition::Fetched(p) => Some(*p),
            Acquisition::Unavailable(_) => None,
        }
    }
}

/// Cache-first lookup used at startup.
pub async fn acquire<S>(source: &S, store: &dyn KeyValueStore, now_ms: i64) -> Acquisition
where
    S: SpotSource + ?Sized,
{
    match load_price_cache(store) {
        Ok(Some(entry)) if entry.is_fresh(now_ms) => {
            debug!(price = %entry.price_per_gram, age_ms = now_ms - entry.fetched_at, "using cached price");
            return Acquisition::Cached(entry.price_per_gram);
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "ignoring unreadable price cache"),
    }
    refresh(source, store, now_ms).await
}

/// Always ask the source, then rewrite the cache on success.
pub async fn refresh<S>(source: &S, store: &dyn KeyValueStore, now_ms: i64) -> Acquisition
where
    S: SpotSource + ?Sized,
{
    let per_ounce = match source.silver_per_ounce().await {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "silver price unavailable");
            return Acquisition::Unavailable(e.to_string());
        }
    };
    let per_gram = price_per_gram(per_ounce);
    if per_gram <= Decimal::ZERO {
        warn!(%per_ounce, "silver price rounds to zero per gram");
        return Acquisition::Unavailable("price rounds to zero".into());
    }
    let entry = PriceCacheEntry {
        price_per_gram: per_gram,
        silver_per_oz: per_ounce,
        fetched_at: now_ms,
    };
    if let Err(e) = save_price_cache(store, &entry) {
        warn!(error = %e, "could not write price cache");
    }
    info!(%per_ounce, %per_gram, "fetched silver price");
    Acquisition::Fetched(per_gram)
}
