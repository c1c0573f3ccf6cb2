use crate::{PersistenceError, PRICE_CACHE_MAX_AGE_MS, SNAPSHOT_KEY};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Persisted worksheet state.
///
/// The first four keys are the stable wire format; `priceConfirmed` and
/// `step` are optional extensions and default when absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub data: BTreeMap<String, Decimal>,
    pub nisab_price: Decimal,
    pub held_one_year: bool,
    pub use_gregorian: bool,
    pub price_confirmed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
}

impl Snapshot {
    /// Lenient decode: wrong-typed values fall back to zero / false instead
    /// of rejecting the whole document. Only a non-object root is corrupt.
    pub fn from_json(text: &str) -> Result<Self, PersistenceError> {
        let root: Value = serde_json::from_str(text)?;
        let obj = root.as_object().ok_or_else(|| PersistenceError::Corrupt {
            key: SNAPSHOT_KEY.to_string(),
            reason: "root is not an object".to_string(),
        })?;

        let data = obj
            .get("data")
            .and_then(Value::as_object)
            .map(decode_amounts)
            .unwrap_or_default();

        Ok(Self {
            data,
            nisab_price: obj.get("nisabPrice").map(coerce_amount).unwrap_or_default(),
            held_one_year: flag(obj, "heldOneYear"),
            use_gregorian: flag(obj, "useGregorian"),
            price_confirmed: flag(obj, "priceConfirmed"),
            step: obj.get("step").and_then(Value::as_str).map(str::to_string),
        })
    }
}

fn decode_amounts(map: &Map<String, Value>) -> BTreeMap<String, Decimal> {
    map.iter()
        .map(|(k, v)| (k.clone(), coerce_amount(v)))
        .collect()
}

fn flag(obj: &Map<String, Value>, key: &str) -> bool {
    obj.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Numbers and numeric strings become amounts; everything else, and any
/// negative value, is zero.
pub(crate) fn coerce_amount(v: &Value) -> Decimal {
    let parsed = match v {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
        }
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    };
    parsed
        .filter(|d| *d >= Decimal::ZERO)
        .unwrap_or(Decimal::ZERO)
}

/// Cached result of the last successful price lookup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceCacheEntry {
    /// Silver price per gram, rounded to four decimals.
    pub price_per_gram: Decimal,
    /// Raw source value: silver per troy ounce.
    pub silver_per_oz: Decimal,
    /// Epoch milliseconds of the fetch.
    pub fetched_at: i64,
}

impl PriceCacheEntry {
    /// Reusable without a network call at `now_ms`.
    pub fn is_fresh(&self, now_ms: i64) -> bool {
        now_ms
            .checked_sub(self.fetched_at)
            .is_some_and(|age| age < PRICE_CACHE_MAX_AGE_MS)
            && self.price_per_gram > Decimal::ZERO
    }
}
