//! Per-URL price history with drop/increase alerts

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::config::PriceHistoryConfig;
use crate::error::{Result, ShoplensError};
use crate::product::ProductRecord;

/// Prefix of every price history key
pub const KEY_PREFIX: &str = "price_history_";
const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Durable string key-value storage.
///
/// Calls for a given URL are made one at a time; concurrent writers to the
/// same key race on `lastPrice` and must be serialized by the caller.
pub trait PriceStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// In-process store, for tests and runs that shouldn't touch disk
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PriceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| ShoplensError::StorageError("memory store poisoned".into()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| ShoplensError::StorageError("memory store poisoned".into()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<S: PriceStore + ?Sized> PriceStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub price: f64,
    pub currency: String,
    /// Epoch milliseconds
    pub timestamp: i64,
}

/// Persisted state for one product URL
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistoryEntry {
    #[serde(default)]
    pub prices: Vec<PricePoint>,
    pub last_price: Option<f64>,
    pub last_update: Option<i64>,
}

impl PriceHistoryEntry {
    pub fn lowest(&self) -> Option<&PricePoint> {
        self.prices
            .iter()
            .min_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(std::cmp::Ordering::Equal))
    }

    pub fn highest(&self) -> Option<&PricePoint> {
        self.prices
            .iter()
            .max_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(std::cmp::Ordering::Equal))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Drop,
    Increase,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAlert {
    pub kind: AlertKind,
    /// Magnitude of the change, always positive
    pub percent: f64,
    pub previous_price: f64,
    pub current_price: f64,
    pub currency: String,
}

impl PriceAlert {
    /// One decimal place, e.g. "15.0%"
    pub fn percent_label(&self) -> String {
        format!("{:.1}%", self.percent)
    }

    pub fn message(&self) -> String {
        let verb = match self.kind {
            AlertKind::Drop => "dropped",
            AlertKind::Increase => "increased",
        };
        format!(
            "Price {} {} ({:.2} → {:.2} {})",
            verb,
            self.percent_label(),
            self.previous_price,
            self.current_price,
            self.currency
        )
    }
}

impl fmt::Display for PriceAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Storage key for a product URL
pub fn history_key(url: &str) -> String {
    format!("{}{}", KEY_PREFIX, url)
}

/// Product URL a storage key belongs to
pub fn url_from_key(key: &str) -> Option<&str> {
    key.strip_prefix(KEY_PREFIX)
}

/// Compare a new price against the last one seen
pub fn detect_change(
    previous: f64,
    current: f64,
    currency: &str,
    threshold_percent: f64,
) -> Option<PriceAlert> {
    if previous <= 0.0 {
        return None;
    }
    // Positive when the price fell
    let change = (previous - current) / previous * 100.0;
    let kind = if change >= threshold_percent {
        AlertKind::Drop
    } else if change <= -threshold_percent {
        AlertKind::Increase
    } else {
        return None;
    };
    Some(PriceAlert {
        kind,
        percent: change.abs(),
        previous_price: previous,
        current_price: current,
        currency: currency.to_string(),
    })
}

pub struct PriceHistoryTracker<S: PriceStore> {
    store: S,
    config: PriceHistoryConfig,
}

impl<S: PriceStore> PriceHistoryTracker<S> {
    pub fn new(store: S, config: PriceHistoryConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Record an observation now. Never fails: storage errors are logged and
    /// reported as "no alert".
    pub fn track(&self, record: &ProductRecord) -> Option<PriceAlert> {
        self.track_at(record, chrono::Utc::now().timestamp_millis())
    }

    /// Record an observation as of `now_ms`
    pub fn track_at(&self, record: &ProductRecord, now_ms: i64) -> Option<PriceAlert> {
        let price = record.price?;
        if record.url.is_empty() {
            return None;
        }
        match self.update(&record.url, price, &record.currency, now_ms) {
            Ok(alert) => alert,
            Err(e) => {
                warn!(url = %record.url, error = %e, "price history update failed");
                None
            }
        }
    }

    /// Stored history for a URL, untouched
    pub fn history(&self, url: &str) -> Result<Option<PriceHistoryEntry>> {
        match self.store.get(&history_key(url))? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn update(&self, url: &str, price: f64, currency: &str, now_ms: i64) -> Result<Option<PriceAlert>> {
        let mut entry = self.history(url)?.unwrap_or_default();

        let alert = entry.last_price.and_then(|last| {
            detect_change(last, price, currency, self.config.alert_threshold_percent)
        });

        entry.prices.push(PricePoint {
            price,
            currency: currency.to_string(),
            timestamp: now_ms,
        });
        let cutoff = now_ms - self.config.retention_days * DAY_MS;
        entry.prices.retain(|point| point.timestamp >= cutoff);
        entry.last_price = Some(price);
        entry.last_update = Some(now_ms);

        self.store.set(&history_key(url), &serde_json::to_string(&entry)?)?;
        debug!(url, price, points = entry.prices.len(), "price history updated");

        Ok(alert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_700_000_000_000;

    fn record(price: Option<f64>) -> ProductRecord {
        ProductRecord {
            url: "https://shop.example/kettle".to_string(),
            title: "Kettle".to_string(),
            price,
            rating: None,
            review_count: None,
            currency: "USD".to_string(),
            timestamp: T0,
        }
    }

    fn tracker() -> PriceHistoryTracker<MemoryStore> {
        PriceHistoryTracker::new(MemoryStore::new(), PriceHistoryConfig::default())
    }

    struct FailingStore;

    impl PriceStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(ShoplensError::StorageError("unavailable".into()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(ShoplensError::StorageError("unavailable".into()))
        }
    }

    #[test]
    fn test_first_observation_has_no_alert() {
        let t = tracker();
        assert!(t.track_at(&record(Some(100.0)), T0).is_none());

        let entry = t.history("https://shop.example/kettle").unwrap().unwrap();
        assert_eq!(entry.prices.len(), 1);
        assert_eq!(entry.last_price, Some(100.0));
        assert_eq!(entry.last_update, Some(T0));
    }

    #[test]
    fn test_drop_alert() {
        let t = tracker();
        t.track_at(&record(Some(100.0)), T0);
        let alert = t.track_at(&record(Some(85.0)), T0 + 1000).unwrap();
        assert_eq!(alert.kind, AlertKind::Drop);
        assert_eq!(alert.percent_label(), "15.0%");
        assert_eq!(alert.message(), "Price dropped 15.0% (100.00 → 85.00 USD)");
    }

    #[test]
    fn test_small_change_no_alert() {
        let t = tracker();
        t.track_at(&record(Some(100.0)), T0);
        assert!(t.track_at(&record(Some(95.0)), T0 + 1000).is_none());
    }

    #[test]
    fn test_increase_alert() {
        let t = tracker();
        t.track_at(&record(Some(100.0)), T0);
        let alert = t.track_at(&record(Some(125.0)), T0 + 1000).unwrap();
        assert_eq!(alert.kind, AlertKind::Increase);
        assert_eq!(alert.percent_label(), "25.0%");
    }

    #[test]
    fn test_compares_against_last_price() {
        let t = tracker();
        t.track_at(&record(Some(100.0)), T0);
        t.track_at(&record(Some(95.0)), T0 + 1);
        // 95 → 90 is about 5.3%, even though 100 → 90 would alert
        assert!(t.track_at(&record(Some(90.0)), T0 + 2).is_none());
    }

    #[test]
    fn test_missing_price_is_noop() {
        let t = tracker();
        assert!(t.track_at(&record(None), T0).is_none());
        assert!(t.history("https://shop.example/kettle").unwrap().is_none());
    }

    #[test]
    fn test_prunes_old_points() {
        let t = tracker();
        t.track_at(&record(Some(100.0)), T0);
        t.track_at(&record(Some(101.0)), T0 + 10 * DAY_MS);
        t.track_at(&record(Some(102.0)), T0 + 31 * DAY_MS);

        let entry = t.history("https://shop.example/kettle").unwrap().unwrap();
        let prices: Vec<f64> = entry.prices.iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![101.0, 102.0]);
        assert_eq!(entry.lowest().map(|p| p.price), Some(101.0));
        assert_eq!(entry.highest().map(|p| p.price), Some(102.0));
    }

    #[test]
    fn test_store_failure_means_no_alert() {
        let t = PriceHistoryTracker::new(FailingStore, PriceHistoryConfig::default());
        assert!(t.track_at(&record(Some(50.0)), T0).is_none());
    }

    #[test]
    fn test_key_round_trip() {
        let key = history_key("https://shop.example/a?b=1");
        assert_eq!(key, "price_history_https://shop.example/a?b=1");
        assert_eq!(url_from_key(&key), Some("https://shop.example/a?b=1"));
        assert_eq!(url_from_key("other"), None);
    }

    #[test]
    fn test_zero_last_price() {
        assert!(detect_change(0.0, 10.0, "USD", 10.0).is_none());
    }

    #[test]
    fn test_entry_json_is_camel_case() {
        let t = tracker();
        t.track_at(&record(Some(42.0)), T0);
        let raw = t
            .store()
            .get(&history_key("https://shop.example/kettle"))
            .unwrap()
            .unwrap();
        assert!(raw.contains("\"lastPrice\":42.0"));
        assert!(raw.contains("\"lastUpdate\""));
    }
}
