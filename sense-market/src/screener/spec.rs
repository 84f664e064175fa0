//! Filter thresholds as entered in the screener form.
//!
//! A sparse set of user thresholds as typed into the screener form. The
//! raw wire value is kept so the form can be re-rendered; only entries
//! that coerce to a finite number are active.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::directory::Metric;
use super::record::coerce_number;

/// Wire key of the exchange selector in the form payload.
pub const EXCHANGE_KEY: &str = "exchange";

/// Thresholds keyed by metric, plus an optional exchange selector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    thresholds: BTreeMap<Metric, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exchange: Option<String>,
}

/// A filter that takes part in evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveFilter {
    pub metric: Metric,
    pub threshold: f64,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the flat form payload (`{"exchange": "NSE", "pe": 25, "roe": ""}`).
    ///
    /// Keys outside the metric directory are dropped.
    pub fn from_form(form: &serde_json::Map<String, Value>) -> Self {
        let mut spec = Self::new();
        for (key, value) in form {
            if key == EXCHANGE_KEY {
                spec.exchange = value.as_str().map(str::to_string);
                continue;
            }
            match Metric::from_key(key) {
                Some(metric) => {
                    spec.thresholds.insert(metric, value.clone());
                }
                None => debug!(key = %key, "Ignoring filter key outside the metric directory"),
            }
        }
        spec
    }

    /// Set the raw threshold for a metric (number, string, or null).
    pub fn set(&mut self, metric: Metric, value: impl Into<Value>) -> &mut Self {
        self.thresholds.insert(metric, value.into());
        self
    }

    /// Builder-style `set`.
    pub fn with(mut self, metric: Metric, value: impl Into<Value>) -> Self {
        self.set(metric, value);
        self
    }

    pub fn clear(&mut self, metric: Metric) {
        self.thresholds.remove(&metric);
    }

    pub fn set_exchange(&mut self, exchange: Option<String>) -> &mut Self {
        self.exchange = exchange;
        self
    }

    pub fn with_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = Some(exchange.into());
        self
    }

    /// Raw value as entered.
    pub fn raw(&self, metric: Metric) -> Option<&Value> {
        self.thresholds.get(&metric)
    }

    /// Exchange selector, `None` when blank.
    pub fn exchange(&self) -> Option<&str> {
        self.exchange
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }

    /// Entries that are present, non-blank and numeric, in directory order.
    pub fn active_filters(&self) -> Vec<ActiveFilter> {
        self.thresholds
            .iter()
            .filter_map(|(metric, raw)| {
                coerce_number(raw).map(|threshold| ActiveFilter {
                    metric: *metric,
                    threshold,
                })
            })
            .collect()
    }

    /// Whether any criterion (metric or exchange) is active.
    pub fn is_active(&self) -> bool {
        self.exchange().is_some() || !self.active_filters().is_empty()
    }
}
