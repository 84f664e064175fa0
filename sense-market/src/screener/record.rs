//! Stock records as received from the screener service.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::directory::Metric;

/// One row of the screener table.
///
/// Identity fields are typed; everything else (metric fields, price,
/// detail-only keys) is kept verbatim so the detail view can render it
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub symbol: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub exchange: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sector: String,
    /// Open set of remaining fields
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Identity fields come back as `null` for thinly covered listings.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl StockRecord {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Default::default()
        }
    }

    /// Builder-style field setter, mostly for fixtures.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Raw wire value of a field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Numeric value of a metric, `None` if absent, null or not a finite number.
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        self.field(metric.key()).and_then(coerce_number)
    }
}

/// Coerce a wire value to a finite number.
///
/// Accepts JSON numbers and numeric strings (surrounding whitespace
/// ignored). Everything else, including blank strings, is `None`.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };

    n.is_finite().then_some(n)
}
