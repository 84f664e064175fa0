//! HTTP adapter for the remote market service.
//!
//! # Endpoints
//! - `POST /screener/filter` - bulk record table
//! - `GET /api/stock/historical/{symbol}?range={range}` - raw time series
//! - `GET /api/stock/{symbol}` - detail record

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

use sense_common::config::Config;
use sense_common::logging::generate_request_id;

use super::provider::{FilterContext, MarketService, ServiceError};
use super::sanitize::sanitize_non_finite;
use crate::chart::{RangeSelection, TimeSeriesRaw};
use crate::screener::StockRecord;

// ============================================================================
// Constants
// ============================================================================

const SCREENER_PATH: &[&str] = &["screener", "filter"];
const HISTORICAL_PATH: &[&str] = &["api", "stock", "historical"];
const DETAIL_PATH: &[&str] = &["api", "stock"];

/// Default request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Longest error body kept in `ServiceError::Http`
const MAX_ERROR_BODY: usize = 512;

// ============================================================================
// HTTP Market Service
// ============================================================================

/// `reqwest`-backed [`MarketService`].
pub struct HttpMarketService {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpMarketService {
    /// Create a client for `base_url` with the default timeout.
    pub fn new(base_url: &str) -> Result<Self, ServiceError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client with a custom per-request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ServiceError::InvalidRequest(format!("base url '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ServiceError::InvalidRequest(format!(
                "base url '{}' cannot carry a path",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        Ok(Self { base_url, client })
    }

    /// Create from config.
    pub fn from_config(config: &Config) -> Result<Self, ServiceError> {
        Self::with_timeout(config.base_url(), config.request_timeout())
    }

    /// Build `{base}/{segments...}`; segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ServiceError::InvalidRequest("base url cannot carry a path".into()))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        url: &Url,
    ) -> Result<T, ServiceError> {
        let request_id = generate_request_id();
        debug!(request_id = %request_id, url = %url, "Sending market service request");

        let response = request
            .header("accept", "application/json")
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(transport_error)?;

        debug!(
            request_id = %request_id,
            status = status.as_u16(),
            bytes = body.len(),
            "Market service responded"
        );

        if !status.is_success() {
            return Err(ServiceError::Http {
                status: status.as_u16(),
                body: upstream_message(&body).unwrap_or_else(|| truncate(&body)),
            });
        }

        decode(&body)
    }
}

fn transport_error(e: reqwest::Error) -> ServiceError {
    if e.is_timeout() {
        ServiceError::Timeout
    } else if e.is_connect() {
        ServiceError::Network("Connection failed".into())
    } else {
        ServiceError::Network(e.to_string())
    }
}

/// Parse a success body, treating `{"error": ...}` as a failure.
fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ServiceError> {
    let cleaned = sanitize_non_finite(body);
    let value: serde_json::Value =
        serde_json::from_str(&cleaned).map_err(|e| ServiceError::Decode(e.to_string()))?;

    if let Some(message) = error_field(&value) {
        return Err(ServiceError::Upstream(message));
    }

    serde_json::from_value(value).map_err(|e| ServiceError::Decode(e.to_string()))
}

fn error_field(value: &serde_json::Value) -> Option<String> {
    let obj = value.as_object()?;
    match obj.get("error")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn upstream_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .as_ref()
        .and_then(error_field)
}

fn truncate(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

fn check_symbol(symbol: &str) -> Result<&str, ServiceError> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(ServiceError::InvalidRequest("symbol is empty".into()));
    }
    Ok(symbol)
}

// ============================================================================
// MarketService Implementation
// ============================================================================

#[async_trait]
impl MarketService for HttpMarketService {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_records(&self, context: &FilterContext) -> Result<Vec<StockRecord>, ServiceError> {
        let url = self.endpoint(SCREENER_PATH)?;
        let request = self.client.post(url.clone()).json(context);
        self.send(request, &url).await
    }

    async fn fetch_historical(
        &self,
        symbol: &str,
        range: RangeSelection,
    ) -> Result<TimeSeriesRaw, ServiceError> {
        let symbol = check_symbol(symbol)?;
        let mut url = self.endpoint(&[HISTORICAL_PATH, &[symbol][..]].concat())?;
        url.query_pairs_mut().append_pair("range", range.token());

        let request = self.client.get(url.clone());
        self.send(request, &url).await
    }

    async fn fetch_detail(&self, symbol: &str) -> Result<StockRecord, ServiceError> {
        let symbol = check_symbol(symbol)?;
        let url = self.endpoint(&[DETAIL_PATH, &[symbol][..]].concat())?;
        let request = self.client.get(url.clone());
        self.send(request, &url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_and_encodes() {
        let service = HttpMarketService::new("http://localhost:5000/").unwrap();
        let url = service
            .endpoint(&[HISTORICAL_PATH, &["M&M.NS"][..]].concat())
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/stock/historical/M&M.NS");

        let url = service.endpoint(&[DETAIL_PATH, &["A/B"][..]].concat()).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/stock/A%2FB");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let service = HttpMarketService::new("https://example.com/backend").unwrap();
        let url = service.endpoint(SCREENER_PATH).unwrap();
        assert_eq!(url.as_str(), "https://example.com/backend/screener/filter");
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(matches!(
            HttpMarketService::new("not a url"),
            Err(ServiceError::InvalidRequest(_))
        ));
        assert!(HttpMarketService::new("mailto:someone@example.com").is_err());
    }

    #[test]
    fn test_decode_error_payload() {
        let result: Result<TimeSeriesRaw, _> = decode(r#"{"error": "No data found for XYZ"}"#);
        assert_eq!(
            result.unwrap_err(),
            ServiceError::Upstream("No data found for XYZ".into())
        );
    }

    #[test]
    fn test_decode_tolerates_nan() {
        let raw: TimeSeriesRaw =
            decode(r#"{"dates": ["2024-01-01", "2024-01-02"], "prices": [1.0, 2.0], "ma20": [NaN, NaN]}"#)
                .unwrap();
        let ma20 = raw.ma20.unwrap();
        assert!(ma20.iter().all(serde_json::Value::is_null));
    }

    #[test]
    fn test_truncate_long_body() {
        let body = "x".repeat(MAX_ERROR_BODY + 10);
        assert_eq!(truncate(&body).len(), MAX_ERROR_BODY + 3);
        assert_eq!(truncate("short"), "short");
    }

    #[test]
    fn test_empty_symbol_rejected() {
        assert!(check_symbol("  ").is_err());
        assert_eq!(check_symbol(" TCS.NS ").unwrap(), "TCS.NS");
    }
}
