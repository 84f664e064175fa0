//! Market service abstraction.
//!
//! Defines the `MarketService` trait for the remote endpoints the client
//! consumes. The engines never see the transport; the controller and the
//! screener session talk to this trait so tests can drive them with mocks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chart::{RangeSelection, TimeSeriesRaw};
use crate::screener::StockRecord;

// ============================================================================
// Service Error
// ============================================================================

/// Transport-level failures. Always surfaced to the user as a message.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ServiceError {
    /// Connection failed or dropped
    #[error("Network error: {0}")]
    Network(String),

    /// No complete response within the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// Non-success HTTP status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Body was not the expected JSON shape
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Service answered with an `{"error": ...}` payload
    #[error("Service error: {0}")]
    Upstream(String),

    /// Request could not be built (bad symbol, bad URL)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ServiceError {
    /// Check if the error is worth retrying
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout => true,
            Self::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<ServiceError> for sense_common::Error {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidRequest(msg) => Self::InvalidInput(msg),
            ServiceError::Http { status: 404, body } => Self::NotFound(body),
            ServiceError::Timeout => Self::Timeout,
            other => Self::External(other.to_string()),
        }
    }
}

// ============================================================================
// Request Context
// ============================================================================

/// Body of the bulk screener request.
///
/// The server may pre-narrow by exchange; all threshold filtering happens
/// locally afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
}

impl FilterContext {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn exchange(exchange: impl Into<String>) -> Self {
        Self {
            exchange: Some(exchange.into()),
        }
    }
}

// ============================================================================
// Market Service Trait
// ============================================================================

/// Remote market data endpoints.
#[async_trait]
pub trait MarketService: Send + Sync {
    /// Service name for logs.
    fn name(&self) -> &'static str;

    /// Bulk record table feeding the filter engine.
    async fn fetch_records(&self, context: &FilterContext) -> Result<Vec<StockRecord>, ServiceError>;

    /// Raw time series for one symbol and range.
    async fn fetch_historical(
        &self,
        symbol: &str,
        range: RangeSelection,
    ) -> Result<TimeSeriesRaw, ServiceError>;

    /// Single-record detail view, rendered as-is.
    async fn fetch_detail(&self, symbol: &str) -> Result<StockRecord, ServiceError>;
}
