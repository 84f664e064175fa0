//! Screener session: the loaded record table plus the live filter form.

use serde_json::Value;
use tracing::{info, warn};

use super::directory::Metric;
use super::engine::{apply_filters_with_stats, FilterStats};
use super::record::StockRecord;
use super::spec::FilterSpec;
use crate::data::{FilterContext, MarketService, ServiceError};

/// Holds the bulk table fetched once and re-filters it locally on every
/// form change.
#[derive(Debug, Default)]
pub struct ScreenerSession {
    records: Vec<StockRecord>,
    spec: FilterSpec,
    results: Vec<StockRecord>,
    stats: Option<FilterStats>,
    last_error: Option<String>,
}

impl ScreenerSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already held table.
    pub fn with_records(records: Vec<StockRecord>) -> Self {
        let mut session = Self {
            records,
            ..Self::default()
        };
        session.apply();
        session
    }

    /// Fetch the record table and re-apply the current spec.
    ///
    /// On failure the previous table and results are kept and the message
    /// is stored for display.
    pub async fn load(
        &mut self,
        service: &dyn MarketService,
        context: &FilterContext,
    ) -> Result<usize, ServiceError> {
        match service.fetch_records(context).await {
            Ok(records) => {
                info!(
                    service = service.name(),
                    records = records.len(),
                    "Loaded screener table"
                );
                self.records = records;
                self.last_error = None;
                self.apply();
                Ok(self.records.len())
            }
            Err(e) => {
                warn!(service = service.name(), error = %e, "Failed to load screener table");
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Replace the whole filter form.
    pub fn set_spec(&mut self, spec: FilterSpec) -> &[StockRecord] {
        self.spec = spec;
        self.apply()
    }

    /// Update one threshold and re-filter.
    pub fn set_threshold(&mut self, metric: Metric, value: impl Into<Value>) -> &[StockRecord] {
        self.spec.set(metric, value);
        self.apply()
    }

    pub fn clear_threshold(&mut self, metric: Metric) -> &[StockRecord] {
        self.spec.clear(metric);
        self.apply()
    }

    pub fn set_exchange(&mut self, exchange: Option<String>) -> &[StockRecord] {
        self.spec.set_exchange(exchange);
        self.apply()
    }

    /// Re-run the filter engine over the held table.
    pub fn apply(&mut self) -> &[StockRecord] {
        let outcome = apply_filters_with_stats(&self.records, &self.spec);
        self.results = outcome.records;
        self.stats = Some(outcome.stats);
        &self.results
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    pub fn records(&self) -> &[StockRecord] {
        &self.records
    }

    pub fn results(&self) -> &[StockRecord] {
        &self.results
    }

    pub fn stats(&self) -> Option<FilterStats> {
        self.stats
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
