//! Range/request controller for the chart view.
//!
//! Holds the active symbol and range, issues historical fetches and
//! commits their shaped result. Each selection change bumps a request
//! token; a response is committed only if its token is still current, so
//! a slow response to an old selection can never overwrite a newer one.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use sense_common::config::ChartConfig;

use crate::chart::{
    shape_with_limit, ChartOptions, ChartOutcome, ChartSeries, Dataset, RangeSelection,
    TimeSeriesRaw, MAX_POINTS,
};
use crate::data::{MarketService, ServiceError};

// ============================================================================
// State
// ============================================================================

/// Outcome of a chart request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChartResult {
    Ready { series: ChartSeries },
    NoData,
    /// Fetch failed; distinct from an empty but valid response
    Failed { message: String },
}

impl From<ChartOutcome> for ChartResult {
    fn from(outcome: ChartOutcome) -> Self {
        match outcome {
            ChartOutcome::Ready(series) => Self::Ready { series },
            ChartOutcome::NoData => Self::NoData,
        }
    }
}

/// Most recently accepted chart result, tagged with the selection it was
/// fetched for. The current selection may already differ while a newer
/// request is loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommittedChart {
    pub symbol: String,
    pub range: RangeSelection,
    #[serde(flatten)]
    pub result: ChartResult,
}

impl CommittedChart {
    pub fn series(&self) -> Option<&ChartSeries> {
        match &self.result {
            ChartResult::Ready { series } => Some(series),
            _ => None,
        }
    }

    /// Datasets labelled with the symbol this series belongs to.
    pub fn datasets(&self, options: &ChartOptions) -> Vec<Dataset> {
        self.series()
            .map(|series| series.datasets(&self.symbol, options))
            .unwrap_or_default()
    }
}

/// Controller state. Written only by [`ChartController`] methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSnapshot {
    pub symbol: Option<String>,
    pub range: RangeSelection,
    /// Token of the latest issued request
    pub token: u64,
    /// A request for the current token is in flight
    pub loading: bool,
    pub committed: Option<CommittedChart>,
    pub options: ChartOptions,
}

impl ChartSnapshot {
    fn new(range: RangeSelection, options: ChartOptions) -> Self {
        Self {
            symbol: None,
            range,
            token: 0,
            loading: false,
            committed: None,
            options,
        }
    }

    /// Datasets for the committed series under the current toggles.
    pub fn datasets(&self) -> Vec<Dataset> {
        self.committed
            .as_ref()
            .map(|c| c.datasets(&self.options))
            .unwrap_or_default()
    }
}

/// Captured at request time, handed back on completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    pub token: u64,
    pub symbol: String,
    pub range: RangeSelection,
}

/// What happened to a completed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// Result became the committed state
    Applied,
    /// Superseded by a newer selection; discarded
    Stale,
    /// No symbol selected, nothing requested
    Idle,
}

// ============================================================================
// Controller
// ============================================================================

/// Chart controller. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ChartController {
    service: Arc<dyn MarketService>,
    state: Arc<RwLock<ChartSnapshot>>,
    max_points: usize,
}

impl ChartController {
    pub fn new(service: Arc<dyn MarketService>) -> Self {
        Self {
            service,
            state: Arc::new(RwLock::new(ChartSnapshot::new(
                RangeSelection::default(),
                ChartOptions::default(),
            ))),
            max_points: MAX_POINTS,
        }
    }

    /// Create with the configured default range, window and toggles.
    pub fn from_config(service: Arc<dyn MarketService>, config: &ChartConfig) -> Self {
        let range = RangeSelection::from_config_or_default(&config.default_range);
        Self {
            service,
            state: Arc::new(RwLock::new(ChartSnapshot::new(range, ChartOptions::from(config)))),
            max_points: config.max_points,
        }
    }

    /// Select a symbol and fetch its chart for the current range.
    pub async fn select_symbol(&self, symbol: &str) -> Commit {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            self.clear().await;
            return Commit::Idle;
        }

        let ticket = self.begin(Some(symbol.to_string()), None).await;
        self.run(ticket).await
    }

    /// Change range and re-fetch for the current symbol.
    pub async fn select_range(&self, range: RangeSelection) -> Commit {
        let ticket = self.begin(None, Some(range)).await;
        self.run(ticket).await
    }

    /// Re-fetch the current selection.
    pub async fn refresh(&self) -> Commit {
        let ticket = self.begin(None, None).await;
        self.run(ticket).await
    }

    async fn run(&self, ticket: Option<RequestTicket>) -> Commit {
        let Some(ticket) = ticket else {
            return Commit::Idle;
        };

        // No lock held here
        let result = self
            .service
            .fetch_historical(&ticket.symbol, ticket.range)
            .await;

        self.complete(ticket, result).await
    }

    /// Apply a selection change and issue a new token.
    ///
    /// `None` keeps the current value. Returns `None` when no symbol is
    /// selected, after recording the range.
    pub async fn begin(
        &self,
        symbol: Option<String>,
        range: Option<RangeSelection>,
    ) -> Option<RequestTicket> {
        let mut state = self.state.write().await;

        if let Some(symbol) = symbol {
            state.symbol = Some(symbol);
        }
        if let Some(range) = range {
            state.range = range;
        }

        let symbol = state.symbol.clone()?;
        state.token += 1;
        state.loading = true;

        debug!(
            token = state.token,
            symbol = %symbol,
            range = %state.range,
            "Issuing chart request"
        );

        Some(RequestTicket {
            token: state.token,
            symbol,
            range: state.range,
        })
    }

    /// Commit a response if its ticket is still current.
    pub async fn complete(
        &self,
        ticket: RequestTicket,
        result: Result<TimeSeriesRaw, ServiceError>,
    ) -> Commit {
        let mut state = self.state.write().await;
        if ticket.token != state.token {
            debug!(
                token = ticket.token,
                current = state.token,
                symbol = %ticket.symbol,
                range = %ticket.range,
                "Discarding stale chart response"
            );
            return Commit::Stale;
        }

        let result = match result {
            Ok(raw) => ChartResult::from(shape_with_limit(&raw, self.max_points)),
            Err(e) => ChartResult::Failed {
                message: e.to_string(),
            },
        };

        match &result {
            ChartResult::Ready { series } => info!(
                symbol = %ticket.symbol,
                range = %ticket.range,
                points = series.len(),
                "Chart updated"
            ),
            ChartResult::NoData => info!(
                symbol = %ticket.symbol,
                range = %ticket.range,
                "No chart data available"
            ),
            ChartResult::Failed { message } => warn!(
                symbol = %ticket.symbol,
                range = %ticket.range,
                error = %message,
                "Chart request failed"
            ),
        }

        let committed = CommittedChart {
            symbol: ticket.symbol,
            range: ticket.range,
            result,
        };
        state.loading = false;
        state.committed = Some(committed);
        Commit::Applied
    }

    /// Drop the symbol and committed result; in-flight responses go stale.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.token += 1;
        state.symbol = None;
        state.loading = false;
        state.committed = None;
    }

    /// Update chart toggles. Applies to the committed series, no re-fetch.
    pub async fn set_options(&self, options: ChartOptions) {
        self.state.write().await.options = options;
    }

    pub async fn snapshot(&self) -> ChartSnapshot {
        self.state.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FilterContext;
    use crate::screener::StockRecord;
    use async_trait::async_trait;
    use serde_json::json;

    /// Answers every historical request with `len` points priced by range.
    struct FixedService {
        len: usize,
    }

    #[async_trait]
    impl MarketService for FixedService {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch_records(
            &self,
            _context: &FilterContext,
        ) -> Result<Vec<StockRecord>, ServiceError> {
            Ok(Vec::new())
        }

        async fn fetch_historical(
            &self,
            symbol: &str,
            _range: RangeSelection,
        ) -> Result<TimeSeriesRaw, ServiceError> {
            if symbol == "FAIL" {
                return Err(ServiceError::Upstream("No data found".into()));
            }
            if symbol == "EMPTY" {
                return Ok(TimeSeriesRaw::default());
            }
            Ok(raw(self.len, 1.0))
        }

        async fn fetch_detail(&self, symbol: &str) -> Result<StockRecord, ServiceError> {
            Ok(StockRecord::new(symbol))
        }
    }

    fn raw(len: usize, price: f64) -> TimeSeriesRaw {
        TimeSeriesRaw {
            dates: Some((0..len).map(|i| json!(format!("d{}", i))).collect()),
            prices: Some(vec![json!(price); len]),
            volumes: Some(vec![json!(1000); len]),
            ..Default::default()
        }
    }

    fn controller(len: usize) -> ChartController {
        ChartController::new(Arc::new(FixedService { len }))
    }

    #[tokio::test]
    async fn test_select_symbol_commits_windowed_series() {
        let controller = controller(250);
        assert_eq!(controller.select_symbol("TCS.NS").await, Commit::Applied);

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.symbol.as_deref(), Some("TCS.NS"));
        assert_eq!(snapshot.range, RangeSelection::OneMonth);
        assert!(!snapshot.loading);
        assert_eq!(snapshot.token, 1);
        let series = snapshot.committed.as_ref().and_then(CommittedChart::series).unwrap();
        assert_eq!(series.len(), MAX_POINTS);
    }

    #[tokio::test]
    async fn test_range_without_symbol_is_idle() {
        let controller = controller(10);
        assert_eq!(controller.select_range(RangeSelection::OneYear).await, Commit::Idle);
        assert_eq!(controller.refresh().await, Commit::Idle);

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.range, RangeSelection::OneYear);
        assert_eq!(snapshot.token, 0);
        assert!(snapshot.committed.is_none());
    }

    #[tokio::test]
    async fn test_stale_ticket_is_discarded() {
        let controller = controller(10);

        let a = controller
            .begin(Some("TCS".into()), Some(RangeSelection::FiveDays))
            .await
            .unwrap();
        let b = controller
            .begin(None, Some(RangeSelection::OneYear))
            .await
            .unwrap();
        assert!(b.token > a.token);
        assert_eq!(b.symbol, "TCS");

        assert_eq!(controller.complete(b, Ok(raw(3, 2.0))).await, Commit::Applied);
        assert_eq!(controller.complete(a, Ok(raw(8, 1.0))).await, Commit::Stale);

        let snapshot = controller.snapshot().await;
        let series = snapshot.committed.as_ref().and_then(CommittedChart::series).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.last_price(), Some(2.0));
        assert_eq!(snapshot.range, RangeSelection::OneYear);
    }

    #[tokio::test]
    async fn test_stale_failure_is_discarded() {
        let controller = controller(10);
        let old = controller.begin(Some("TCS".into()), None).await.unwrap();
        let current = controller.begin(None, None).await.unwrap();

        controller.complete(current, Ok(raw(4, 1.0))).await;
        let commit = controller
            .complete(old, Err(ServiceError::Network("timeout".into())))
            .await;
        assert_eq!(commit, Commit::Stale);
        assert!(controller.snapshot().await.committed.unwrap().series().is_some());
    }

    #[tokio::test]
    async fn test_failure_clears_series() {
        let controller = controller(10);
        controller.select_symbol("TCS").await;
        assert_eq!(controller.select_symbol("FAIL").await, Commit::Applied);

        let committed = controller.snapshot().await.committed.unwrap();
        assert_eq!(committed.symbol, "FAIL");
        match committed.result {
            ChartResult::Failed { message } => assert!(message.contains("No data found")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_payload_is_no_data() {
        let controller = controller(10);
        controller.select_symbol("EMPTY").await;
        assert_eq!(
            controller.snapshot().await.committed.map(|c| c.result),
            Some(ChartResult::NoData)
        );
        assert!(controller.snapshot().await.datasets().is_empty());
    }

    #[tokio::test]
    async fn test_blank_symbol_clears_selection() {
        let controller = controller(10);
        controller.select_symbol("TCS").await;
        let pending = controller.begin(None, None).await.unwrap();

        assert_eq!(controller.select_symbol("  ").await, Commit::Idle);
        assert_eq!(controller.complete(pending, Ok(raw(2, 1.0))).await, Commit::Stale);

        let snapshot = controller.snapshot().await;
        assert!(snapshot.symbol.is_none());
        assert!(snapshot.committed.is_none());
    }

    #[tokio::test]
    async fn test_options_toggle_without_refetch() {
        let controller = controller(5);
        controller.select_symbol("TCS").await;
        let token = controller.snapshot().await.token;

        assert_eq!(controller.snapshot().await.datasets().len(), 2);
        controller
            .set_options(ChartOptions {
                show_volume: false,
                show_moving_averages: true,
            })
            .await;

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.token, token);
        let labels: Vec<String> = snapshot.datasets().into_iter().map(|d| d.label).collect();
        assert_eq!(labels, vec!["TCS Price".to_string()]);
    }

    #[tokio::test]
    async fn test_pending_symbol_keeps_committed_labels() {
        let controller = controller(5);
        controller.select_symbol("TCS").await;
        let pending = controller.begin(Some("INFY".into()), None).await.unwrap();

        let snapshot = controller.snapshot().await;
        assert!(snapshot.loading);
        assert_eq!(snapshot.symbol.as_deref(), Some("INFY"));
        let labels: Vec<String> = snapshot.datasets().into_iter().map(|d| d.label).collect();
        assert_eq!(labels, vec!["TCS Price".to_string(), "Volume".to_string()]);

        controller.complete(pending, Ok(raw(5, 3.0))).await;
        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.committed.as_ref().unwrap().symbol, "INFY");
        assert_eq!(snapshot.datasets()[0].label, "INFY Price");
    }

    #[tokio::test]
    async fn test_stale_response_is_not_shaped() {
        let controller = controller(10);
        let old = controller.begin(Some("TCS".into()), None).await.unwrap();
        let _current = controller.begin(None, Some(RangeSelection::OneYear)).await.unwrap();

        let commit = controller.complete(old, Ok(raw(4, 1.0))).await;
        assert_eq!(commit, Commit::Stale);
        let snapshot = controller.snapshot().await;
        assert!(snapshot.loading);
        assert!(snapshot.committed.is_none());
    }

    #[tokio::test]
    async fn test_from_config_uses_window_and_range() {
        let config = ChartConfig {
            max_points: 10,
            default_range: "6m".into(),
            show_volume: false,
            show_moving_averages: false,
        };
        let controller = ChartController::from_config(Arc::new(FixedService { len: 50 }), &config);
        controller.select_symbol("TCS").await;

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.range, RangeSelection::SixMonths);
        assert!(!snapshot.options.show_volume);
        assert_eq!(snapshot.committed.unwrap().series().unwrap().len(), 10);
    }
}
