//! Filter engine.
//!
//! Evaluates a [`FilterSpec`] against a locally held record table. Every
//! active criterion must hold (logical AND); a record whose value for an
//! active metric is missing or non-numeric fails that criterion.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::record::StockRecord;
use super::spec::{ActiveFilter, FilterSpec};

// ============================================================================
// Filter Outcome
// ============================================================================

/// Counts for one filter pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterStats {
    pub input: usize,
    pub passed: usize,
    pub eliminated: usize,
    /// Elimination rate (%)
    pub elimination_rate: f64,
}

impl FilterStats {
    pub fn new(input: usize, passed: usize) -> Self {
        let eliminated = input.saturating_sub(passed);
        let elimination_rate = if input > 0 {
            (eliminated as f64 / input as f64) * 100.0
        } else {
            0.0
        };

        Self {
            input,
            passed,
            eliminated,
            elimination_rate,
        }
    }
}

/// Filtered table plus its counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOutcome {
    pub records: Vec<StockRecord>,
    pub stats: FilterStats,
}

// ============================================================================
// Evaluation
// ============================================================================

/// Apply `spec` to `records`, preserving input order.
///
/// With no active criterion the input is returned unchanged.
pub fn apply_filters(records: &[StockRecord], spec: &FilterSpec) -> Vec<StockRecord> {
    let active = spec.active_filters();
    let exchange = spec.exchange();

    if active.is_empty() && exchange.is_none() {
        return records.to_vec();
    }

    debug!(
        active_filters = active.len(),
        exchange = exchange.unwrap_or(""),
        input = records.len(),
        "Applying screener filters"
    );

    records
        .iter()
        .filter(|r| passes_all(r, &active, exchange))
        .cloned()
        .collect()
}

/// [`apply_filters`] with elimination counts.
pub fn apply_filters_with_stats(records: &[StockRecord], spec: &FilterSpec) -> FilterOutcome {
    let passed = apply_filters(records, spec);
    let stats = FilterStats::new(records.len(), passed.len());
    FilterOutcome {
        records: passed,
        stats,
    }
}

fn passes_all(record: &StockRecord, active: &[ActiveFilter], exchange: Option<&str>) -> bool {
    if let Some(exchange) = exchange {
        if record.exchange != exchange {
            return false;
        }
    }

    active.iter().all(|f| passes(record, f))
}

/// Single-criterion check. Unverifiable values fail.
pub fn passes(record: &StockRecord, filter: &ActiveFilter) -> bool {
    match record.metric(filter.metric) {
        Some(value) => filter.metric.direction().admits(value, filter.threshold),
        None => false,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screener::directory::Metric;
    use serde_json::Value;
    use test_case::test_case;

    fn stock(symbol: &str) -> StockRecord {
        StockRecord {
            symbol: symbol.to_string(),
            name: format!("Test {}", symbol),
            exchange: "NSE".to_string(),
            sector: "Technology".to_string(),
            ..Default::default()
        }
    }

    fn symbols(records: &[StockRecord]) -> Vec<&str> {
        records.iter().map(|r| r.symbol.as_str()).collect()
    }

    #[test]
    fn test_no_active_filters_is_identity() {
        let records = vec![
            stock("A").with_field("pe", 10),
            stock("B"),
            stock("C").with_field("pe", Value::Null),
        ];

        let spec = FilterSpec::new().with(Metric::Pe, "").with(Metric::Roe, "x");
        assert_eq!(apply_filters(&records, &spec), records);
        assert_eq!(apply_filters(&records, &FilterSpec::new()), records);
    }

    #[test_case(Metric::Pe, 20.0, 25.0, true ; "pe under max passes")]
    #[test_case(Metric::Pe, 20.0, 15.0, false ; "pe over max fails")]
    #[test_case(Metric::Pe, 20.0, 20.0, true ; "pe at max passes")]
    #[test_case(Metric::Roe, 18.0, 15.0, true ; "roe over min passes")]
    #[test_case(Metric::Roe, 18.0, 20.0, false ; "roe under min fails")]
    #[test_case(Metric::DebtToEquity, 0.4, 0.5, true ; "debt to equity under max passes")]
    #[test_case(Metric::MarketCap, 900.0, 1000.0, false ; "market cap under min fails")]
    fn test_directional(metric: Metric, value: f64, threshold: f64, expected: bool) {
        let records = vec![stock("A").with_field(metric.key(), value)];
        let spec = FilterSpec::new().with(metric, threshold);
        assert_eq!(apply_filters(&records, &spec).len() == 1, expected);
    }

    #[test]
    fn test_missing_value_fails_only_its_metric() {
        let records = vec![
            stock("NULLPE").with_field("pe", Value::Null).with_field("roe", 30),
            stock("NOPE").with_field("roe", 30),
            stock("TEXTPE").with_field("pe", "N/A").with_field("roe", 30),
        ];

        for threshold in [1.0, 1e9, -1e9] {
            let spec = FilterSpec::new().with(Metric::Pe, threshold);
            assert!(apply_filters(&records, &spec).is_empty());
        }

        let roe_only = FilterSpec::new().with(Metric::Roe, 15);
        assert_eq!(apply_filters(&records, &roe_only).len(), 3);
    }

    #[test]
    fn test_conjunction() {
        // Passes pe alone, fails roe alone
        let records = vec![stock("A").with_field("pe", 12).with_field("roe", 8)];

        let pe = FilterSpec::new().with(Metric::Pe, 15);
        let roe = FilterSpec::new().with(Metric::Roe, 10);
        assert_eq!(apply_filters(&records, &pe).len(), 1);
        assert!(apply_filters(&records, &roe).is_empty());

        let both = pe.with(Metric::Roe, 10);
        assert!(apply_filters(&records, &both).is_empty());
    }

    #[test]
    fn test_preserves_input_order() {
        let records = vec![
            stock("Z").with_field("beta", 0.9),
            stock("A").with_field("beta", 1.8),
            stock("M").with_field("beta", 0.5),
            stock("B").with_field("beta", 1.0),
        ];

        let spec = FilterSpec::new().with(Metric::Beta, 1.0);
        assert_eq!(symbols(&apply_filters(&records, &spec)), vec!["Z", "M", "B"]);
    }

    #[test]
    fn test_string_encoded_values_are_coerced() {
        let records = vec![
            stock("A").with_field("pb", "2.5"),
            stock("B").with_field("pb", "4"),
        ];

        let spec = FilterSpec::new().with(Metric::Pb, "3");
        assert_eq!(symbols(&apply_filters(&records, &spec)), vec!["A"]);
    }

    #[test]
    fn test_exchange_selector() {
        let mut bse = stock("B").with_field("pe", 10);
        bse.exchange = "BSE".to_string();
        let records = vec![stock("A").with_field("pe", 10), bse];

        let spec = FilterSpec::new().with_exchange("BSE");
        assert_eq!(symbols(&apply_filters(&records, &spec)), vec!["B"]);

        let spec = spec.with(Metric::Pe, 5);
        assert!(apply_filters(&records, &spec).is_empty());
    }

    #[test]
    fn test_stats() {
        let records = vec![
            stock("A").with_field("roe", 25),
            stock("B").with_field("roe", 5),
            stock("C").with_field("roe", 15),
            stock("D"),
        ];

        let outcome = apply_filters_with_stats(&records, &FilterSpec::new().with(Metric::Roe, 15));
        assert_eq!(symbols(&outcome.records), vec!["A", "C"]);
        assert_eq!(outcome.stats.input, 4);
        assert_eq!(outcome.stats.eliminated, 2);
        assert!((outcome.stats.elimination_rate - 50.0).abs() < 0.001);
    }

    #[test]
    fn test_stats_empty_input() {
        let stats = FilterStats::new(0, 0);
        assert_eq!(stats.elimination_rate, 0.0);
    }
}
