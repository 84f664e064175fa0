//! Chart data pipeline.
//!
//! Clean, conform, then window. Each step is a pure function over slices
//! so the length and alignment invariants can be checked in isolation.

use serde_json::Value;
use tracing::debug;

use super::series::{ChartOutcome, ChartSeries, Point, PriceAxis, TimeSeriesRaw, VolumeAxis};

/// Trailing window applied to every series.
pub const MAX_POINTS: usize = 200;

/// Replace every element that is not a finite JSON number with `None`.
///
/// Length is preserved.
pub fn clean(values: &[Value]) -> Vec<Point> {
    values
        .iter()
        .map(|v| v.as_f64().filter(|n| n.is_finite()))
        .collect()
}

/// Keep the trailing `max_points` elements.
pub fn window<T>(values: &[T], max_points: usize) -> &[T] {
    let start = values.len().saturating_sub(max_points);
    &values[start..]
}

/// Force a series onto the label axis: pad missing tail entries with gaps,
/// drop entries past the last label.
fn conform(mut values: Vec<Point>, len: usize) -> Vec<Point> {
    values.resize(len, None);
    values
}

fn label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// Label axis: supplied dates, or ordinals `1..=len` when there are none.
fn labels(dates: Option<&[Value]>, len: usize) -> Vec<String> {
    match dates {
        Some(dates) if !dates.is_empty() => dates.iter().map(label).collect(),
        _ => (1..=len).map(|i| i.to_string()).collect(),
    }
}

/// Shape a payload with the default [`MAX_POINTS`] window.
pub fn shape(raw: &TimeSeriesRaw) -> ChartOutcome {
    shape_with_limit(raw, MAX_POINTS)
}

/// Shape a payload with a custom trailing window (at least one point).
pub fn shape_with_limit(raw: &TimeSeriesRaw, max_points: usize) -> ChartOutcome {
    let prices = match raw.prices.as_deref() {
        Some(prices) if !prices.is_empty() => prices,
        _ => return ChartOutcome::NoData,
    };
    let max_points = max_points.max(1);

    let dates = raw.dates.as_deref().filter(|d| !d.is_empty());
    let len = dates.map_or(prices.len(), <[Value]>::len);

    if len > max_points {
        debug!(points = len, kept = max_points, "Windowing chart series");
    }

    let prepare = |values: &[Value]| -> Vec<Point> {
        let aligned = conform(clean(values), len);
        window(&aligned, max_points).to_vec()
    };

    let all_labels = labels(dates, len);
    let labels = window(&all_labels, max_points).to_vec();

    let primary = PriceAxis {
        labels: labels.clone(),
        price: prepare(prices),
        ma20: raw.ma20.as_deref().map(prepare),
        ma50: raw.ma50.as_deref().map(prepare),
    };

    let volume = raw.volumes.as_deref().map(|volumes| VolumeAxis {
        labels,
        volume: prepare(volumes),
    });

    ChartOutcome::Ready(ChartSeries { primary, volume })
}

// ============================================================================
// Tests
// ============================================================================
