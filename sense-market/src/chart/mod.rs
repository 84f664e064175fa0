//! Chart data module.
//!
//! Turns a raw historical payload into plot-ready series.
//!
//! # Pipeline
//!
//! ```text
//! TimeSeriesRaw ──▶ clean ──▶ conform to label axis ──▶ window (MAX_POINTS)
//!                                                          │
//!                               ChartOutcome::Ready ◀──────┤
//!                               ChartOutcome::NoData ◀─────┘ (no prices)
//! ```

mod pipeline;
mod range;
mod series;

pub use pipeline::{clean, shape, shape_with_limit, window, MAX_POINTS};
pub use range::RangeSelection;
pub use series::{
    Axis, ChartOptions, ChartOutcome, ChartSeries, Dataset, DatasetKind, Point, PriceAxis,
    TimeSeriesRaw, VolumeAxis,
};
