//! Stock screener.
//!
//! # Architecture
//!
//! ```text
//! MetricDirectory ──▶ FilterSpec ──▶ apply_filters ──▶ results
//!   (key, label,        (thresholds,     (AND over every
//!    direction)          exchange)        active filter)
//! ```
//!
//! The engine is pure. [`ScreenerSession`] owns the loaded record table
//! and re-runs the engine whenever the filter form changes.

mod directory;
mod engine;
mod record;
mod session;
mod spec;

pub use directory::{Direction, Metric, MetricDescriptor, MetricGroup};
pub use engine::{apply_filters, apply_filters_with_stats, passes, FilterOutcome, FilterStats};
pub use record::{coerce_number, StockRecord};
pub use session::ScreenerSession;
pub use spec::{ActiveFilter, FilterSpec, EXCHANGE_KEY};
