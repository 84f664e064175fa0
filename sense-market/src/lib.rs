//! Sense Market Library
//!
//! Client-side engines for a financial-market browser: a stock screener
//! that filters a locally held record table, and a chart pipeline that
//! turns raw historical payloads into aligned, bounded series.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       sense-market                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌───────────────┐   ┌────────────────┐   ┌──────────────────┐  │
//! │  │  screener     │   │  chart         │   │  controller      │  │
//! │  │  directory    │   │  clean/window  │◀──│  token guard     │  │
//! │  │  filter engine│   │  shape         │   │  range/symbol    │  │
//! │  └───────▲───────┘   └────────────────┘   └────────┬─────────┘  │
//! │          │                                         │            │
//! │  ┌───────┴─────────────────────────────────────────▼─────────┐  │
//! │  │  data: MarketService trait, HttpMarketService (reqwest)   │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The filter engine and the pipeline are synchronous and stateless. The
//! only suspension points are the fetches made by [`controller`] and
//! [`screener::ScreenerSession`].

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod chart;
pub mod controller;
pub mod data;
pub mod screener;

pub use chart::{shape, ChartOptions, ChartOutcome, ChartSeries, RangeSelection, TimeSeriesRaw};
pub use controller::{
    ChartController, ChartResult, ChartSnapshot, Commit, CommittedChart, RequestTicket,
};
pub use data::{FilterContext, HttpMarketService, MarketService, ServiceError};
pub use screener::{apply_filters, FilterSpec, Metric, ScreenerSession, StockRecord};
