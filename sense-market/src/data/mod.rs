//! Market data access.
//!
//! # Components
//! - **MarketService**: async trait over the three remote endpoints
//! - **HttpMarketService**: `reqwest` adapter used by the CLI

mod http;
mod provider;
mod sanitize;

pub use http::HttpMarketService;
pub use provider::{FilterContext, MarketService, ServiceError};
pub use sanitize::sanitize_non_finite;
