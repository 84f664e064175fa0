//! Chart range selection.

use serde::{Deserialize, Serialize};

/// Historical range offered by the chart controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RangeSelection {
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1w")]
    OneWeek,
    #[default]
    #[serde(rename = "1m")]
    OneMonth,
    #[serde(rename = "6m")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "5y")]
    FiveYears,
}

impl RangeSelection {
    pub const ALL: [RangeSelection; 6] = [
        Self::FiveDays,
        Self::OneWeek,
        Self::OneMonth,
        Self::SixMonths,
        Self::OneYear,
        Self::FiveYears,
    ];

    /// Query token sent as `?range=`.
    pub fn token(self) -> &'static str {
        match self {
            Self::FiveDays => "5d",
            Self::OneWeek => "1w",
            Self::OneMonth => "1m",
            Self::SixMonths => "6m",
            Self::OneYear => "1y",
            Self::FiveYears => "5y",
        }
    }

    /// Button label.
    pub fn label(self) -> &'static str {
        match self {
            Self::FiveDays => "5 Days",
            Self::OneWeek => "1 Week",
            Self::OneMonth => "1 Month",
            Self::SixMonths => "6 Months",
            Self::OneYear => "1 Year",
            Self::FiveYears => "5 Years",
        }
    }

    /// Bar interval and lookback period the service resolves the token to.
    pub fn interval_and_period(self) -> (&'static str, &'static str) {
        match self {
            Self::FiveDays => ("1d", "5d"),
            Self::OneWeek => ("1d", "1wk"),
            Self::OneMonth => ("1d", "1mo"),
            Self::SixMonths => ("1d", "6mo"),
            Self::OneYear => ("1d", "1y"),
            Self::FiveYears => ("1wk", "5y"),
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.token() == token)
    }

    /// Parse a configured default, falling back to one month.
    pub fn from_config_or_default(token: &str) -> Self {
        Self::from_token(token).unwrap_or_else(|| {
            tracing::warn!(range = %token, "Unknown default chart range, using 1m");
            Self::default()
        })
    }
}

impl std::fmt::Display for RangeSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

impl std::str::FromStr for RangeSelection {
    type Err = sense_common::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s.trim().to_lowercase().as_str()).ok_or_else(|| {
            sense_common::Error::InvalidInput(format!(
                "unknown range '{}', expected one of 5d, 1w, 1m, 6m, 1y, 5y",
                s
            ))
        })
    }
}
