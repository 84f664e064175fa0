//! Metric directory.
//!
//! Closed registry of every screenable metric. Direction and display
//! metadata come from exhaustive matches, so adding a variant without
//! deciding its comparison direction does not compile.

use serde::{Deserialize, Serialize};

// ============================================================================
// Direction
// ============================================================================

/// How a threshold bounds a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Passes when `value <= threshold`
    AtMost,
    /// Passes when `value >= threshold`
    AtLeast,
}

impl Direction {
    /// Compare a record value against a threshold.
    pub fn admits(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::AtMost => value <= threshold,
            Self::AtLeast => value >= threshold,
        }
    }

    /// Comparison operator as shown next to an input.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::AtMost => "<=",
            Self::AtLeast => ">=",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AtMost => write!(f, "at most"),
            Self::AtLeast => write!(f, "at least"),
        }
    }
}

// ============================================================================
// Metric Groups
// ============================================================================

/// Tab grouping used by the screener form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricGroup {
    Valuation,
    Profitability,
    Growth,
    FinancialHealth,
    Dividend,
    PerShare,
    CashFlow,
    Trading,
}

impl MetricGroup {
    pub const ALL: [MetricGroup; 8] = [
        Self::Valuation,
        Self::Profitability,
        Self::Growth,
        Self::FinancialHealth,
        Self::Dividend,
        Self::PerShare,
        Self::CashFlow,
        Self::Trading,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::Valuation => "Valuation Metrics",
            Self::Profitability => "Profitability Metrics",
            Self::Growth => "Growth Metrics",
            Self::FinancialHealth => "Financial Health",
            Self::Dividend => "Dividend Metrics",
            Self::PerShare => "Per Share Metrics",
            Self::CashFlow => "Cash Flow Ratios",
            Self::Trading => "Volume and Risk",
        }
    }

    /// Metrics in this group, in directory order.
    pub fn metrics(self) -> impl Iterator<Item = Metric> {
        Metric::ALL.into_iter().filter(move |m| m.group() == self)
    }
}

// ============================================================================
// Metrics
// ============================================================================

/// A screenable numeric metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    Pe,
    Pb,
    Ps,
    Peg,
    EnterpriseToEbitda,
    Roe,
    Roce,
    Roa,
    OperatingMargin,
    ProfitMargin,
    RevenueGrowth,
    EarningsGrowth,
    Cagr5Y,
    MarketCap,
    DebtToEquity,
    CurrentRatio,
    QuickRatio,
    InterestCoverage,
    DividendYield,
    PayoutRatio,
    DividendGrowth,
    Eps,
    BookValuePerShare,
    CashPerShare,
    PriceToCashFlow,
    PriceToFreeCashFlow,
    AvgVolume,
    Beta,
}

/// Display and comparison metadata for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricDescriptor {
    /// Wire key in records and filter specs
    pub key: &'static str,
    pub label: &'static str,
    pub placeholder: &'static str,
    pub group: MetricGroup,
    pub direction: Direction,
}

impl Metric {
    pub const ALL: [Metric; 28] = [
        Self::Pe,
        Self::Pb,
        Self::Ps,
        Self::Peg,
        Self::EnterpriseToEbitda,
        Self::Roe,
        Self::Roce,
        Self::Roa,
        Self::OperatingMargin,
        Self::ProfitMargin,
        Self::RevenueGrowth,
        Self::EarningsGrowth,
        Self::Cagr5Y,
        Self::MarketCap,
        Self::DebtToEquity,
        Self::CurrentRatio,
        Self::QuickRatio,
        Self::InterestCoverage,
        Self::DividendYield,
        Self::PayoutRatio,
        Self::DividendGrowth,
        Self::Eps,
        Self::BookValuePerShare,
        Self::CashPerShare,
        Self::PriceToCashFlow,
        Self::PriceToFreeCashFlow,
        Self::AvgVolume,
        Self::Beta,
    ];

    /// Resolve a wire key. Keys outside the directory cannot become filters.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.key() == key)
    }

    pub fn key(self) -> &'static str {
        self.descriptor().key
    }

    pub fn direction(self) -> Direction {
        self.descriptor().direction
    }

    pub fn group(self) -> MetricGroup {
        self.descriptor().group
    }

    pub fn label(self) -> &'static str {
        self.descriptor().label
    }

    pub fn descriptor(self) -> MetricDescriptor {
        use Direction::{AtLeast, AtMost};
        use MetricGroup::*;

        let (key, label, placeholder, group, direction) = match self {
            Self::Pe => ("pe", "P/E Ratio", "Max P/E", Valuation, AtMost),
            Self::Pb => ("pb", "P/B Ratio", "Max P/B", Valuation, AtMost),
            Self::Ps => ("ps", "P/S Ratio", "Max P/S", Valuation, AtMost),
            Self::Peg => ("peg", "PEG Ratio", "Max PEG", Valuation, AtMost),
            Self::EnterpriseToEbitda => {
                ("enterpriseToEbitda", "EV/EBITDA", "Max EV/EBITDA", Valuation, AtMost)
            }
            Self::Roe => ("roe", "ROE (%)", "Min ROE", Profitability, AtLeast),
            Self::Roce => ("roce", "ROCE (%)", "Min ROCE", Profitability, AtLeast),
            Self::Roa => ("roa", "ROA (%)", "Min ROA", Profitability, AtLeast),
            Self::OperatingMargin => (
                "operatingMargin",
                "Operating Margin (%)",
                "Min Margin",
                Profitability,
                AtLeast,
            ),
            Self::ProfitMargin => {
                ("profitMargin", "Profit Margin (%)", "Min Margin", Profitability, AtLeast)
            }
            Self::RevenueGrowth => {
                ("revenueGrowth", "Revenue Growth (%)", "Min Growth", Growth, AtLeast)
            }
            Self::EarningsGrowth => {
                ("earningsGrowth", "Earnings Growth (%)", "Min Growth", Growth, AtLeast)
            }
            Self::Cagr5Y => ("cagr5Y", "5-Year CAGR (%)", "Min CAGR", Growth, AtLeast),
            Self::MarketCap => {
                ("marketCap", "Market Cap (Cr)", "Min Market Cap", FinancialHealth, AtLeast)
            }
            Self::DebtToEquity => {
                ("debtToEquity", "Debt to Equity", "Max D/E", FinancialHealth, AtMost)
            }
            Self::CurrentRatio => {
                ("currentRatio", "Current Ratio", "Min Ratio", FinancialHealth, AtLeast)
            }
            Self::QuickRatio => ("quickRatio", "Quick Ratio", "Min Ratio", FinancialHealth, AtLeast),
            Self::InterestCoverage => (
                "interestCoverage",
                "Interest Coverage",
                "Min Coverage",
                FinancialHealth,
                AtLeast,
            ),
            Self::DividendYield => {
                ("dividendYield", "Dividend Yield (%)", "Min Yield", Dividend, AtLeast)
            }
            Self::PayoutRatio => ("payoutRatio", "Payout Ratio (%)", "Max Ratio", Dividend, AtMost),
            Self::DividendGrowth => {
                ("dividendGrowth", "Dividend Growth (%)", "Min Growth", Dividend, AtLeast)
            }
            Self::Eps => ("eps", "EPS", "Min EPS", PerShare, AtLeast),
            Self::BookValuePerShare => {
                ("bookValuePerShare", "Book Value / Share", "Min BVPS", PerShare, AtLeast)
            }
            Self::CashPerShare => ("cashPerShare", "Cash / Share", "Min Cash", PerShare, AtLeast),
            Self::PriceToCashFlow => {
                ("priceToCashFlow", "Price / Cash Flow", "Max P/CF", CashFlow, AtMost)
            }
            Self::PriceToFreeCashFlow => (
                "priceToFreeCashFlow",
                "Price / Free Cash Flow",
                "Max P/FCF",
                CashFlow,
                AtMost,
            ),
            Self::AvgVolume => ("avgVolume", "Average Volume", "Min Volume", Trading, AtLeast),
            Self::Beta => ("beta", "Beta", "Max Beta", Trading, AtMost),
        };

        MetricDescriptor {
            key,
            label,
            placeholder,
            group,
            direction,
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for Metric {
    type Err = sense_common::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s.trim())
            .ok_or_else(|| sense_common::Error::InvalidInput(format!("unknown metric '{}'", s)))
    }
}

impl Serialize for Metric {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for Metric {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        Self::from_key(&key)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown metric '{}'", key)))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_keys_round_trip_and_are_unique() {
        let mut seen = HashSet::new();
        for metric in Metric::ALL {
            assert!(seen.insert(metric.key()), "duplicate key {}", metric.key());
            assert_eq!(Metric::from_key(metric.key()), Some(metric));
        }
    }

    #[test]
    fn test_unknown_key_is_not_a_metric() {
        assert_eq!(Metric::from_key("exchange"), None);
        assert_eq!(Metric::from_key("PE"), None);
        assert!("sharpe".parse::<Metric>().is_err());
    }

    #[test]
    fn test_directions_match_screener_bounds() {
        assert_eq!(Metric::Pe.direction(), Direction::AtMost);
        assert_eq!(Metric::DebtToEquity.direction(), Direction::AtMost);
        assert_eq!(Metric::PayoutRatio.direction(), Direction::AtMost);
        assert_eq!(Metric::Beta.direction(), Direction::AtMost);
        assert_eq!(Metric::Roe.direction(), Direction::AtLeast);
        assert_eq!(Metric::MarketCap.direction(), Direction::AtLeast);
        assert_eq!(Metric::Cagr5Y.direction(), Direction::AtLeast);
    }

    #[test]
    fn test_direction_admits_boundary() {
        assert!(Direction::AtMost.admits(25.0, 25.0));
        assert!(Direction::AtLeast.admits(25.0, 25.0));
        assert!(!Direction::AtMost.admits(25.1, 25.0));
        assert!(!Direction::AtLeast.admits(24.9, 25.0));
    }

    #[test]
    fn test_every_metric_has_a_group() {
        let grouped: usize = MetricGroup::ALL.iter().map(|g| g.metrics().count()).sum();
        assert_eq!(grouped, Metric::ALL.len());
        assert_eq!(
            MetricGroup::Valuation.metrics().collect::<Vec<_>>(),
            vec![
                Metric::Pe,
                Metric::Pb,
                Metric::Ps,
                Metric::Peg,
                Metric::EnterpriseToEbitda
            ]
        );
    }

    #[test]
    fn test_metric_serde_uses_wire_key() {
        let json = serde_json::to_string(&Metric::EnterpriseToEbitda).unwrap();
        assert_eq!(json, "\"enterpriseToEbitda\"");
        let parsed: Metric = serde_json::from_str("\"cagr5Y\"").unwrap();
        assert_eq!(parsed, Metric::Cagr5Y);
        assert!(serde_json::from_str::<Metric>("\"vwap\"").is_err());
    }
}
