//! Chart data types: the raw payload in, the aligned series out.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use sense_common::config::ChartConfig;

/// A plotted value; `None` is an explicit gap that keeps index alignment.
pub type Point = Option<f64>;

// ============================================================================
// Raw Payload
// ============================================================================

/// Historical payload as returned by the service.
///
/// Sequences are parallel by index but nothing guarantees equal length
/// or numeric content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesRaw {
    #[serde(default)]
    pub dates: Option<Vec<Value>>,
    #[serde(default)]
    pub prices: Option<Vec<Value>>,
    #[serde(default)]
    pub volumes: Option<Vec<Value>>,
    #[serde(default)]
    pub ma20: Option<Vec<Value>>,
    #[serde(default)]
    pub ma50: Option<Vec<Value>>,
}

// ============================================================================
// Shaped Series
// ============================================================================

/// Price axis group: price plus whichever moving averages were supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAxis {
    pub labels: Vec<String>,
    pub price: Vec<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ma20: Option<Vec<Point>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ma50: Option<Vec<Point>>,
}

/// Secondary axis group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeAxis {
    pub labels: Vec<String>,
    pub volume: Vec<Point>,
}

/// Plot-ready data. Every sequence has the same length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub primary: PriceAxis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<VolumeAxis>,
}

/// Result of shaping a payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "series", rename_all = "snake_case")]
pub enum ChartOutcome {
    Ready(ChartSeries),
    /// Valid empty response; rendered as an explicit "no data" state
    NoData,
}

impl ChartOutcome {
    pub fn series(&self) -> Option<&ChartSeries> {
        match self {
            Self::Ready(series) => Some(series),
            Self::NoData => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }
}

// ============================================================================
// Datasets
// ============================================================================

/// Which y-axis a dataset is drawn against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    #[serde(rename = "y")]
    Price,
    #[serde(rename = "y1")]
    Volume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Line,
    Bar,
}

/// One dataset handed to the chart renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub label: String,
    pub kind: DatasetKind,
    pub axis: Axis,
    pub dashed: bool,
    pub data: Vec<Point>,
}

/// Display toggles; applied to an already shaped series, no re-fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartOptions {
    pub show_volume: bool,
    pub show_moving_averages: bool,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            show_volume: true,
            show_moving_averages: true,
        }
    }
}

impl From<&ChartConfig> for ChartOptions {
    fn from(config: &ChartConfig) -> Self {
        Self {
            show_volume: config.show_volume,
            show_moving_averages: config.show_moving_averages,
        }
    }
}

impl ChartSeries {
    /// Number of points on the label axis.
    pub fn len(&self) -> usize {
        self.primary.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.primary.labels
    }

    /// Most recent valid price, if any.
    pub fn last_price(&self) -> Option<f64> {
        self.primary.price.iter().rev().find_map(|p| *p)
    }

    /// Datasets in draw order: price, moving averages, volume.
    pub fn datasets(&self, symbol: &str, options: &ChartOptions) -> Vec<Dataset> {
        let mut datasets = vec![Dataset {
            label: format!("{} Price", symbol),
            kind: DatasetKind::Line,
            axis: Axis::Price,
            dashed: false,
            data: self.primary.price.clone(),
        }];

        if options.show_moving_averages {
            let averages = [
                ("20-day MA", &self.primary.ma20),
                ("50-day MA", &self.primary.ma50),
            ];
            for (label, series) in averages {
                if let Some(data) = series {
                    datasets.push(Dataset {
                        label: label.to_string(),
                        kind: DatasetKind::Line,
                        axis: Axis::Price,
                        dashed: true,
                        data: data.clone(),
                    });
                }
            }
        }

        if options.show_volume {
            if let Some(volume) = &self.volume {
                datasets.push(Dataset {
                    label: "Volume".to_string(),
                    kind: DatasetKind::Bar,
                    axis: Axis::Volume,
                    dashed: false,
                    data: volume.volume.clone(),
                });
            }
        }

        datasets
    }
}
