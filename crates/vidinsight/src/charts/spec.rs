//! Canonical chart specification.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Visual encoding of a chart.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PlotType {
    Pie,
    Donut,
    Gauge,
    Bar,
    Line,
    Histogram,
    Waterfall,
    /// "Data unavailable" card for charts whose series failed validation.
    Placeholder,
}

impl PlotType {
    /// Parses a plot-type hint from a raw chart record.
    /// Returns the type and, for bar hints, the orientation the hint implies.
    pub fn from_hint(hint: &str) -> Option<(PlotType, Option<Orientation>)> {
        let normalized = hint.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let parsed = match normalized.as_str() {
            "pie" | "pie_chart" => (PlotType::Pie, None),
            "donut" | "doughnut" => (PlotType::Donut, None),
            "gauge" | "radial" | "meter" => (PlotType::Gauge, None),
            "bar" | "bar_chart" | "column" | "vertical_bar" | "vbar" => {
                (PlotType::Bar, Some(Orientation::Vertical))
            }
            "horizontal_bar" | "hbar" => (PlotType::Bar, Some(Orientation::Horizontal)),
            "line" | "line_chart" | "area" => (PlotType::Line, None),
            "histogram" => (PlotType::Histogram, None),
            "waterfall" => (PlotType::Waterfall, None),
            _ => return None,
        };
        Some(parsed)
    }

    /// True for encodings that draw a categories/values pair.
    pub fn is_categorical(&self) -> bool {
        !matches!(self, PlotType::Gauge | PlotType::Placeholder)
    }
}

impl fmt::Display for PlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlotType::Pie => "Pie",
            PlotType::Donut => "Donut",
            PlotType::Gauge => "Gauge",
            PlotType::Bar => "Bar",
            PlotType::Line => "Line",
            PlotType::Histogram => "Histogram",
            PlotType::Waterfall => "Waterfall",
            PlotType::Placeholder => "Data unavailable",
        };
        write!(f, "{}", name)
    }
}

/// Bar direction. Only meaningful for [`PlotType::Bar`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

/// Health badge attached to a chart.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChartStatus {
    Excellent,
    #[default]
    Good,
    AttentionNeeded,
}

impl ChartStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "excellent" => Some(ChartStatus::Excellent),
            "good" => Some(ChartStatus::Good),
            "attention_needed" | "attention" | "needs_attention" | "warning" => {
                Some(ChartStatus::AttentionNeeded)
            }
            _ => None,
        }
    }

    /// Status derived from how full a gauge is.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= 0.8 {
            ChartStatus::Excellent
        } else if ratio >= 0.5 {
            ChartStatus::Good
        } else {
            ChartStatus::AttentionNeeded
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChartStatus::Excellent => "Excellent",
            ChartStatus::Good => "Good",
            ChartStatus::AttentionNeeded => "Attention needed",
        }
    }
}

/// Why a raw chart could not be turned into a renderable series.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartValidationFailure {
    #[error("chart record is not an object")]
    NotAnObject,

    #[error("chart record carries no series data")]
    NoData,

    #[error("categories and values must both be present")]
    MissingPair,

    #[error("series is empty")]
    EmptySeries,

    #[error("{categories} categories but {values} values")]
    LengthMismatch { categories: usize, values: usize },

    #[error("series contains a non-numeric or non-finite value")]
    NonNumericValue,

    #[error("gauge needs a finite value and a positive maximum")]
    InvalidGauge,
}

/// One named line/bar series of a multi-series chart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedSeries {
    pub name: String,
    pub values: Vec<f64>,
}

/// Series data of a chart. Downstream code only ever sees this union.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ChartSeries {
    Gauge {
        value: f64,
        max_value: f64,
        unit: String,
    },
    Categorical {
        categories: Vec<String>,
        values: Vec<f64>,
    },
    MultiSeries {
        categories: Vec<String>,
        series: Vec<NamedSeries>,
    },
    Unavailable {
        reason: ChartValidationFailure,
    },
}

/// Renderable description of one chart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    pub id: String,
    pub title: String,
    pub plot_type: PlotType,
    #[serde(default)]
    pub orientation: Orientation,
    pub series: ChartSeries,
    #[serde(default)]
    pub status: ChartStatus,
    #[serde(default)]
    pub insights: Vec<String>,
    /// Chart this one was derived from. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
}

impl ChartSpec {
    /// True unless the chart is the "data unavailable" placeholder.
    pub fn is_available(&self) -> bool {
        !matches!(self.series, ChartSeries::Unavailable { .. })
    }

    /// Key of this chart's encoding inside the categorical variant family.
    pub(crate) fn encoding_tag(&self) -> Option<&'static str> {
        match (self.plot_type, self.orientation) {
            (PlotType::Pie, _) => Some("pie"),
            (PlotType::Donut, _) => Some("donut"),
            (PlotType::Bar, Orientation::Horizontal) => Some("hbar"),
            (PlotType::Bar, Orientation::Vertical) => Some("vbar"),
            _ => None,
        }
    }

    /// Plain-text lines describing the series, used wherever the chart
    /// cannot be shown as an image.
    pub fn series_lines(&self) -> Vec<String> {
        use crate::analytics::format_number;

        match &self.series {
            ChartSeries::Gauge {
                value,
                max_value,
                unit,
            } => {
                let unit = if unit.is_empty() {
                    String::new()
                } else {
                    format!(" {}", unit)
                };
                vec![format!(
                    "Value: {}{} of {}{}",
                    format_number(*value),
                    unit,
                    format_number(*max_value),
                    unit
                )]
            }
            ChartSeries::Categorical { categories, values } => categories
                .iter()
                .zip(values)
                .map(|(category, value)| format!("{}: {}", category, format_number(*value)))
                .collect(),
            ChartSeries::MultiSeries { categories, series } => {
                let mut lines = vec![format!("Categories: {}", categories.join(", "))];
                for named in series {
                    let values: Vec<String> =
                        named.values.iter().map(|v| format_number(*v)).collect();
                    lines.push(format!("{}: {}", named.name, values.join(", ")));
                }
                lines
            }
            ChartSeries::Unavailable { reason } => {
                vec![format!("Data unavailable: {}", reason)]
            }
        }
    }
}
