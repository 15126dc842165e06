//! Analytics result model returned for a completed job.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::charts::{self, ChartSpec, RawChart};
use crate::client::payload::{deserialize_lenient, deserialize_null_default};
use crate::client::RecordId;

/// Stringified form of a JavaScript object that leaked into metric values.
const OBJECT_PLACEHOLDER: &str = "[object Object]";

/// One parsed metric value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
    Flag(bool),
    Other(Value),
}

impl MetricValue {
    /// Human-readable value, or `None` when the metric has nothing worth
    /// showing (objects, nulls, empty strings, object placeholders).
    pub fn display(&self) -> Option<String> {
        match self {
            MetricValue::Number(n) => Some(format_number(*n)),
            MetricValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() || trimmed == OBJECT_PLACEHOLDER {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            MetricValue::Flag(b) => Some(b.to_string()),
            MetricValue::Other(Value::Array(items)) => {
                let parts: Vec<String> = items
                    .iter()
                    .filter_map(|item| {
                        serde_json::from_value::<MetricValue>(item.clone())
                            .ok()
                            .and_then(|v| v.display())
                    })
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join(", "))
                }
            }
            MetricValue::Other(_) => None,
        }
    }
}

/// Formats a number without a trailing `.0` for whole values.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        let formatted = format!("{:.2}", n);
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

/// One titled section of the narrative summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(from = "SectionRepr")]
pub struct SummarySection {
    pub title: String,
    pub content: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SectionRepr {
    Plain(String),
    Titled {
        #[serde(default, alias = "heading")]
        title: String,
        #[serde(default, alias = "text", alias = "body")]
        content: String,
    },
}

impl From<SectionRepr> for SummarySection {
    fn from(repr: SectionRepr) -> Self {
        match repr {
            SectionRepr::Plain(content) => Self {
                title: String::new(),
                content,
            },
            SectionRepr::Titled { title, content } => Self { title, content },
        }
    }
}

/// Generated narrative summary of an analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSummary {
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub content: String,
    #[serde(default)]
    pub sections: Vec<SummarySection>,
    #[serde(default, alias = "word_count")]
    pub word_count: Option<u64>,
    #[serde(default, alias = "metrics_highlighted")]
    pub metrics_highlighted: Vec<String>,
}

impl GeneratedSummary {
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
            && self.sections.iter().all(|s| s.content.trim().is_empty())
    }

    /// Word count as reported, or counted from the content.
    pub fn effective_word_count(&self) -> u64 {
        self.word_count
            .unwrap_or_else(|| self.content.split_whitespace().count() as u64)
    }
}

/// Full analytics result of one completed job. Read-only after fetch; a
/// refresh replaces the whole record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsRecord {
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub id: RecordId,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub uuid: String,
    #[serde(
        default,
        alias = "confidence_score",
        deserialize_with = "deserialize_null_default"
    )]
    pub confidence_score: f64,
    #[serde(
        default,
        alias = "processing_status",
        deserialize_with = "deserialize_null_default"
    )]
    pub status: String,
    #[serde(default, alias = "video_title")]
    pub video_title: Option<String>,
    #[serde(
        default,
        alias = "parsed_metrics",
        deserialize_with = "deserialize_lenient"
    )]
    pub parsed_metrics: BTreeMap<String, MetricValue>,
    #[serde(
        default,
        alias = "generated_charts",
        deserialize_with = "deserialize_lenient"
    )]
    pub generated_charts: Vec<RawChart>,
    #[serde(
        default,
        alias = "generated_summary",
        deserialize_with = "deserialize_lenient"
    )]
    pub generated_summary: Option<GeneratedSummary>,
    #[serde(default, alias = "processing_started_at")]
    pub processing_started_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "processing_completed_at")]
    pub processing_completed_at: Option<DateTime<Utc>>,
}

impl AnalyticsRecord {
    /// Identifier used in file names and report headers: the uuid when the
    /// server sent one, the numeric id otherwise.
    pub fn display_id(&self) -> String {
        if self.uuid.trim().is_empty() {
            self.id.to_string()
        } else {
            self.uuid.clone()
        }
    }

    /// Normalized chart specifications, in payload order.
    pub fn charts(&self) -> Vec<ChartSpec> {
        charts::normalize_all(&self.generated_charts)
    }

    /// The summary, if it has any text.
    pub fn summary(&self) -> Option<&GeneratedSummary> {
        self.generated_summary.as_ref().filter(|s| !s.is_empty())
    }

    /// Confidence score clamped to the 0–100 range.
    pub fn confidence_percent(&self) -> f64 {
        if self.confidence_score.is_finite() {
            self.confidence_score.clamp(0.0, 100.0)
        } else {
            0.0
        }
    }
}
