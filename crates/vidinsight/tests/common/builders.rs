//! Builders for creating test data without repetitive boilerplate.

#![allow(dead_code)]

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

use vidinsight::analytics::{AnalyticsRecord, GeneratedSummary, MetricValue};
use vidinsight::charts::RawChart;
use vidinsight::client::{Priority, RecordId, ServerJobRecord};
use vidinsight::tracker::{ProcessingJob, SubmitRequest};

/// A request that passes validation.
pub fn valid_request() -> SubmitRequest {
    SubmitRequest::new("https://videos.example.com/clip.mp4", 1, 1, 1).with_video_name("Clip")
}

/// Server listing entry for a job id.
pub fn server_record(job_id: &str, status: &str) -> ServerJobRecord {
    ServerJobRecord {
        id: Some(RecordId::Number(7)),
        uuid: Some(job_id.to_string()),
        video_title: Some("Clip".to_string()),
        processing_status: status.to_string(),
        confidence_score: Some(0.9),
        error_message: None,
    }
}

/// A live job submitted `age` ago.
pub fn job_aged(job_id: &str, age: Duration, now: DateTime<Utc>) -> ProcessingJob {
    ProcessingJob::new(job_id, "Clip", Priority::Normal, now - age)
}

pub fn categorical_chart(id: &str) -> RawChart {
    RawChart::new(json!({
        "id": id,
        "title": "Sentiment",
        "category": ["Positive", "Negative"],
        "value": [3, 7],
        "insights": ["Mostly negative"],
    }))
}

pub fn gauge_chart(id: &str, value: f64) -> RawChart {
    RawChart::new(json!({
        "id": id,
        "title": "Engagement",
        "value": value,
        "max_value": 100,
        "unit": "%",
    }))
}

pub fn raw(value: Value) -> RawChart {
    RawChart::new(value)
}

/// Builder for `AnalyticsRecord` instances.
pub struct RecordBuilder {
    record: AnalyticsRecord,
}

impl RecordBuilder {
    pub fn new(uuid: &str) -> Self {
        Self {
            record: AnalyticsRecord {
                id: RecordId::Number(7),
                uuid: uuid.to_string(),
                confidence_score: 87.25,
                status: "completed".to_string(),
                video_title: Some("Quarterly Review".to_string()),
                parsed_metrics: BTreeMap::new(),
                generated_charts: Vec::new(),
                generated_summary: None,
                processing_started_at: None,
                processing_completed_at: None,
            },
        }
    }

    pub fn metric(mut self, key: &str, value: MetricValue) -> Self {
        self.record.parsed_metrics.insert(key.to_string(), value);
        self
    }

    pub fn chart(mut self, chart: RawChart) -> Self {
        self.record.generated_charts.push(chart);
        self
    }

    pub fn summary(mut self, content: &str) -> Self {
        self.record.generated_summary = Some(GeneratedSummary {
            content: content.to_string(),
            ..GeneratedSummary::default()
        });
        self
    }

    pub fn build(self) -> AnalyticsRecord {
        self.record
    }
}
