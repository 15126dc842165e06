//! Processing jobs and their lifecycle.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{Priority, SubmitJobPayload};
use crate::error::SubmissionError;

/// Lifecycle state of a tracked job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    TimedOut,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::TimedOut
        )
    }

    fn rank(&self) -> u8 {
        match self {
            JobStatus::Queued => 0,
            JobStatus::Processing => 1,
            JobStatus::Completed | JobStatus::Failed | JobStatus::TimedOut => 2,
        }
    }

    /// Transitions only move forward and terminal states are absorbing.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "Queued"),
            JobStatus::Processing => write!(f, "Processing"),
            JobStatus::Completed => write!(f, "Completed"),
            JobStatus::Failed => write!(f, "Failed"),
            JobStatus::TimedOut => write!(f, "Timed out"),
        }
    }
}

/// Processing status as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ServerStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ServerStatus::Completed | ServerStatus::Failed)
    }
}

/// Parses a server processing status. Unknown values are treated as still
/// processing so the job is revisited on the next tick.
pub fn parse_server_status(s: &str, job_id: &str) -> ServerStatus {
    match s.trim().to_ascii_lowercase().as_str() {
        "completed" | "complete" | "done" | "success" => ServerStatus::Completed,
        "failed" | "error" => ServerStatus::Failed,
        "queued" | "pending" => ServerStatus::Pending,
        "processing" | "in_progress" | "running" => ServerStatus::Processing,
        other => {
            log::warn!(
                "Unknown server status '{}' for job {}, treating as processing",
                other,
                job_id
            );
            ServerStatus::Processing
        }
    }
}

/// One video submitted for analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingJob {
    /// Server-issued job id (the analytics uuid).
    pub job_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<i64>,
    pub video_name: String,
    pub status: JobStatus,
    pub priority: Priority,
    pub submitted_at: DateTime<Utc>,
    /// Advisory only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_completion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
}

impl ProcessingJob {
    /// Creates a queued job.
    pub fn new(job_id: &str, video_name: &str, priority: Priority, submitted_at: DateTime<Utc>) -> Self {
        Self {
            job_id: job_id.to_string(),
            video_id: None,
            video_name: video_name.to_string(),
            status: JobStatus::Queued,
            priority,
            submitted_at,
            estimated_completion: None,
            error_message: None,
            completed_at: None,
            confidence_score: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Moves the job to `next`. Returns false and leaves the job untouched
    /// when the transition would go backwards or leave a terminal state.
    pub fn transition(&mut self, next: JobStatus, at: DateTime<Utc>) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        if next.is_terminal() {
            self.completed_at = Some(at);
        }
        true
    }

    /// Time since submission.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.submitted_at)
    }
}

/// What the UI asks the tracker to submit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmitRequest {
    pub video_url: String,
    pub profile_id: Option<i64>,
    pub sub_profile_id: Option<i64>,
    pub template_id: Option<i64>,
    pub priority: Priority,
    pub custom_parameters: Value,
    /// Display name; derived from the URL when absent.
    pub video_name: Option<String>,
}

impl SubmitRequest {
    pub fn new(video_url: &str, profile_id: i64, sub_profile_id: i64, template_id: i64) -> Self {
        Self {
            video_url: video_url.to_string(),
            profile_id: Some(profile_id),
            sub_profile_id: Some(sub_profile_id),
            template_id: Some(template_id),
            priority: Priority::Normal,
            custom_parameters: Value::Object(Default::default()),
            video_name: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_video_name(mut self, name: &str) -> Self {
        self.video_name = Some(name.to_string());
        self
    }

    /// Checks the request and builds the wire payload.
    pub fn validate(&self) -> Result<SubmitJobPayload, SubmissionError> {
        let video_url = self.video_url.trim();
        if video_url.is_empty() {
            return Err(SubmissionError::MissingField("videoUrl"));
        }

        let profile_id = positive_id("profileId", self.profile_id)?;
        let sub_profile_id = positive_id("subProfileId", self.sub_profile_id)?;
        let template_id = positive_id("templateId", self.template_id)?;

        let custom_parameters = match &self.custom_parameters {
            Value::Null => Value::Object(Default::default()),
            Value::Object(_) => self.custom_parameters.clone(),
            _ => {
                return Err(SubmissionError::InvalidField {
                    field: "customParameters",
                    reason: "must be an object".to_string(),
                })
            }
        };

        Ok(SubmitJobPayload {
            video_url: video_url.to_string(),
            profile_id,
            sub_profile_id,
            template_id,
            priority: self.priority,
            custom_parameters,
        })
    }

    /// Name shown for the job: the explicit name, else the last URL path
    /// segment, else the URL itself.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.video_name.as_deref().map(str::trim) {
            if !name.is_empty() {
                return name.to_string();
            }
        }
        let url = self.video_url.trim();
        let without_query = url.split(['?', '#']).next().unwrap_or(url);
        without_query
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .unwrap_or(url)
            .to_string()
    }
}

fn positive_id(field: &'static str, value: Option<i64>) -> Result<i64, SubmissionError> {
    match value {
        None => Err(SubmissionError::MissingField(field)),
        Some(id) if id <= 0 => Err(SubmissionError::InvalidField {
            field,
            reason: format!("must be greater than 0, got {}", id),
        }),
        Some(id) => Ok(id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_are_monotone() {
        let mut job = ProcessingJob::new("j1", "clip.mp4", Priority::Normal, Utc::now());
        assert!(job.transition(JobStatus::Processing, Utc::now()));
        assert!(!job.transition(JobStatus::Queued, Utc::now()));
        assert!(job.transition(JobStatus::Completed, Utc::now()));
        assert!(job.completed_at.is_some());
        assert!(!job.transition(JobStatus::Processing, Utc::now()));
        assert!(!job.transition(JobStatus::Failed, Utc::now()));
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[test]
    fn test_status_serializes_camel_case() {
        assert_eq!(
            serde_json::to_string(&JobStatus::TimedOut).unwrap(),
            "\"timedOut\""
        );
    }

    #[test]
    fn test_parse_server_status() {
        assert_eq!(parse_server_status("COMPLETED", "j"), ServerStatus::Completed);
        assert_eq!(parse_server_status("error", "j"), ServerStatus::Failed);
        assert_eq!(parse_server_status("pending", "j"), ServerStatus::Pending);
        assert_eq!(parse_server_status("weird", "j"), ServerStatus::Processing);
    }

    #[test]
    fn test_validate_rejects_empty_url() {
        let request = SubmitRequest::new("  ", 1, 1, 1);
        assert!(matches!(
            request.validate(),
            Err(SubmissionError::MissingField("videoUrl"))
        ));
    }

    #[test]
    fn test_validate_rejects_non_positive_ids() {
        let request = SubmitRequest::new("https://cdn/v.mp4", 1, 0, 1);
        assert!(matches!(
            request.validate(),
            Err(SubmissionError::InvalidField {
                field: "subProfileId",
                ..
            })
        ));

        let request = SubmitRequest {
            template_id: None,
            ..SubmitRequest::new("https://cdn/v.mp4", 1, 1, 1)
        };
        assert!(matches!(
            request.validate(),
            Err(SubmissionError::MissingField("templateId"))
        ));
    }

    #[test]
    fn test_validate_builds_payload() {
        let payload = SubmitRequest::new(" https://cdn/v.mp4 ", 1, 2, 3)
            .with_priority(Priority::High)
            .validate()
            .unwrap();
        assert_eq!(payload.video_url, "https://cdn/v.mp4");
        assert_eq!(payload.template_id, 3);
        assert_eq!(payload.priority, Priority::High);
        assert!(payload.custom_parameters.is_object());
    }

    #[test]
    fn test_display_name() {
        let request = SubmitRequest::new("https://cdn.example.com/videos/launch.mp4?sig=1", 1, 1, 1);
        assert_eq!(request.display_name(), "launch.mp4");
        assert_eq!(request.with_video_name("Launch").display_name(), "Launch");
    }
}
