//! Request and response shapes of the analytics API.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::payload::deserialize_null_default;

/// Processing priority requested for a job.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Normal => write!(f, "normal"),
            Priority::High => write!(f, "high"),
        }
    }
}

/// Server-side record identifier. The API uses numeric ids but older
/// payloads send them as strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl Default for RecordId {
    fn default() -> Self {
        RecordId::Text(String::new())
    }
}

/// Body of the submit-job request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJobPayload {
    pub video_url: String,
    pub profile_id: i64,
    pub sub_profile_id: i64,
    pub template_id: i64,
    pub priority: Priority,
    #[serde(default)]
    pub custom_parameters: serde_json::Value,
}

/// Response of the submit-job request. Every field is optional on the wire;
/// the tracker decides what a usable response is.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJobResponse {
    #[serde(default, alias = "job_id")]
    pub job_id: Option<String>,
    #[serde(default, alias = "video_id")]
    pub video_id: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "estimated_completion")]
    pub estimated_completion: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
}

/// Sort direction for job listings.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Query parameters for the paginated job listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobQuery {
    pub page: u32,
    pub page_size: u32,
    pub sort_by: String,
    pub sort_order: SortOrder,
}

impl Default for JobQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 50,
            sort_by: "createdAt".to_string(),
            sort_order: SortOrder::Desc,
        }
    }
}

impl JobQuery {
    /// Returns the same query for the following page.
    pub fn next_page(&self) -> Self {
        Self {
            page: self.page + 1,
            ..self.clone()
        }
    }
}

/// One entry of the job listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerJobRecord {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default, alias = "video_title")]
    pub video_title: Option<String>,
    #[serde(
        default,
        alias = "processing_status",
        deserialize_with = "deserialize_null_default"
    )]
    pub processing_status: String,
    #[serde(default, alias = "confidence_score")]
    pub confidence_score: Option<f64>,
    #[serde(default, alias = "error_message")]
    pub error_message: Option<String>,
}

impl ServerJobRecord {
    /// Returns true if this record describes the job with the given id,
    /// matching the server uuid first and the numeric id second.
    pub fn matches(&self, job_id: &str) -> bool {
        if self.uuid.as_deref() == Some(job_id) {
            return true;
        }
        self.id
            .as_ref()
            .map(|id| id.to_string() == job_id)
            .unwrap_or(false)
    }
}

/// One page of the job listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobListPage {
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub data: Vec<ServerJobRecord>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub total: u64,
}

/// Acknowledgement of a delete request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteAck {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_record_matches_uuid_or_id() {
        let record = ServerJobRecord {
            id: Some(RecordId::Number(42)),
            uuid: Some("4f1c-uuid".to_string()),
            processing_status: "processing".to_string(),
            ..Default::default()
        };

        assert!(record.matches("4f1c-uuid"));
        assert!(record.matches("42"));
        assert!(!record.matches("43"));
    }

    #[test]
    fn test_submit_response_accepts_snake_case() {
        let response: SubmitJobResponse =
            serde_json::from_str(r#"{"job_id": "abc", "video_id": 7}"#).unwrap();
        assert_eq!(response.job_id.as_deref(), Some("abc"));
        assert_eq!(response.video_id, Some(7));
    }

    #[test]
    fn test_list_page_parses_mixed_ids() {
        let page: JobListPage = serde_json::from_str(
            r#"{"data": [
                {"id": 1, "uuid": "u-1", "processingStatus": "completed"},
                {"id": "2", "processingStatus": "failed", "errorMessage": "boom"}
            ], "total": 2}"#,
        )
        .unwrap();

        assert_eq!(page.total, 2);
        assert_eq!(page.data[0].id, Some(RecordId::Number(1)));
        assert_eq!(page.data[1].id, Some(RecordId::Text("2".to_string())));
        assert_eq!(page.data[1].error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn test_list_page_tolerates_null_status() {
        let page: JobListPage = serde_json::from_str(
            r#"{"data": [
                {"uuid": "u-1", "processingStatus": null, "confidenceScore": null},
                {"uuid": "u-2", "processingStatus": "completed"}
            ], "total": null}"#,
        )
        .unwrap();

        assert_eq!(page.total, 0);
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[0].processing_status, "");
        assert_eq!(page.data[1].processing_status, "completed");
    }

    #[test]
    fn test_job_query_next_page() {
        let query = JobQuery::default();
        let next = query.next_page();
        assert_eq!(next.page, 2);
        assert_eq!(next.page_size, query.page_size);
    }
}
