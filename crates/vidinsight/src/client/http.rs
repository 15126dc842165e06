//! reqwest-backed implementation of the analytics API.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, Method, Response, Url};
use serde_json::Value;

use super::error::{ClientError, Result};
use super::payload::decode_payload;
use super::types::{DeleteAck, JobListPage, JobQuery, SubmitJobPayload, SubmitJobResponse};
use super::AnalyticsClient;
use crate::analytics::{AnalyticsRecord, GeneratedSummary};
use crate::charts::RawChart;
use crate::config::ApiConfig;

/// Maximum length of an error body kept in [`ClientError::Http`].
const MAX_ERROR_BODY_LENGTH: usize = 200;

fn truncate_body(body: &str) -> String {
    if body.chars().count() > MAX_ERROR_BODY_LENGTH {
        let head: String = body.chars().take(MAX_ERROR_BODY_LENGTH).collect();
        format!("{}... (truncated)", head)
    } else {
        body.to_string()
    }
}

/// Analytics API client talking JSON over HTTP.
pub struct HttpAnalyticsClient {
    client: Client,
    base_url: Url,
}

impl HttpAnalyticsClient {
    /// Creates a client with the timeouts and base URL from config.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(config.base_url.clone()));
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ClientError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// Builds the URL for an endpoint below the base URL. Segments are
    /// percent-encoded, so job ids cannot escape their path position.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, method: Method, url: Url, body: Option<&SubmitJobPayload>) -> Result<Value> {
        debug!("{} {}", method, url);

        let mut request = self.client.request(method, url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        read_json(response, &url).await
    }
}

/// Maps a response to its JSON body or to the matching [`ClientError`].
async fn read_json(response: Response, url: &Url) -> Result<Value> {
    let status = response.status();

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound(url.path().to_string()));
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Http {
            status: status.as_u16(),
            body: truncate_body(&body),
        });
    }

    let text = response.text().await?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(ClientError::from)
}

#[async_trait]
impl AnalyticsClient for HttpAnalyticsClient {
    async fn submit_job(&self, payload: &SubmitJobPayload) -> Result<SubmitJobResponse> {
        let url = self.endpoint(&["analytics", "process"])?;
        let body = self.send(Method::POST, url, Some(payload)).await?;
        let response: SubmitJobResponse = decode_payload(body)?;
        info!(
            "Submitted {} for processing (job id: {})",
            payload.video_url,
            response.job_id.as_deref().unwrap_or("<none>")
        );
        Ok(response)
    }

    async fn list_jobs(&self, query: &JobQuery) -> Result<JobListPage> {
        let mut url = self.endpoint(&["analytics"])?;
        url.query_pairs_mut()
            .append_pair("page", &query.page.to_string())
            .append_pair("pageSize", &query.page_size.to_string())
            .append_pair("sortBy", &query.sort_by)
            .append_pair("sortOrder", query.sort_order.as_str());
        let body = self.send(Method::GET, url, None).await?;
        decode_payload(body)
    }

    async fn get_analytics(&self, job_id: &str) -> Result<AnalyticsRecord> {
        let url = self.endpoint(&["analytics", job_id])?;
        let body = self.send(Method::GET, url, None).await?;
        decode_payload(body)
    }

    async fn get_charts(&self, job_id: &str) -> Result<Vec<RawChart>> {
        let url = self.endpoint(&["analytics", job_id, "charts"])?;
        let body = self.send(Method::GET, url, None).await?;
        decode_payload(body)
    }

    async fn get_summary(&self, job_id: &str) -> Result<GeneratedSummary> {
        let url = self.endpoint(&["analytics", job_id, "summary"])?;
        let body = self.send(Method::GET, url, None).await?;
        decode_payload(body)
    }

    async fn delete_analytics(&self, job_id: &str) -> Result<DeleteAck> {
        let url = self.endpoint(&["analytics", job_id])?;
        let body = self.send(Method::DELETE, url, None).await?;
        if body.is_null() {
            return Ok(DeleteAck {
                success: true,
                message: None,
            });
        }
        decode_payload(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> HttpAnalyticsClient {
        let config = ApiConfig {
            base_url: base_url.to_string(),
            ..ApiConfig::default()
        };
        HttpAnalyticsClient::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = client("http://localhost:3000/api");
        let url = client.endpoint(&["analytics", "abc", "charts"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/analytics/abc/charts");
    }

    #[test]
    fn test_endpoint_with_trailing_slash() {
        let client = client("http://localhost:3000/api/");
        let url = client.endpoint(&["analytics"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/analytics");
    }

    #[test]
    fn test_endpoint_encodes_job_id() {
        let client = client("http://localhost:3000/api");
        let url = client.endpoint(&["analytics", "../admin"]).unwrap();
        assert!(url.path().ends_with("/analytics/..%2Fadmin"));
    }

    #[test]
    fn test_invalid_base_url() {
        let config = ApiConfig {
            base_url: "not a url".to_string(),
            ..ApiConfig::default()
        };
        assert!(matches!(
            HttpAnalyticsClient::new(&config),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(500);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("... (truncated)"));
        assert_eq!(truncate_body("short"), "short");
    }
}
