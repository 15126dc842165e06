//! Analytics API contract consumed by the tracker and the report pipeline.
//!
//! The processing engine itself is an external collaborator; this module only
//! describes the request/response surface and ships an HTTP implementation.

pub mod error;
pub mod http;
pub mod payload;
pub mod types;

use async_trait::async_trait;

use crate::analytics::{AnalyticsRecord, GeneratedSummary};
use crate::charts::RawChart;

pub use error::ClientError;
pub use http::HttpAnalyticsClient;
pub use payload::{decode_payload, deserialize_lenient, deserialize_null_default};
pub use types::{
    DeleteAck, JobListPage, JobQuery, Priority, RecordId, ServerJobRecord, SortOrder,
    SubmitJobPayload, SubmitJobResponse,
};

/// Request/response interface of the analytics backend.
///
/// Implementations must surface every failure as an `Err`; the tracker decides
/// which failures are transient.
#[async_trait]
pub trait AnalyticsClient: Send + Sync {
    /// Submits a video for processing.
    async fn submit_job(&self, payload: &SubmitJobPayload) -> error::Result<SubmitJobResponse>;

    /// Lists processing jobs, one page at a time.
    async fn list_jobs(&self, query: &JobQuery) -> error::Result<JobListPage>;

    /// Fetches the full analytics record of a job.
    async fn get_analytics(&self, job_id: &str) -> error::Result<AnalyticsRecord>;

    /// Fetches the raw generated charts of a job.
    async fn get_charts(&self, job_id: &str) -> error::Result<Vec<RawChart>>;

    /// Fetches the generated narrative summary of a job.
    async fn get_summary(&self, job_id: &str) -> error::Result<GeneratedSummary>;

    /// Deletes the analytics of a job.
    async fn delete_analytics(&self, job_id: &str) -> error::Result<DeleteAck>;
}
