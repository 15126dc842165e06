//! The live job set and its reconciliation against the server.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::Serialize;
use tracing::Instrument;

use super::events::{QueueEvent, QueueEventBroadcaster};
use super::job::{parse_server_status, JobStatus, ProcessingJob, ServerStatus, SubmitRequest};
use crate::client::{AnalyticsClient, ClientError, JobQuery, ServerJobRecord};
use crate::config::TrackerConfig;
use crate::error::SubmissionError;

/// Message used when the server fails a job without saying why.
const SERVER_FAILURE_MESSAGE: &str = "Processing failed on the server";
const NOT_FOUND_MESSAGE: &str = "Analytics record not found on the server";

/// Tuning of the reconciliation rules.
#[derive(Debug, Clone)]
pub struct QueueSettings {
    /// Age after which a job missing from the server listing times out.
    pub stale_after: Duration,
    /// Listing query issued once per tick.
    pub query: JobQuery,
    pub event_capacity: usize,
}

impl QueueSettings {
    pub fn from_config(config: &TrackerConfig) -> Self {
        Self {
            stale_after: Duration::from_secs(config.stale_after_secs),
            query: JobQuery {
                page: 1,
                page_size: config.page_size,
                sort_by: config.sort_by.clone(),
                sort_order: config.sort_order,
            },
            event_capacity: config.event_capacity,
        }
    }
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self::from_config(&TrackerConfig::default())
    }
}

/// Job ids affected by one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub completed: Vec<String>,
    pub failed: Vec<String>,
    pub timed_out: Vec<String>,
    pub still_processing: usize,
}

impl ReconcileReport {
    /// True when no job changed state.
    pub fn is_unchanged(&self) -> bool {
        self.completed.is_empty() && self.failed.is_empty() && self.timed_out.is_empty()
    }

    fn record(&mut self, job: &ProcessingJob) {
        let bucket = match job.status {
            JobStatus::Completed => &mut self.completed,
            JobStatus::Failed => &mut self.failed,
            JobStatus::TimedOut => &mut self.timed_out,
            JobStatus::Queued | JobStatus::Processing => return,
        };
        bucket.push(job.job_id.clone());
    }
}

/// Counts of tracked jobs per state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueCounts {
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    pub timed_out: usize,
}

/// True when the job is older than `stale_after`. Jobs stamped in the
/// future are never stale.
fn is_stale(job: &ProcessingJob, now: DateTime<Utc>, stale_after: Duration) -> bool {
    job.age(now)
        .to_std()
        .map(|age| age > stale_after)
        .unwrap_or(false)
}

/// How a single job is resolved.
enum Resolution {
    Keep,
    Complete { confidence_score: Option<f64> },
    Fail(String),
    TimeOut(String),
}

impl Resolution {
    fn for_server_record(job_id: &str, record: &ServerJobRecord) -> Self {
        match parse_server_status(&record.processing_status, job_id) {
            ServerStatus::Completed => Resolution::Complete {
                confidence_score: record.confidence_score,
            },
            ServerStatus::Failed => Resolution::Fail(
                record
                    .error_message
                    .clone()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| SERVER_FAILURE_MESSAGE.to_string()),
            ),
            ServerStatus::Pending | ServerStatus::Processing => Resolution::Keep,
        }
    }
}

#[derive(Default)]
struct QueueState {
    /// Jobs still in flight, in insertion order.
    live: Vec<ProcessingJob>,
    /// Terminal jobs waiting for acknowledgement.
    settled: Vec<ProcessingJob>,
}

impl QueueState {
    fn contains(&self, job_id: &str) -> bool {
        self.live.iter().chain(&self.settled).any(|j| j.job_id == job_id)
    }

    /// Applies `resolution` to the live job at `index`. A job that became
    /// terminal is moved to the settled list and returned.
    fn resolve(
        &mut self,
        index: usize,
        resolution: Resolution,
        now: DateTime<Utc>,
    ) -> Option<ProcessingJob> {
        let (next, message, confidence_score) = match resolution {
            Resolution::Keep => return None,
            Resolution::Complete { confidence_score } => {
                (JobStatus::Completed, None, confidence_score)
            }
            Resolution::Fail(message) => (JobStatus::Failed, Some(message), None),
            Resolution::TimeOut(message) => (JobStatus::TimedOut, Some(message), None),
        };

        let job = &mut self.live[index];
        if !job.transition(next, now) {
            return None;
        }
        job.error_message = message;
        if confidence_score.is_some() {
            job.confidence_score = confidence_score;
        }

        let job = self.live.remove(index);
        self.settled.push(job.clone());
        Some(job)
    }
}

/// Owns the set of in-flight jobs. The UI reads snapshots and requests
/// mutations only through this type.
pub struct ProcessingQueue {
    client: Arc<dyn AnalyticsClient>,
    state: RwLock<QueueState>,
    events: QueueEventBroadcaster,
    settings: QueueSettings,
}

impl ProcessingQueue {
    pub fn new(client: Arc<dyn AnalyticsClient>, settings: QueueSettings) -> Self {
        Self {
            client,
            state: RwLock::new(QueueState::default()),
            events: QueueEventBroadcaster::new(settings.event_capacity),
            settings,
        }
    }

    pub fn settings(&self) -> &QueueSettings {
        &self.settings
    }

    fn read_state(&self) -> RwLockReadGuard<'_, QueueState> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Queue state lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, QueueState> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Queue state lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn emit_settled(&self, jobs: &[ProcessingJob]) {
        for job in jobs {
            if let Some(event) = QueueEvent::settled(job) {
                self.events.send(event);
            }
        }
    }

    /// Submits a job and starts tracking it. The job is in the live set
    /// before this returns, so the next tick always sees it.
    pub async fn submit(&self, request: SubmitRequest) -> Result<ProcessingJob, SubmissionError> {
        let payload = request.validate()?;
        let response = self.client.submit_job(&payload).await?;

        let job_id = response
            .job_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(SubmissionError::MissingJobId)?
            .to_string();

        let now = Utc::now();
        let mut job = ProcessingJob::new(&job_id, &request.display_name(), payload.priority, now);
        job.video_id = response.video_id;
        job.estimated_completion = response.estimated_completion;
        if let Some(priority) = response.priority {
            job.priority = priority;
        }
        job.transition(JobStatus::Processing, now);

        {
            let mut state = self.write_state();
            if state.contains(&job_id) {
                return Err(SubmissionError::DuplicateJob(job_id));
            }
            state.live.push(job.clone());
        }

        info!("Tracking job {} ({})", job.job_id, job.video_name);
        self.events.send(QueueEvent::added(&job));
        Ok(job)
    }

    /// Reconciles live jobs against a server listing as of now.
    pub fn reconcile(&self, server: &[ServerJobRecord]) -> ReconcileReport {
        self.reconcile_at(server, Utc::now())
    }

    /// Reconciles live jobs against a server listing, in insertion order.
    /// Jobs that became terminal leave the live set and are reported once.
    pub fn reconcile_at(&self, server: &[ServerJobRecord], now: DateTime<Utc>) -> ReconcileReport {
        let stale_after = self.settings.stale_after;
        let mut report = ReconcileReport::default();
        let mut settled = Vec::new();

        {
            let mut state = self.write_state();
            let mut index = 0;
            while index < state.live.len() {
                let job = &state.live[index];
                let resolution = match server.iter().find(|record| record.matches(&job.job_id)) {
                    Some(record) => Resolution::for_server_record(&job.job_id, record),
                    None if is_stale(job, now, stale_after) => Resolution::TimeOut(format!(
                        "No status from the server within {} seconds of submission",
                        self.settings.stale_after.as_secs()
                    )),
                    None => Resolution::Keep,
                };

                match state.resolve(index, resolution, now) {
                    Some(job) => {
                        report.record(&job);
                        settled.push(job);
                    }
                    None => index += 1,
                }
            }
            report.still_processing = state.live.len();
        }

        for job in &settled {
            match job.status {
                JobStatus::Completed => info!("Job {} completed", job.job_id),
                _ => warn!(
                    "Job {} {}: {}",
                    job.job_id,
                    job.status.to_string().to_lowercase(),
                    job.error_message.as_deref().unwrap_or("")
                ),
            }
        }
        self.emit_settled(&settled);
        report
    }

    /// One poll tick: a single listing request for all live jobs, then
    /// reconciliation. A failed request is logged and retried next tick, but
    /// jobs past the staleness threshold still time out. Returns `None` when
    /// the listing failed and no job aged out.
    pub async fn poll_once(&self) -> Option<ReconcileReport> {
        let live = self.live_count();
        if live == 0 {
            return None;
        }

        let span = tracing::info_span!("poll_tick", live_jobs = live);
        async {
            match self.client.list_jobs(&self.settings.query).await {
                Ok(page) => {
                    debug!("Listing returned {} of {} records", page.data.len(), page.total);
                    Some(self.reconcile(&page.data))
                }
                Err(e) => {
                    if e.is_transient() {
                        warn!("Job listing failed, retrying next tick: {}", e);
                    } else {
                        error!("Job listing failed: {}", e);
                    }
                    // No listing means no record matches, so only the age
                    // check can resolve a job.
                    let report = self.reconcile(&[]);
                    (!report.is_unchanged()).then_some(report)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Applies a failed single-job lookup. A missing record fails the job;
    /// anything else keeps it for the next tick. Returns true when the job
    /// was failed.
    pub fn record_lookup_failure(&self, job_id: &str, err: &ClientError) -> bool {
        if !err.is_not_found() {
            warn!("Lookup of job {} failed, keeping it: {}", job_id, err);
            return false;
        }

        let failed = {
            let mut state = self.write_state();
            match state.live.iter().position(|j| j.job_id == job_id) {
                Some(index) => {
                    state.resolve(index, Resolution::Fail(NOT_FOUND_MESSAGE.to_string()), Utc::now())
                }
                None => None,
            }
        };

        match failed {
            Some(job) => {
                warn!("Job {} failed: {}", job.job_id, NOT_FOUND_MESSAGE);
                self.emit_settled(std::slice::from_ref(&job));
                true
            }
            None => false,
        }
    }

    /// Looks up one live job directly and applies the result. Returns the
    /// job's status afterwards, or `None` if the job is not live.
    pub async fn refresh_job(&self, job_id: &str) -> Option<JobStatus> {
        if !self.read_state().live.iter().any(|j| j.job_id == job_id) {
            return None;
        }

        match self.client.get_analytics(job_id).await {
            Ok(record) => {
                let server = ServerJobRecord {
                    id: Some(record.id.clone()),
                    uuid: Some(job_id.to_string()),
                    video_title: record.video_title.clone(),
                    processing_status: record.status.clone(),
                    confidence_score: Some(record.confidence_score),
                    error_message: None,
                };
                let settled = {
                    let mut state = self.write_state();
                    let index = state.live.iter().position(|j| j.job_id == job_id)?;
                    state.resolve(
                        index,
                        Resolution::for_server_record(job_id, &server),
                        Utc::now(),
                    )
                };
                match settled {
                    Some(job) => {
                        self.emit_settled(std::slice::from_ref(&job));
                        Some(job.status)
                    }
                    None => Some(JobStatus::Processing),
                }
            }
            Err(e) => {
                if self.record_lookup_failure(job_id, &e) {
                    Some(JobStatus::Failed)
                } else {
                    self.get(job_id).map(|j| j.status)
                }
            }
        }
    }

    /// Live jobs in insertion order.
    pub fn snapshot(&self) -> Vec<ProcessingJob> {
        self.read_state().live.clone()
    }

    /// Terminal jobs not yet acknowledged.
    pub fn settled(&self) -> Vec<ProcessingJob> {
        self.read_state().settled.clone()
    }

    /// Any tracked job, live or settled.
    pub fn get(&self, job_id: &str) -> Option<ProcessingJob> {
        let state = self.read_state();
        state
            .live
            .iter()
            .chain(&state.settled)
            .find(|j| j.job_id == job_id)
            .cloned()
    }

    /// Drops a settled job once the UI has consumed its event.
    pub fn acknowledge(&self, job_id: &str) -> Option<ProcessingJob> {
        let job = {
            let mut state = self.write_state();
            let index = state.settled.iter().position(|j| j.job_id == job_id)?;
            state.settled.remove(index)
        };
        self.events.send(QueueEvent::removed(&job));
        Some(job)
    }

    /// Stops tracking a job, live or settled.
    pub fn remove(&self, job_id: &str) -> Option<ProcessingJob> {
        let job = {
            let mut state = self.write_state();
            if let Some(index) = state.live.iter().position(|j| j.job_id == job_id) {
                Some(state.live.remove(index))
            } else {
                let index = state.settled.iter().position(|j| j.job_id == job_id)?;
                Some(state.settled.remove(index))
            }
        }?;
        info!("Stopped tracking job {}", job.job_id);
        self.events.send(QueueEvent::removed(&job));
        Some(job)
    }

    pub fn counts(&self) -> QueueCounts {
        let state = self.read_state();
        let mut counts = QueueCounts {
            processing: state.live.len(),
            ..Default::default()
        };
        for job in &state.settled {
            match job.status {
                JobStatus::Completed => counts.completed += 1,
                JobStatus::Failed => counts.failed += 1,
                JobStatus::TimedOut => counts.timed_out += 1,
                JobStatus::Queued | JobStatus::Processing => {}
            }
        }
        counts
    }

    pub fn live_count(&self) -> usize {
        self.read_state().live.len()
    }

    pub fn is_idle(&self) -> bool {
        self.live_count() == 0
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<QueueEvent> {
        self.events.subscribe()
    }
}
