//! Processing queue tracker.
//!
//! [`QueueTracker`] is what the UI talks to: it submits jobs, keeps the poll
//! loop armed while jobs are in flight and hands out snapshots and events.

pub mod events;
pub mod job;
pub mod queue;
pub mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::client::AnalyticsClient;
use crate::config::TrackerConfig;
use crate::error::SubmissionError;

pub use events::{QueueEvent, QueueEventBroadcaster, QueueEventKind};
pub use job::{parse_server_status, JobStatus, ProcessingJob, ServerStatus, SubmitRequest};
pub use queue::{ProcessingQueue, QueueCounts, QueueSettings, ReconcileReport};
pub use scheduler::PollScheduler;

/// Facade over the queue and its poll scheduler.
pub struct QueueTracker {
    queue: Arc<ProcessingQueue>,
    scheduler: PollScheduler,
}

impl QueueTracker {
    pub fn new(client: Arc<dyn AnalyticsClient>, config: &TrackerConfig) -> Self {
        Self::with_settings(
            client,
            QueueSettings::from_config(config),
            Duration::from_secs(config.poll_interval_secs),
        )
    }

    pub fn with_settings(
        client: Arc<dyn AnalyticsClient>,
        settings: QueueSettings,
        poll_interval: Duration,
    ) -> Self {
        Self {
            queue: Arc::new(ProcessingQueue::new(client, settings)),
            scheduler: PollScheduler::new(poll_interval),
        }
    }

    /// Submits a job, starts tracking it and arms polling.
    pub async fn submit(&self, request: SubmitRequest) -> Result<ProcessingJob, SubmissionError> {
        let job = self.queue.submit(request).await?;
        self.start_polling();
        Ok(job)
    }

    /// Arms the poll loop if there is anything to poll. Idempotent.
    pub fn start_polling(&self) -> bool {
        self.scheduler.start(Arc::clone(&self.queue))
    }

    /// Idempotent.
    pub fn stop_polling(&self) {
        self.scheduler.stop();
    }

    pub fn is_polling(&self) -> bool {
        self.scheduler.is_polling()
    }

    /// Clears any outstanding timer. Call when the owning view goes away;
    /// dropping the tracker does the same.
    pub fn teardown(&self) {
        self.scheduler.stop();
    }

    /// Runs one poll tick immediately, outside the timer.
    pub async fn poll_now(&self) -> Option<ReconcileReport> {
        self.queue.poll_once().await
    }

    pub async fn refresh_job(&self, job_id: &str) -> Option<JobStatus> {
        self.queue.refresh_job(job_id).await
    }

    pub fn snapshot(&self) -> Vec<ProcessingJob> {
        self.queue.snapshot()
    }

    pub fn settled(&self) -> Vec<ProcessingJob> {
        self.queue.settled()
    }

    pub fn acknowledge(&self, job_id: &str) -> Option<ProcessingJob> {
        self.queue.acknowledge(job_id)
    }

    pub fn remove(&self, job_id: &str) -> Option<ProcessingJob> {
        let job = self.queue.remove(job_id);
        if self.queue.is_idle() {
            self.scheduler.stop();
        }
        job
    }

    pub fn counts(&self) -> QueueCounts {
        self.queue.counts()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.queue.subscribe()
    }

    pub fn queue(&self) -> &Arc<ProcessingQueue> {
        &self.queue
    }
}
