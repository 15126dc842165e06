//! Queue mutation events for UI consumers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::job::{JobStatus, ProcessingJob};

/// Default channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueueEventKind {
    Added,
    Completed,
    Failed,
    Removed,
}

/// A change to the tracked job set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEvent {
    pub kind: QueueEventKind,
    /// Job state after the change.
    pub job: ProcessingJob,
    pub timestamp: DateTime<Utc>,
}

impl QueueEvent {
    pub fn added(job: &ProcessingJob) -> Self {
        Self::new(QueueEventKind::Added, job)
    }

    pub fn removed(job: &ProcessingJob) -> Self {
        Self::new(QueueEventKind::Removed, job)
    }

    /// Event for a job that just reached a terminal state. Timed-out jobs
    /// are reported as failures.
    pub fn settled(job: &ProcessingJob) -> Option<Self> {
        let kind = match job.status {
            JobStatus::Completed => QueueEventKind::Completed,
            JobStatus::Failed | JobStatus::TimedOut => QueueEventKind::Failed,
            JobStatus::Queued | JobStatus::Processing => return None,
        };
        Some(Self::new(kind, job))
    }

    fn new(kind: QueueEventKind, job: &ProcessingJob) -> Self {
        Self {
            kind,
            job: job.clone(),
            timestamp: Utc::now(),
        }
    }
}

/// Broadcasts queue events to any number of subscribers.
#[derive(Clone)]
pub struct QueueEventBroadcaster {
    sender: Arc<broadcast::Sender<QueueEvent>>,
}

impl QueueEventBroadcaster {
    /// Creates a broadcaster with the given channel capacity (at least 1).
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn send(&self, event: QueueEvent) {
        // No receivers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for QueueEventBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Priority;

    fn job(status: JobStatus) -> ProcessingJob {
        let mut job = ProcessingJob::new("j1", "clip.mp4", Priority::Normal, Utc::now());
        job.status = status;
        job
    }

    #[test]
    fn test_timed_out_reports_as_failed() {
        let event = QueueEvent::settled(&job(JobStatus::TimedOut)).unwrap();
        assert_eq!(event.kind, QueueEventKind::Failed);
        assert!(QueueEvent::settled(&job(JobStatus::Processing)).is_none());
    }

    #[test]
    fn test_send_without_subscribers() {
        let broadcaster = QueueEventBroadcaster::default();
        broadcaster.send(QueueEvent::added(&job(JobStatus::Processing)));
        assert_eq!(broadcaster.receiver_count(), 0);
    }

    #[test]
    fn test_subscriber_receives() {
        let broadcaster = QueueEventBroadcaster::new(4);
        let mut rx = broadcaster.subscribe();
        broadcaster.send(QueueEvent::added(&job(JobStatus::Processing)));

        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind, QueueEventKind::Added);
        assert_eq!(event.job.job_id, "j1");
    }
}
