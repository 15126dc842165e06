//! Fixed-interval poll loop for the processing queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::queue::ProcessingQueue;

/// Owns the poll timer. Polling runs only while the queue has live jobs:
/// the loop disarms itself when the queue drains and `start` re-arms it.
pub struct PollScheduler {
    interval: Duration,
    polling: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PollScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            polling: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The single exposed polling flag.
    pub fn is_polling(&self) -> bool {
        self.polling.load(Ordering::Acquire)
    }

    /// Arms the poll loop. Does nothing when already polling or when the
    /// queue is idle. Returns true if a new loop was started.
    pub fn start(&self, queue: Arc<ProcessingQueue>) -> bool {
        if queue.is_idle() {
            return false;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                log::error!("Cannot start polling outside a tokio runtime: {}", e);
                return false;
            }
        };

        if self
            .polling
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let polling = Arc::clone(&self.polling);
        let interval = self.interval;
        let handle = runtime.spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            timer.tick().await; // skip immediate first tick

            loop {
                timer.tick().await;
                if !polling.load(Ordering::Acquire) {
                    break;
                }

                queue.poll_once().await;

                if queue.is_idle() {
                    polling.store(false, Ordering::Release);
                    // A submit racing with the store above saw the flag set
                    // and did not re-arm, so pick its job up here.
                    if !queue.is_idle()
                        && polling
                            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                            .is_ok()
                    {
                        continue;
                    }
                    log::debug!("Queue drained, polling stopped");
                    break;
                }
            }
        });

        let mut slot = match self.handle.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Poll handle lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        *slot = Some(handle);
        log::debug!("Polling started every {:?}", interval);
        true
    }

    /// Stops polling and cancels the outstanding timer. Idempotent.
    pub fn stop(&self) {
        self.polling.store(false, Ordering::Release);
        let handle = match self.handle.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::queue::QueueSettings;

    #[tokio::test]
    async fn test_start_on_idle_queue_is_noop() {
        let client = Arc::new(crate::client::HttpAnalyticsClient::new(&Default::default()).unwrap());
        let queue = Arc::new(ProcessingQueue::new(client, QueueSettings::default()));
        let scheduler = PollScheduler::new(Duration::from_secs(12));

        assert!(!scheduler.start(queue));
        assert!(!scheduler.is_polling());
        scheduler.stop();
        scheduler.stop();
        assert!(!scheduler.is_polling());
    }
}
