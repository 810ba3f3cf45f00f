//! Proposal analysis — scoring, tiering, interview guides, investigator chat.

pub mod chat;
pub mod engine;
pub mod handlers;
pub mod interview;
pub mod prompts;

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

/// Tracks running batch analyses so a second run on the same job is refused
/// and a cancel request can reach the right batch.
#[derive(Default)]
pub struct BatchTracker {
    running: Mutex<HashMap<Uuid, Arc<AtomicBool>>>,
}

impl BatchTracker {
    /// Registers a batch for the job. Returns the cancel flag, or None when a
    /// batch is already running for it.
    pub async fn begin(&self, job_id: Uuid) -> Option<Arc<AtomicBool>> {
        let mut running = self.running.lock().await;
        if running.contains_key(&job_id) {
            return None;
        }
        let flag = Arc::new(AtomicBool::new(false));
        running.insert(job_id, flag.clone());
        Some(flag)
    }

    pub async fn finish(&self, job_id: Uuid) {
        self.running.lock().await.remove(&job_id);
    }

    /// Requests cancellation. Returns false when no batch is running.
    pub async fn cancel(&self, job_id: Uuid) -> bool {
        match self.running.lock().await.get(&job_id) {
            Some(flag) => {
                flag.store(true, std::sync::atomic::Ordering::Relaxed);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_second_batch_for_same_job_is_refused() {
        let tracker = BatchTracker::default();
        let job_id = Uuid::new_v4();
        let first = tracker.begin(job_id).await;
        assert!(first.is_some());
        assert!(tracker.begin(job_id).await.is_none());

        tracker.finish(job_id).await;
        assert!(tracker.begin(job_id).await.is_some());
    }

    #[tokio::test]
    async fn test_cancel_sets_flag() {
        let tracker = BatchTracker::default();
        let job_id = Uuid::new_v4();
        let flag = tracker.begin(job_id).await.unwrap();

        assert!(tracker.cancel(job_id).await);
        assert!(flag.load(std::sync::atomic::Ordering::Relaxed));
        assert!(!tracker.cancel(Uuid::new_v4()).await);
    }
}
