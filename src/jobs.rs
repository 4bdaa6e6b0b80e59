//! Keyed job scheduling over tokio tasks.
//!
//! A thin stand-in for a platform job-scheduling facility: one-shot deferred
//! jobs and periodic jobs, each addressed by a string key with an explicit
//! policy for what happens when the key is already pending.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info};
use tokio::task::JoinHandle;

/// Initial retry delay after a failed periodic run; doubles up to the period.
const RETRY_BACKOFF_START: Duration = Duration::from_secs(30);

/// What to do when a job with the same key is already pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistingJobPolicy {
    /// The new request is a no-op; the pending job stays.
    Keep,
    /// The new request supersedes the pending job.
    Replace,
}

/// Keyed scheduler. Cloning shares the underlying job table.
#[derive(Clone, Default)]
pub struct JobScheduler {
    jobs: Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
}

impl JobScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a one-shot job that runs once after `delay`. Returns false if
    /// the key was already pending and the policy is `Keep`.
    pub fn schedule_once<F, Fut>(
        &self,
        key: &str,
        delay: Duration,
        policy: ExistingJobPolicy,
        job: F,
    ) -> bool
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut jobs = self.jobs.lock().unwrap();
        if !Self::claim_key(&mut jobs, key, policy) {
            return false;
        }

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            job().await;
        });
        jobs.insert(key.to_string(), handle);
        true
    }

    /// Schedule a periodic job. The first run happens one period after
    /// scheduling. A run returning false is retried with doubling backoff
    /// capped at the period; a successful run resets the cadence.
    pub fn schedule_periodic<F, Fut>(
        &self,
        key: &str,
        period: Duration,
        policy: ExistingJobPolicy,
        job: F,
    ) -> bool
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let mut jobs = self.jobs.lock().unwrap();
        if !Self::claim_key(&mut jobs, key, policy) {
            return false;
        }

        let key_owned = key.to_string();
        let handle = tokio::spawn(async move {
            let mut wait = period;
            loop {
                tokio::time::sleep(wait).await;
                if job().await {
                    wait = period;
                } else {
                    let next = if wait >= period {
                        RETRY_BACKOFF_START
                    } else {
                        wait * 2
                    };
                    wait = next.min(period);
                    info!("periodic job {key_owned} failed, retrying in {wait:?}");
                }
            }
        });
        jobs.insert(key.to_string(), handle);
        true
    }

    /// Cancel a pending job. Returns true if one was pending.
    pub fn cancel(&self, key: &str) -> bool {
        let mut jobs = self.jobs.lock().unwrap();
        match jobs.remove(key) {
            Some(handle) => {
                let pending = !handle.is_finished();
                handle.abort();
                debug!("cancelled job {key}");
                pending
            }
            None => false,
        }
    }

    /// Whether a job with this key is still pending.
    pub fn is_scheduled(&self, key: &str) -> bool {
        let mut jobs = self.jobs.lock().unwrap();
        Self::prune(&mut jobs);
        jobs.contains_key(key)
    }

    /// Number of pending jobs.
    pub fn pending_count(&self) -> usize {
        let mut jobs = self.jobs.lock().unwrap();
        Self::prune(&mut jobs);
        jobs.len()
    }

    /// Abort every pending job.
    pub fn shutdown(&self) {
        let mut jobs = self.jobs.lock().unwrap();
        for (_, handle) in jobs.drain() {
            handle.abort();
        }
    }

    /// Returns true if the key is free (or was freed) for a new job.
    fn claim_key(
        jobs: &mut HashMap<String, JoinHandle<()>>,
        key: &str,
        policy: ExistingJobPolicy,
    ) -> bool {
        Self::prune(jobs);
        if let Some(existing) = jobs.get(key) {
            match policy {
                ExistingJobPolicy::Keep => {
                    debug!("job {key} already pending, keeping it");
                    return false;
                }
                ExistingJobPolicy::Replace => {
                    existing.abort();
                    jobs.remove(key);
                }
            }
        }
        true
    }

    fn prune(jobs: &mut HashMap<String, JoinHandle<()>>) {
        jobs.retain(|_, handle| !handle.is_finished());
    }
}
