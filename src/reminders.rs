//! Reminder notifications.
//!
//! Given a task with a reminder timestamp, schedules a one-shot deferred job
//! keyed by the task id that posts a notification when it fires. The actual
//! notification surface is an external collaborator behind the [`Notifier`]
//! trait.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use uuid::Uuid;

use crate::entities::task;
use crate::jobs::{ExistingJobPolicy, JobScheduler};
use crate::utils::datetime;

/// A posted reminder, referencing the task it was raised for.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: u32,
    pub task_id: Uuid,
    pub title: String,
}

/// Notification surface. Implementations post to whatever the host platform
/// offers; the default just logs.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Fallback notifier writing reminders to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) {
        info!("reminder {}: {}", notification.id, notification.title);
    }
}

/// Notification id derived from a hash of the task's id string. Collisions
/// are accepted, not mitigated.
pub fn notification_id(task_id: &Uuid) -> u32 {
    let mut hasher = DefaultHasher::new();
    task_id.to_string().hash(&mut hasher);
    hasher.finish() as u32
}

/// Schedules one pending notification job per task.
///
/// Re-scheduling a task replaces its pending job. Clearing a task's reminder
/// does NOT cancel automatically; callers must invoke [`cancel`] themselves.
///
/// [`cancel`]: ReminderScheduler::cancel
pub struct ReminderScheduler {
    jobs: JobScheduler,
    notifier: Arc<dyn Notifier>,
}

impl ReminderScheduler {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            jobs: JobScheduler::new(),
            notifier,
        }
    }

    /// Schedule the task's reminder. Past-due reminders are silently dropped.
    /// Returns true if a job was scheduled.
    pub fn schedule(&self, task: &task::Model) -> bool {
        let Some(reminder_at) = task.reminder_at else {
            return false;
        };

        let delay = reminder_at - datetime::now_millis();
        if delay <= 0 {
            debug!("dropping past-due reminder for task {}", task.id);
            return false;
        }

        let notification = Notification {
            id: notification_id(&task.id),
            task_id: task.id,
            title: task.title.clone(),
        };
        let notifier = Arc::clone(&self.notifier);

        self.jobs.schedule_once(
            &Self::job_key(&task.id),
            Duration::from_millis(delay as u64),
            ExistingJobPolicy::Replace,
            move || async move {
                notifier.notify(&notification);
            },
        )
    }

    /// Cancel the task's pending reminder job, if any.
    pub fn cancel(&self, task_id: &Uuid) -> bool {
        self.jobs.cancel(&Self::job_key(task_id))
    }

    /// Whether a reminder job for this task is still pending.
    pub fn is_pending(&self, task_id: &Uuid) -> bool {
        self.jobs.is_scheduled(&Self::job_key(task_id))
    }

    /// Number of pending reminder jobs.
    pub fn pending_count(&self) -> usize {
        self.jobs.pending_count()
    }

    fn job_key(task_id: &Uuid) -> String {
        format!("reminder:{task_id}")
    }
}
