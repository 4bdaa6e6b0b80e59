//! Backup/restore orchestration module.
//!
//! This module provides the [`BackupService`] struct which mirrors local
//! lists, tasks and steps to a remote document store and reconstructs them
//! from it. It is a thin sequential orchestration layer: one remote write per
//! entity, per-item success/failure accounting, no conflict resolution.
//! The remote side is last-writer-wins.

pub mod documents;

mod backup;
mod restore;

use std::sync::Arc;

use anyhow::Result;
use log::{error, warn};
use tokio::sync::Mutex;

use crate::remote::{AuthProvider, RemoteError, RemoteStore};
use crate::settings::SettingsStore;
use crate::storage::LocalStorage;

enum Operation {
    Backup,
    Restore,
}

/// Outcome of a backup or restore run.
///
/// Only a static message is surfaced for errors; per-item detail goes to the
/// logs.
#[derive(Debug, Clone, PartialEq)]
pub enum BackupStatus {
    /// No operation is currently running
    Idle,
    /// Another run is already in progress; this request was not started
    InProgress,
    /// The run completed, with per-item counts
    Success {
        /// Number of entity documents pushed (backup) or rows inserted (restore)
        succeeded: usize,
        /// Number of entity documents that failed
        failed: usize,
    },
    /// The run failed as a whole
    Error { message: String },
}

impl BackupStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, BackupStatus::Success { .. })
    }
}

/// Service that mirrors local data to a remote document store.
///
/// Pushes are strictly sequential, which keeps the failure accounting simple
/// at the cost of latency linear in the item count. A single-flight guard
/// rejects a second run while one is in progress instead of letting two runs
/// interleave writes to the same documents.
pub struct BackupService {
    storage: Arc<Mutex<LocalStorage>>,
    auth: Arc<dyn AuthProvider>,
    remote: Arc<dyn RemoteStore>,
    settings: Option<Arc<SettingsStore>>,
    in_progress: Arc<Mutex<bool>>,
}

impl BackupService {
    pub fn new(
        storage: Arc<Mutex<LocalStorage>>,
        auth: Arc<dyn AuthProvider>,
        remote: Arc<dyn RemoteStore>,
    ) -> Self {
        Self {
            storage,
            auth,
            remote,
            settings: None,
            in_progress: Arc::new(Mutex::new(false)),
        }
    }

    /// Stamp `last_backup_at` in the given settings store after successful
    /// backups.
    pub fn with_settings(mut self, settings: Arc<SettingsStore>) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Whether a backup or restore run is currently in progress.
    pub async fn is_running(&self) -> bool {
        *self.in_progress.lock().await
    }

    /// Push all local lists, tasks and steps to the remote store.
    ///
    /// Never panics or returns `Err` to the caller: every failure is caught
    /// and reported as a [`BackupStatus`], so the scheduled-job wrapper can
    /// treat any non-success as "retry".
    pub async fn backup(&self) -> BackupStatus {
        self.run(Operation::Backup).await
    }

    /// Replace all local data with the latest remote mirror.
    ///
    /// Destructive: local lists are cleared (cascading to tasks, steps and
    /// attachments) before the first restored row is inserted, and only after
    /// the remote store confirmed it holds at least one list.
    pub async fn restore(&self) -> BackupStatus {
        self.run(Operation::Restore).await
    }

    /// Single-flight wrapper: takes the guard, runs the operation, converts
    /// any error into a status.
    async fn run(&self, operation: Operation) -> BackupStatus {
        {
            let mut guard = self.in_progress.lock().await;
            if *guard {
                return BackupStatus::InProgress;
            }
            *guard = true;
        }

        let result = match operation {
            Operation::Backup => self.perform_backup().await,
            Operation::Restore => self.perform_restore().await,
        };

        *self.in_progress.lock().await = false;

        match result {
            Ok(status) => status,
            Err(e) => {
                error!("backup/restore run failed: {e:#}");
                BackupStatus::Error {
                    message: format!("operation failed: {e}"),
                }
            }
        }
    }

    /// Confirm the remote side is reachable: ensure a session exists
    /// (creating an anonymous one if needed), then perform one trial write to
    /// the connectivity-test document. Returns the user id on success.
    pub(crate) async fn verify_connectivity(&self) -> Result<String, String> {
        if !self.auth.ensure_signed_in().await {
            return Err("sign-in failed".to_string());
        }
        let Some(uid) = self.auth.uid().await else {
            return Err("no user id after sign-in".to_string());
        };
        if let Err(e) = self.remote.probe(&uid).await {
            log_remote_error("connectivity probe", &e);
            return Err(format!("connectivity probe failed: {e}"));
        }
        Ok(uid)
    }
}

/// Log a remote failure with its taxonomy category. Diagnostic only; callers
/// see a plain boolean/status outcome.
pub(crate) fn log_remote_error(context: &str, err: &RemoteError) {
    let category = match err {
        RemoteError::PermissionDenied(_) => "permission-denied",
        RemoteError::Unauthenticated(_) => "unauthenticated",
        RemoteError::Unavailable(_) => "unavailable",
        RemoteError::FailedPrecondition(_) => "precondition-failed",
        RemoteError::Network(_) => "network",
        RemoteError::InvalidData(_) => "invalid-data",
    };
    warn!("{context} failed ({category}): {err}");
}
