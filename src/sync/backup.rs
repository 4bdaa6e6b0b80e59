use anyhow::Result;
use log::info;

use super::{documents, log_remote_error, BackupService, BackupStatus};
use crate::repositories::{ListRepository, StepRepository, TaskRepository};
use crate::utils::datetime;

impl BackupService {
    /// Sequential full backup: lists, then each pushed list's tasks, then
    /// each task's steps. A failed list push skips that list's tasks
    /// entirely; a failed task push still attempts its steps.
    pub(super) async fn perform_backup(&self) -> Result<BackupStatus> {
        let uid = match self.verify_connectivity().await {
            Ok(uid) => uid,
            Err(message) => return Ok(BackupStatus::Error { message }),
        };

        let lists = {
            let storage = self.storage.lock().await;
            ListRepository::get_all(&storage.conn).await?
        };
        if lists.is_empty() {
            info!("backup: no local lists, nothing to do");
            return Ok(BackupStatus::Success { succeeded: 0, failed: 0 });
        }

        let mut succeeded = 0usize;
        let mut failed = 0usize;

        for list in &lists {
            let list_id = list.id.to_string();
            match self
                .remote
                .put_list(&uid, &list_id, &documents::list_to_document(list))
                .await
            {
                Ok(()) => succeeded += 1,
                Err(e) => {
                    failed += 1;
                    log_remote_error(&format!("list push {list_id}"), &e);
                    // Short-circuit per list: its tasks are not attempted
                    continue;
                }
            }

            let tasks = {
                let storage = self.storage.lock().await;
                TaskRepository::get_for_list(&storage.conn, Some(&list.id)).await?
            };

            for task in &tasks {
                let task_id = task.id.to_string();
                match self
                    .remote
                    .put_task(&uid, &list_id, &task_id, &documents::task_to_document(task))
                    .await
                {
                    Ok(()) => succeeded += 1,
                    Err(e) => {
                        failed += 1;
                        log_remote_error(&format!("task push {task_id}"), &e);
                        // Steps are still attempted below
                    }
                }

                let steps = {
                    let storage = self.storage.lock().await;
                    StepRepository::get_for_task(&storage.conn, &task.id).await?
                };

                for step in &steps {
                    let step_id = step.id.to_string();
                    match self
                        .remote
                        .put_step(&uid, &list_id, &task_id, &step_id, &documents::step_to_document(step))
                        .await
                    {
                        Ok(()) => succeeded += 1,
                        Err(e) => {
                            failed += 1;
                            log_remote_error(&format!("step push {step_id}"), &e);
                        }
                    }
                }
            }
        }

        info!("backup finished: {succeeded} pushed, {failed} failed");

        // Lenient policy: a partial backup counts as success; failure is
        // reported only when nothing at all went through.
        if failed == 0 || succeeded > 0 {
            if let Some(settings) = &self.settings {
                let stamped = datetime::now_millis();
                if let Err(e) = settings.update(|s| s.last_backup_at = Some(stamped)) {
                    log::warn!("failed to stamp last backup time: {e:#}");
                }
            }
            Ok(BackupStatus::Success { succeeded, failed })
        } else {
            Ok(BackupStatus::Error {
                message: format!("backup failed: all {failed} items failed"),
            })
        }
    }
}
