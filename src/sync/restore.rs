use anyhow::Result;
use log::{info, warn};
use uuid::Uuid;

use super::{documents, log_remote_error, BackupService, BackupStatus};
use crate::repositories::{ListRepository, StepRepository, TaskRepository};

impl BackupService {
    /// Replace local data with the remote mirror.
    ///
    /// The local clear runs only after the remote store confirmed it holds at
    /// least one list, but there is no staging or atomic swap: a crash
    /// between the clear and the inserts leaves an empty database.
    /// Attachments are never mirrored remotely and are not restored.
    pub(super) async fn perform_restore(&self) -> Result<BackupStatus> {
        let uid = match self.verify_connectivity().await {
            Ok(uid) => uid,
            Err(message) => return Ok(BackupStatus::Error { message }),
        };

        let remote_lists = match self.remote.fetch_lists(&uid).await {
            Ok(lists) => lists,
            Err(e) => {
                log_remote_error("list fetch", &e);
                return Ok(BackupStatus::Error {
                    message: format!("failed to fetch remote lists: {e}"),
                });
            }
        };
        if remote_lists.is_empty() {
            warn!("restore: remote store holds no lists, keeping local data");
            return Ok(BackupStatus::Error {
                message: "no remote backup found".to_string(),
            });
        }

        {
            let storage = self.storage.lock().await;
            storage.clear_all_data().await?;
        }
        info!("restore: cleared local data, inserting {} remote lists", remote_lists.len());

        let mut restored = 0usize;

        for (list_id, list_doc) in &remote_lists {
            let local_list_id = parse_or_new_id(list_id);
            {
                let storage = self.storage.lock().await;
                ListRepository::insert(&storage.conn, documents::list_from_document(local_list_id, list_doc))
                    .await?;
            }
            restored += 1;

            let remote_tasks = self.remote.fetch_tasks(&uid, list_id).await?;
            for (task_id, task_doc) in &remote_tasks {
                let local_task_id = parse_or_new_id(task_id);
                {
                    let storage = self.storage.lock().await;
                    TaskRepository::insert(
                        &storage.conn,
                        documents::task_from_document(local_task_id, local_list_id, task_doc),
                    )
                    .await?;
                }
                restored += 1;

                let remote_steps = self.remote.fetch_steps(&uid, list_id, task_id).await?;
                for (step_id, step_doc) in &remote_steps {
                    let local_step_id = parse_or_new_id(step_id);
                    let storage = self.storage.lock().await;
                    StepRepository::insert(
                        &storage.conn,
                        documents::step_from_document(local_step_id, local_task_id, step_doc),
                    )
                    .await?;
                    restored += 1;
                }
            }
        }

        info!("restore finished: {restored} rows inserted");
        Ok(BackupStatus::Success {
            succeeded: restored,
            failed: 0,
        })
    }
}

/// Remote documents are keyed by the local entity's id string; a document
/// whose key is not a UUID (written by another client) still restores, under
/// a fresh id.
fn parse_or_new_id(raw: &str) -> Uuid {
    Uuid::parse_str(raw).unwrap_or_else(|_| Uuid::new_v4())
}
