//! Remote document-store abstraction.
//!
//! This module defines the common interface the backup orchestrator talks to,
//! along with the document model and error taxonomy shared by all remote
//! store implementations.

use async_trait::async_trait;

pub mod auth;
pub mod firestore;
pub mod memory;

pub use auth::AuthProvider;

/// An untyped remote document: field name to JSON value. The remote side
/// enforces no schema; readers must cope with missing or oddly-typed fields.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Common error types for remote store operations.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("precondition failed: {0}")]
    FailedPrecondition(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

/// Document path of a list: `users/{uid}/lists/{listId}`
pub fn list_path(uid: &str, list_id: &str) -> String {
    format!("users/{uid}/lists/{list_id}")
}

/// Document path of a task: `users/{uid}/lists/{listId}/tasks/{taskId}`
pub fn task_path(uid: &str, list_id: &str, task_id: &str) -> String {
    format!("users/{uid}/lists/{list_id}/tasks/{task_id}")
}

/// Document path of a step: `.../tasks/{taskId}/subtasks/{stepId}`
pub fn step_path(uid: &str, list_id: &str, task_id: &str, step_id: &str) -> String {
    format!("users/{uid}/lists/{list_id}/tasks/{task_id}/subtasks/{step_id}")
}

/// Document path of the connectivity probe: `users/{uid}/meta/{doc}`
pub fn probe_path(uid: &str) -> String {
    format!("users/{uid}/meta/{}", crate::constants::CONNECTIVITY_DOC_ID)
}

/// Remote store trait all document-store backends implement.
///
/// Every write targets one entity document and is independently fallible.
/// Writes use merge semantics: fields present in `fields` overwrite the
/// corresponding remote fields, fields absent are left untouched remotely.
/// A field cleared locally therefore stays at its old remote value until a
/// caller explicitly writes a null marker; callers must be aware of this.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// One trial write to the connectivity-test document.
    async fn probe(&self, uid: &str) -> Result<(), RemoteError>;

    async fn put_list(&self, uid: &str, list_id: &str, fields: &Document) -> Result<(), RemoteError>;

    async fn put_task(
        &self,
        uid: &str,
        list_id: &str,
        task_id: &str,
        fields: &Document,
    ) -> Result<(), RemoteError>;

    async fn put_step(
        &self,
        uid: &str,
        list_id: &str,
        task_id: &str,
        step_id: &str,
        fields: &Document,
    ) -> Result<(), RemoteError>;

    /// All list documents of a user, as (id, fields) pairs. No pagination:
    /// one request, one snapshot.
    async fn fetch_lists(&self, uid: &str) -> Result<Vec<(String, Document)>, RemoteError>;

    async fn fetch_tasks(&self, uid: &str, list_id: &str) -> Result<Vec<(String, Document)>, RemoteError>;

    async fn fetch_steps(
        &self,
        uid: &str,
        list_id: &str,
        task_id: &str,
    ) -> Result<Vec<(String, Document)>, RemoteError>;
}
