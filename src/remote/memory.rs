//! In-process remote store.
//!
//! Backs the `memory` backend kind: a document map with the same merge-write
//! semantics as the Firestore backend, usable offline and in tests. Failures
//! can be injected per path or globally.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use super::{list_path, probe_path, step_path, task_path, Document, RemoteError, RemoteStore};
use crate::utils::datetime;

#[derive(Default)]
pub struct MemoryRemote {
    documents: Mutex<BTreeMap<String, Document>>,
    fail_paths: Mutex<HashSet<String>>,
    fail_all: AtomicBool,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make writes and reads touching `path` fail with `Unavailable`.
    pub fn fail_path(&self, path: impl Into<String>) {
        self.fail_paths.lock().unwrap().insert(path.into());
    }

    /// Make every operation fail with `Unavailable`.
    pub fn set_fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of one document's fields.
    pub fn document(&self, path: &str) -> Option<Document> {
        self.documents.lock().unwrap().get(path).cloned()
    }

    /// All stored document paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.documents.lock().unwrap().keys().cloned().collect()
    }

    pub fn document_count(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    /// Seed a document directly, bypassing merge semantics.
    pub fn seed(&self, path: impl Into<String>, fields: Document) {
        self.documents.lock().unwrap().insert(path.into(), fields);
    }

    fn check(&self, path: &str) -> Result<(), RemoteError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("injected outage".to_string()));
        }
        if self.fail_paths.lock().unwrap().contains(path) {
            return Err(RemoteError::Unavailable(format!("injected failure: {path}")));
        }
        Ok(())
    }

    /// Merge-write: present fields overwrite, absent fields keep their old
    /// value. Matches the Firestore backend's updateMask behavior.
    fn merge(&self, path: &str, fields: &Document) -> Result<(), RemoteError> {
        self.check(path)?;
        let mut documents = self.documents.lock().unwrap();
        let doc = documents.entry(path.to_string()).or_default();
        for (key, value) in fields {
            doc.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    /// Documents directly under `{prefix}/`, i.e. whose remaining path is a
    /// bare id with no further nesting.
    fn collection(&self, prefix: &str) -> Result<Vec<(String, Document)>, RemoteError> {
        self.check(prefix)?;
        let prefix = format!("{prefix}/");
        let documents = self.documents.lock().unwrap();
        Ok(documents
            .iter()
            .filter_map(|(path, doc)| {
                let rest = path.strip_prefix(&prefix)?;
                if rest.contains('/') {
                    return None;
                }
                Some((rest.to_string(), doc.clone()))
            })
            .collect())
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn probe(&self, uid: &str) -> Result<(), RemoteError> {
        let mut fields = Document::new();
        fields.insert("probedAt".to_string(), json!(datetime::now_millis()));
        self.merge(&probe_path(uid), &fields)
    }

    async fn put_list(&self, uid: &str, list_id: &str, fields: &Document) -> Result<(), RemoteError> {
        self.merge(&list_path(uid, list_id), fields)
    }

    async fn put_task(
        &self,
        uid: &str,
        list_id: &str,
        task_id: &str,
        fields: &Document,
    ) -> Result<(), RemoteError> {
        self.merge(&task_path(uid, list_id, task_id), fields)
    }

    async fn put_step(
        &self,
        uid: &str,
        list_id: &str,
        task_id: &str,
        step_id: &str,
        fields: &Document,
    ) -> Result<(), RemoteError> {
        self.merge(&step_path(uid, list_id, task_id, step_id), fields)
    }

    async fn fetch_lists(&self, uid: &str) -> Result<Vec<(String, Document)>, RemoteError> {
        self.collection(&format!("users/{uid}/lists"))
    }

    async fn fetch_tasks(&self, uid: &str, list_id: &str) -> Result<Vec<(String, Document)>, RemoteError> {
        self.collection(&format!("{}/tasks", list_path(uid, list_id)))
    }

    async fn fetch_steps(
        &self,
        uid: &str,
        list_id: &str,
        task_id: &str,
    ) -> Result<Vec<(String, Document)>, RemoteError> {
        self.collection(&format!("{}/subtasks", task_path(uid, list_id, task_id)))
    }
}
