//! Debounced task search.
//!
//! Typing in a search box issues a call per keystroke; the debouncer applies
//! a fixed quiet period before querying and delivers results only for the
//! most recent call. Superseded calls return `None` and are discarded, never
//! merged.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::Mutex;

use crate::constants::SEARCH_DEBOUNCE_MS;
use crate::entities::task;
use crate::repositories::TaskRepository;
use crate::storage::LocalStorage;

pub struct SearchDebouncer {
    storage: Arc<Mutex<LocalStorage>>,
    delay: Duration,
    generation: AtomicU64,
}

impl SearchDebouncer {
    pub fn new(storage: Arc<Mutex<LocalStorage>>) -> Self {
        Self::with_delay(storage, Duration::from_millis(SEARCH_DEBOUNCE_MS))
    }

    /// Custom quiet period; tests use short delays.
    pub fn with_delay(storage: Arc<Mutex<LocalStorage>>, delay: Duration) -> Self {
        Self {
            storage,
            delay,
            generation: AtomicU64::new(0),
        }
    }

    /// Wait out the quiet period, then query. If a newer search arrived
    /// meanwhile, this one is discarded and returns `None`.
    pub async fn search(&self, query: &str) -> Result<Option<Vec<task::Model>>> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        tokio::time::sleep(self.delay).await;

        if self.generation.load(Ordering::SeqCst) != ticket {
            return Ok(None);
        }

        let storage = self.storage.lock().await;
        Ok(Some(TaskRepository::search(&storage.conn, query).await?))
    }
}
