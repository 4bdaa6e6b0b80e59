//! Authentication clients.
//!
//! The backup path never runs unauthenticated: before any network operation
//! the orchestrator asks the auth provider to ensure a session exists,
//! creating an anonymous one if needed.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use log::error;
use serde::Deserialize;
use tokio::sync::Mutex;

/// Identity provider abstraction.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Returns true if a session already exists or an anonymous session
    /// could be created; false only if session creation fails (e.g. no
    /// connectivity). No retry is attempted; callers must re-invoke.
    async fn ensure_signed_in(&self) -> bool;

    /// User id of the current session, if any.
    async fn uid(&self) -> Option<String>;
}

#[derive(Debug, Clone, Deserialize)]
struct SignUpResponse {
    #[serde(rename = "idToken")]
    id_token: String,
    #[serde(rename = "localId")]
    local_id: String,
}

#[derive(Debug, Clone)]
struct Session {
    uid: String,
    id_token: String,
}

/// Anonymous-session client for the Firebase identity toolkit REST API.
pub struct FirebaseAuth {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    session: Mutex<Option<Session>>,
}

impl FirebaseAuth {
    const DEFAULT_ENDPOINT: &'static str = "https://identitytoolkit.googleapis.com/v1";

    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self::with_endpoint(client, api_key, Self::DEFAULT_ENDPOINT.to_string())
    }

    /// Point the client at a non-default endpoint (emulator, test server).
    pub fn with_endpoint(client: reqwest::Client, api_key: String, endpoint: String) -> Self {
        Self {
            client,
            api_key,
            endpoint,
            session: Mutex::new(None),
        }
    }

    /// Bearer token of the current session, if any.
    pub async fn token(&self) -> Option<String> {
        self.session.lock().await.as_ref().map(|s| s.id_token.clone())
    }

    /// `accounts:signUp` with an empty body creates an anonymous user.
    async fn sign_in_anonymously(&self) -> anyhow::Result<Session> {
        let url = format!("{}/accounts:signUp?key={}", self.endpoint, self.api_key);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "returnSecureToken": true }))
            .send()
            .await?
            .error_for_status()?;
        let body: SignUpResponse = response.json().await?;
        Ok(Session {
            uid: body.local_id,
            id_token: body.id_token,
        })
    }
}

#[async_trait]
impl AuthProvider for FirebaseAuth {
    async fn ensure_signed_in(&self) -> bool {
        let mut session = self.session.lock().await;
        if session.is_some() {
            return true;
        }
        match self.sign_in_anonymously().await {
            Ok(created) => {
                *session = Some(created);
                true
            }
            Err(e) => {
                error!("anonymous sign-in failed: {e}");
                false
            }
        }
    }

    async fn uid(&self) -> Option<String> {
        self.session.lock().await.as_ref().map(|s| s.uid.clone())
    }
}

/// In-process auth provider with a fixed user id. Used by the memory backend
/// and by tests; sign-in failure can be injected.
pub struct MemoryAuth {
    uid: String,
    fail_sign_in: AtomicBool,
}

impl MemoryAuth {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            fail_sign_in: AtomicBool::new(false),
        }
    }

    /// Make subsequent `ensure_signed_in` calls fail.
    pub fn set_fail_sign_in(&self, fail: bool) {
        self.fail_sign_in.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    async fn ensure_signed_in(&self) -> bool {
        if self.fail_sign_in.load(Ordering::SeqCst) {
            error!("anonymous sign-in failed: injected failure");
            return false;
        }
        true
    }

    async fn uid(&self) -> Option<String> {
        Some(self.uid.clone())
    }
}
