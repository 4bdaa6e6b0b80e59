//! Firestore REST backend for the remote store.
//!
//! Documents are addressed as
//! `projects/{project}/databases/(default)/documents/{path}` and written with
//! an explicit `updateMask` listing exactly the fields present in the payload,
//! which gives the merge-on-write semantics the [`RemoteStore`] contract
//! requires.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::auth::FirebaseAuth;
use super::{list_path, probe_path, step_path, task_path, Document, RemoteError, RemoteStore};
use crate::utils::datetime;

/// Remote store backed by the Firestore v1 REST API.
pub struct FirestoreRemote {
    client: reqwest::Client,
    auth: Arc<FirebaseAuth>,
    base_url: String,
}

impl FirestoreRemote {
    const DEFAULT_HOST: &'static str = "https://firestore.googleapis.com/v1";

    pub fn new(client: reqwest::Client, auth: Arc<FirebaseAuth>, project_id: &str) -> Self {
        Self::with_host(client, auth, project_id, Self::DEFAULT_HOST)
    }

    /// Point the client at a non-default host (emulator, test server).
    pub fn with_host(
        client: reqwest::Client,
        auth: Arc<FirebaseAuth>,
        project_id: &str,
        host: &str,
    ) -> Self {
        Self {
            client,
            auth,
            base_url: format!("{host}/projects/{project_id}/databases/(default)/documents"),
        }
    }

    async fn bearer(&self) -> Result<String, RemoteError> {
        self.auth
            .token()
            .await
            .ok_or_else(|| RemoteError::Unauthenticated("no session".to_string()))
    }

    /// Merge-write one document: only the fields present in `fields` are
    /// named in the update mask, so absent fields keep their remote value.
    async fn patch(&self, path: &str, fields: &Document) -> Result<(), RemoteError> {
        let token = self.bearer().await?;
        let url = format!("{}/{}", self.base_url, path);

        let mask: Vec<(&str, &str)> = fields
            .keys()
            .map(|k| ("updateMask.fieldPaths", k.as_str()))
            .collect();
        let body = json!({ "fields": encode_fields(fields) });

        let response = self
            .client
            .patch(&url)
            .query(&mask)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        check_status(response).await?;
        Ok(())
    }

    /// Read every document of one collection. One request, one snapshot: the
    /// response's continuation token is ignored, matching the contract's
    /// no-pagination clause.
    async fn list_collection(&self, parent: &str, collection: &str) -> Result<Vec<(String, Document)>, RemoteError> {
        let token = self.bearer().await?;
        let url = format!("{}/{}/{}", self.base_url, parent, collection);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let body: Value = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| RemoteError::InvalidData(e.to_string()))?;

        let mut documents = Vec::new();
        if let Some(items) = body.get("documents").and_then(Value::as_array) {
            for item in items {
                let Some(name) = item.get("name").and_then(Value::as_str) else {
                    continue;
                };
                let id = name.rsplit('/').next().unwrap_or_default().to_string();
                let fields = item
                    .get("fields")
                    .and_then(Value::as_object)
                    .map(decode_fields)
                    .unwrap_or_default();
                documents.push((id, fields));
            }
        }
        Ok(documents)
    }
}

#[async_trait]
impl RemoteStore for FirestoreRemote {
    async fn probe(&self, uid: &str) -> Result<(), RemoteError> {
        let mut fields = Document::new();
        fields.insert("probedAt".to_string(), json!(datetime::now_millis()));
        self.patch(&probe_path(uid), &fields).await
    }

    async fn put_list(&self, uid: &str, list_id: &str, fields: &Document) -> Result<(), RemoteError> {
        self.patch(&list_path(uid, list_id), fields).await
    }

    async fn put_task(
        &self,
        uid: &str,
        list_id: &str,
        task_id: &str,
        fields: &Document,
    ) -> Result<(), RemoteError> {
        self.patch(&task_path(uid, list_id, task_id), fields).await
    }

    async fn put_step(
        &self,
        uid: &str,
        list_id: &str,
        task_id: &str,
        step_id: &str,
        fields: &Document,
    ) -> Result<(), RemoteError> {
        self.patch(&step_path(uid, list_id, task_id, step_id), fields).await
    }

    async fn fetch_lists(&self, uid: &str) -> Result<Vec<(String, Document)>, RemoteError> {
        self.list_collection(&format!("users/{uid}"), "lists").await
    }

    async fn fetch_tasks(&self, uid: &str, list_id: &str) -> Result<Vec<(String, Document)>, RemoteError> {
        self.list_collection(&list_path(uid, list_id), "tasks").await
    }

    async fn fetch_steps(
        &self,
        uid: &str,
        list_id: &str,
        task_id: &str,
    ) -> Result<Vec<(String, Document)>, RemoteError> {
        self.list_collection(&task_path(uid, list_id, task_id), "subtasks").await
    }
}

/// Map an HTTP response onto the error taxonomy, passing successes through.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| status.to_string());

    Err(match status.as_u16() {
        401 => RemoteError::Unauthenticated(detail),
        403 => RemoteError::PermissionDenied(detail),
        400 if detail.contains("FAILED_PRECONDITION") => RemoteError::FailedPrecondition(detail),
        429 | 500..=599 => RemoteError::Unavailable(detail),
        _ => RemoteError::Network(detail),
    })
}

/// Encode plain JSON fields into Firestore's typed value representation.
fn encode_fields(fields: &Document) -> Map<String, Value> {
    fields.iter().map(|(k, v)| (k.clone(), encode_value(v))).collect()
}

fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                // Firestore carries 64-bit integers as strings
                json!({ "integerValue": i.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => {
            let fields: Map<String, Value> =
                map.iter().map(|(k, v)| (k.clone(), encode_value(v))).collect();
            json!({ "mapValue": { "fields": fields } })
        }
    }
}

/// Decode Firestore's typed value representation back into plain JSON.
/// Unknown value kinds decode to null rather than failing.
fn decode_fields(fields: &Map<String, Value>) -> Document {
    fields.iter().map(|(k, v)| (k.clone(), decode_value(v))).collect()
}

fn decode_value(value: &Value) -> Value {
    let Some(map) = value.as_object() else {
        return Value::Null;
    };

    if let Some(s) = map.get("stringValue").and_then(Value::as_str) {
        return Value::String(s.to_string());
    }
    if let Some(b) = map.get("booleanValue").and_then(Value::as_bool) {
        return Value::Bool(b);
    }
    if let Some(i) = map.get("integerValue") {
        let parsed = match i {
            Value::String(s) => s.parse::<i64>().ok(),
            Value::Number(n) => n.as_i64(),
            _ => None,
        };
        if let Some(i) = parsed {
            return json!(i);
        }
    }
    if let Some(d) = map.get("doubleValue").and_then(Value::as_f64) {
        return json!(d);
    }
    if let Some(items) = map
        .get("arrayValue")
        .and_then(|a| a.get("values"))
        .and_then(Value::as_array)
    {
        return Value::Array(items.iter().map(decode_value).collect());
    }
    if let Some(fields) = map
        .get("mapValue")
        .and_then(|m| m.get("fields"))
        .and_then(Value::as_object)
    {
        return Value::Object(fields.iter().map(|(k, v)| (k.clone(), decode_value(v))).collect());
    }
    Value::Null
}
