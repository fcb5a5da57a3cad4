//! Firebase Realtime Database store backend.
//!
//! Documents live at `users/{user_id}`. The REST API gives exactly the
//! primitives the trait needs:
//! - `GET  /users.json?shallow=true`     — key listing without documents
//! - `GET  /users/{id}/{field}.json`     — single-field read
//! - `PATCH /users/{id}.json`            — partial update
//!
//! A missing node reads as JSON `null` with status 200, so absence is not
//! an error path here.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::debug;

use super::{ProfileStore, StoreError};
use crate::types::UserProfile;

/// Realtime Database REST client.
pub struct FirebaseStore {
    http: Client,
    base_url: String,
    /// Database auth token, appended as the `auth` query parameter.
    auth_token: Option<String>,
}

impl FirebaseStore {
    pub fn new(base_url: impl Into<String>, auth_token: Option<String>) -> anyhow::Result<Self> {
        use anyhow::Context;

        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("LUNOBOT/0.1.0 (balance-sync)")
            .build()
            .context("Failed to build HTTP client for Firebase")?;

        let base_url = base_url.into();
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
        })
    }

    // -- Internal helpers ------------------------------------------------

    /// Build a node URL, appending any extra query parameters and the
    /// auth token.
    fn node_url(&self, path: &str, extra_query: Option<&str>) -> String {
        let mut url = format!("{}/{}.json", self.base_url, path);
        let mut sep = '?';
        if let Some(q) = extra_query {
            url.push(sep);
            url.push_str(q);
            sep = '&';
        }
        if let Some(token) = &self.auth_token {
            url.push(sep);
            url.push_str("auth=");
            url.push_str(token);
        }
        url
    }

    fn user_path(user_id: &str) -> String {
        format!("users/{}", urlencoding::encode(user_id))
    }

    /// GET a node and return its JSON value (`Null` for absent nodes).
    async fn get_node(&self, path: &str, extra_query: Option<&str>) -> Result<Value, StoreError> {
        let url = self.node_url(path, extra_query);
        debug!(path, "Firebase read");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(format!("Firebase request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Unavailable(format!(
                "Firebase error {status}: {body}"
            )));
        }

        resp.json()
            .await
            .map_err(|e| StoreError::Unavailable(format!("Firebase response parse failed: {e}")))
    }
}

#[async_trait]
impl ProfileStore for FirebaseStore {
    async fn get_field(&self, user_id: &str, field: &str) -> Result<Option<Value>, StoreError> {
        let path = format!("{}/{}", Self::user_path(user_id), field);
        let value = self.get_node(&path, None).await?;
        Ok(match value {
            Value::Null => None,
            v => Some(v),
        })
    }

    async fn patch(&self, user_id: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        let url = self.node_url(&Self::user_path(user_id), None);
        debug!(user_id, fields = fields.len(), "Firebase patch");

        let resp = self
            .http
            .patch(&url)
            .json(&Value::Object(fields))
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(format!("Firebase patch failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Unavailable(format!(
                "Firebase patch error {status}: {body}"
            )));
        }

        Ok(())
    }

    async fn list_user_ids(&self) -> Result<Vec<String>, StoreError> {
        // Shallow listing returns `{"<user_id>": true, ...}` or null when
        // no users exist yet.
        let value = self.get_node("users", Some("shallow=true")).await?;
        Ok(match value {
            Value::Object(map) => map.keys().cloned().collect(),
            _ => Vec::new(),
        })
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        let value = self.get_node(&Self::user_path(user_id), None).await?;
        match value {
            Value::Null => Ok(None),
            v => serde_json::from_value(v)
                .map(Some)
                .map_err(|e| StoreError::Unavailable(format!("Malformed profile document: {e}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
