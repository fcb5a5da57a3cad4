//! In-memory store backend.
//!
//! Used for local development without a Firebase project and as the store
//! double in tests. Documents are plain JSON maps so the patch semantics
//! match the real backend exactly.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{ProfileStore, StoreError};
use crate::types::UserProfile;

/// In-process `ProfileStore` with the same patch semantics as Firebase.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<BTreeMap<String, Map<String, Value>>>,
    patches: Mutex<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user document from a profile value.
    pub fn insert_user(&self, user_id: &str, profile: &UserProfile) {
        let doc = match serde_json::to_value(profile) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        self.users.lock().unwrap().insert(user_id.to_string(), doc);
    }

    /// Raw document snapshot, for inspection.
    pub fn document(&self, user_id: &str) -> Option<Map<String, Value>> {
        self.users.lock().unwrap().get(user_id).cloned()
    }

    /// Number of patch calls applied so far.
    pub fn patch_count(&self) -> u64 {
        *self.patches.lock().unwrap()
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn get_field(&self, user_id: &str, field: &str) -> Result<Option<Value>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .get(user_id)
            .and_then(|doc| doc.get(field))
            .cloned())
    }

    async fn patch(&self, user_id: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        let mut users = self.users.lock().unwrap();
        let doc = users.entry(user_id.to_string()).or_default();
        for (key, value) in fields {
            doc.insert(key, value);
        }
        *self.patches.lock().unwrap() += 1;
        Ok(())
    }

    async fn list_user_ids(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.users.lock().unwrap().keys().cloned().collect())
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        let users = self.users.lock().unwrap();
        match users.get(user_id) {
            None => Ok(None),
            Some(doc) => serde_json::from_value(Value::Object(doc.clone()))
                .map(Some)
                .map_err(|e| StoreError::Unavailable(format!("Malformed profile document: {e}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
