//! Failure-injecting store wrapper for integration testing.
//!
//! Delegates to a `MemoryStore` but can be told to fail every operation
//! for one specific user, or to fail the user listing — the two failure
//! modes the sync loop must survive.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};

use lunobot::store::{MemoryStore, ProfileStore, StoreError};
use lunobot::types::UserProfile;

pub struct FlakyStore {
    inner: Arc<MemoryStore>,
    fail_for_user: Mutex<Option<String>>,
    fail_listing: Mutex<bool>,
}

impl FlakyStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            fail_for_user: Mutex::new(None),
            fail_listing: Mutex::new(false),
        }
    }

    /// Fail every read/write touching this user.
    pub fn fail_user(&self, user_id: &str) {
        *self.fail_for_user.lock().unwrap() = Some(user_id.to_string());
    }

    pub fn set_fail_listing(&self, fail: bool) {
        *self.fail_listing.lock().unwrap() = fail;
    }

    fn check_user(&self, user_id: &str) -> Result<(), StoreError> {
        if self.fail_for_user.lock().unwrap().as_deref() == Some(user_id) {
            return Err(StoreError::Unavailable(format!(
                "injected failure for {user_id}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for FlakyStore {
    async fn get_field(&self, user_id: &str, field: &str) -> Result<Option<Value>, StoreError> {
        self.check_user(user_id)?;
        self.inner.get_field(user_id, field).await
    }

    async fn patch(&self, user_id: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        self.check_user(user_id)?;
        self.inner.patch(user_id, fields).await
    }

    async fn list_user_ids(&self) -> Result<Vec<String>, StoreError> {
        if *self.fail_listing.lock().unwrap() {
            return Err(StoreError::Unavailable("injected listing failure".into()));
        }
        self.inner.list_user_ids().await
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        self.check_user(user_id)?;
        self.inner.get_profile(user_id).await
    }
}
