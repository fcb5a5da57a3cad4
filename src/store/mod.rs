//! Profile store integrations.
//!
//! Defines the `ProfileStore` trait, a key-value document store keyed by
//! user id with partial-update ("patch") semantics, and provides:
//! - `FirebaseStore`: Realtime Database REST backend (production)
//! - `MemoryStore`: in-process backend for local development and tests
//!
//! The store is the sole shared resource between the sync loop and the
//! HTTP handlers; all coordination happens through it.

pub mod firebase;
pub mod memory;

pub use firebase::FirebaseStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::UserProfile;

/// Wire names of the profile document fields.
///
/// The mixed snake/camel casing is historical; the records predate this
/// service and both naming styles are live in production data.
pub mod fields {
    pub const ZAR_BALANCE: &str = "zar_balance";
    pub const BTC_BALANCE: &str = "btc_balance";
    pub const STRATEGIES: &str = "strategies";
    pub const BOT_ACTIVE: &str = "botActive";
    pub const AWAITING_FUNDS: &str = "awaitingFunds";
}

/// Errors from store reads/writes.
///
/// Callers do not retry within a single reconciliation attempt — a failed
/// call abandons that user for the current cycle.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Abstraction over the per-user profile document store.
///
/// Patch semantics: fields absent from the mapping are left untouched.
/// A single patch call is applied together from the writer's perspective,
/// but is only per-field atomic across concurrent readers.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Read a single field of a user's document. `None` if the field
    /// (or the user) is absent.
    async fn get_field(&self, user_id: &str, field: &str) -> Result<Option<Value>, StoreError>;

    /// Apply a partial update to a user's document.
    async fn patch(&self, user_id: &str, fields: Map<String, Value>) -> Result<(), StoreError>;

    /// Point-in-time snapshot of all known user ids (shallow listing).
    async fn list_user_ids(&self) -> Result<Vec<String>, StoreError>;

    /// Read a user's full profile document. `None` if the user is absent.
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError>;
}
