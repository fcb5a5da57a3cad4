//! Core sync engine — the balance-reconciliation loop.
//!
//! `reconciler` handles one user: fetch balances, merge into the profile
//! document, derive the awaiting-funds flag. `poller` drives the
//! reconciler over all known users on a fixed cadence.

pub mod reconciler;
pub mod poller;

use thiserror::Error;

use crate::exchange::ExchangeError;
use crate::store::StoreError;

/// A per-user reconciliation failure.
///
/// Always recovered at the user boundary inside a cycle — it never
/// propagates past the poller's dispatch.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Source(#[from] ExchangeError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SyncError {
    /// Stable error-kind label for cycle reports and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Source(_) => "source_unavailable",
            SyncError::Store(_) => "store_unavailable",
        }
    }
}
