//! Exchange integrations.
//!
//! Defines the `BalanceSource` trait and provides the Luno implementation.
//! The sync loop only needs one capability from an exchange: reading the
//! current account balances per currency code.

pub mod luno;

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

/// Errors from an exchange balance query.
///
/// Transport, auth, and rate-limit failures are all collapsed into
/// `Unavailable`; the sync loop treats them identically (skip the user
/// this cycle, try again next cycle).
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("exchange unavailable: {0}")]
    Unavailable(String),
}

/// Abstraction over an exchange account-balance query.
///
/// Read-only: implementors must not mutate any remote state.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BalanceSource: Send + Sync {
    /// Fetch current holdings, keyed by currency code (e.g. "ZAR", "XBT").
    async fn fetch_balances(&self) -> Result<HashMap<String, Decimal>, ExchangeError>;

    /// Exchange name for logging and identification.
    fn name(&self) -> &str;
}
