//! Per-user balance reconciliation.
//!
//! For one user: fetch exchange balances, merge them into the profile
//! document, and derive the awaiting-funds flag from the bot's activation
//! state and the freshly observed fiat balance.
//!
//! The flag write rule is asymmetric and deliberate:
//! - a true→false transition is always written,
//! - a derived true is always written (even when already true),
//! - false staying false writes nothing.
//!
//! The HTTP toggle endpoint mutates the same document concurrently; the
//! reconciler never assumes it is the only writer.

use rust_decimal::Decimal;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

use super::SyncError;
use crate::exchange::BalanceSource;
use crate::store::{fields, ProfileStore};
use crate::types::awaiting_funds;

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// What one reconciliation attempt observed and wrote.
#[derive(Debug, Clone)]
pub struct UserSyncReport {
    pub user_id: String,
    /// Fiat balance refreshed this cycle, if the fetch included it.
    pub fiat_balance: Option<Decimal>,
    /// Crypto balance refreshed this cycle, if the fetch included it.
    pub crypto_balance: Option<Decimal>,
    /// Flag value written this cycle. `None` when the no-op branch was taken.
    pub flag_written: Option<bool>,
    /// The derived awaiting-funds value, whether or not it was written.
    pub awaiting_funds: bool,
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

pub struct Reconciler {
    source: Arc<dyn BalanceSource>,
    store: Arc<dyn ProfileStore>,
    fiat_currency: String,
    crypto_currency: String,
}

impl Reconciler {
    pub fn new(
        source: Arc<dyn BalanceSource>,
        store: Arc<dyn ProfileStore>,
        fiat_currency: String,
        crypto_currency: String,
    ) -> Self {
        Self {
            source,
            store,
            fiat_currency,
            crypto_currency,
        }
    }

    /// Reconcile one user.
    ///
    /// Any error aborts the remainder of this user's reconciliation for
    /// the cycle; a fetch failure happens before any store write, so it
    /// leaves the document untouched.
    pub async fn reconcile_user(&self, user_id: &str) -> Result<UserSyncReport, SyncError> {
        let balances = self.source.fetch_balances().await?;
        let new_fiat = balances.get(&self.fiat_currency).copied();
        let new_crypto = balances.get(&self.crypto_currency).copied();

        // Patch only the balances present in the fetch — a currency the
        // exchange omitted must not clobber the stored value.
        let mut patch = Map::new();
        if let Some(fiat) = new_fiat {
            patch.insert(fields::ZAR_BALANCE.to_string(), json!(fiat));
        }
        if let Some(crypto) = new_crypto {
            patch.insert(fields::BTC_BALANCE.to_string(), json!(crypto));
        }
        if !patch.is_empty() {
            self.store.patch(user_id, patch).await?;
        }

        let bot_active = self.read_bool(user_id, fields::BOT_ACTIVE).await?;
        let prev_awaiting = self.read_bool(user_id, fields::AWAITING_FUNDS).await?;

        // Funding check uses this cycle's fiat balance when refreshed,
        // otherwise whatever is on record.
        let effective_fiat = match new_fiat {
            Some(fiat) => fiat,
            None => self.read_decimal(user_id, fields::ZAR_BALANCE).await?,
        };
        let new_awaiting = awaiting_funds(bot_active, effective_fiat);

        let flag_written = if prev_awaiting && !new_awaiting {
            self.write_flag(user_id, false).await?;
            info!(user_id, "Funds arrived — awaitingFunds cleared");
            Some(false)
        } else if new_awaiting {
            self.write_flag(user_id, true).await?;
            if !prev_awaiting {
                info!(user_id, fiat = %effective_fiat, "Bot active but under-funded — awaitingFunds set");
            }
            Some(true)
        } else {
            None
        };

        debug!(
            user_id,
            fiat = ?new_fiat,
            crypto = ?new_crypto,
            awaiting = new_awaiting,
            "User reconciled"
        );

        Ok(UserSyncReport {
            user_id: user_id.to_string(),
            fiat_balance: new_fiat,
            crypto_balance: new_crypto,
            flag_written,
            awaiting_funds: new_awaiting,
        })
    }

    // -- Internal helpers ------------------------------------------------

    async fn read_bool(&self, user_id: &str, field: &str) -> Result<bool, SyncError> {
        let value = self.store.get_field(user_id, field).await?;
        Ok(value.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    async fn read_decimal(&self, user_id: &str, field: &str) -> Result<Decimal, SyncError> {
        let value = self.store.get_field(user_id, field).await?;
        Ok(value
            .and_then(|v| serde_json::from_value::<Decimal>(v).ok())
            .unwrap_or(Decimal::ZERO))
    }

    async fn write_flag(&self, user_id: &str, value: bool) -> Result<(), SyncError> {
        let mut patch = Map::new();
        patch.insert(fields::AWAITING_FUNDS.to_string(), Value::Bool(value));
        self.store.patch(user_id, patch).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
