//! Shared types for the LUNOBOT service.
//!
//! The user profile document and the derived-flag predicate live here so
//! that the sync loop and the HTTP layer depend on one definition of both.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// User profile
// ---------------------------------------------------------------------------

/// A user's profile document as stored at `users/{user_id}`.
///
/// Field names on the wire match the database records exactly (mixed
/// snake/camel casing is historical — the records predate this service).
/// Every field defaults so that partially-populated records deserialize.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct UserProfile {
    /// Fiat balance, last known value from the exchange.
    #[serde(default)]
    pub zar_balance: Decimal,
    /// Crypto balance, last known value from the exchange.
    #[serde(default)]
    pub btc_balance: Decimal,
    /// Configured strategy identifiers (opaque to the sync loop).
    #[serde(default)]
    pub strategies: Vec<i64>,
    /// Whether the user's trading bot is enabled. Mutated only by the
    /// toggle endpoint.
    #[serde(rename = "botActive", default)]
    pub bot_active: bool,
    /// Derived flag: bot is active but currently under-funded. Mutated
    /// only by the reconciler and the toggle endpoint.
    #[serde(rename = "awaitingFunds", default)]
    pub awaiting_funds: bool,
}

// ---------------------------------------------------------------------------
// Derived flag
// ---------------------------------------------------------------------------

/// The single definition of the "awaiting funds" predicate.
///
/// Both the reconciler and the bot-toggle endpoint derive the flag through
/// this function; the two paths must agree on the semantics.
pub fn awaiting_funds(bot_active: bool, fiat_balance: Decimal) -> bool {
    bot_active && fiat_balance <= Decimal::ZERO
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
