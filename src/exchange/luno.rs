//! Luno exchange integration.
//!
//! Balances only — order placement goes through a separate execution
//! service and is not part of this crate.
//!
//! API docs: https://www.luno.com/en/developers/api
//! Base URL: https://api.luno.com
//! Auth: HTTP Basic with API key id / secret.

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, warn};

use super::{BalanceSource, ExchangeError};

const EXCHANGE_NAME: &str = "luno";

// ---------------------------------------------------------------------------
// API response types (Luno JSON → Rust)
// ---------------------------------------------------------------------------

/// Response from `GET /api/1/balance`.
#[derive(Debug, Deserialize)]
struct BalanceResponse {
    #[serde(default)]
    balance: Vec<AccountBalance>,
}

/// One account entry. A user may hold several accounts in the same
/// currency; amounts are decimal strings on the wire.
#[derive(Debug, Deserialize)]
struct AccountBalance {
    /// Currency code. Older API versions called this field "currency".
    #[serde(alias = "currency")]
    asset: String,
    balance: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Luno REST client scoped to the balance endpoint.
pub struct LunoClient {
    http: Client,
    base_url: String,
    api_key_id: String,
    api_key_secret: Secret<String>,
}

impl LunoClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key_id: String,
        api_key_secret: String,
    ) -> anyhow::Result<Self> {
        use anyhow::Context;

        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("LUNOBOT/0.1.0 (balance-sync)")
            .build()
            .context("Failed to build HTTP client for Luno")?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key_id,
            api_key_secret: Secret::new(api_key_secret),
        })
    }
}

#[async_trait]
impl BalanceSource for LunoClient {
    async fn fetch_balances(&self) -> Result<HashMap<String, Decimal>, ExchangeError> {
        let url = format!("{}/api/1/balance", self.base_url);
        debug!(url = %url, "Fetching Luno balances");

        let resp = self
            .http
            .get(&url)
            .basic_auth(&self.api_key_id, Some(self.api_key_secret.expose_secret()))
            .send()
            .await
            .map_err(|e| ExchangeError::Unavailable(format!("Luno request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ExchangeError::Unavailable(format!(
                "Luno API error {status}: {body}"
            )));
        }

        let parsed: BalanceResponse = resp
            .json()
            .await
            .map_err(|e| ExchangeError::Unavailable(format!("Luno balance parse failed: {e}")))?;

        let mut balances: HashMap<String, Decimal> = HashMap::new();
        for account in parsed.balance {
            match Decimal::from_str(&account.balance) {
                Ok(amount) => {
                    // Sum across accounts holding the same currency.
                    *balances.entry(account.asset).or_insert(Decimal::ZERO) += amount;
                }
                Err(e) => {
                    warn!(
                        asset = %account.asset,
                        raw = %account.balance,
                        error = %e,
                        "Skipping unparseable balance entry"
                    );
                }
            }
        }

        debug!(currencies = balances.len(), "Luno balances fetched");
        Ok(balances)
    }

    fn name(&self) -> &str {
        EXCHANGE_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
