//! Mock exchange for integration testing.
//!
//! A deterministic `BalanceSource` whose balances are fully controllable
//! from test code, with a forced-error switch to simulate outages.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;

use lunobot::exchange::{BalanceSource, ExchangeError};

pub struct MockExchange {
    balances: Mutex<HashMap<String, Decimal>>,
    /// If set, all fetches return this error.
    force_error: Mutex<Option<String>>,
}

impl MockExchange {
    pub fn new(balances: Vec<(&str, Decimal)>) -> Self {
        Self {
            balances: Mutex::new(
                balances
                    .into_iter()
                    .map(|(code, amount)| (code.to_string(), amount))
                    .collect(),
            ),
            force_error: Mutex::new(None),
        }
    }

    /// Replace one currency's balance.
    pub fn set_balance(&self, code: &str, amount: Decimal) {
        self.balances
            .lock()
            .unwrap()
            .insert(code.to_string(), amount);
    }

    /// Drop a currency from subsequent responses entirely.
    pub fn remove_currency(&self, code: &str) {
        self.balances.lock().unwrap().remove(code);
    }

    /// Force all subsequent fetches to fail.
    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    /// Clear any forced error.
    pub fn clear_error(&self) {
        *self.force_error.lock().unwrap() = None;
    }
}

#[async_trait]
impl BalanceSource for MockExchange {
    async fn fetch_balances(&self) -> Result<HashMap<String, Decimal>, ExchangeError> {
        if let Some(err) = self.force_error.lock().unwrap().as_ref() {
            return Err(ExchangeError::Unavailable(err.clone()));
        }
        Ok(self.balances.lock().unwrap().clone())
    }

    fn name(&self) -> &str {
        "mock-exchange"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_mock_returns_configured_balances() {
        let exchange = MockExchange::new(vec![("ZAR", dec!(100)), ("XBT", dec!(0.5))]);
        let balances = exchange.fetch_balances().await.unwrap();
        assert_eq!(balances["ZAR"], dec!(100));
        assert_eq!(balances["XBT"], dec!(0.5));
    }

    #[tokio::test]
    async fn test_mock_forced_error() {
        let exchange = MockExchange::new(vec![("ZAR", dec!(100))]);
        exchange.set_error("simulated outage");
        assert!(exchange.fetch_balances().await.is_err());

        exchange.clear_error();
        assert!(exchange.fetch_balances().await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_remove_currency() {
        let exchange = MockExchange::new(vec![("ZAR", dec!(100)), ("XBT", dec!(0.5))]);
        exchange.remove_currency("XBT");
        let balances = exchange.fetch_balances().await.unwrap();
        assert!(!balances.contains_key("XBT"));
    }
}
