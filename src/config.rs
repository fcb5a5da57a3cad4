//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (API keys, store tokens) are referenced by env-var name in the
//! config and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub exchange: ExchangeConfig,
    pub store: StoreConfig,
    pub poller: PollerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub name: String,
    pub port: u16,
    /// Allowed browser origin for CORS. `None` means allow any origin
    /// (local development).
    #[serde(default)]
    pub frontend_origin: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExchangeConfig {
    /// Luno REST API base, overridable for testing against a stub.
    #[serde(default = "default_exchange_base_url")]
    pub base_url: String,
    pub api_key_id_env: String,
    pub api_key_secret_env: String,
    /// Fiat currency code tracked for funding checks.
    #[serde(default = "default_fiat_currency")]
    pub fiat_currency: String,
    /// Crypto currency code tracked alongside the fiat balance.
    #[serde(default = "default_crypto_currency")]
    pub crypto_currency: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Realtime Database root, e.g. "https://yourproject.firebaseio.com".
    pub base_url: String,
    /// Env var holding the database auth token. Optional for open
    /// development databases.
    #[serde(default)]
    pub auth_token_env: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollerConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub interval_secs: u64,
    /// Disable to run the HTTP API without the background loop.
    #[serde(default = "default_poller_enabled")]
    pub enabled: bool,
}

fn default_exchange_base_url() -> String {
    "https://api.luno.com".to_string()
}

fn default_fiat_currency() -> String {
    "ZAR".to_string()
}

fn default_crypto_currency() -> String {
    "XBT".to_string()
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_poller_enabled() -> bool {
    true
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
