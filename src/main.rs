//! LUNOBOT — per-user trading-bot profile service.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! constructs the store and exchange handles, spawns the balance poll
//! loop, and serves the HTTP API with graceful shutdown.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use lunobot::api;
use lunobot::api::routes::ApiContext;
use lunobot::config::AppConfig;
use lunobot::exchange::luno::LunoClient;
use lunobot::store::{FirebaseStore, ProfileStore};
use lunobot::sync::poller::Poller;
use lunobot::sync::reconciler::Reconciler;

const BANNER: &str = r#"
 _    _   _ _   _  ___  ____   ___ _____
| |  | | | | \ | |/ _ \| __ ) / _ \_   _|
| |  | | | |  \| | | | |  _ \| | | || |
| |__| |_| | |\  | |_| | |_) | |_| || |
|_____\___/|_| \_|\___/|____/ \___/ |_|

  Balance Sync & Bot Profile Service
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        service = %cfg.service.name,
        port = cfg.service.port,
        poll_interval_secs = cfg.poller.interval_secs,
        fiat = %cfg.exchange.fiat_currency,
        crypto = %cfg.exchange.crypto_currency,
        "LUNOBOT starting up"
    );

    // -- Store handle ----------------------------------------------------
    // Constructed once here and shared by the poller and the HTTP layer;
    // it is the only resource the two have in common.

    let store_token = match &cfg.store.auth_token_env {
        Some(env_name) => Some(AppConfig::resolve_env(env_name)?),
        None => None,
    };
    let store: Arc<dyn ProfileStore> =
        Arc::new(FirebaseStore::new(&cfg.store.base_url, store_token)?);

    // -- Balance poll loop -----------------------------------------------

    let poller = if cfg.poller.enabled {
        let api_key_id = AppConfig::resolve_env(&cfg.exchange.api_key_id_env)?;
        let api_key_secret = AppConfig::resolve_env(&cfg.exchange.api_key_secret_env)?;
        let exchange = Arc::new(LunoClient::new(
            &cfg.exchange.base_url,
            api_key_id,
            api_key_secret,
        )?);

        let reconciler = Reconciler::new(
            exchange,
            store.clone(),
            cfg.exchange.fiat_currency.clone(),
            cfg.exchange.crypto_currency.clone(),
        );
        let poller = Poller::new(
            store.clone(),
            reconciler,
            Duration::from_secs(cfg.poller.interval_secs),
        );
        Some(poller.spawn())
    } else {
        warn!("Poller disabled — serving API only");
        None
    };

    // -- HTTP API --------------------------------------------------------

    let state = Arc::new(ApiContext {
        store: store.clone(),
    });
    let app = api::build_router(state, cfg.service.frontend_origin.clone());

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], cfg.service.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind port {}", cfg.service.port))?;
    info!(port = cfg.service.port, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received.");
        })
        .await
        .context("API server error")?;

    // Stop the poll loop before exiting so the last cycle isn't cut off
    // mid-write.
    if let Some(handle) = poller {
        handle.stop().await;
    }

    info!("LUNOBOT shut down cleanly.");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("lunobot=info"));

    let json_logging = std::env::var("LUNOBOT_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
