//! End-to-end sync loop tests.
//!
//! Drive the poller against the in-memory store and the mock exchange,
//! covering the full funding journey and both failure-isolation modes.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use lunobot::api;
use lunobot::api::routes::ApiContext;
use lunobot::store::{MemoryStore, ProfileStore};
use lunobot::sync::poller::Poller;
use lunobot::sync::reconciler::Reconciler;
use lunobot::types::UserProfile;

use crate::flaky_store::FlakyStore;
use crate::mock_exchange::MockExchange;

fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.insert_user(
        "alice",
        &UserProfile {
            zar_balance: dec!(10),
            btc_balance: dec!(0.4),
            strategies: vec![1],
            bot_active: true,
            awaiting_funds: false,
        },
    );
    store.insert_user(
        "bob",
        &UserProfile {
            zar_balance: dec!(10),
            btc_balance: dec!(0.4),
            ..Default::default()
        },
    );
    store
}

fn poller_over(
    exchange: Arc<MockExchange>,
    store: Arc<dyn ProfileStore>,
    interval: Duration,
) -> Poller {
    let reconciler = Reconciler::new(
        exchange,
        store.clone(),
        "ZAR".to_string(),
        "XBT".to_string(),
    );
    Poller::new(store, reconciler, interval)
}

#[tokio::test]
async fn test_full_cycle_updates_all_users() {
    let store = seeded_store();
    let exchange = Arc::new(MockExchange::new(vec![("ZAR", dec!(0)), ("XBT", dec!(0.9))]));
    let poller = poller_over(exchange, store.clone(), Duration::from_secs(60));

    let report = poller.run_cycle().await.unwrap();
    assert_eq!(report.users_listed, 2);
    assert_eq!(report.synced.len(), 2);
    assert!(report.failed.is_empty());

    // Alice's bot is active and the fiat balance hit zero.
    let alice = store.get_profile("alice").await.unwrap().unwrap();
    assert_eq!(alice.zar_balance, dec!(0));
    assert_eq!(alice.btc_balance, dec!(0.9));
    assert!(alice.awaiting_funds);

    // Bob's bot is off — same balances, no flag.
    let bob = store.get_profile("bob").await.unwrap().unwrap();
    assert_eq!(bob.zar_balance, dec!(0));
    assert!(!bob.awaiting_funds);
}

#[tokio::test]
async fn test_store_failure_isolated_to_one_user() {
    let inner = seeded_store();
    let store = Arc::new(FlakyStore::new(inner.clone()));
    store.fail_user("alice");

    let exchange = Arc::new(MockExchange::new(vec![("ZAR", dec!(75))]));
    let poller = poller_over(exchange, store, Duration::from_secs(60));

    let report = poller.run_cycle().await.unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].user_id, "alice");
    assert_eq!(report.failed[0].kind, "store_unavailable");

    assert_eq!(report.synced.len(), 1);
    assert_eq!(report.synced[0].user_id, "bob");
    let bob = inner.get_profile("bob").await.unwrap().unwrap();
    assert_eq!(bob.zar_balance, dec!(75));
}

#[tokio::test]
async fn test_exchange_outage_skips_users_without_writes() {
    let store = seeded_store();
    let exchange = Arc::new(MockExchange::new(vec![("ZAR", dec!(75))]));
    exchange.set_error("exchange maintenance window");

    let poller = poller_over(exchange, store.clone(), Duration::from_secs(60));
    let report = poller.run_cycle().await.unwrap();

    assert!(report.synced.is_empty());
    assert_eq!(report.failed.len(), 2);
    assert!(report.failed.iter().all(|f| f.kind == "source_unavailable"));

    // Nothing was written anywhere.
    assert_eq!(store.patch_count(), 0);
    let alice = store.get_profile("alice").await.unwrap().unwrap();
    assert_eq!(alice.zar_balance, dec!(10));
}

#[tokio::test]
async fn test_omitted_currency_survives_cycles() {
    let store = seeded_store();
    let exchange = Arc::new(MockExchange::new(vec![("ZAR", dec!(20)), ("XBT", dec!(0.9))]));
    exchange.remove_currency("XBT");

    let poller = poller_over(exchange, store.clone(), Duration::from_secs(60));
    poller.run_cycle().await.unwrap();

    let alice = store.get_profile("alice").await.unwrap().unwrap();
    assert_eq!(alice.zar_balance, dec!(20));
    assert_eq!(alice.btc_balance, dec!(0.4));
}

#[tokio::test]
async fn test_loop_survives_listing_failures() {
    let inner = seeded_store();
    let store = Arc::new(FlakyStore::new(inner.clone()));
    store.set_fail_listing(true);

    let exchange = Arc::new(MockExchange::new(vec![("ZAR", dec!(321))]));
    let handle = poller_over(exchange, store.clone(), Duration::from_millis(10)).spawn();

    // Several cycles fail at the listing stage.
    tokio::time::sleep(Duration::from_millis(40)).await;
    assert!(handle.is_running());

    // Once the store recovers, the loop picks up where it left off.
    store.set_fail_listing(false);
    tokio::time::sleep(Duration::from_millis(40)).await;

    tokio::time::timeout(Duration::from_secs(1), handle.stop())
        .await
        .expect("poll loop failed to stop");

    let alice = inner.get_profile("alice").await.unwrap().unwrap();
    assert_eq!(alice.zar_balance, dec!(321));
}

#[tokio::test]
async fn test_stop_signal_terminates_promptly() {
    let store = seeded_store();
    let exchange = Arc::new(MockExchange::new(vec![("ZAR", dec!(1))]));
    let handle = poller_over(exchange, store, Duration::from_secs(3600)).spawn();

    assert!(handle.is_running());
    tokio::time::timeout(Duration::from_secs(1), handle.stop())
        .await
        .expect("poll loop failed to stop");
}

#[tokio::test]
async fn test_funding_journey_through_api_and_poller() {
    // A user activates their bot with an empty account, then a deposit
    // lands on the exchange and the next poll cycle clears the flag.
    let store = Arc::new(MemoryStore::new());
    store.insert_user("carol", &UserProfile::default());

    let state = Arc::new(ApiContext {
        store: store.clone(),
    });
    let app = api::build_router(state, None);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/bot/toggle?user_id=carol")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"activate": true}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let carol = store.get_profile("carol").await.unwrap().unwrap();
    assert!(carol.bot_active);
    assert!(carol.awaiting_funds);

    // Deposit lands on the exchange; the poller notices.
    let exchange = Arc::new(MockExchange::new(vec![("ZAR", dec!(500)), ("XBT", dec!(0))]));
    let poller = poller_over(exchange, store.clone(), Duration::from_secs(60));
    let report = poller.run_cycle().await.unwrap();
    assert_eq!(report.synced.len(), 1);
    assert_eq!(report.synced[0].flag_written, Some(false));

    // The profile endpoint reflects the funded state.
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/profile?user_id=carol")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!((json["zar"].as_f64().unwrap() - 500.0).abs() < 1e-10);
    assert_eq!(json["awaitingFunds"], false);
    assert_eq!(json["botActive"], true);
}
