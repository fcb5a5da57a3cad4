//! Fixed-cadence poll loop over all registered users.
//!
//! Each cycle: snapshot user ids, dispatch the reconciler for every user
//! concurrently, absorb per-user failures into the cycle report. The loop
//! itself never terminates on an error: a failed listing skips the cycle,
//! a failed user skips that user. No backoff, no jitter.
//!
//! The loop runs as a background task holding a watch-channel stop signal
//! so shutdown (and tests) can end it deterministically.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::reconciler::{Reconciler, UserSyncReport};
use crate::store::{ProfileStore, StoreError};

// ---------------------------------------------------------------------------
// Cycle report
// ---------------------------------------------------------------------------

/// Summary of one pass over all known users.
#[derive(Debug)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub users_listed: usize,
    pub synced: Vec<UserSyncReport>,
    pub failed: Vec<FailedUser>,
}

/// One user skipped this cycle, with the error kind that caused it.
#[derive(Debug)]
pub struct FailedUser {
    pub user_id: String,
    pub kind: &'static str,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Poller
// ---------------------------------------------------------------------------

pub struct Poller {
    store: Arc<dyn ProfileStore>,
    reconciler: Reconciler,
    interval: Duration,
}

impl Poller {
    pub fn new(store: Arc<dyn ProfileStore>, reconciler: Reconciler, interval: Duration) -> Self {
        Self {
            store,
            reconciler,
            interval,
        }
    }

    /// Run a single reconciliation cycle over a fresh user-id snapshot.
    ///
    /// `Err` means the listing itself failed and nothing was dispatched;
    /// per-user failures never surface here — they land in the report.
    pub async fn run_cycle(&self) -> Result<CycleReport, StoreError> {
        let cycle_id = Uuid::new_v4();
        let started_at = Utc::now();

        let user_ids = self.store.list_user_ids().await?;
        let users_listed = user_ids.len();

        let outcomes = join_all(user_ids.into_iter().map(|user_id| async move {
            let result = self.reconciler.reconcile_user(&user_id).await;
            (user_id, result)
        }))
        .await;

        let mut synced = Vec::new();
        let mut failed = Vec::new();
        for (user_id, result) in outcomes {
            match result {
                Ok(report) => synced.push(report),
                Err(e) => {
                    warn!(
                        user_id = %user_id,
                        kind = e.kind(),
                        error = %e,
                        "User reconciliation failed — skipped for this cycle"
                    );
                    failed.push(FailedUser {
                        user_id,
                        kind: e.kind(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(CycleReport {
            cycle_id,
            started_at,
            users_listed,
            synced,
            failed,
        })
    }

    /// Spawn the loop as a background task. The returned handle stops it.
    pub fn spawn(self) -> PollerHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(stop_rx));
        PollerHandle {
            stop: stop_tx,
            task,
        }
    }

    /// The loop body. Runs until the stop signal fires.
    async fn run(self, mut stop: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.interval);
        info!(interval_secs = self.interval.as_secs(), "Balance poll loop starting");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.run_cycle().await {
                        Ok(report) => log_cycle(&report),
                        Err(e) => {
                            error!(error = %e, "User listing failed — skipping cycle");
                        }
                    }
                }
                _ = stop.changed() => {
                    info!("Stop signal received — poll loop exiting");
                    break;
                }
            }
        }
    }
}

/// Handle to a running poll loop.
pub struct PollerHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Signal the loop to stop and wait for it to exit.
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        let _ = self.task.await;
    }
}

fn log_cycle(report: &CycleReport) {
    info!(
        cycle = %report.cycle_id,
        users = report.users_listed,
        synced = report.synced.len(),
        failed = report.failed.len(),
        "Cycle complete"
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
