//! Background job: reclaim approvals nobody finished.
//!
//! An operator who closes the browser tab leaves a record behind. Every
//! `interval` this task drops records older than the expiry window; their
//! waiters (if still attached) wake up with an expiry error.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::store::PendingStore;

/// Spawn the reaper. Call this once at startup and abort the handle on shutdown.
pub fn spawn(store: PendingStore, interval: Duration, max_age: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let evicted = store.evict_expired(max_age);
            if evicted > 0 {
                tracing::info!(
                    evicted,
                    remaining = store.len(),
                    "reaped abandoned approvals"
                );
            }
        }
    })
}
