//! In-memory registry of approvals awaiting a browser decision.
//!
//! Each record owns a one-shot channel. `resolve` sends the outcome through it
//! while holding the record's shard lock, and a timed-out waiter only removes
//! the record if it is still awaiting under that same lock. So when a
//! resolution and a deadline land together, the waiter sees exactly one of
//! them.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::time::Instant;
use uuid::Uuid;

use crate::metrics;
use crate::models::approval::{ApprovalOutcome, ApprovalStatus, PendingApproval};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("approval not found")]
    NotFound,
    #[error("approval already resolved")]
    AlreadyResolved,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WaitError {
    #[error("approval timed out")]
    TimedOut,
    #[error("approval expired before it was completed")]
    Expired,
    #[error("approval not found")]
    NotFound,
    #[error("approval already has a waiter")]
    AlreadyAwaited,
}

struct Slot {
    record: PendingApproval,
    inserted_at: Instant,
    notify: Option<oneshot::Sender<ApprovalOutcome>>,
    waiter: Option<oneshot::Receiver<ApprovalOutcome>>,
}

#[derive(Clone, Default)]
pub struct PendingStore {
    slots: Arc<DashMap<Uuid, Slot>>,
}

impl PendingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new awaiting record and return its identifier.
    pub fn create(&self, method: impl Into<String>, params: Value) -> Uuid {
        let method = method.into();
        let (notify, waiter) = oneshot::channel();

        let id = loop {
            let id = Uuid::new_v4();
            // v4 collisions are not a practical concern, but a live id is never handed out twice.
            if let Entry::Vacant(vacant) = self.slots.entry(id) {
                vacant.insert(Slot {
                    record: PendingApproval {
                        id,
                        method,
                        params,
                        status: ApprovalStatus::Awaiting,
                        outcome: None,
                        created_at: Utc::now(),
                    },
                    inserted_at: Instant::now(),
                    notify: Some(notify),
                    waiter: Some(waiter),
                });
                break id;
            }
        };

        metrics::set_pending(self.slots.len());
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<PendingApproval> {
        self.slots.get(id).map(|slot| slot.record.clone())
    }

    /// Move a record from awaiting to resolved and wake its waiter.
    pub fn resolve(&self, id: &Uuid, outcome: ApprovalOutcome) -> Result<(), ResolveError> {
        let mut slot = self.slots.get_mut(id).ok_or(ResolveError::NotFound)?;
        if slot.record.status == ApprovalStatus::Resolved {
            return Err(ResolveError::AlreadyResolved);
        }

        slot.record.status = ApprovalStatus::Resolved;
        slot.record.outcome = Some(outcome.clone());
        if let Some(notify) = slot.notify.take() {
            // The waiter may already be gone (client hung up); the record still counts as resolved.
            let _ = notify.send(outcome);
        }
        Ok(())
    }

    /// Tracked identifiers, oldest first.
    pub fn list_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<(Instant, Uuid)> = self
            .slots
            .iter()
            .map(|slot| (slot.inserted_at, *slot.key()))
            .collect();
        ids.sort();
        ids.into_iter().map(|(_, id)| id).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Suspend until `id` is resolved or `deadline` elapses.
    ///
    /// The record is removed once this returns, or if the returned future is
    /// dropped early. Only one waiter per record is allowed.
    pub async fn await_resolution(
        &self,
        id: &Uuid,
        deadline: Duration,
    ) -> Result<ApprovalOutcome, WaitError> {
        let mut waiter = {
            let mut slot = self.slots.get_mut(id).ok_or(WaitError::NotFound)?;
            slot.waiter.take().ok_or(WaitError::AlreadyAwaited)?
        };
        let _cleanup = RemoveOnDrop { store: self, id: *id };

        match tokio::time::timeout(deadline, &mut waiter).await {
            Ok(Ok(outcome)) => Ok(outcome),
            // Sender dropped: the reaper evicted the record.
            Ok(Err(_)) => Err(WaitError::Expired),
            Err(_) => {
                let removed = self
                    .slots
                    .remove_if(id, |_, slot| slot.record.status == ApprovalStatus::Awaiting);
                if removed.is_some() {
                    return Err(WaitError::TimedOut);
                }
                // Resolved (or reaped after resolving) right at the deadline: the outcome is buffered.
                waiter.try_recv().map_err(|_| WaitError::TimedOut)
            }
        }
    }

    /// Drop every record older than `max_age`, returning how many went.
    /// Waiters on evicted records wake with [`WaitError::Expired`].
    pub fn evict_expired(&self, max_age: Duration) -> usize {
        let now = Instant::now();
        let mut evicted = 0;
        self.slots.retain(|id, slot| {
            let keep = now.saturating_duration_since(slot.inserted_at) < max_age;
            if !keep {
                tracing::debug!(%id, method = %slot.record.method, status = ?slot.record.status, "evicting expired approval");
                evicted += 1;
            }
            keep
        });
        if evicted > 0 {
            metrics::set_pending(self.slots.len());
        }
        evicted
    }

    fn remove(&self, id: &Uuid) {
        if self.slots.remove(id).is_some() {
            metrics::set_pending(self.slots.len());
        }
    }
}

struct RemoveOnDrop<'a> {
    store: &'a PendingStore,
    id: Uuid,
}

impl Drop for RemoveOnDrop<'_> {
    fn drop(&mut self) {
        self.store.remove(&self.id);
    }
}
