//! Completion tracking for one phase
//!
//! `PhaseTracker` is the listener registered with the event stream while a
//! phase runs. It owns the set of keys still pending and the countdown the
//! caller waits on. Removing a key and counting it down happen under one
//! lock, so `pending + completed == N` holds for every observer.

use chrono::{DateTime, Utc};
use churn_core::{AppId, IntentEvent, IntentEventKind, IntentKey, IntentListener};
use parking_lot::Mutex;
use std::collections::HashSet;
use tracing::{debug, trace};

use crate::latch::CountDownLatch;

#[derive(Debug)]
struct TrackerState {
    pending: HashSet<IntentKey>,
    completed: usize,
    last_completion: Option<DateTime<Utc>>,
    duplicates: usize,
    failed_events: usize,
    unexpected: usize,
    armed: bool,
}

/// Point-in-time view of a tracker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerSnapshot {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    pub duplicates: usize,
    pub failed_events: usize,
    pub unexpected: usize,
    pub latch: usize,
    pub last_completion: Option<DateTime<Utc>>,
}

/// Listener counting terminal events for a fixed set of keys
#[derive(Debug)]
pub struct PhaseTracker {
    app_id: AppId,
    expected: IntentEventKind,
    total: usize,
    state: Mutex<TrackerState>,
    latch: CountDownLatch,
}

impl PhaseTracker {
    /// Create an armed tracker seeded with `keys`
    pub fn new(app_id: AppId, expected: IntentEventKind, keys: impl IntoIterator<Item = IntentKey>) -> Self {
        let pending: HashSet<IntentKey> = keys.into_iter().collect();
        let total = pending.len();
        Self {
            app_id,
            expected,
            total,
            state: Mutex::new(TrackerState {
                pending,
                completed: 0,
                last_completion: None,
                duplicates: 0,
                failed_events: 0,
                unexpected: 0,
                armed: true,
            }),
            latch: CountDownLatch::new(total),
        }
    }

    /// Wait until every key has completed
    pub async fn wait(&self) {
        self.latch.wait().await
    }

    /// Stop accepting events. Late deliveries after this are dropped.
    pub fn disarm(&self) {
        self.state.lock().armed = false;
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        let state = self.state.lock();
        TrackerSnapshot {
            total: self.total,
            pending: state.pending.len(),
            completed: state.completed,
            duplicates: state.duplicates,
            failed_events: state.failed_events,
            unexpected: state.unexpected,
            latch: self.latch.count(),
            last_completion: state.last_completion,
        }
    }

    pub fn outstanding(&self) -> usize {
        self.state.lock().pending.len()
    }
}

impl IntentListener for PhaseTracker {
    fn event(&self, event: &IntentEvent) {
        if event.app_id != self.app_id {
            return;
        }

        let mut state = self.state.lock();
        if !state.armed {
            return;
        }

        match event.kind {
            kind if kind == self.expected => {
                if state.pending.remove(&event.key) {
                    state.completed += 1;
                    state.last_completion = Some(match state.last_completion {
                        Some(last) => last.max(event.time),
                        None => event.time,
                    });
                    self.latch.count_down();
                } else {
                    trace!("Ignoring repeated {} for {}", kind, event.key);
                    state.duplicates += 1;
                }
            }
            IntentEventKind::InstallRequested | IntentEventKind::WithdrawRequested => {}
            IntentEventKind::Failed => {
                debug!("Intent {} failed", event.key);
                state.failed_events += 1;
            }
            IntentEventKind::Installed | IntentEventKind::Withdrawn => {
                debug!("Unexpected {} event for {}", event.kind, event.key);
                state.unexpected += 1;
            }
        }
    }
}
