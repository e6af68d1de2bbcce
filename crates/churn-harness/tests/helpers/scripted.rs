//! ScriptedService - an intent service that replays canned events
//!
//! Records every submit/withdraw call and, once a configured number of
//! calls has been seen, emits a fixed list of events from a separate task
//! after a delay. With no script it never emits anything.

use async_trait::async_trait;
use churn_core::{
    AppId, ChurnError, EventStream, Intent, IntentEvent, IntentEventKind, IntentKey,
    IntentListener, ListenerId, SubmissionService,
};
use churn_harness::{InterruptHandle, Phase};
use churn_sim::ListenerRegistry;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Events to emit once `after_calls` calls have been recorded
pub struct Script {
    pub after_calls: usize,
    pub delay: Duration,
    pub events: Vec<(AppId, u64, IntentEventKind)>,
}

impl Script {
    /// Emit `kind` for `keys` (in the given order) under the default app id
    pub fn keys(after_calls: usize, delay: Duration, kind: IntentEventKind, keys: &[u64]) -> Self {
        Self {
            after_calls,
            delay,
            events: keys.iter().map(|k| (AppId::default(), *k, kind)).collect(),
        }
    }

    pub fn with_event(mut self, app_id: AppId, key: u64, kind: IntentEventKind) -> Self {
        self.events.push((app_id, key, kind));
        self
    }
}

#[derive(Default)]
pub struct ScriptedService {
    listeners: Arc<ListenerRegistry>,
    calls: Mutex<Vec<(Phase, IntentKey)>>,
    scripts: Mutex<VecDeque<Script>>,
    reject: AtomicBool,
    interrupt_at: Mutex<Option<(usize, InterruptHandle)>>,
}

impl ScriptedService {
    /// A service that accepts everything and never reports completion
    pub fn silent() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_scripts(scripts: Vec<Script>) -> Arc<Self> {
        let service = Self::default();
        service.scripts.lock().extend(scripts);
        Arc::new(service)
    }

    /// Fail every subsequent submit/withdraw call
    pub fn reject_calls(&self) {
        self.reject.store(true, Ordering::SeqCst);
    }

    /// Fire `handle` as soon as the `calls`-th call is recorded
    pub fn interrupt_after(&self, calls: usize, handle: InterruptHandle) {
        *self.interrupt_at.lock() = Some((calls, handle));
    }

    pub fn calls(&self) -> Vec<(Phase, IntentKey)> {
        self.calls.lock().clone()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Deliver an event synchronously to current listeners
    pub fn emit(&self, event: IntentEvent) {
        self.listeners.dispatch(&event);
    }

    fn record(&self, phase: Phase, key: IntentKey) -> churn_core::Result<()> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(ChurnError::ServiceUnavailable("scripted rejection".into()));
        }

        let calls = {
            let mut calls = self.calls.lock();
            calls.push((phase, key));
            calls.len()
        };

        if let Some((at, handle)) = self.interrupt_at.lock().as_ref() {
            if *at == calls {
                handle.interrupt();
            }
        }

        let due = {
            let mut scripts = self.scripts.lock();
            match scripts.front() {
                Some(script) if script.after_calls == calls => scripts.pop_front(),
                _ => None,
            }
        };

        if let Some(script) = due {
            let listeners = self.listeners.clone();
            tokio::spawn(async move {
                tokio::time::sleep(script.delay).await;
                for (app_id, key, kind) in script.events {
                    listeners.dispatch(&IntentEvent::new(app_id, IntentKey(key), kind));
                }
            });
        }

        Ok(())
    }
}

#[async_trait]
impl SubmissionService for ScriptedService {
    async fn submit(&self, intent: Intent) -> churn_core::Result<()> {
        self.record(Phase::Install, intent.key)
    }

    async fn withdraw(&self, intent: Intent) -> churn_core::Result<()> {
        self.record(Phase::Withdraw, intent.key)
    }
}

impl EventStream for ScriptedService {
    fn add_listener(&self, listener: Arc<dyn IntentListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}
