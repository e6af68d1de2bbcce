//! Simulated intent service
//!
//! The `IntentSimulator` owns the intent store and turns submit/withdraw
//! commands into the lifecycle event stream a real intent engine would
//! produce. Callers interact with it through a cloneable `SimHandle`.

use async_trait::async_trait;
use churn_core::{
    ChurnError, EventStream, Intent, IntentEvent, IntentEventKind, IntentListener, ListenerId,
    SimulatorConfig, SubmissionService,
};
use parking_lot::RwLock;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace};

use crate::error::{Result, SimError};
use crate::listeners::ListenerRegistry;
use crate::store::{IntentState, IntentStore};

/// Commands sent to the simulator
#[derive(Debug)]
pub enum SimCommand {
    /// Install an intent
    Submit { intent: Intent },
    /// Withdraw an intent
    Withdraw { intent: Intent },
    /// Get simulator stats
    GetStats { response: oneshot::Sender<SimStats> },
    /// Shutdown
    Shutdown,
}

/// Counters maintained by the simulator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimStats {
    /// Install requests accepted
    pub submitted: u64,
    /// Withdraw requests accepted
    pub withdraw_requests: u64,
    /// INSTALLED events emitted
    pub installed: u64,
    /// WITHDRAWN events emitted
    pub withdrawn: u64,
    /// FAILED events emitted
    pub failed: u64,
    /// Intents currently tracked
    pub active_intents: usize,
    /// Registered listeners
    pub listeners: usize,
}

/// Handle for interacting with the simulator
#[derive(Clone)]
pub struct SimHandle {
    command_tx: mpsc::Sender<SimCommand>,
    listeners: Arc<ListenerRegistry>,
}

impl SimHandle {
    /// Get simulator statistics
    pub async fn get_stats(&self) -> Result<SimStats> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(SimCommand::GetStats { response: tx })
            .await
            .map_err(|_| SimError::Channel("Failed to send get_stats command".into()))?;

        rx.await
            .map_err(|_| SimError::Channel("Failed to receive stats".into()))
    }

    /// Shutdown the simulator
    pub async fn shutdown(&self) -> Result<()> {
        self.command_tx
            .send(SimCommand::Shutdown)
            .await
            .map_err(|_| SimError::Channel("Failed to send shutdown command".into()))
    }

    /// Number of listeners currently registered
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

#[async_trait]
impl SubmissionService for SimHandle {
    async fn submit(&self, intent: Intent) -> churn_core::Result<()> {
        self.command_tx
            .send(SimCommand::Submit { intent })
            .await
            .map_err(|_| ChurnError::ServiceUnavailable("Failed to send submit command".into()))
    }

    async fn withdraw(&self, intent: Intent) -> churn_core::Result<()> {
        self.command_tx
            .send(SimCommand::Withdraw { intent })
            .await
            .map_err(|_| ChurnError::ServiceUnavailable("Failed to send withdraw command".into()))
    }
}

impl EventStream for SimHandle {
    fn add_listener(&self, listener: Arc<dyn IntentListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}

/// The simulated intent service
pub struct IntentSimulator {
    /// Configuration
    config: SimulatorConfig,
    /// Command receiver
    command_rx: mpsc::Receiver<SimCommand>,
    /// Registered listeners, shared with handles
    listeners: Arc<ListenerRegistry>,
    /// Intent states
    store: Arc<IntentStore>,
    /// Statistics
    stats: Arc<RwLock<SimStats>>,
}

impl IntentSimulator {
    /// Create a new simulator and a handle to it
    pub fn new(config: SimulatorConfig) -> Result<(Self, SimHandle)> {
        config.validate()?;

        let (command_tx, command_rx) = mpsc::channel(config.command_buffer);
        let listeners = Arc::new(ListenerRegistry::new());

        let handle = SimHandle {
            command_tx,
            listeners: listeners.clone(),
        };

        let simulator = Self {
            config,
            command_rx,
            listeners,
            store: Arc::new(IntentStore::new()),
            stats: Arc::new(RwLock::new(SimStats::default())),
        };

        Ok((simulator, handle))
    }

    /// Create a simulator and spawn it on the current runtime
    pub fn spawn(config: SimulatorConfig) -> Result<SimHandle> {
        let (simulator, handle) = Self::new(config)?;
        tokio::spawn(simulator.run());
        Ok(handle)
    }

    /// Run until shutdown or until every handle is dropped
    pub async fn run(mut self) -> Result<()> {
        info!(
            "Starting intent simulator (install {:?}, withdraw {:?}, jitter {:?}, stall: {})",
            self.config.install_latency,
            self.config.withdraw_latency,
            self.config.jitter,
            self.config.stall
        );

        while let Some(cmd) = self.command_rx.recv().await {
            if !self.handle_command(cmd) {
                break;
            }
        }

        info!("Intent simulator stopped");
        Ok(())
    }

    /// Handle a command, returns false if should shutdown
    fn handle_command(&mut self, cmd: SimCommand) -> bool {
        match cmd {
            SimCommand::Submit { intent } => self.handle_submit(intent),

            SimCommand::Withdraw { intent } => self.handle_withdraw(intent),

            SimCommand::GetStats { response } => {
                let mut stats = self.stats.read().clone();
                stats.active_intents = self.store.len();
                stats.listeners = self.listeners.len();
                let _ = response.send(stats);
            }

            SimCommand::Shutdown => {
                info!("Shutdown requested");
                return false;
            }
        }

        true
    }

    fn handle_submit(&mut self, intent: Intent) {
        trace!("Submit {}", intent);
        let app_id = intent.app_id.clone();
        let key = intent.key;

        self.store.request_install(intent);
        self.stats.write().submitted += 1;
        self.listeners.dispatch(&IntentEvent::new(
            app_id.clone(),
            key,
            IntentEventKind::InstallRequested,
        ));

        if self.config.stall {
            return;
        }

        let delay = self.completion_delay(self.config.install_latency);
        let success = !rand::thread_rng().gen_bool(self.config.failure_rate);
        let store = self.store.clone();
        let listeners = self.listeners.clone();
        let stats = self.stats.clone();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            if !store.complete_install(&app_id, key, success) {
                debug!("Install of {} superseded before completion", key);
                return;
            }

            let kind = if success {
                stats.write().installed += 1;
                IntentEventKind::Installed
            } else {
                stats.write().failed += 1;
                IntentEventKind::Failed
            };
            listeners.dispatch(&IntentEvent::new(app_id, key, kind));
        });
    }

    fn handle_withdraw(&mut self, intent: Intent) {
        trace!("Withdraw {}", intent);
        let app_id = intent.app_id.clone();
        let key = intent.key;

        self.store.request_withdraw(intent);
        self.stats.write().withdraw_requests += 1;
        self.listeners.dispatch(&IntentEvent::new(
            app_id.clone(),
            key,
            IntentEventKind::WithdrawRequested,
        ));

        if self.config.stall {
            return;
        }

        let delay = self.completion_delay(self.config.withdraw_latency);
        let store = self.store.clone();
        let listeners = self.listeners.clone();
        let stats = self.stats.clone();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            // A re-submit in the meantime wins over this withdraw
            if store.state(&app_id, key) != Some(IntentState::WithdrawRequested) {
                debug!("Withdraw of {} superseded before completion", key);
                return;
            }
            store.complete_withdraw(&app_id, key);
            stats.write().withdrawn += 1;
            listeners.dispatch(&IntentEvent::new(app_id, key, IntentEventKind::Withdrawn));
        });
    }

    fn completion_delay(&self, base: Duration) -> Duration {
        let jitter_ms = self.config.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return base;
        }
        base + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}
