//! The churn harness
//!
//! Pushes a batch of intents through an intent service and times how long
//! the service takes to report every one of them installed (or withdrawn).
//!
//! Each phase moves through `ARMED -> AWAITING -> DONE | TIMED_OUT`: the
//! tracker is registered and seeded before the first submission, so a fast
//! completion can never arrive ahead of the pending entry it clears.

use chrono::Utc;
use churn_core::{
    ChurnError, ConnectPoint, EventStream, HarnessConfig, IntentListener, IntentService,
    ListenerId, Result, SubmissionService,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::batch::{generate_batch, Batch};
use crate::phase::{Phase, PhaseOutcome, PhaseResult};
use crate::report::{CycleReport, CycleSummary, RunReport};
use crate::tracker::PhaseTracker;

/// Which phases a run executes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Install then withdraw the same batch
    Full,
    InstallOnly,
    WithdrawOnly,
}

impl RunMode {
    /// Map the `--install` / `--withdraw` flags; neither or both means a full cycle
    pub fn from_flags(install_only: bool, withdraw_only: bool) -> Self {
        match (install_only, withdraw_only) {
            (true, false) => RunMode::InstallOnly,
            (false, true) => RunMode::WithdrawOnly,
            _ => RunMode::Full,
        }
    }

    pub fn phases(&self) -> &'static [Phase] {
        match self {
            RunMode::Full => &[Phase::Install, Phase::Withdraw],
            RunMode::InstallOnly => &[Phase::Install],
            RunMode::WithdrawOnly => &[Phase::Withdraw],
        }
    }
}

/// Interrupts a harness wait from another task
#[derive(Clone)]
pub struct InterruptHandle {
    flag: Arc<watch::Sender<bool>>,
}

impl InterruptHandle {
    /// Interrupt the current wait and every later one
    pub fn interrupt(&self) {
        self.flag.send_replace(true);
    }

    pub fn is_interrupted(&self) -> bool {
        *self.flag.borrow()
    }
}

/// Deregisters the tracker when dropped
struct ListenerGuard<'a, S: EventStream + ?Sized> {
    stream: &'a S,
    id: ListenerId,
    tracker: Arc<PhaseTracker>,
}

impl<'a, S: EventStream + ?Sized> ListenerGuard<'a, S> {
    fn register(stream: &'a S, tracker: Arc<PhaseTracker>) -> Self {
        let listener: Arc<dyn IntentListener> = tracker.clone();
        let id = stream.add_listener(listener);
        Self { stream, id, tracker }
    }
}

impl<S: EventStream + ?Sized> Drop for ListenerGuard<'_, S> {
    fn drop(&mut self) {
        // Disarm first so an in-flight dispatch cannot land after the outcome
        self.tracker.disarm();
        self.stream.remove_listener(self.id);
    }
}

/// Bulk intent install/withdraw load generator
pub struct ChurnHarness<S: ?Sized> {
    service: Arc<S>,
    config: HarnessConfig,
    interrupt: Arc<watch::Sender<bool>>,
}

impl<S: IntentService + ?Sized> ChurnHarness<S> {
    pub fn new(service: Arc<S>, config: HarnessConfig) -> Result<Self> {
        config.validate()?;
        let (interrupt, _) = watch::channel(false);
        Ok(Self {
            service,
            config,
            interrupt: Arc::new(interrupt),
        })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Handle that interrupts waits from outside
    pub fn interrupt_handle(&self) -> InterruptHandle {
        InterruptHandle {
            flag: self.interrupt.clone(),
        }
    }

    /// Generate a batch owned by this harness's application id
    pub fn generate_batch(
        &self,
        ingress: &ConnectPoint,
        egress: &ConnectPoint,
        count: usize,
        key_offset: u64,
    ) -> Result<Batch> {
        generate_batch(&self.config.app_id, ingress, egress, count, key_offset)
    }

    /// Submit or withdraw every intent of `batch` and wait for completion.
    ///
    /// Timeouts and interruptions are reported in the result; only a batch
    /// that cannot be used or a service that cannot be reached is an error.
    /// The tracker is deregistered on every path out of this function.
    pub async fn submit_phase(&self, batch: &Batch, phase: Phase) -> Result<PhaseResult> {
        if batch.is_empty() {
            return Err(ChurnError::InvalidArgument("batch is empty".into()));
        }
        if let Some(foreign) = batch.iter().find(|i| i.app_id != self.config.app_id) {
            return Err(ChurnError::InvalidArgument(format!(
                "intent {} belongs to {}, harness runs as {}",
                foreign.key, foreign.app_id, self.config.app_id
            )));
        }

        let count = batch.len();
        if *self.interrupt.borrow() {
            debug!("Harness interrupted, skipping {} phase", phase);
            return Ok(PhaseResult {
                phase,
                count,
                started: Utc::now(),
                duplicates: 0,
                failed_events: 0,
                outcome: PhaseOutcome::Interrupted { outstanding: count },
            });
        }

        let tracker = Arc::new(PhaseTracker::new(
            self.config.app_id.clone(),
            phase.expected_kind(),
            batch.keys(),
        ));
        let guard = ListenerGuard::register(self.service.as_ref(), tracker.clone());
        debug!("Armed {} tracker for {} intents", phase, count);

        let started = Utc::now();
        let mut submitted = 0;
        for intent in batch.iter() {
            if *self.interrupt.borrow() {
                break;
            }
            match phase {
                Phase::Install => self.service.submit(intent.clone()).await?,
                Phase::Withdraw => self.service.withdraw(intent.clone()).await?,
            }
            submitted += 1;
        }

        let deadline = self.config.phase_timeout(count);
        let wait_start = Instant::now();
        let mut interrupt_rx = self.interrupt.subscribe();
        let outcome = if submitted < count {
            warn!("Interrupted after {} of {} {} requests", submitted, count, phase);
            PhaseOutcome::Interrupted {
                outstanding: tracker.outstanding(),
            }
        } else {
            info!("Submitted {} {} requests, waiting up to {:?}", count, phase, deadline);
            tokio::select! {
                res = tokio::time::timeout(deadline, tracker.wait()) => match res {
                    Ok(()) => {
                        let last = tracker.snapshot().last_completion.unwrap_or_else(Utc::now);
                        let elapsed = (last - started).to_std().unwrap_or(Duration::ZERO);
                        PhaseOutcome::Completed { elapsed }
                    }
                    Err(_) => PhaseOutcome::TimedOut {
                        outstanding: tracker.outstanding(),
                        waited: wait_start.elapsed(),
                    },
                },
                _ = async {
                    let _ = interrupt_rx.wait_for(|interrupted| *interrupted).await;
                } => PhaseOutcome::Interrupted {
                    outstanding: tracker.outstanding(),
                },
            }
        };

        drop(guard);
        let snapshot = tracker.snapshot();

        let result = PhaseResult {
            phase,
            count,
            started,
            duplicates: snapshot.duplicates,
            failed_events: snapshot.failed_events,
            outcome,
        };
        if result.is_completed() {
            info!("{}", result);
        } else {
            warn!("{}", result);
        }

        Ok(result)
    }

    /// Generate one batch and run the phases selected by `mode` over it
    pub async fn run(
        &self,
        ingress: &ConnectPoint,
        egress: &ConnectPoint,
        count: usize,
        key_offset: u64,
        mode: RunMode,
    ) -> Result<RunReport> {
        let batch = self.generate_batch(ingress, egress, count, key_offset)?;
        let mut report = RunReport::new(&self.config.app_id, &batch, key_offset);

        for &phase in mode.phases() {
            let result = self.submit_phase(&batch, phase).await?;
            let interrupted = result.is_interrupted();
            report.phases.push(result);
            if interrupted {
                break;
            }
        }

        Ok(report)
    }

    /// Install and withdraw the same batch `cycles` times
    pub async fn cycle(
        &self,
        ingress: &ConnectPoint,
        egress: &ConnectPoint,
        count: usize,
        key_offset: u64,
        cycles: usize,
    ) -> Result<CycleReport> {
        if cycles == 0 {
            return Err(ChurnError::InvalidArgument("cycles must be positive".into()));
        }
        let batch = self.generate_batch(ingress, egress, count, key_offset)?;
        let mut phases = Vec::with_capacity(cycles * 2);

        'cycles: for n in 1..=cycles {
            debug!("Starting cycle {}/{}", n, cycles);
            for &phase in RunMode::Full.phases() {
                let result = self.submit_phase(&batch, phase).await?;
                let interrupted = result.is_interrupted();
                phases.push(result);
                if interrupted {
                    break 'cycles;
                }
            }
        }

        let summary = CycleSummary::from_phases(&phases);
        Ok(CycleReport {
            run_id: Uuid::new_v4(),
            app_id: self.config.app_id.clone(),
            count,
            key_offset,
            cycles_requested: cycles,
            phases,
            summary,
        })
    }
}
