//! Run and cycle reports

use churn_core::AppId;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::batch::Batch;
use crate::phase::{Phase, PhaseResult};

/// Result of a single `run`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub app_id: AppId,
    pub count: usize,
    pub key_offset: u64,
    pub phases: Vec<PhaseResult>,
}

impl RunReport {
    pub fn new(app_id: &AppId, batch: &Batch, key_offset: u64) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            app_id: app_id.clone(),
            count: batch.len(),
            key_offset,
            phases: Vec::new(),
        }
    }

    /// True when every executed phase completed
    pub fn all_completed(&self) -> bool {
        !self.phases.is_empty() && self.phases.iter().all(PhaseResult::is_completed)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, phase) in self.phases.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", phase)?;
        }
        Ok(())
    }
}

/// Aggregate timings across cycles
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleSummary {
    pub completed_phases: usize,
    pub failed_phases: usize,
    pub mean_install_ms: Option<u64>,
    pub max_install_ms: Option<u64>,
    pub mean_withdraw_ms: Option<u64>,
    pub max_withdraw_ms: Option<u64>,
}

impl CycleSummary {
    pub fn from_phases(phases: &[PhaseResult]) -> Self {
        let timings = |wanted: Phase| -> Vec<u64> {
            phases
                .iter()
                .filter(|p| p.phase == wanted)
                .filter_map(|p| p.elapsed())
                .map(|d| d.as_millis() as u64)
                .collect()
        };
        let mean = |v: &[u64]| (!v.is_empty()).then(|| v.iter().sum::<u64>() / v.len() as u64);

        let install = timings(Phase::Install);
        let withdraw = timings(Phase::Withdraw);
        let completed_phases = phases.iter().filter(|p| p.is_completed()).count();

        Self {
            completed_phases,
            failed_phases: phases.len() - completed_phases,
            mean_install_ms: mean(&install),
            max_install_ms: install.iter().copied().max(),
            mean_withdraw_ms: mean(&withdraw),
            max_withdraw_ms: withdraw.iter().copied().max(),
        }
    }
}

/// Result of a multi-cycle `cycle` run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub run_id: Uuid,
    pub app_id: AppId,
    pub count: usize,
    pub key_offset: u64,
    pub cycles_requested: usize,
    pub phases: Vec<PhaseResult>,
    pub summary: CycleSummary,
}

impl CycleReport {
    /// True when every phase of every cycle completed
    pub fn all_completed(&self) -> bool {
        !self.phases.is_empty() && self.summary.failed_phases == 0
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, pair) in self.phases.chunks(2).enumerate() {
            write!(f, "Cycle {}:", i + 1)?;
            for phase in pair {
                write!(f, "\n  {}", phase)?;
            }
            writeln!(f)?;
        }
        let fmt_ms = |v: Option<u64>| v.map_or_else(|| "-".to_string(), |ms| format!("{} ms", ms));
        write!(
            f,
            "{} phases completed, {} failed; install mean {} max {}; withdraw mean {} max {}",
            self.summary.completed_phases,
            self.summary.failed_phases,
            fmt_ms(self.summary.mean_install_ms),
            fmt_ms(self.summary.max_install_ms),
            fmt_ms(self.summary.mean_withdraw_ms),
            fmt_ms(self.summary.max_withdraw_ms),
        )
    }
}
