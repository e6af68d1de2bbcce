//! Phase types and results

use chrono::{DateTime, Utc};
use churn_core::IntentEventKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Which half of the churn cycle a phase drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Install,
    Withdraw,
}

impl Phase {
    /// Terminal event that completes an intent in this phase
    pub fn expected_kind(&self) -> IntentEventKind {
        match self {
            Phase::Install => IntentEventKind::Installed,
            Phase::Withdraw => IntentEventKind::Withdrawn,
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            Phase::Install => "install",
            Phase::Withdraw => "withdraw",
        }
    }

    fn participle(&self) -> &'static str {
        match self {
            Phase::Install => "installed",
            Phase::Withdraw => "withdrawn",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// How a phase ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PhaseOutcome {
    /// Every intent reached the expected state before the deadline
    Completed {
        /// From the start of submission to the last completion event
        #[serde(with = "duration_ms", rename = "elapsed_ms")]
        elapsed: Duration,
    },
    /// The deadline passed with intents outstanding
    TimedOut {
        outstanding: usize,
        #[serde(with = "duration_ms", rename = "waited_ms")]
        waited: Duration,
    },
    /// The wait was interrupted before completion
    Interrupted { outstanding: usize },
}

/// Result of one install or withdraw phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseResult {
    pub phase: Phase,
    /// Intents in the batch
    pub count: usize,
    /// When submission started
    pub started: DateTime<Utc>,
    /// Events ignored because their key had already completed
    pub duplicates: usize,
    /// FAILED events observed for this batch
    pub failed_events: usize,
    #[serde(flatten)]
    pub outcome: PhaseOutcome,
}

impl PhaseResult {
    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, PhaseOutcome::Completed { .. })
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self.outcome, PhaseOutcome::Interrupted { .. })
    }

    /// Intents that did not complete
    pub fn outstanding(&self) -> usize {
        match self.outcome {
            PhaseOutcome::Completed { .. } => 0,
            PhaseOutcome::TimedOut { outstanding, .. } => outstanding,
            PhaseOutcome::Interrupted { outstanding } => outstanding,
        }
    }

    /// Elapsed time for completed phases
    pub fn elapsed(&self) -> Option<Duration> {
        match self.outcome {
            PhaseOutcome::Completed { elapsed } => Some(elapsed),
            _ => None,
        }
    }

    /// Completed intents per second
    pub fn throughput(&self) -> Option<f64> {
        let secs = self.elapsed()?.as_secs_f64();
        (secs > 0.0).then(|| self.count as f64 / secs)
    }
}

impl fmt::Display for PhaseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            PhaseOutcome::Completed { elapsed } => write!(
                f,
                "Time to {} {} intents: {} ms",
                self.phase,
                self.count,
                elapsed.as_millis()
            ),
            PhaseOutcome::TimedOut { outstanding, .. } => write!(
                f,
                "Failure: {} intents not {}",
                outstanding,
                self.phase.participle()
            ),
            PhaseOutcome::Interrupted { outstanding } => write!(
                f,
                "Interrupted: {} intents not {}",
                outstanding,
                self.phase.participle()
            ),
        }
    }
}

pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
