//! Configuration types for the churn harness
//!
//! Durations are written as humantime strings (`"1s"`, `"60ms"`) so config
//! files stay readable.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{ChurnError, Result};
use crate::intent::AppId;

/// Top-level configuration, loadable from a JSON file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChurnConfig {
    /// Harness configuration
    pub harness: HarnessConfig,
    /// Simulated intent service configuration
    pub simulator: SimulatorConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ChurnConfig {
    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ChurnError::ConfigNotFound(path.display().to_string()));
        }
        let raw = std::fs::read_to_string(path)?;
        let config: ChurnConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.harness.validate()?;
        self.simulator.validate()
    }
}

/// Harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Application identity under which intents are submitted
    pub app_id: AppId,
    /// Fixed part of the completion timeout
    #[serde(with = "humantime_serde")]
    pub base_timeout: Duration,
    /// Per-intent part of the completion timeout
    #[serde(with = "humantime_serde")]
    pub per_item_timeout: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            app_id: AppId::default(),
            base_timeout: Duration::from_millis(1000),
            per_item_timeout: Duration::from_millis(60),
        }
    }
}

impl HarnessConfig {
    /// Completion deadline for a phase of `count` intents
    pub fn phase_timeout(&self, count: usize) -> Duration {
        let count = u32::try_from(count).unwrap_or(u32::MAX);
        self.base_timeout
            .saturating_add(self.per_item_timeout.saturating_mul(count))
    }

    pub fn validate(&self) -> Result<()> {
        if self.app_id.as_str().trim().is_empty() {
            return Err(ChurnError::InvalidConfig("app_id must not be empty".into()));
        }
        if self.base_timeout.is_zero() && self.per_item_timeout.is_zero() {
            return Err(ChurnError::InvalidConfig(
                "base_timeout and per_item_timeout cannot both be zero".into(),
            ));
        }
        Ok(())
    }
}

/// Simulated intent service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Delay between INSTALL_REQ and INSTALLED
    #[serde(with = "humantime_serde")]
    pub install_latency: Duration,
    /// Delay between WITHDRAW_REQ and WITHDRAWN
    #[serde(with = "humantime_serde")]
    pub withdraw_latency: Duration,
    /// Maximum random delay added to each completion
    #[serde(with = "humantime_serde")]
    pub jitter: Duration,
    /// Probability in [0, 1] that an install ends in FAILED
    pub failure_rate: f64,
    /// Never emit terminal events (timeouts on purpose)
    pub stall: bool,
    /// Command channel capacity
    pub command_buffer: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            install_latency: Duration::from_millis(5),
            withdraw_latency: Duration::from_millis(5),
            jitter: Duration::from_millis(2),
            failure_rate: 0.0,
            stall: false,
            command_buffer: 1024,
        }
    }
}

impl SimulatorConfig {
    /// Configuration with fixed latency and no randomness
    pub fn fixed(latency: Duration) -> Self {
        Self {
            install_latency: latency,
            withdraw_latency: latency,
            jitter: Duration::ZERO,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(ChurnError::InvalidConfig(format!(
                "failure_rate must be within [0, 1], got {}",
                self.failure_rate
            )));
        }
        if self.command_buffer == 0 {
            return Err(ChurnError::InvalidConfig("command_buffer must be positive".into()));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    pub filter: String,
    /// Log format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogFormat {
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    Compact,
}

// Helper module for Duration serialization
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        s.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
