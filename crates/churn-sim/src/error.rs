//! Simulator-specific error types

use churn_core::ChurnError;
use thiserror::Error;

/// Simulator errors
#[derive(Error, Debug)]
pub enum SimError {
    /// Command or reply channel closed
    #[error("Channel error: {0}")]
    Channel(String),

    /// Configuration rejected
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ChurnError> for SimError {
    fn from(err: ChurnError) -> Self {
        match err {
            ChurnError::InvalidConfig(msg) => SimError::Config(msg),
            other => SimError::Config(other.to_string()),
        }
    }
}

impl From<SimError> for ChurnError {
    fn from(err: SimError) -> Self {
        match err {
            SimError::Channel(msg) => ChurnError::ServiceUnavailable(msg),
            SimError::Config(msg) => ChurnError::InvalidConfig(msg),
        }
    }
}

/// Result type for simulator operations
pub type Result<T> = std::result::Result<T, SimError>;
