//! Error types shared by the churn crates

use thiserror::Error;

/// Main error type for churn operations
#[derive(Error, Debug)]
pub enum ChurnError {
    // ===== Input Errors =====
    /// An argument was rejected before any work was performed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Malformed `device/port` endpoint descriptor
    #[error("Invalid endpoint '{input}': {reason}")]
    InvalidEndpoint { input: String, reason: String },

    // ===== Configuration Errors =====
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    ConfigNotFound(String),

    // ===== Service Errors =====
    /// The intent service could not be reached
    #[error("Intent service unavailable: {0}")]
    ServiceUnavailable(String),

    // ===== Serialization Errors =====
    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O failure while reading configuration or writing reports
    #[error("I/O error: {0}")]
    Io(String),
}

impl ChurnError {
    /// Check if this error is a client error (bad input)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ChurnError::InvalidArgument(_)
                | ChurnError::InvalidEndpoint { .. }
                | ChurnError::InvalidConfig(_)
                | ChurnError::ConfigNotFound(_)
        )
    }

    /// Get an error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ChurnError::InvalidArgument(_) => "INVALID_ARGUMENT",
            ChurnError::InvalidEndpoint { .. } => "INVALID_ENDPOINT",
            ChurnError::InvalidConfig(_) => "INVALID_CONFIG",
            ChurnError::ConfigNotFound(_) => "CONFIG_NOT_FOUND",
            ChurnError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            ChurnError::Serialization(_) => "SERIALIZATION_ERROR",
            ChurnError::Io(_) => "IO_ERROR",
        }
    }
}

/// Result type alias for churn operations
pub type Result<T> = std::result::Result<T, ChurnError>;

impl From<std::io::Error> for ChurnError {
    fn from(err: std::io::Error) -> Self {
        ChurnError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ChurnError {
    fn from(err: serde_json::Error) -> Self {
        ChurnError::Serialization(err.to_string())
    }
}
