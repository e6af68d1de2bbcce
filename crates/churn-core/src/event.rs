//! Intent lifecycle events
//!
//! Events are emitted by the intent service as submitted requests move
//! through their lifecycle, and consumed by registered listeners.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::intent::{AppId, IntentKey};

/// Lifecycle state reported by an intent event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentEventKind {
    /// Accepted for installation
    InstallRequested,
    /// Installed in the network
    Installed,
    /// Accepted for withdrawal
    WithdrawRequested,
    /// Removed from the network
    Withdrawn,
    /// Compilation or installation failed
    Failed,
}

impl fmt::Display for IntentEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IntentEventKind::InstallRequested => "INSTALL_REQ",
            IntentEventKind::Installed => "INSTALLED",
            IntentEventKind::WithdrawRequested => "WITHDRAW_REQ",
            IntentEventKind::Withdrawn => "WITHDRAWN",
            IntentEventKind::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// An event about one intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentEvent {
    /// Application that owns the intent
    pub app_id: AppId,
    /// Intent the event refers to
    pub key: IntentKey,
    /// Lifecycle state
    pub kind: IntentEventKind,
    /// When the state was reached
    pub time: DateTime<Utc>,
}

impl IntentEvent {
    /// Create an event stamped with the current time
    pub fn new(app_id: AppId, key: IntentKey, kind: IntentEventKind) -> Self {
        Self::at(app_id, key, kind, Utc::now())
    }

    /// Create an event with an explicit timestamp
    pub fn at(app_id: AppId, key: IntentKey, kind: IntentEventKind, time: DateTime<Utc>) -> Self {
        Self {
            app_id,
            key,
            kind,
            time,
        }
    }
}

/// Handle returned when a listener is registered with an event stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}
