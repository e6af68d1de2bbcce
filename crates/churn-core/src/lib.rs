//! Churn Core - Domain types and service contracts for intent churn testing
//!
//! This crate holds the types shared by the harness, the simulated intent
//! service and the command-line tool.
//!
//! # Modules
//!
//! - [`intent`] - Application ids, keys, attachment points, selectors and intents
//! - [`event`] - Intent lifecycle events and listener handles
//! - [`config`] - Configuration types
//! - [`error`] - Error types
//!
//! # Service contracts
//!
//! The intent engine itself is an external collaborator. The harness talks
//! to it through two traits:
//!
//! - [`SubmissionService`] - fire-and-forget submit and withdraw
//! - [`EventStream`] - listener registration for lifecycle events

pub mod config;
pub mod error;
pub mod event;
pub mod intent;

// Re-exports for convenience
pub use config::{ChurnConfig, HarnessConfig, LogFormat, LoggingConfig, SimulatorConfig};
pub use error::{ChurnError, Result};
pub use event::{IntentEvent, IntentEventKind, ListenerId};
pub use intent::{AppId, ConnectPoint, DeviceId, Intent, IntentKey, MacAddress, TrafficSelector};

use async_trait::async_trait;
use std::sync::Arc;

/// Receives intent events from an [`EventStream`]
///
/// Delivery may happen on any thread, so implementations must synchronise
/// their own state.
pub trait IntentListener: Send + Sync {
    /// Handle one event
    fn event(&self, event: &IntentEvent);
}

/// Registration point for intent event listeners
pub trait EventStream: Send + Sync {
    /// Register a listener; events may be delivered as soon as this returns
    fn add_listener(&self, listener: Arc<dyn IntentListener>) -> ListenerId;

    /// Remove a listener. Returns false if it was not registered.
    ///
    /// Removal does not drain in-flight deliveries: a listener may still
    /// observe an event that was already being dispatched.
    fn remove_listener(&self, id: ListenerId) -> bool;
}

/// Asynchronous intent submission
#[async_trait]
pub trait SubmissionService: Send + Sync {
    /// Request installation; completion is reported through the event stream
    async fn submit(&self, intent: Intent) -> Result<()>;

    /// Request withdrawal; completion is reported through the event stream
    async fn withdraw(&self, intent: Intent) -> Result<()>;
}

/// An intent service offering both contracts
pub trait IntentService: SubmissionService + EventStream {}

impl<T: SubmissionService + EventStream> IntentService for T {}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
