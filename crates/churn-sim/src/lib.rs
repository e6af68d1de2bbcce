//! Churn Sim - In-process simulated intent service
//!
//! The real intent engine is an external system. This crate provides a
//! stand-in that honours the same contracts ([`SubmissionService`] and
//! [`EventStream`]) so the churn harness can be exercised end-to-end.
//!
//! Every submit produces `INSTALL_REQ` immediately and `INSTALLED` (or
//! `FAILED`) after the configured latency; every withdraw produces
//! `WITHDRAW_REQ` followed by `WITHDRAWN`. Events are delivered on the
//! simulator's own tasks, never on the caller's.
//!
//! # Example
//!
//! ```rust,no_run
//! use churn_core::SimulatorConfig;
//! use churn_sim::IntentSimulator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let handle = IntentSimulator::spawn(SimulatorConfig::default())?;
//!     let stats = handle.get_stats().await?;
//!     println!("{} intents tracked", stats.active_intents);
//!     handle.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! [`SubmissionService`]: churn_core::SubmissionService
//! [`EventStream`]: churn_core::EventStream

pub mod error;
pub mod listeners;
pub mod service;
pub mod store;

// Re-exports
pub use error::{Result, SimError};
pub use listeners::ListenerRegistry;
pub use service::{IntentSimulator, SimCommand, SimHandle, SimStats};
pub use store::{IntentRecord, IntentState, IntentStore};
