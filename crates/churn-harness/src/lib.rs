//! Churn Harness - bulk intent install/withdraw load generator
//!
//! Generates a batch of point-to-point intents, pushes them through an
//! asynchronous intent service and measures the wall-clock time until the
//! service has reported every one of them installed, then withdrawn.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use churn_core::{ConnectPoint, HarnessConfig};
//! use churn_harness::{ChurnHarness, RunMode};
//! # use churn_core::IntentService;
//!
//! # async fn demo<S: IntentService + 'static>(service: Arc<S>) -> churn_core::Result<()> {
//! let harness = ChurnHarness::new(service, HarnessConfig::default())?;
//! let ingress: ConnectPoint = "of:0000000000000001/1".parse()?;
//! let egress: ConnectPoint = "of:0000000000000002/1".parse()?;
//!
//! let report = harness.run(&ingress, &egress, 1000, 1, RunMode::Full).await?;
//! println!("{}", report);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod harness;
pub mod latch;
pub mod phase;
pub mod report;
pub mod tracker;

// Re-exports
pub use batch::{generate_batch, Batch};
pub use harness::{ChurnHarness, InterruptHandle, RunMode};
pub use latch::CountDownLatch;
pub use phase::{Phase, PhaseOutcome, PhaseResult};
pub use report::{CycleReport, CycleSummary, RunReport};
pub use tracker::{PhaseTracker, TrackerSnapshot};
