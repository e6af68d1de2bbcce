//! Shared test helpers

pub mod scripted;

pub use scripted::{Script, ScriptedService};

/// Install a test subscriber once per process
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("churn_harness=debug,churn_sim=info")
        .with_test_writer()
        .try_init();
}
