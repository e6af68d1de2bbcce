//! End-to-end runs against the in-process intent simulator
//!
//! Run: cargo test -p churn-harness --test simulated_service

mod helpers;

use churn_core::{AppId, ConnectPoint, HarnessConfig, SimulatorConfig};
use churn_harness::{ChurnHarness, PhaseOutcome, RunMode};
use churn_sim::{IntentSimulator, SimHandle};
use helpers::init_tracing;
use std::sync::Arc;
use std::time::Duration;

fn endpoints() -> (ConnectPoint, ConnectPoint) {
    (
        "of:0000000000000001/1".parse().unwrap(),
        "of:0000000000000002/1".parse().unwrap(),
    )
}

/// Short deadlines so failure cases finish quickly
fn quick_config() -> HarnessConfig {
    HarnessConfig {
        base_timeout: Duration::from_millis(200),
        per_item_timeout: Duration::from_millis(1),
        ..Default::default()
    }
}

fn start(config: SimulatorConfig) -> Arc<SimHandle> {
    Arc::new(IntentSimulator::spawn(config).expect("Failed to start simulator"))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_full_run_200_intents() {
    init_tracing();
    let sim = start(SimulatorConfig::default());
    let harness = ChurnHarness::new(sim.clone(), HarnessConfig::default()).unwrap();
    let (ingress, egress) = endpoints();

    let report = harness
        .run(&ingress, &egress, 200, 1, RunMode::Full)
        .await
        .unwrap();

    assert!(report.all_completed(), "report: {}", report);
    assert_eq!(report.count, 200);
    println!("{}", report);

    let stats = sim.get_stats().await.unwrap();
    assert_eq!(stats.submitted, 200);
    assert_eq!(stats.installed, 200);
    assert_eq!(stats.withdrawn, 200);
    assert_eq!(stats.active_intents, 0);
    assert_eq!(stats.listeners, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cycles_accumulate_summary() {
    init_tracing();
    let sim = start(SimulatorConfig::fixed(Duration::from_millis(2)));
    let harness = ChurnHarness::new(sim.clone(), HarnessConfig::default()).unwrap();
    let (ingress, egress) = endpoints();

    let report = harness.cycle(&ingress, &egress, 25, 100, 3).await.unwrap();

    assert_eq!(report.phases.len(), 6);
    assert_eq!(report.summary.completed_phases, 6);
    assert_eq!(report.summary.failed_phases, 0);
    assert!(report.summary.mean_install_ms.is_some());
    assert!(report.summary.max_withdraw_ms.is_some());

    let stats = sim.get_stats().await.unwrap();
    assert_eq!(stats.submitted, 75);
    assert_eq!(stats.withdrawn, 75);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failed_installs_time_out() {
    init_tracing();
    let sim = start(SimulatorConfig {
        failure_rate: 1.0,
        ..SimulatorConfig::fixed(Duration::from_millis(1))
    });
    let harness = ChurnHarness::new(sim, quick_config()).unwrap();
    let (ingress, egress) = endpoints();

    let report = harness
        .run(&ingress, &egress, 8, 1, RunMode::Full)
        .await
        .unwrap();

    let install = &report.phases[0];
    assert_eq!(install.outstanding(), 8);
    assert_eq!(install.failed_events, 8);
    assert!(matches!(install.outcome, PhaseOutcome::TimedOut { .. }));

    // Failed intents can still be withdrawn
    assert!(report.phases[1].is_completed());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stalled_service_times_out() {
    init_tracing();
    let sim = start(SimulatorConfig {
        stall: true,
        ..Default::default()
    });
    let harness = ChurnHarness::new(sim.clone(), quick_config()).unwrap();
    let (ingress, egress) = endpoints();

    let report = harness
        .run(&ingress, &egress, 4, 1, RunMode::InstallOnly)
        .await
        .unwrap();

    assert_eq!(report.phases.len(), 1);
    assert_eq!(report.phases[0].outstanding(), 4);
    assert_eq!(sim.listener_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_harnesses_are_isolated() {
    init_tracing();
    let sim = start(SimulatorConfig::default());
    let (ingress, egress) = endpoints();

    let a = ChurnHarness::new(
        sim.clone(),
        HarnessConfig {
            app_id: AppId::new("churn.a"),
            ..Default::default()
        },
    )
    .unwrap();
    let b = ChurnHarness::new(
        sim.clone(),
        HarnessConfig {
            app_id: AppId::new("churn.b"),
            ..Default::default()
        },
    )
    .unwrap();

    // Same keys, different owners
    let (ra, rb) = tokio::join!(
        a.run(&ingress, &egress, 50, 1, RunMode::Full),
        b.run(&ingress, &egress, 50, 1, RunMode::Full),
    );

    let (ra, rb) = (ra.unwrap(), rb.unwrap());
    assert!(ra.all_completed());
    assert!(rb.all_completed());
    assert_eq!(ra.phases[0].duplicates, 0);
    assert_eq!(rb.phases[0].duplicates, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_report_serializes() {
    let sim = start(SimulatorConfig::fixed(Duration::from_millis(1)));
    let harness = ChurnHarness::new(sim, HarnessConfig::default()).unwrap();
    let (ingress, egress) = endpoints();

    let report = harness
        .run(&ingress, &egress, 3, 1, RunMode::InstallOnly)
        .await
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["count"], 3);
    assert_eq!(json["phases"][0]["phase"], "install");
    assert_eq!(json["phases"][0]["status"], "completed");
}
