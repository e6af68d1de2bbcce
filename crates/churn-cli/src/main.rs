//! Intent Churn - bulk intent install/withdraw load generator
//!
//! Pushes a batch of point-to-point intents through the in-process intent
//! simulator and reports how long installation and withdrawal took:
//!
//! ```text
//! intent-churn of:0000000000000001/1 of:0000000000000002/1 1000
//! Time to install 1000 intents: 41 ms
//! Time to withdraw 1000 intents: 38 ms
//! ```

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use churn_core::{AppId, ChurnConfig, ChurnError, ConnectPoint, LogFormat};
use churn_harness::{ChurnHarness, RunMode};
use churn_sim::IntentSimulator;

#[derive(Parser, Debug)]
#[command(name = "intent-churn")]
#[command(about = "Install and withdraw a batch of point-to-point intents and time it")]
#[command(allow_negative_numbers = true)]
struct Args {
    /// Ingress attachment point (device/port)
    ingress: String,

    /// Egress attachment point (device/port)
    egress: String,

    /// Number of intents to push
    count: i64,

    /// First intent key
    #[arg(default_value_t = 1)]
    key_offset: u64,

    /// Only install the batch
    #[arg(long, short)]
    install: bool,

    /// Only withdraw the batch
    #[arg(long, short)]
    withdraw: bool,

    /// Repeat install and withdraw this many times
    #[arg(long, default_value_t = 1, conflicts_with_all = ["install", "withdraw"])]
    cycles: usize,

    /// Application id owning the intents
    #[arg(long)]
    app_id: Option<String>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Simulated install/withdraw latency, e.g. "20ms"
    #[arg(long, value_parser = humantime::parse_duration)]
    latency: Option<Duration>,

    /// Simulated service never completes anything
    #[arg(long)]
    stall: bool,

    /// Print results as JSON
    #[arg(long, short)]
    json: bool,

    /// Enable verbose logging
    #[arg(long, short)]
    verbose: bool,
}

impl Args {
    /// Merge command-line overrides into the file (or default) configuration
    fn config(&self) -> anyhow::Result<ChurnConfig> {
        let mut config = match &self.config {
            Some(path) => ChurnConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ChurnConfig::default(),
        };

        if let Some(app_id) = &self.app_id {
            config.harness.app_id = AppId::new(app_id.clone());
        }
        if let Some(latency) = self.latency {
            config.simulator.install_latency = latency;
            config.simulator.withdraw_latency = latency;
        }
        if self.stall {
            config.simulator.stall = true;
        }
        if self.verbose {
            config.logging.filter = "debug".to_string();
        }

        config.validate()?;
        Ok(config)
    }

    fn count(&self) -> Result<usize, ChurnError> {
        usize::try_from(self.count)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ChurnError::InvalidArgument(format!(
                    "number of intents must be positive, got {}",
                    self.count
                ))
            })
    }

    fn mode(&self) -> RunMode {
        RunMode::from_flags(self.install, self.withdraw)
    }
}

fn init_logging(config: &ChurnConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = match config.logging.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("failed to initialise logging: {}", e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = args.config()?;
    init_logging(&config)?;

    let ingress: ConnectPoint = args.ingress.parse()?;
    let egress: ConnectPoint = args.egress.parse()?;
    let count = args.count()?;
    if args.cycles == 0 {
        bail!("--cycles must be positive");
    }

    info!("Starting intent simulator");
    let (simulator, sim_handle) = IntentSimulator::new(config.simulator.clone())?;
    let sim_task = tokio::spawn(async move {
        if let Err(e) = simulator.run().await {
            error!("Simulator error: {}", e);
        }
    });

    let sim_handle = Arc::new(sim_handle);
    let harness = ChurnHarness::new(sim_handle.clone(), config.harness.clone())?;

    // Ctrl-C interrupts the current wait instead of killing the process
    let interrupt = harness.interrupt_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, reporting partial results");
            interrupt.interrupt();
        }
    });

    let completed = if args.cycles > 1 {
        let report = harness
            .cycle(&ingress, &egress, count, args.key_offset, args.cycles)
            .await?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("{}", report);
        }
        report.all_completed()
    } else {
        let report = harness
            .run(&ingress, &egress, count, args.key_offset, args.mode())
            .await?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("{}", report);
        }
        report.all_completed()
    };

    sim_handle.shutdown().await?;
    let _ = sim_task.await;

    // Timed out or interrupted phases fail the process
    if !completed {
        bail!("not every phase completed");
    }
    Ok(())
}
