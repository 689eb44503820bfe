//! venue-monitor CLI
//!
//! ```bash
//! # Watch the simulated venue for 20s, inject a surge at 5s
//! venue-monitor run --duration-secs 20 --surge-after-secs 5
//!
//! # Reproducible run, final snapshot as JSON
//! VENUE_SAMPLER_SEED=42 venue-monitor run --json
//!
//! # Classify a saved 8x8 count matrix
//! venue-monitor classify frame.txt
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use escalation_core::{DensityClassifier, HotspotSampler};
use tracing::info;
use venue_monitor::telemetry::{init_tracing, render_classification, render_snapshot};
use venue_monitor::{spawn_monitor, Collaborators, MonitorConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Crowd-density escalation monitor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the monitor against the simulated hotspot sampler
    Run(RunArgs),
    /// Classify an 8x8 whitespace-separated count matrix
    Classify {
        /// File with one row per line
        file: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// How long to monitor before printing the report
    #[arg(long, default_value_t = 10)]
    duration_secs: u64,

    /// Sampler seed (overrides VENUE_SAMPLER_SEED)
    #[arg(long)]
    seed: Option<u64>,

    /// Sampling interval in ms (overrides VENUE_SAMPLE_INTERVAL_MS)
    #[arg(long)]
    sample_interval_ms: Option<u64>,

    /// Watchdog interval in ms (overrides VENUE_WATCHDOG_INTERVAL_MS)
    #[arg(long)]
    watchdog_interval_ms: Option<u64>,

    /// Alert endpoint (overrides VENUE_ALERT_URL)
    #[arg(long)]
    alert_url: Option<String>,

    /// Print the final snapshot as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Inject a simulated surge this many seconds in
    #[arg(long)]
    surge_after_secs: Option<u64>,

    /// Request a manual dispatch this many seconds in
    #[arg(long)]
    dispatch_after_secs: Option<u64>,
}

/// Scripted operator input during `run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum OperatorAction {
    Surge,
    Dispatch,
}

impl RunArgs {
    fn apply(&self, config: &mut MonitorConfig) {
        if let Some(seed) = self.seed {
            config.sampler_seed = Some(seed);
        }
        if let Some(ms) = self.sample_interval_ms {
            config.sample_interval = Duration::from_millis(ms.max(1));
        }
        if let Some(ms) = self.watchdog_interval_ms {
            config.watchdog_interval = Duration::from_millis(ms.max(1));
        }
        if let Some(url) = &self.alert_url {
            config.alert.url = url.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    match Cli::parse().command {
        Command::Run(args) => run(args).await,
        Command::Classify { file } => classify(&file),
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let mut config = MonitorConfig::from_env();
    args.apply(&mut config);

    info!(
        sample_ms = config.sample_interval.as_millis() as u64,
        seed = ?config.sampler_seed,
        "Starting venue monitor"
    );

    let sampler = match config.sampler_seed {
        Some(seed) => HotspotSampler::seeded(seed),
        None => HotspotSampler::new(),
    };
    let collaborators = Collaborators::from_config(&config)?;
    let monitor = spawn_monitor(&config, Box::new(sampler), collaborators);
    monitor.start().await?;

    let mut actions = Vec::new();
    if let Some(at) = args.surge_after_secs {
        actions.push((at, OperatorAction::Surge));
    }
    if let Some(at) = args.dispatch_after_secs {
        actions.push((at, OperatorAction::Dispatch));
    }
    actions.sort();

    let started = tokio::time::Instant::now();
    for (at, action) in actions.into_iter().filter(|(at, _)| *at < args.duration_secs) {
        tokio::time::sleep_until(started + Duration::from_secs(at)).await;
        match action {
            OperatorAction::Surge => monitor.inject_surge().await?,
            OperatorAction::Dispatch => {
                let decision = monitor.manual_dispatch().await?;
                info!(accepted = decision.is_accepted(), "Manual dispatch requested");
            }
        }
    }
    tokio::time::sleep_until(started + Duration::from_secs(args.duration_secs)).await;

    monitor.stop().await?;
    let snapshot = monitor.snapshot().await?;
    monitor.shutdown().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", render_snapshot(&snapshot));
    }
    Ok(())
}

fn classify(file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let raw = parse_matrix(&text)?;
    let classification = DensityClassifier::new().classify(&raw)?;
    print!("{}", render_classification(&classification));
    Ok(())
}

/// Rows are lines; blank lines are skipped.
fn parse_matrix(text: &str) -> Result<Vec<Vec<u32>>> {
    let mut rows = Vec::new();
    for (n, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|tok| tok.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("line {}: expected non-negative integers", n + 1))?;
        rows.push(row);
    }
    if rows.is_empty() {
        bail!("matrix is empty");
    }
    Ok(rows)
}
