//! graphited — standalone host for the Graphite metrics reporter.
//!
//! Plays the part of the host metrics framework: loads a properties file,
//! hands it to the reporter plugin, publishes a few process metrics, and
//! drives the plugin lifecycle from signals.
//!
//! # Usage
//!
//! ```text
//! graphited run --config /etc/graphited/reporter.toml
//! graphited check --config /etc/graphited/reporter.toml --set kafka.graphite.metrics.port=2004
//! ```

mod process;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::info;

use graphite_core::config::DEFAULT_POLLING_INTERVAL_SECS;
use graphite_core::{Properties, ReporterConfig, reporter_enabled};
use graphite_metrics::{MetricFilter, Registry};
use graphite_reporter::{
    GraphiteMetricsReporter, GraphiteTarget, LifecycleState, MetricsReporterPlugin,
};

#[derive(Parser)]
#[command(name = "graphited", about = "Graphite metrics reporter host")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initialize the reporter and run until Ctrl-C. SIGHUP restarts the push.
    Run {
        #[command(flatten)]
        props: PropsArgs,

        /// Process metrics sampling interval in seconds.
        #[arg(long, default_value = "5")]
        process_metrics_interval: u64,
    },
    /// Print the resolved reporter configuration as JSON and validate it.
    Check {
        #[command(flatten)]
        props: PropsArgs,
    },
}

#[derive(Args)]
struct PropsArgs {
    /// TOML properties file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override a property, e.g. `--set kafka.graphite.metrics.host=carbon`.
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    overrides: Vec<(String, String)>,
}

impl PropsArgs {
    fn load(&self) -> anyhow::Result<Properties> {
        let mut props = match &self.config {
            Some(path) => Properties::from_file(path)
                .with_context(|| format!("loading properties from {}", path.display()))?,
            None => Properties::new(),
        };
        for (key, value) in &self.overrides {
            props.insert(key.clone(), value.clone());
        }
        Ok(props)
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {raw:?}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in {raw:?}"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,graphited=debug,graphite_reporter=debug")
            }),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            props,
            process_metrics_interval,
        } => run(props.load()?, process_metrics_interval).await,
        Command::Check { props } => check(&props.load()?),
    }
}

async fn run(props: Properties, process_metrics_interval: u64) -> anyhow::Result<()> {
    info!(properties = props.len(), "graphited starting");

    let registry = Arc::new(Registry::new());
    let reporter = GraphiteMetricsReporter::graphite(registry.clone(), Handle::current());
    let plugin: &dyn MetricsReporterPlugin = &reporter;

    info!(name = plugin.management_name(), "loading metrics reporter plugin");
    plugin.init(&props);

    let polling_secs = reporter
        .config()
        .map_or(DEFAULT_POLLING_INTERVAL_SECS, |c| c.polling_interval_secs);

    // ── Background tasks ───────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sampler = tokio::spawn(process::run(
        registry,
        Duration::from_secs(process_metrics_interval.max(1)),
        shutdown_rx,
    ));

    wait_for_shutdown(&reporter, polling_secs).await?;

    plugin.stop_reporter();
    let _ = shutdown_tx.send(true);
    let _ = sampler.await;

    info!("graphited stopped");
    Ok(())
}

/// Stop and start the push again, leaving a reporter that was not running alone.
fn restart_reporter(reporter: &GraphiteMetricsReporter, polling_secs: u64) {
    if reporter.state() != LifecycleState::Running {
        info!(state = ?reporter.state(), "reporter not running, nothing to restart");
        return;
    }
    reporter.stop_reporter();
    reporter.start_reporter(polling_secs);
}

#[cfg(unix)]
async fn wait_for_shutdown(reporter: &GraphiteMetricsReporter, polling_secs: u64) -> anyhow::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = signal(SignalKind::hangup())?;
    loop {
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                res?;
                info!("shutdown signal received");
                return Ok(());
            }
            _ = hangup.recv() => {
                info!("SIGHUP received, restarting reporter");
                restart_reporter(reporter, polling_secs);
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown(_reporter: &GraphiteMetricsReporter, _polling_secs: u64) -> anyhow::Result<()> {
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    Ok(())
}

/// Resolved configuration plus validation verdicts, as printed by `check`.
fn check_report(props: &Properties) -> (serde_json::Value, anyhow::Result<()>) {
    let config = ReporterConfig::from_properties(props);
    let target = GraphiteTarget::new(&config.host, config.port);
    let exclusion_valid = config
        .exclude_regex
        .as_deref()
        .is_none_or(|p| MetricFilter::excluding(p).is_ok());

    let report = serde_json::json!({
        "config": config,
        "enabled": reporter_enabled(props),
        "target_valid": target.is_ok(),
        "exclusion_valid": exclusion_valid,
    });
    let verdict = target
        .map(|_| ())
        .with_context(|| format!("graphite target {} is not usable", config.endpoint()));
    (report, verdict)
}

fn check(props: &Properties) -> anyhow::Result<()> {
    let (report, verdict) = check_report(props);
    println!("{}", serde_json::to_string_pretty(&report)?);
    verdict
}
