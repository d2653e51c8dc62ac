//! `gpsdo-sock`: feed Z3805A Time-of-Day telegrams to chrony's SOCK refclock

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use gpsdo_sock::{Bridge, BridgeConfig, BridgeError};

/// Bridge an HP Z3805A GPSDO into chrony.
///
/// Example: gpsdo-sock /dev/ttyAMA0 /var/run/chrony/gpsdo.sock
#[derive(Debug, Parser)]
#[command(name = "gpsdo-sock", version, about)]
struct Cli {
    /// Serial device the oscillator is attached to
    #[arg(required_unless_present = "config")]
    serial_port: Option<PathBuf>,

    /// chrony SOCK refclock path [default: /var/run/chrony/gpsdo.sock]
    sock_path: Option<PathBuf>,

    /// YAML configuration file; arguments given here take precedence
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Seconds between status reports
    #[arg(long)]
    report_interval: Option<u64>,

    /// Years below this are shifted forward by 1024 GPS weeks
    #[arg(long)]
    rollover_threshold: Option<i32>,

    /// Verbosity (`error`, `warn`, `info`, `debug`, `trace`); RUST_LOG wins if set
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn into_config(self) -> gpsdo_sock::Result<BridgeConfig> {
        let mut config = match &self.config {
            Some(path) => BridgeConfig::load(path)?,
            None => BridgeConfig::default(),
        };
        if let Some(serial_port) = self.serial_port {
            config.serial_port = serial_port;
        }
        if let Some(sock_path) = self.sock_path {
            config.socket_path = sock_path;
        }
        if let Some(secs) = self.report_interval {
            config.report_interval_secs = secs;
        }
        if let Some(year) = self.rollover_threshold {
            config.rollover_threshold_year = year;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = cli.into_config().map_err(report)?;

    if !config.serial_port.exists() {
        bail!("Serial port {} does not exist", config.serial_port.display());
    }

    let bridge = Bridge::open(&config).map_err(report)?;

    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .context("failed to install SIGTERM handler")?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Interrupted, shutting down"),
        _ = sigterm.recv() => info!("Terminated, shutting down"),
        _ = bridge.closed() => info!("Telegram source closed"),
    }

    bridge.shutdown();
    let stats = bridge.stats();
    bridge.join().await;

    info!(
        "Final: telegrams={}, decoded={}, sent={}, failures={}",
        stats.telegrams_seen, stats.telegrams_decoded, stats.samples_sent, stats.delivery_failures
    );
    Ok(())
}

/// Log recovery hints for a fatal error before handing it to anyhow.
fn report(err: BridgeError) -> anyhow::Error {
    error!("{}", err);
    for suggestion in err.recovery_suggestions() {
        error!("  - {}", suggestion);
    }
    err.into()
}
