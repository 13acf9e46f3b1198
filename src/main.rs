use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use alarmvisor::{AlarmService, Config, Console, LogWriter, wait_for_shutdown_signal};

/// Concurrent alarm scheduler with per-group display workers.
///
/// Reads commands from stdin, one per line:
///   Start_Alarm(<id>): Group(<gid>) <seconds> <message>
///   Change_Alarm(<id>): Group(<gid>) <seconds> <message>
///   Cancel_Alarm(<id>) | Suspend_Alarm(<id>) | Reactivate_Alarm(<id>) | View_Alarms
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Period of the discovery, display and reaper loops, in milliseconds.
    #[clap(long, default_value_t = 1000)]
    poll_ms: u64,

    /// Maximum wait for background tasks on shutdown, in seconds.
    #[clap(long, default_value_t = 5)]
    grace_secs: u64,

    /// Event bus capacity.
    #[clap(long, default_value_t = 1024)]
    bus_capacity: usize,

    /// Maximum alarm message length in bytes.
    #[clap(long, default_value_t = 64)]
    message_limit: usize,

    /// Do not print the `Alarm> ` prompt.
    #[clap(long, short = 'q')]
    no_prompt: bool,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            poll_interval: Duration::from_millis(self.poll_ms),
            grace: Duration::from_secs(self.grace_secs),
            bus_capacity: self.bus_capacity,
            message_limit: self.message_limit,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let cfg = args.config();
    info!(?cfg, "starting alarmvisor");

    let svc = AlarmService::builder(cfg)
        .with_subscriber(Arc::new(LogWriter::new()))
        .build();
    svc.launch().await?;

    let console = Console::new(
        Arc::clone(&svc),
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .with_prompt(!args.no_prompt);

    tokio::select! {
        res = console.run() => {
            res.context("console i/o failed")?;
            info!("end of input");
        }
        res = wait_for_shutdown_signal() => {
            res.context("failed to install signal handlers")?;
        }
    }

    svc.shutdown().await.context("graceful shutdown failed")?;
    Ok(())
}

/// Diagnostics go to stderr; stdout carries the console and the display.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
