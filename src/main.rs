//! Activity worker telemetry (v1)
//!
//! Instrumentation for a worker that runs activities dispatched by an
//! external workflow engine.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌────────────────────────────────────────────────────┐
//!                 │                  ACTIVITY WORKER                    │
//!   workflow      │  ┌───────────┐    ┌──────────────┐    ┌──────────┐  │
//!   engine ───────┼─▶│ activity  │───▶│ interceptor  │───▶│ activity │  │
//!   dispatch      │  │  chain    │    │ (time+count) │    │   body   │  │
//!                 │  └───────────┘    └──────┬───────┘    └──────────┘  │
//!                 │                          ▼                          │
//!                 │                  ┌──────────────┐   ┌────────────┐  │
//!   collector ◀───┼──────────────────│  registry    │◀──│ /metrics   │◀─┼── GET
//!                 │                  └──────────────┘   └────────────┘  │
//!                 │                                                     │
//!   engine logger ┼─▶ adapter ─┐                                        │
//!   tracing! ─────┼─▶ layer ───┴─▶ JSON sink ─▶ stderr                  │
//!                 └────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use activity_telemetry::config::{resolve_config, validate_config, ConfigError};
use activity_telemetry::lifecycle::{bootstrap, wait_for_signal};
use activity_telemetry::observability::logging::Severity;

#[derive(Parser)]
#[command(name = "activity-telemetry")]
#[command(about = "Activity worker metrics and structured logging", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override observability.log_level.
    #[arg(long)]
    log_level: Option<Severity>,

    /// Override observability.metrics_address.
    #[arg(long)]
    metrics_address: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // File and environment first, then flags; validate only the final result.
    let mut config = resolve_config(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }
    if let Some(address) = cli.metrics_address {
        config.observability.metrics_address = address;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    let runtime = bootstrap(config).await?;

    tracing::info!(
        address = %runtime.local_addr()?,
        log_level = %runtime.config.observability.log_level,
        "activity-telemetry v0.1.0 started"
    );

    let shutdown = runtime.shutdown.clone();
    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(signal) => {
                tracing::info!(signal, "Shutdown signal received");
                shutdown.trigger();
            }
            Err(e) => tracing::error!(error = %e, "Failed to install signal handler"),
        }
    });

    runtime.serve().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
