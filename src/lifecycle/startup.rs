//! Startup orchestration.
//!
//! # Responsibilities
//! - Install the process log sink
//! - Create the metric registry and register the activity metrics
//! - Bind the metrics listener
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The listener binds last (traffic only when ready)

use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::activity::MetricsInterceptor;
use crate::config::{ConfigError, WorkerConfig};
use crate::http::MetricsServer;
use crate::lifecycle::Shutdown;
use crate::observability::logging::{self, JsonSink, LogSink, StructuredLogAdapter};
use crate::observability::{ActivityMetrics, MetricRegistry, MetricsError};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("metric registration failed: {0}")]
    Metrics(#[from] MetricsError),

    #[error("failed to bind metrics listener on {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Everything the worker needs after a successful startup.
pub struct Runtime {
    pub config: WorkerConfig,
    pub registry: MetricRegistry,
    pub metrics: Arc<ActivityMetrics>,
    /// Logger to hand to the workflow engine.
    pub engine_logger: StructuredLogAdapter,
    pub shutdown: Shutdown,
    listener: TcpListener,
    shutdown_rx: broadcast::Receiver<()>,
}

/// Start up with JSON logs on stderr.
pub async fn bootstrap(config: WorkerConfig) -> Result<Runtime, StartupError> {
    let level = config.observability.log_level;
    bootstrap_with_sink(config, Arc::new(JsonSink::stderr(level))).await
}

/// Start up writing all logs through `sink`.
pub async fn bootstrap_with_sink(
    config: WorkerConfig,
    sink: Arc<dyn LogSink>,
) -> Result<Runtime, StartupError> {
    // 1. Logging
    if logging::init_logging(sink.clone(), config.observability.log_level).is_err() {
        tracing::debug!("Global tracing subscriber already installed, keeping it");
    }
    let engine_logger = StructuredLogAdapter::new(sink);

    // 2. Metrics
    let registry = MetricRegistry::new();
    let metrics = Arc::new(ActivityMetrics::registered(&registry)?);
    tracing::info!(
        metrics = ?registry.metric_names(),
        "Activity metrics registered"
    );

    // 3. Listener
    let address = config.observability.metrics_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();

    Ok(Runtime {
        config,
        registry,
        metrics,
        engine_logger,
        shutdown,
        listener,
        shutdown_rx,
    })
}

impl Runtime {
    /// Interceptor to install on the engine's worker.
    pub fn interceptor(&self) -> MetricsInterceptor {
        MetricsInterceptor::new(Arc::clone(&self.metrics))
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve the metrics endpoint until [`Runtime::shutdown`] fires.
    pub async fn serve(self) -> Result<(), std::io::Error> {
        let server = MetricsServer::new(
            self.registry.clone(),
            &self.config.observability.metrics_path,
        );
        server.run(self.listener, self.shutdown_rx).await
    }
}
