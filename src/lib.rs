//! Activity worker telemetry library.

pub mod activity;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use activity::{ActivityChain, ActivityExecutor, ActivityInterceptor, MetricsInterceptor};
pub use config::WorkerConfig;
pub use http::MetricsServer;
pub use lifecycle::Shutdown;
pub use observability::{ActivityMetrics, MetricRegistry};
