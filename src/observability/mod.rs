//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Activity interceptor:
//!     → metrics.rs (activity counters and histograms)
//!     → registry.rs (owns families, snapshot for /metrics scrape)
//!
//! Engine logger + process tracing events:
//!     → logging/ (structured JSON lines on stderr)
//! ```
//!
//! # Design Decisions
//! - The metric registry is an explicit value, never a process global
//! - Metric updates are atomic operations inside the prometheus primitives
//! - Logging and metrics share nothing

pub mod logging;
pub mod metrics;
pub mod registry;

pub use metrics::{ActivityMetrics, Outcome};
pub use registry::{MetricRegistry, MetricsError, MetricsResult};
