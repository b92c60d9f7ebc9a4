//! HTTP exposition subsystem.
//!
//! # Data Flow
//! ```text
//! collector GET /metrics
//!     → server.rs (Axum router, trace layer)
//!     → MetricRegistry::encode_text (full snapshot, text format)
//!     → 200 text/plain; version=0.0.4
//! ```

pub mod server;

pub use server::MetricsServer;
