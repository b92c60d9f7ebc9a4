//! Structured logging.
//!
//! # Data Flow
//! ```text
//! workflow engine logger calls (msg, k1, v1, k2, v2, ...)
//!     → adapter.rs (decode key/value pairs)  ─┐
//! process code tracing::info!(field = ..)     │
//!     → layer.rs (visit event fields)        ─┤
//!                                             ▼
//!                                  sink.rs (one JSON object per line, stderr)
//! ```
//!
//! # Design Decisions
//! - One sink per process; both producers write through it
//! - The minimum level belongs to the sink, producers never filter
//! - Malformed key/value lists degrade to a sentinel key, never an error

pub mod adapter;
pub mod layer;
pub mod sink;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use adapter::{decode_keyvals, EngineLogger, StructuredLogAdapter, BAD_KEY};
pub use layer::SinkLayer;
pub use sink::{JsonSink, LogSink};

/// Log severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl Severity {
    /// Uppercase name written to the `level` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }

    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn filter_directive(&self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognised severity name.
#[derive(Debug, thiserror::Error)]
#[error("unknown log level {0:?} (expected debug, info, warn or error)")]
pub struct ParseSeverityError(String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warn" | "warning" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}

/// One structured log entry. Built per call and written immediately.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub severity: Severity,
    pub message: String,
    pub attributes: Vec<(String, Value)>,
}

impl LogRecord {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            attributes: Vec::new(),
        }
    }

    /// First attribute with the given key.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

/// Install the process-wide `tracing` subscriber writing through `sink`.
///
/// `RUST_LOG` overrides `level` when set. Calling this twice returns an error
/// from the second call instead of panicking.
pub fn init_logging(
    sink: Arc<dyn LogSink>,
    level: Severity,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.filter_directive()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(SinkLayer::new(sink))
        .try_init()
}
