//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::observability::logging::Severity;

/// Root configuration for the activity worker's telemetry.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct WorkerConfig {
    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Minimum log level (debug, info, warn, error).
    pub log_level: Severity,

    /// Metrics endpoint bind address.
    pub metrics_address: String,

    /// Path the exposition handler is mounted at.
    pub metrics_path: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: Severity::Info,
            metrics_address: "0.0.0.0:9090".to_string(),
            metrics_path: "/metrics".to_string(),
        }
    }
}
