//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: WorkerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::WorkerConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),

    #[error("observability.metrics_path {0:?} must start with '/'")]
    MetricsPath(String),

    #[error("observability.metrics_path {0:?} must be a literal path without ':' or '*' segments or braces")]
    MetricsPathPattern(String),
}

/// Check semantic constraints serde cannot express.
pub fn validate_config(config: &WorkerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let observability = &config.observability;

    if observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::MetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    let path = &observability.metrics_path;
    if !path.starts_with('/') {
        errors.push(ValidationError::MetricsPath(path.clone()));
    } else if !is_literal_route(path) {
        errors.push(ValidationError::MetricsPathPattern(path.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Whether the router would mount `path` as a plain path rather than a
/// capture or wildcard (and not reject it outright).
fn is_literal_route(path: &str) -> bool {
    !path.contains(['{', '}'])
        && path
            .split('/')
            .all(|segment| !segment.starts_with([':', '*']))
}
