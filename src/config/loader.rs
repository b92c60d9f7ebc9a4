//! Configuration loading from disk and the environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::WorkerConfig;
use crate::config::validation::ValidationError;
use crate::observability::logging::{ParseSeverityError, Severity};

/// Environment variable overriding `observability.log_level`.
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
/// Environment variable overriding `observability.metrics_address`.
pub const ENV_METRICS_ADDR: &str = "METRICS_ADDR";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid {var}: {source}")]
    Env {
        var: &'static str,
        #[source]
        source: ParseSeverityError,
    },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse configuration from a TOML file.
///
/// The result is not validated: later overrides may still replace invalid
/// values, so callers run `validate_config` once after the last one.
pub fn load_config(path: &Path) -> Result<WorkerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Apply `LOG_LEVEL` and `METRICS_ADDR` overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(mut config: WorkerConfig, lookup: F) -> Result<WorkerConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
        config.observability.log_level = level
            .parse::<Severity>()
            .map_err(|source| ConfigError::Env {
                var: ENV_LOG_LEVEL,
                source,
            })?;
    }

    if let Some(addr) = lookup(ENV_METRICS_ADDR).filter(|v| !v.trim().is_empty()) {
        config.observability.metrics_address = addr.trim().to_string();
    }

    Ok(config)
}

/// Merge the file (or defaults) with the process environment.
///
/// Not validated; see [`load_config`].
pub fn resolve_config(path: Option<&Path>) -> Result<WorkerConfig, ConfigError> {
    resolve_config_with(path, |var| std::env::var(var).ok())
}

/// [`resolve_config`] reading variables through `lookup`.
pub fn resolve_config_with<F>(path: Option<&Path>, lookup: F) -> Result<WorkerConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let config = match path {
        Some(path) => load_config(path)?,
        None => WorkerConfig::default(),
    };
    apply_env_overrides(config, lookup)
}
