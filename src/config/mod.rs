//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, env overrides)
//!     → main.rs (CLI overrides)
//!     → validation.rs (semantic checks, once, after the last override)
//!     → WorkerConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; there is no reload
//! - All fields have defaults so an empty file is valid
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, load_config, resolve_config, resolve_config_with, ConfigError};
pub use schema::{ObservabilityConfig, WorkerConfig};
pub use validation::{validate_config, ValidationError};
