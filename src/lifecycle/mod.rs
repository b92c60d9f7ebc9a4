//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Log sink → Metric registry → Register metrics → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Broadcast → Metrics server stops accepting → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: logging first so every later step is visible
//! - Fail fast: a duplicate metric registration aborts before serving
//! - The listener binds last (traffic only when ready)

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
pub use startup::{bootstrap, Runtime, StartupError};
