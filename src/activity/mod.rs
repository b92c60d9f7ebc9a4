//! Activity execution contract.
//!
//! # Data Flow
//! ```text
//! workflow engine
//!     → chain.rs (look up activity by kind, apply interceptors)
//!     → interceptor.rs (time + classify + record metrics)
//!     → activity body (ActivityExecutor)
//!     ← result / error returned unchanged
//! ```
//!
//! # Design Decisions
//! - The engine itself lives outside this crate; only the calls it makes
//!   into the worker are modelled here
//! - Interception is composition: an interceptor returns a new executor that
//!   holds the next one

pub mod chain;
pub mod interceptor;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use chain::ActivityChain;
pub use interceptor::{InstrumentedActivity, MetricsInterceptor, SpecializedActivity};

/// Opaque activity input and output.
pub type Payload = serde_json::Value;

/// Result of one activity execution.
pub type ActivityResult = Result<Payload, ActivityError>;

/// Identity of one activity execution, supplied by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActivityInfo {
    /// Registered activity kind, e.g. `ProvisionSandbox`.
    pub activity_type: String,
    pub activity_id: String,
    pub workflow_id: String,
    /// 1-based attempt number.
    pub attempt: u32,
}

impl ActivityInfo {
    pub fn new(activity_type: impl Into<String>) -> Self {
        Self {
            activity_type: activity_type.into(),
            attempt: 1,
            ..Default::default()
        }
    }

    pub fn with_workflow(mut self, workflow_id: impl Into<String>, activity_id: impl Into<String>) -> Self {
        self.workflow_id = workflow_id.into();
        self.activity_id = activity_id.into();
        self
    }
}

/// Classification of an activity error, as the engine sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityErrorKind {
    Application,
    Canceled,
    Timeout,
}

impl fmt::Display for ActivityErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityErrorKind::Application => f.write_str("application"),
            ActivityErrorKind::Canceled => f.write_str("canceled"),
            ActivityErrorKind::Timeout => f.write_str("timeout"),
        }
    }
}

/// Error returned by an activity body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[error("{kind} error: {message}")]
pub struct ActivityError {
    pub kind: ActivityErrorKind,
    pub message: String,
    /// Whether the engine should stop retrying.
    pub non_retryable: bool,
}

impl ActivityError {
    pub fn application(message: impl Into<String>) -> Self {
        Self {
            kind: ActivityErrorKind::Application,
            message: message.into(),
            non_retryable: false,
        }
    }

    pub fn canceled(message: impl Into<String>) -> Self {
        Self {
            kind: ActivityErrorKind::Canceled,
            message: message.into(),
            non_retryable: true,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: ActivityErrorKind::Timeout,
            message: message.into(),
            non_retryable: false,
        }
    }

    pub fn non_retryable(mut self) -> Self {
        self.non_retryable = true;
        self
    }
}

/// Executes one activity: the capability every link in the chain shares.
#[async_trait]
pub trait ActivityExecutor: Send + Sync {
    async fn execute(&self, info: &ActivityInfo, input: Payload) -> ActivityResult;
}

#[async_trait]
impl<T: ActivityExecutor + ?Sized> ActivityExecutor for Arc<T> {
    async fn execute(&self, info: &ActivityInfo, input: Payload) -> ActivityResult {
        (**self).execute(info, input).await
    }
}

#[async_trait]
impl<T: ActivityExecutor + ?Sized> ActivityExecutor for Box<T> {
    async fn execute(&self, info: &ActivityInfo, input: Payload) -> ActivityResult {
        (**self).execute(info, input).await
    }
}

/// Wraps an executor in another one. Called by the engine around every
/// activity it dispatches.
pub trait ActivityInterceptor: Send + Sync {
    fn intercept(&self, next: Arc<dyn ActivityExecutor>) -> Arc<dyn ActivityExecutor>;
}

/// Executor built from an async closure. See [`activity_fn`].
pub struct FnActivity<F> {
    f: F,
}

/// Turn an async closure into an [`ActivityExecutor`].
///
/// ```rust,ignore
/// let echo = activity_fn(|_info, input| async move { Ok(input) });
/// ```
pub fn activity_fn<F, Fut>(f: F) -> FnActivity<F>
where
    F: Fn(ActivityInfo, Payload) -> Fut + Send + Sync,
    Fut: Future<Output = ActivityResult> + Send + 'static,
{
    FnActivity { f }
}

#[async_trait]
impl<F, Fut> ActivityExecutor for FnActivity<F>
where
    F: Fn(ActivityInfo, Payload) -> Fut + Send + Sync,
    Fut: Future<Output = ActivityResult> + Send + 'static,
{
    async fn execute(&self, info: &ActivityInfo, input: Payload) -> ActivityResult {
        (self.f)(info.clone(), input).await
    }
}
