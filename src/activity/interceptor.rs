//! Metrics interceptor for activity executions.
//!
//! # Responsibilities
//! - Time every activity invocation
//! - Classify the outcome as success or failure
//! - Record generic duration and total metrics by activity kind
//! - Route a few known kinds to their dedicated metrics on success
//!
//! # Design Decisions
//! - The wrapped result is returned untouched, error included
//! - No state is kept between invocations; timing lives in a local `Invocation`
//! - Known kinds are a closed enum, not a callback registry

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::{ActivityExecutor, ActivityInfo, ActivityInterceptor, ActivityResult, Payload};
use crate::observability::metrics::{ActivityMetrics, Outcome};

/// Activity kinds that feed a dedicated metric when they succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecializedActivity {
    /// Observed into `sandbox_provision_duration_seconds`.
    ProvisionSandbox,
    /// Increments `prs_created_total`.
    CreatePullRequest,
}

impl SpecializedActivity {
    pub const PROVISION_SANDBOX: &'static str = "ProvisionSandbox";
    pub const CREATE_PULL_REQUEST: &'static str = "CreatePullRequest";

    pub fn from_kind(kind: &str) -> Option<Self> {
        match kind {
            Self::PROVISION_SANDBOX => Some(SpecializedActivity::ProvisionSandbox),
            Self::CREATE_PULL_REQUEST => Some(SpecializedActivity::CreatePullRequest),
            _ => None,
        }
    }

    fn record(self, metrics: &ActivityMetrics, elapsed: Duration) {
        match self {
            SpecializedActivity::ProvisionSandbox => metrics.record_sandbox_provisioned(elapsed),
            SpecializedActivity::CreatePullRequest => metrics.record_pr_created(),
        }
    }
}

/// Measurement state for a single invocation.
struct Invocation<'a> {
    kind: &'a str,
    started: Instant,
}

impl<'a> Invocation<'a> {
    fn start(info: &'a ActivityInfo) -> Self {
        Self {
            kind: &info.activity_type,
            started: Instant::now(),
        }
    }

    fn finish(self, result: &ActivityResult, metrics: &ActivityMetrics) {
        let elapsed = self.started.elapsed();
        let outcome = Outcome::of(result);

        metrics.record_activity(self.kind, outcome, elapsed);
        if outcome == Outcome::Success {
            if let Some(special) = SpecializedActivity::from_kind(self.kind) {
                special.record(metrics, elapsed);
            }
        }

        tracing::debug!(
            activity_name = %self.kind,
            result = outcome.as_str(),
            elapsed_ms = whole_millis(elapsed),
            "Activity finished"
        );
    }
}

/// Elapsed milliseconds, saturating at `u64::MAX`.
fn whole_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Interceptor that wraps every activity in an [`InstrumentedActivity`].
#[derive(Clone, Debug)]
pub struct MetricsInterceptor {
    metrics: Arc<ActivityMetrics>,
}

impl MetricsInterceptor {
    pub fn new(metrics: Arc<ActivityMetrics>) -> Self {
        Self { metrics }
    }

    pub fn metrics(&self) -> &ActivityMetrics {
        &self.metrics
    }
}

impl ActivityInterceptor for MetricsInterceptor {
    fn intercept(&self, next: Arc<dyn ActivityExecutor>) -> Arc<dyn ActivityExecutor> {
        Arc::new(InstrumentedActivity::new(next, Arc::clone(&self.metrics)))
    }
}

/// An executor that records metrics around `next`.
pub struct InstrumentedActivity<N> {
    next: N,
    metrics: Arc<ActivityMetrics>,
}

impl<N: ActivityExecutor> InstrumentedActivity<N> {
    pub fn new(next: N, metrics: Arc<ActivityMetrics>) -> Self {
        Self { next, metrics }
    }
}

#[async_trait]
impl<N: ActivityExecutor> ActivityExecutor for InstrumentedActivity<N> {
    async fn execute(&self, info: &ActivityInfo, input: Payload) -> ActivityResult {
        let invocation = Invocation::start(info);
        let result = self.next.execute(info, input).await;
        invocation.finish(&result, &self.metrics);
        result
    }
}
