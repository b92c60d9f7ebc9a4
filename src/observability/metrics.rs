//! Activity metric definitions.
//!
//! # Metrics
//! - `activity_duration_seconds` (histogram): wall-clock duration by `activity_name`, `result`
//! - `activity_total` (counter): completed activities by `activity_name`, `result`
//! - `prs_created_total` (counter): pull requests successfully created
//! - `sandbox_provision_duration_seconds` (histogram): successful sandbox provisioning time
//!
//! # Design Decisions
//! - Shapes are built by [`ActivityMetrics::new`] without touching a registry,
//!   then registered explicitly, so tests can use isolated registries
//! - Labels are limited to the activity name and the two-valued result;
//!   error text never becomes a label value
//! - Buckets are tuned for activities that run from seconds to minutes

use std::time::Duration;

use prometheus::core::Collector;
use prometheus::proto::{Metric, MetricFamily};
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

use crate::observability::registry::{MetricRegistry, MetricsResult};

pub const ACTIVITY_DURATION: &str = "activity_duration_seconds";
pub const ACTIVITY_TOTAL: &str = "activity_total";
pub const PRS_CREATED: &str = "prs_created_total";
pub const SANDBOX_PROVISION_DURATION: &str = "sandbox_provision_duration_seconds";

pub const LABEL_ACTIVITY: &str = "activity_name";
pub const LABEL_RESULT: &str = "result";

/// Buckets for generic activity duration, 1s through 10m.
pub const ACTIVITY_DURATION_BUCKETS: &[f64] = &[1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0];

/// Buckets for sandbox provisioning, 1s through 5m.
pub const PROVISION_DURATION_BUCKETS: &[f64] = &[1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0];

/// How an activity invocation completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    /// Classify a completed invocation by whether it returned an error.
    pub fn of<T, E>(result: &Result<T, E>) -> Self {
        if result.is_ok() {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }

    /// Label value for the `result` dimension.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
        }
    }
}

/// The worker's activity metrics.
///
/// All handles use interior atomics; the struct is `Clone` and every clone
/// records into the same series.
#[derive(Clone)]
pub struct ActivityMetrics {
    activity_duration: HistogramVec,
    activity_total: IntCounterVec,
    prs_created: IntCounter,
    sandbox_provision_duration: Histogram,
}

impl ActivityMetrics {
    /// Build the metric shapes. Nothing is registered yet.
    pub fn new() -> MetricsResult<Self> {
        let activity_duration = HistogramVec::new(
            HistogramOpts::new(ACTIVITY_DURATION, "Duration of activity executions in seconds")
                .buckets(ACTIVITY_DURATION_BUCKETS.to_vec()),
            &[LABEL_ACTIVITY, LABEL_RESULT],
        )?;

        let activity_total = IntCounterVec::new(
            Opts::new(ACTIVITY_TOTAL, "Total number of activity executions"),
            &[LABEL_ACTIVITY, LABEL_RESULT],
        )?;

        let prs_created = IntCounter::new(PRS_CREATED, "Total number of pull requests created")?;

        let sandbox_provision_duration = Histogram::with_opts(
            HistogramOpts::new(
                SANDBOX_PROVISION_DURATION,
                "Duration of successful sandbox provisioning in seconds",
            )
            .buckets(PROVISION_DURATION_BUCKETS.to_vec()),
        )?;

        Ok(Self {
            activity_duration,
            activity_total,
            prs_created,
            sandbox_provision_duration,
        })
    }

    /// Register all four metrics into `registry`.
    ///
    /// Stops at the first failure; a duplicate here is a startup-fatal error.
    pub fn register(&self, registry: &MetricRegistry) -> MetricsResult<()> {
        registry.register(&self.activity_duration)?;
        registry.register(&self.activity_total)?;
        registry.register(&self.prs_created)?;
        registry.register(&self.sandbox_provision_duration)?;
        Ok(())
    }

    /// Build the shapes and register them in one step.
    pub fn registered(registry: &MetricRegistry) -> MetricsResult<Self> {
        let metrics = Self::new()?;
        metrics.register(registry)?;
        Ok(metrics)
    }

    /// Record one completed activity in the generic duration and total series.
    pub fn record_activity(&self, activity_name: &str, outcome: Outcome, elapsed: Duration) {
        let labels = [activity_name, outcome.as_str()];
        self.activity_duration
            .with_label_values(&labels)
            .observe(elapsed.as_secs_f64());
        self.activity_total.with_label_values(&labels).inc();
    }

    pub fn record_pr_created(&self) {
        self.prs_created.inc();
    }

    pub fn record_sandbox_provisioned(&self, elapsed: Duration) {
        self.sandbox_provision_duration.observe(elapsed.as_secs_f64());
    }

    /// Current `activity_total` value for one label pair, without creating the series.
    pub fn activity_count(&self, activity_name: &str, outcome: Outcome) -> u64 {
        find_series(&self.activity_total.collect(), activity_name, outcome)
            .map(|m| m.get_counter().get_value() as u64)
            .unwrap_or(0)
    }

    /// Number of observations in `activity_duration_seconds` for one label pair.
    pub fn activity_duration_samples(&self, activity_name: &str, outcome: Outcome) -> u64 {
        find_series(&self.activity_duration.collect(), activity_name, outcome)
            .map(|m| m.get_histogram().get_sample_count())
            .unwrap_or(0)
    }

    /// Sum of observed seconds in `activity_duration_seconds` for one label pair.
    pub fn activity_duration_sum(&self, activity_name: &str, outcome: Outcome) -> f64 {
        find_series(&self.activity_duration.collect(), activity_name, outcome)
            .map(|m| m.get_histogram().get_sample_sum())
            .unwrap_or(0.0)
    }

    pub fn prs_created(&self) -> u64 {
        self.prs_created.get()
    }

    pub fn sandbox_provision_samples(&self) -> u64 {
        self.sandbox_provision_duration.get_sample_count()
    }
}

fn find_series(families: &[MetricFamily], activity_name: &str, outcome: Outcome) -> Option<Metric> {
    families
        .iter()
        .flat_map(|family| family.get_metric())
        .find(|metric| {
            let mut activity = None;
            let mut result = None;
            for pair in metric.get_label() {
                match pair.get_name() {
                    LABEL_ACTIVITY => activity = Some(pair.get_value()),
                    LABEL_RESULT => result = Some(pair.get_value()),
                    _ => {}
                }
            }
            activity == Some(activity_name) && result == Some(outcome.as_str())
        })
        .cloned()
}

impl std::fmt::Debug for ActivityMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityMetrics")
            .field("prs_created", &self.prs_created())
            .field("sandbox_provision_samples", &self.sandbox_provision_samples())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::registry::MetricsError;

    #[test]
    fn registers_the_full_metric_set() {
        let registry = MetricRegistry::new();
        ActivityMetrics::registered(&registry).unwrap();

        assert_eq!(
            registry.metric_names(),
            vec![
                ACTIVITY_DURATION.to_string(),
                ACTIVITY_TOTAL.to_string(),
                PRS_CREATED.to_string(),
                SANDBOX_PROVISION_DURATION.to_string(),
            ]
        );
    }

    #[test]
    fn second_registration_into_same_registry_fails() {
        let registry = MetricRegistry::new();
        let metrics = ActivityMetrics::registered(&registry).unwrap();

        let err = metrics.register(&registry).unwrap_err();
        assert!(matches!(err, MetricsError::DuplicateMetric { ref name } if name == ACTIVITY_DURATION));
    }

    #[test]
    fn unlabeled_metrics_are_exposed_before_first_observation() {
        let registry = MetricRegistry::new();
        ActivityMetrics::registered(&registry).unwrap();

        let text = registry.encode_text().unwrap();
        assert!(text.contains("prs_created_total 0"), "{text}");
        assert!(text.contains("sandbox_provision_duration_seconds_count 0"), "{text}");
        assert!(text.contains("sandbox_provision_duration_seconds_bucket{le=\"300\"} 0"), "{text}");
    }

    #[test]
    fn record_activity_touches_only_its_label_pair() {
        let metrics = ActivityMetrics::new().unwrap();
        metrics.record_activity("Build", Outcome::Failure, Duration::from_millis(1500));

        assert_eq!(metrics.activity_count("Build", Outcome::Failure), 1);
        assert_eq!(metrics.activity_count("Build", Outcome::Success), 0);
        assert_eq!(metrics.activity_duration_samples("Build", Outcome::Failure), 1);
        assert!((metrics.activity_duration_sum("Build", Outcome::Failure) - 1.5).abs() < 1e-9);

        let families = metrics.activity_total.collect();
        assert_eq!(families[0].get_metric().len(), 1);
    }

    #[test]
    fn outcome_follows_result() {
        assert_eq!(Outcome::of::<_, ()>(&Ok(1)), Outcome::Success);
        assert_eq!(Outcome::of::<(), _>(&Err("boom")), Outcome::Failure);
        assert_eq!(Outcome::Failure.as_str(), "failure");
    }
}
