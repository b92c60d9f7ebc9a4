//! Process-scoped metric registry.
//!
//! # Responsibilities
//! - Own the set of registered metric families
//! - Reject a second registration under an already-taken name
//! - Provide pull-based snapshots for the exposition endpoint
//!
//! # Design Decisions
//! - One explicit registry value per process, passed by reference; the
//!   prometheus default registry is never used
//! - The name index lock is held only for the duration of one registration
//! - Snapshots go through `prometheus::Registry::gather`, which copes with
//!   concurrent late registrations (a scrape may miss the newest family)

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use prometheus::core::Collector;
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, Registry, TextEncoder};
use thiserror::Error;

/// Errors raised while registering or exposing metrics.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// A metric with this name is already registered in this registry.
    #[error("duplicate metric: {name} is already registered")]
    DuplicateMetric { name: String },

    /// The underlying prometheus registry rejected the collector.
    #[error("metric registration failed: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// The snapshot could not be rendered as text.
    #[error("failed to encode metrics: {0}")]
    Encode(String),
}

/// Result type for metrics operations.
pub type MetricsResult<T> = Result<T, MetricsError>;

/// A registry of metric families, cheap to clone and share across tasks.
#[derive(Clone)]
pub struct MetricRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    registry: Registry,
    names: Mutex<BTreeSet<String>>,
}

impl MetricRegistry {
    /// Create an empty, isolated registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                registry: Registry::new(),
                names: Mutex::new(BTreeSet::new()),
            }),
        }
    }

    /// Register a collector.
    ///
    /// Fails with [`MetricsError::DuplicateMetric`] if any of the collector's
    /// metric names is already registered here. Registries are independent:
    /// the same definitions can be registered into any number of them.
    pub fn register<C>(&self, collector: &C) -> MetricsResult<()>
    where
        C: Collector + Clone + 'static,
    {
        let candidate: Vec<String> = collector
            .desc()
            .iter()
            .map(|desc| desc.fq_name.clone())
            .collect();

        let mut names = self
            .inner
            .names
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(taken) = candidate.iter().find(|name| names.contains(*name)) {
            return Err(MetricsError::DuplicateMetric {
                name: taken.clone(),
            });
        }

        self.inner.registry.register(Box::new(collector.clone()))?;
        names.extend(candidate);
        Ok(())
    }

    /// Names of every registered metric, sorted.
    pub fn metric_names(&self) -> Vec<String> {
        self.inner
            .names
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    /// Current value of every registered metric family.
    pub fn snapshot(&self) -> Vec<MetricFamily> {
        self.inner.registry.gather()
    }

    /// Render the current snapshot in the Prometheus text exposition format.
    pub fn encode_text(&self) -> MetricsResult<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.snapshot(), &mut buffer)
            .map_err(|e| MetricsError::Encode(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| MetricsError::Encode(e.to_string()))
    }

    /// Content type of [`encode_text`](Self::encode_text) output.
    pub fn content_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MetricRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricRegistry")
            .field("metrics", &self.metric_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::{IntCounter, IntCounterVec, Opts};

    #[test]
    fn duplicate_name_is_rejected() {
        let registry = MetricRegistry::new();
        let first = IntCounter::new("jobs_total", "jobs").unwrap();
        let second = IntCounterVec::new(Opts::new("jobs_total", "other"), &["kind"]).unwrap();

        registry.register(&first).unwrap();
        let err = registry.register(&second).unwrap_err();
        assert!(matches!(err, MetricsError::DuplicateMetric { ref name } if name == "jobs_total"));
        assert_eq!(registry.metric_names(), vec!["jobs_total".to_string()]);
    }

    #[test]
    fn independent_registries_do_not_interfere() {
        let counter = IntCounter::new("jobs_total", "jobs").unwrap();
        let a = MetricRegistry::new();
        let b = MetricRegistry::new();

        a.register(&counter).unwrap();
        b.register(&counter).unwrap();
        counter.inc();

        for registry in [&a, &b] {
            let families = registry.snapshot();
            assert_eq!(families.len(), 1);
            assert_eq!(families[0].get_metric()[0].get_counter().get_value(), 1.0);
        }
    }

    #[test]
    fn late_registrations_race_with_scrapes() {
        use std::sync::atomic::{AtomicBool, Ordering};

        const LATE: usize = 500;
        let registry = MetricRegistry::new();
        let done = AtomicBool::new(false);

        std::thread::scope(|scope| {
            let reader = scope.spawn(|| {
                let mut scrapes = 0usize;
                loop {
                    let finished = done.load(Ordering::Acquire);
                    assert!(registry.snapshot().len() <= LATE);
                    registry.encode_text().unwrap();
                    scrapes += 1;
                    if finished {
                        return scrapes;
                    }
                }
            });

            for i in 0..LATE {
                let counter = IntCounter::new(format!("late_{i}_total"), "late").unwrap();
                registry.register(&counter).unwrap();
            }
            done.store(true, Ordering::Release);
            assert!(reader.join().unwrap() > 0);
        });

        assert_eq!(registry.snapshot().len(), LATE);
        assert_eq!(registry.metric_names().len(), LATE);
    }

    #[test]
    fn unobserved_counter_is_exposed_as_zero() {
        let registry = MetricRegistry::new();
        registry
            .register(&IntCounter::new("idle_total", "never touched").unwrap())
            .unwrap();

        let text = registry.encode_text().unwrap();
        assert!(text.contains("idle_total 0"), "{text}");
        assert!(registry.content_type().starts_with("text/plain"));
    }
}
