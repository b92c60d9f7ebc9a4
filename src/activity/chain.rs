//! Activity dispatch through an interceptor chain.
//!
//! Stands in for the worker side of the workflow engine: activities are
//! registered by kind, interceptors are applied outermost-first, and every
//! dispatch runs through the full chain.

use std::collections::HashMap;
use std::sync::Arc;

use super::{ActivityError, ActivityExecutor, ActivityInfo, ActivityInterceptor, ActivityResult, Payload};

/// Registered activities plus the interceptors wrapped around each call.
#[derive(Default)]
pub struct ActivityChain {
    activities: HashMap<String, Arc<dyn ActivityExecutor>>,
    interceptors: Vec<Arc<dyn ActivityInterceptor>>,
}

impl ActivityChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an activity body under `kind`, replacing any previous one.
    pub fn register_activity<A>(&mut self, kind: impl Into<String>, activity: A) -> &mut Self
    where
        A: ActivityExecutor + 'static,
    {
        let kind = kind.into();
        if self.activities.insert(kind.clone(), Arc::new(activity)).is_some() {
            tracing::warn!(activity_name = %kind, "Activity re-registered, previous body replaced");
        }
        self
    }

    /// Append an interceptor. The first one added is the outermost.
    pub fn add_interceptor<I>(&mut self, interceptor: I) -> &mut Self
    where
        I: ActivityInterceptor + 'static,
    {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn activity_kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.activities.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Run the activity named by `info.activity_type` through every interceptor.
    ///
    /// An unregistered kind fails before any interceptor runs.
    pub async fn dispatch(&self, info: &ActivityInfo, input: Payload) -> ActivityResult {
        let Some(activity) = self.activities.get(&info.activity_type) else {
            tracing::warn!(activity_name = %info.activity_type, "No activity registered for kind");
            return Err(ActivityError::application(format!(
                "activity type {:?} is not registered",
                info.activity_type
            ))
            .non_retryable());
        };

        let chain = self
            .interceptors
            .iter()
            .rev()
            .fold(Arc::clone(activity), |next, interceptor| interceptor.intercept(next));

        chain.execute(info, input).await
    }
}

impl std::fmt::Debug for ActivityChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityChain")
            .field("activities", &self.activity_kinds())
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}
