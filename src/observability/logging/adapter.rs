//! Adapter from the workflow engine's key/value logger interface.
//!
//! The engine calls `info("msg", &[k1, v1, k2, v2, ...])` with untyped,
//! alternating arguments. The adapter turns that list into record attributes
//! and forwards the record synchronously to the sink.

use std::sync::Arc;

use serde_json::Value;

use super::{LogRecord, LogSink, Severity};

/// Key used for a trailing value that has no partner.
pub const BAD_KEY: &str = "!BADKEY";

/// The logging interface the workflow engine expects to be handed.
pub trait EngineLogger: Send + Sync {
    fn debug(&self, msg: &str, keyvals: &[Value]);
    fn info(&self, msg: &str, keyvals: &[Value]);
    fn warn(&self, msg: &str, keyvals: &[Value]);
    fn error(&self, msg: &str, keyvals: &[Value]);
}

/// Pair up an alternating key/value list.
///
/// String keys are used verbatim, any other key is coerced to its JSON
/// rendering. An odd trailing value is kept under [`BAD_KEY`].
pub fn decode_keyvals(keyvals: &[Value]) -> Vec<(String, Value)> {
    let mut pairs = keyvals.chunks_exact(2);
    let mut attributes: Vec<(String, Value)> = pairs
        .by_ref()
        .map(|pair| (key_name(&pair[0]), pair[1].clone()))
        .collect();

    if let [unpaired] = pairs.remainder() {
        attributes.push((BAD_KEY.to_string(), unpaired.clone()));
    }
    attributes
}

fn key_name(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// [`EngineLogger`] backed by a structured [`LogSink`].
#[derive(Clone)]
pub struct StructuredLogAdapter {
    sink: Arc<dyn LogSink>,
    context: Vec<(String, Value)>,
}

impl StructuredLogAdapter {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            context: Vec::new(),
        }
    }

    /// A child adapter whose records start with the given attributes.
    pub fn with(&self, keyvals: &[Value]) -> Self {
        let mut context = self.context.clone();
        context.extend(decode_keyvals(keyvals));
        Self {
            sink: Arc::clone(&self.sink),
            context,
        }
    }

    fn log(&self, severity: Severity, msg: &str, keyvals: &[Value]) {
        let mut record = LogRecord::new(severity, msg);
        record.attributes.extend(self.context.iter().cloned());
        record.attributes.extend(decode_keyvals(keyvals));
        self.sink.write(&record);
    }
}

impl EngineLogger for StructuredLogAdapter {
    fn debug(&self, msg: &str, keyvals: &[Value]) {
        self.log(Severity::Debug, msg, keyvals);
    }

    fn info(&self, msg: &str, keyvals: &[Value]) {
        self.log(Severity::Info, msg, keyvals);
    }

    fn warn(&self, msg: &str, keyvals: &[Value]) {
        self.log(Severity::Warn, msg, keyvals);
    }

    fn error(&self, msg: &str, keyvals: &[Value]) {
        self.log(Severity::Error, msg, keyvals);
    }
}

impl std::fmt::Debug for StructuredLogAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructuredLogAdapter")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
