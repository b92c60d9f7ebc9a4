//! Bridge from `tracing` events to the log sink.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use super::{LogRecord, LogSink, Severity};

/// A `tracing_subscriber` layer that writes every event to a [`LogSink`].
///
/// The event's `message` field becomes the record message; all other fields
/// become attributes in declaration order, followed by `target`.
pub struct SinkLayer {
    sink: Arc<dyn LogSink>,
}

impl SinkLayer {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }
}

fn severity_of(level: &Level) -> Severity {
    if *level == Level::ERROR {
        Severity::Error
    } else if *level == Level::WARN {
        Severity::Warn
    } else if *level == Level::INFO {
        Severity::Info
    } else {
        Severity::Debug
    }
}

struct RecordVisitor<'a> {
    record: &'a mut LogRecord,
}

impl RecordVisitor<'_> {
    fn push(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.record.message = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
        } else {
            self.record.attributes.push((field.name().to_string(), value));
        }
    }
}

impl Visit for RecordVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push(field, Value::from(format!("{value:?}")));
    }
}

impl<S: Subscriber> Layer<S> for SinkLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let severity = severity_of(meta.level());
        if !self.sink.enabled(severity) {
            return;
        }

        let mut record = LogRecord::new(severity, String::new());
        event.record(&mut RecordVisitor {
            record: &mut record,
        });
        record
            .attributes
            .push(("target".to_string(), Value::from(meta.target())));
        self.sink.write(&record);
    }
}
