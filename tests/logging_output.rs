//! JSON line output of the engine logging adapter.

use std::sync::Arc;

use activity_telemetry::observability::logging::{
    EngineLogger, JsonSink, Severity, StructuredLogAdapter, BAD_KEY,
};
use serde_json::json;

mod common;

fn adapter(min: Severity) -> (StructuredLogAdapter, common::SharedBuffer) {
    let buffer = common::SharedBuffer::default();
    let sink = Arc::new(JsonSink::new(buffer.clone(), min));
    (StructuredLogAdapter::new(sink), buffer)
}

#[test]
fn attributes_are_top_level_fields() {
    let (logger, buffer) = adapter(Severity::Debug);
    logger.warn(
        "Heartbeat timed out",
        &[json!("ActivityID"), json!("a-1"), json!("Attempt"), json!(3)],
    );

    let lines = buffer.json_lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["msg"], "Heartbeat timed out");
    assert_eq!(lines[0]["level"], "WARN");
    assert_eq!(lines[0]["ActivityID"], "a-1");
    assert_eq!(lines[0]["Attempt"], 3);
}

#[test]
fn odd_argument_list_still_emits_record() {
    let (logger, buffer) = adapter(Severity::Debug);
    logger.error("Activity failed", &[json!("Error"), json!("boom"), json!("dangling")]);
    logger.debug("only a value", &[json!(12.5)]);

    let lines = buffer.json_lines();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["level"], "ERROR");
    assert_eq!(lines[0]["Error"], "boom");
    assert_eq!(lines[0][BAD_KEY], "dangling");
    assert_eq!(lines[1]["level"], "DEBUG");
    assert_eq!(lines[1][BAD_KEY], 12.5);
}

#[test]
fn non_string_keys_are_coerced() {
    let (logger, buffer) = adapter(Severity::Debug);
    logger.info("numbers as keys", &[json!(1), json!("one"), json!({"k": 1}), json!(2)]);

    let lines = buffer.json_lines();
    assert_eq!(lines[0]["1"], "one");
    assert_eq!(lines[0][r#"{"k":1}"#], 2);
}

#[test]
fn minimum_level_is_the_sinks_decision() {
    let (logger, buffer) = adapter(Severity::Warn);
    logger.debug("hidden", &[]);
    logger.info("hidden", &[]);
    logger.warn("shown", &[]);
    logger.error("shown", &[]);

    let levels: Vec<String> = buffer
        .json_lines()
        .iter()
        .map(|l| l["level"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(levels, vec!["WARN", "ERROR"]);
}

#[test]
fn concurrent_writers_never_interleave_lines() {
    let (logger, buffer) = adapter(Severity::Info);
    let logger = Arc::new(logger);

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let logger = logger.clone();
            std::thread::spawn(move || {
                for i in 0..50 {
                    logger.info("tick", &[json!("worker"), json!(worker), json!("i"), json!(i)]);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(buffer.json_lines().len(), 400);
}
