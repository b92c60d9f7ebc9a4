//! Log sinks.

use std::io::{self, Write};
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};

use super::{LogRecord, Severity};

/// Destination for structured log records.
pub trait LogSink: Send + Sync {
    /// Whether records at `severity` would be written.
    fn enabled(&self, _severity: Severity) -> bool {
        true
    }

    /// Write one record. Must not fail the caller.
    fn write(&self, record: &LogRecord);
}

/// Writes each record as one JSON object per line.
///
/// Field order is `time`, `level`, `msg`, then the record's attributes in
/// call order.
pub struct JsonSink<W> {
    writer: Mutex<W>,
    min_level: Severity,
}

impl<W: Write + Send> JsonSink<W> {
    pub fn new(writer: W, min_level: Severity) -> Self {
        Self {
            writer: Mutex::new(writer),
            min_level,
        }
    }

    pub fn min_level(&self) -> Severity {
        self.min_level
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl JsonSink<io::Stderr> {
    /// The process sink: JSON lines on stderr.
    pub fn stderr(min_level: Severity) -> Self {
        Self::new(io::stderr(), min_level)
    }
}

impl<W: Write + Send> LogSink for JsonSink<W> {
    fn enabled(&self, severity: Severity) -> bool {
        severity >= self.min_level
    }

    fn write(&self, record: &LogRecord) {
        if !self.enabled(record.severity) {
            return;
        }

        let line = JsonLine {
            time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            record,
        };

        // Logging never fails the caller; an unencodable record is dropped.
        let Ok(mut buf) = serde_json::to_vec(&line) else {
            return;
        };
        buf.push(b'\n');

        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // One write per line, so a failed write cannot leave a fragment for
        // the next record to join.
        let _ = writer.write_all(&buf);
        let _ = writer.flush();
    }
}

struct JsonLine<'a> {
    time: String,
    record: &'a LogRecord,
}

impl Serialize for JsonLine<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3 + self.record.attributes.len()))?;
        map.serialize_entry("time", &self.time)?;
        map.serialize_entry("level", self.record.severity.as_str())?;
        map.serialize_entry("msg", &self.record.message)?;
        for (key, value) in &self.record.attributes {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn lines(sink: JsonSink<Vec<u8>>) -> Vec<Value> {
        String::from_utf8(sink.into_inner())
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn writes_one_json_object_per_record() {
        let sink = JsonSink::new(Vec::new(), Severity::Debug);
        let mut record = LogRecord::new(Severity::Warn, "disk almost full");
        record.attributes.push(("free_mb".into(), json!(12)));
        sink.write(&record);
        sink.write(&LogRecord::new(Severity::Debug, "second"));

        let out = lines(sink);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["level"], "WARN");
        assert_eq!(out[0]["msg"], "disk almost full");
        assert_eq!(out[0]["free_mb"], 12);
        assert!(out[0]["time"].as_str().unwrap().ends_with('Z'));
        assert_eq!(out[1]["level"], "DEBUG");
    }

    #[test]
    fn drops_records_below_min_level() {
        let sink = JsonSink::new(Vec::new(), Severity::Warn);
        assert!(!sink.enabled(Severity::Info));
        sink.write(&LogRecord::new(Severity::Info, "chatty"));
        sink.write(&LogRecord::new(Severity::Error, "loud"));

        let out = lines(sink);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["msg"], "loud");
    }

    /// Accepts whole buffers only, failing every `fail_every`-th write.
    struct FlakyWriter {
        out: Vec<u8>,
        calls: usize,
        fail_every: usize,
    }

    impl Write for FlakyWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.calls += 1;
            if self.calls % self.fail_every == 0 {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"));
            }
            self.out.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_write_does_not_corrupt_the_next_line() {
        let sink = JsonSink::new(
            FlakyWriter {
                out: Vec::new(),
                calls: 0,
                fail_every: 2,
            },
            Severity::Debug,
        );
        for i in 0..4 {
            let mut record = LogRecord::new(Severity::Info, format!("record {i}"));
            record.attributes.push(("i".into(), json!(i)));
            sink.write(&record);
        }

        let raw = String::from_utf8(sink.into_inner().out).unwrap();
        let parsed: Vec<Value> = raw
            .lines()
            .map(|line| serde_json::from_str(line).unwrap_or_else(|e| panic!("{e}: {line:?}")))
            .collect();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["msg"], "record 0");
        assert_eq!(parsed[1]["msg"], "record 2");
        assert!(raw.ends_with('\n'));
    }

    #[test]
    fn keeps_attribute_order() {
        let sink = JsonSink::new(Vec::new(), Severity::Info);
        let mut record = LogRecord::new(Severity::Info, "ordered");
        record.attributes.push(("zeta".into(), json!(1)));
        record.attributes.push(("alpha".into(), json!(2)));
        sink.write(&record);

        let raw = String::from_utf8(sink.into_inner()).unwrap();
        assert!(raw.find("\"zeta\"").unwrap() < raw.find("\"alpha\"").unwrap(), "{raw}");
    }
}
