//! Structured JSONL logging for simulation runs.
//!
//! Provides:
//! - [`LogEntry`]: one JSONL record with required + optional run fields.
//! - [`LogEmitter`]: writes JSONL lines to a file or any writer.
//! - [`validate_log_line`]: checks one line against the schema.
//! - [`validate_log_file`]: checks an entire JSONL file.

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use lesdc_sim::{RunPhase, StepSnapshot};

// ---------------------------------------------------------------------------
// Log entry
// ---------------------------------------------------------------------------

/// Severity level for log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Per-request outcome under the optimized policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Fresh,
    Redundant,
}

/// Canonical structured log entry.
///
/// Required fields: `timestamp`, `trace_id`, `level`, `event`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    // Required
    pub timestamp: String,
    pub trace_id: String,
    pub level: LogLevel,
    pub event: String,

    // Optional
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<RunPhase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basic_total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimized_total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entropy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_size: Option<usize>,
    /// Index of a single request (per-request trace events).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl LogEntry {
    /// Create a new log entry with required fields only.
    #[must_use]
    pub fn new(trace_id: impl Into<String>, level: LogLevel, event: impl Into<String>) -> Self {
        Self {
            timestamp: now_utc(),
            trace_id: trace_id.into(),
            level,
            event: event.into(),
            run_id: None,
            mode: None,
            phase: None,
            cursor: None,
            total: None,
            basic_total: None,
            optimized_total: None,
            entropy: None,
            memory_size: None,
            request_index: None,
            outcome: None,
            duration_ms: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    /// Set the compression mode (`faithful` or `per-text`).
    #[must_use]
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    /// Copy the observable fields of a step snapshot.
    #[must_use]
    pub fn with_snapshot(mut self, snap: &StepSnapshot) -> Self {
        self.phase = Some(snap.phase);
        self.cursor = Some(snap.cursor);
        self.total = Some(snap.total);
        self.basic_total = Some(snap.basic_total);
        self.optimized_total = Some(snap.optimized_total);
        self.entropy = Some(snap.entropy);
        self.memory_size = Some(snap.memory_size);
        self
    }

    #[must_use]
    pub fn with_phase(mut self, phase: RunPhase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Per-request trace fields.
    #[must_use]
    pub fn with_request(mut self, index: usize, outcome: Outcome) -> Self {
        self.request_index = Some(index);
        self.outcome = Some(outcome);
        self
    }

    #[must_use]
    pub fn with_duration_ms(mut self, ms: u64) -> Self {
        self.duration_ms = Some(ms);
        self
    }

    /// Set free-form details.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Serialize to a single JSONL line (no trailing newline).
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// JSONL writer with sequential trace ids (`<run_id>::<seq>`).
pub struct LogEmitter {
    writer: Box<dyn Write>,
    seq: u64,
    run_id: String,
}

impl LogEmitter {
    /// Create an emitter that writes to a file.
    pub fn to_file(path: &Path, run_id: &str) -> std::io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        Ok(Self::to_writer(
            Box::new(std::io::BufWriter::new(file)),
            run_id,
        ))
    }

    /// Create an emitter over any writer (tests pass a `Vec<u8>` sink).
    #[must_use]
    pub fn to_writer(writer: Box<dyn Write>, run_id: &str) -> Self {
        Self {
            writer,
            seq: 0,
            run_id: run_id.to_string(),
        }
    }

    fn next_trace_id(&mut self) -> String {
        self.seq += 1;
        format!("{}::{:04}", self.run_id, self.seq)
    }

    /// Emit a bare event with auto-generated trace id.
    pub fn emit(&mut self, level: LogLevel, event: &str) -> std::io::Result<LogEntry> {
        let trace_id = self.next_trace_id();
        let entry = LogEntry::new(trace_id, level, event).with_run_id(&self.run_id);
        self.write_entry(&entry)?;
        Ok(entry)
    }

    /// Emit a fully-populated entry. Missing trace/run ids are filled in.
    pub fn emit_entry(&mut self, mut entry: LogEntry) -> std::io::Result<()> {
        if entry.trace_id.is_empty() {
            entry.trace_id = self.next_trace_id();
        }
        if entry.run_id.is_none() {
            entry.run_id = Some(self.run_id.clone());
        }
        self.write_entry(&entry)
    }

    fn write_entry(&mut self, entry: &LogEntry) -> std::io::Result<()> {
        let line = serde_json::to_string(entry).map_err(std::io::Error::other)?;
        writeln!(self.writer, "{line}")
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validation error for a log line.
#[derive(Debug)]
pub struct LogValidationError {
    pub line_number: usize,
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for LogValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {}: field '{}': {}",
            self.line_number, self.field, self.message
        )
    }
}

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const PHASES: [&str; 3] = ["idle", "running", "complete"];
const OUTCOMES: [&str; 2] = ["fresh", "redundant"];
const MODES: [&str; 2] = ["faithful", "per-text"];

/// Validate a single JSONL line against the schema.
pub fn validate_log_line(
    line: &str,
    line_number: usize,
) -> Result<LogEntry, Vec<LogValidationError>> {
    let mut errors = Vec::new();
    let mut push = |field: &str, message: String| {
        errors.push(LogValidationError {
            line_number,
            field: field.to_string(),
            message,
        });
    };

    let value: serde_json::Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            push("<json>", format!("invalid JSON: {e}"));
            return Err(errors);
        }
    };

    let Some(obj) = value.as_object() else {
        push("<root>", "expected JSON object".to_string());
        return Err(errors);
    };

    for field in ["timestamp", "trace_id", "level", "event"] {
        if !obj.contains_key(field) {
            push(field, "required field missing".to_string());
        }
    }

    let enum_fields: [(&str, &[&str]); 4] = [
        ("level", &LEVELS),
        ("phase", &PHASES),
        ("outcome", &OUTCOMES),
        ("mode", &MODES),
    ];
    for (field, allowed) in enum_fields {
        if let Some(raw) = obj.get(field).and_then(|v| v.as_str())
            && !allowed.contains(&raw)
        {
            push(field, format!("invalid {field}: '{raw}'"));
        }
    }

    // Per-request events carry both the index and the outcome.
    if obj.contains_key("request_index") != obj.contains_key("outcome") {
        push(
            "request_index",
            "request_index and outcome must appear together".to_string(),
        );
    }

    if let (Some(cursor), Some(total)) = (
        obj.get("cursor").and_then(serde_json::Value::as_u64),
        obj.get("total").and_then(serde_json::Value::as_u64),
    ) && cursor > total
    {
        push("cursor", format!("cursor {cursor} exceeds total {total}"));
    }

    if let Some(entropy) = obj.get("entropy").and_then(serde_json::Value::as_f64)
        && !(entropy > 0.0 && entropy <= 1.0)
    {
        push("entropy", format!("entropy {entropy} outside (0, 1]"));
    }

    if let Some(trace_id) = obj.get("trace_id").and_then(|v| v.as_str())
        && !trace_id.contains("::")
    {
        push(
            "trace_id",
            format!("trace_id should follow <run_id>::<seq> format, got: '{trace_id}'"),
        );
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    serde_json::from_value::<LogEntry>(value).map_err(|e| {
        vec![LogValidationError {
            line_number,
            field: "<deserialization>".to_string(),
            message: format!("failed to deserialize: {e}"),
        }]
    })
}

/// Validate an entire JSONL file.
///
/// Returns the non-empty line count and any validation errors found.
pub fn validate_log_file(path: &Path) -> Result<(usize, Vec<LogValidationError>), std::io::Error> {
    let content = std::fs::read_to_string(path)?;
    let mut all_errors = Vec::new();
    let mut line_count = 0;

    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        line_count += 1;
        if let Err(errs) = validate_log_line(line, i + 1) {
            all_errors.extend(errs);
        }
    }

    Ok((line_count, all_errors))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn now_utc() -> String {
    let duration = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();
    // Approximate calendar fields; ordering and uniqueness are what matter here.
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        1970 + secs / 31_557_600,
        (secs % 31_557_600) / 2_629_800 + 1,
        (secs % 2_629_800) / 86400 + 1,
        (secs % 86400) / 3600,
        (secs % 3600) / 60,
        secs % 60,
        millis,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// `Write` sink whose contents stay readable after the emitter takes it.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn lines(&self) -> Vec<String> {
            String::from_utf8(self.0.lock().unwrap().clone())
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    #[test]
    fn log_entry_serializes_required_fields() {
        let entry = LogEntry::new("run-1::0001", LogLevel::Info, "run_start");
        let json = entry.to_jsonl().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed["timestamp"].is_string());
        assert_eq!(parsed["trace_id"], "run-1::0001");
        assert_eq!(parsed["level"], "info");
        assert_eq!(parsed["event"], "run_start");
        assert!(parsed.get("phase").is_none());
        assert!(parsed.get("cursor").is_none());
        assert!(parsed.get("outcome").is_none());
    }

    #[test]
    fn emitter_numbers_trace_ids() {
        let buf = SharedBuf::default();
        let mut emitter = LogEmitter::to_writer(Box::new(buf.clone()), "run-7");
        emitter.emit(LogLevel::Info, "run_start").unwrap();
        emitter
            .emit_entry(
                LogEntry::new("", LogLevel::Debug, "request")
                    .with_request(3, Outcome::Redundant),
            )
            .unwrap();
        emitter.flush().unwrap();

        let lines = buf.lines();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        let second: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(first["trace_id"], "run-7::0001");
        assert_eq!(second["trace_id"], "run-7::0002");
        assert_eq!(second["run_id"], "run-7");
        assert_eq!(second["outcome"], "redundant");
        for (i, line) in lines.iter().enumerate() {
            assert!(validate_log_line(line, i + 1).is_ok(), "line {line}");
        }
    }

    #[test]
    fn validate_missing_required_fields() {
        let errs = validate_log_line(r#"{"level":"info"}"#, 4).unwrap_err();
        let fields: Vec<&str> = errs.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"timestamp"));
        assert!(fields.contains(&"trace_id"));
        assert!(fields.contains(&"event"));
        assert!(errs.iter().all(|e| e.line_number == 4));
    }

    #[test]
    fn validate_rejects_bad_enums() {
        let line = r#"{"timestamp":"t","trace_id":"r::1","level":"loud","event":"x","phase":"paused","mode":"turbo"}"#;
        let errs = validate_log_line(line, 1).unwrap_err();
        let fields: Vec<&str> = errs.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["level", "phase", "mode"]);
    }

    #[test]
    fn validate_rejects_out_of_range_run_fields() {
        let line = r#"{"timestamp":"t","trace_id":"r::1","level":"info","event":"step","cursor":11,"total":10,"entropy":1.5}"#;
        let errs = validate_log_line(line, 1).unwrap_err();
        let fields: Vec<&str> = errs.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["cursor", "entropy"]);
    }

    #[test]
    fn validate_requires_paired_request_fields() {
        let line = r#"{"timestamp":"t","trace_id":"r::1","level":"debug","event":"request","request_index":2}"#;
        assert!(validate_log_line(line, 1).is_err());
    }

    #[test]
    fn validate_rejects_bad_trace_id_and_json() {
        let line = r#"{"timestamp":"t","trace_id":"nope","level":"info","event":"x"}"#;
        assert_eq!(validate_log_line(line, 1).unwrap_err()[0].field, "trace_id");
        assert_eq!(validate_log_line("not json", 1).unwrap_err()[0].field, "<json>");
        assert_eq!(validate_log_line("[1,2]", 1).unwrap_err()[0].field, "<root>");
    }

    #[test]
    fn timestamp_shape() {
        let ts = now_utc();
        assert_eq!(ts.len(), 24);
        assert!(ts.ends_with('Z'));
        assert_eq!(&ts[10..11], "T");
    }
}
