//! Structured JSONL logging for soak runs.
//!
//! Every soak event becomes one JSON object per line:
//!
//! - [`LogEntry`]: the canonical record. Four required fields (`timestamp`,
//!   `trace_id`, `level`, `event`) plus optional soak context.
//! - [`LogEmitter`]: writes entries to a file or an in-memory buffer and
//!   assigns sequential trace ids of the form `campaign::run::NNN`.
//! - [`validate_log_line`] / [`validate_log_file`]: schema checks for logs
//!   produced by this crate (or by anything claiming compatibility).

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Log entry
// ---------------------------------------------------------------------------

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Verdict attached to a finished soak case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
}

/// Canonical structured log entry.
///
/// Optional fields are omitted from the serialized form when unset, so a
/// minimal entry stays a short line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    // Required fields.
    pub timestamp: String,
    pub trace_id: String,
    pub level: LogLevel,
    pub event: String,

    // Optional soak context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl LogEntry {
    /// Create an entry carrying only the required fields, stamped with the
    /// current UTC time.
    #[must_use]
    pub fn new(trace_id: impl Into<String>, level: LogLevel, event: impl Into<String>) -> Self {
        Self {
            timestamp: now_utc(),
            trace_id: trace_id.into(),
            level,
            event: event.into(),
            campaign: None,
            case: None,
            worker: None,
            cycle: None,
            exit_code: None,
            outcome: None,
            elapsed_ms: None,
            detail: None,
        }
    }

    #[must_use]
    pub fn with_campaign(mut self, campaign: impl Into<String>) -> Self {
        self.campaign = Some(campaign.into());
        self
    }

    #[must_use]
    pub fn with_case(mut self, case: impl Into<String>) -> Self {
        self.case = Some(case.into());
        self
    }

    #[must_use]
    pub fn with_worker(mut self, worker: u32) -> Self {
        self.worker = Some(worker);
        self
    }

    #[must_use]
    pub fn with_cycle(mut self, cycle: u64) -> Self {
        self.cycle = Some(cycle);
        self
    }

    #[must_use]
    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = Some(exit_code);
        self
    }

    #[must_use]
    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    #[must_use]
    pub fn with_elapsed_ms(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = Some(elapsed_ms);
        self
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Serialize as a single JSONL line (no trailing newline).
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Writes structured log entries as JSONL to a file or an in-memory buffer.
pub struct LogEmitter {
    writer: Box<dyn Write>,
    seq: u64,
    campaign: String,
    run_id: String,
}

impl LogEmitter {
    /// Create an emitter backed by a freshly created file.
    pub fn to_file(path: &Path, campaign: &str, run_id: &str) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self {
            writer: Box::new(std::io::BufWriter::new(file)),
            seq: 0,
            campaign: campaign.to_string(),
            run_id: run_id.to_string(),
        })
    }

    /// Create an emitter backed by a throwaway buffer, for tests and runs
    /// that did not ask for a log file.
    #[must_use]
    pub fn to_buffer(campaign: &str, run_id: &str) -> Self {
        Self {
            writer: Box::new(Vec::new()),
            seq: 0,
            campaign: campaign.to_string(),
            run_id: run_id.to_string(),
        }
    }

    fn next_trace_id(&mut self) -> String {
        self.seq += 1;
        format!("{}::{}::{:03}", self.campaign, self.run_id, self.seq)
    }

    /// Emit a minimal entry with an auto-generated trace id. Returns the
    /// entry as written.
    pub fn emit(&mut self, level: LogLevel, event: &str) -> std::io::Result<LogEntry> {
        let trace_id = self.next_trace_id();
        let entry = LogEntry::new(trace_id, level, event).with_campaign(&self.campaign);
        self.write_line(&entry)?;
        Ok(entry)
    }

    /// Emit a caller-built entry, filling in the trace id and campaign if
    /// the caller left them blank. Returns the entry as written.
    pub fn emit_entry(&mut self, mut entry: LogEntry) -> std::io::Result<LogEntry> {
        if entry.trace_id.is_empty() {
            entry.trace_id = self.next_trace_id();
        }
        if entry.campaign.is_none() {
            entry.campaign = Some(self.campaign.clone());
        }
        self.write_line(&entry)?;
        Ok(entry)
    }

    fn write_line(&mut self, entry: &LogEntry) -> std::io::Result<()> {
        let line = entry.to_jsonl().map_err(std::io::Error::other)?;
        writeln!(self.writer, "{line}")
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }

    /// Identifier of the run this emitter is logging for.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// One schema violation found in a log line.
#[derive(Debug, Clone, PartialEq, Eq)]
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

const VALID_LEVELS: [&str; 3] = ["info", "warn", "error"];
const VALID_OUTCOMES: [&str; 2] = ["pass", "fail"];

/// Validate one JSONL line against the log schema.
///
/// Returns the parsed entry on success, or every violation found on the
/// line otherwise.
pub fn validate_log_line(
    line: &str,
    line_number: usize,
) -> Result<LogEntry, Vec<LogValidationError>> {
    let mut errors = Vec::new();

    let value: serde_json::Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(err) => {
            errors.push(LogValidationError {
                line_number,
                field: "<json>".to_string(),
                message: format!("invalid JSON: {err}"),
            });
            return Err(errors);
        }
    };
    let Some(object) = value.as_object() else {
        errors.push(LogValidationError {
            line_number,
            field: "<root>".to_string(),
            message: "expected a JSON object".to_string(),
        });
        return Err(errors);
    };

    for field in ["timestamp", "trace_id", "level", "event"] {
        if !object.contains_key(field) {
            errors.push(LogValidationError {
                line_number,
                field: field.to_string(),
                message: "required field missing".to_string(),
            });
        }
    }

    if let Some(level) = object.get("level").and_then(|v| v.as_str())
        && !VALID_LEVELS.contains(&level)
    {
        errors.push(LogValidationError {
            line_number,
            field: "level".to_string(),
            message: format!("invalid level: '{level}'"),
        });
    }

    if let Some(outcome) = object.get("outcome").and_then(|v| v.as_str())
        && !VALID_OUTCOMES.contains(&outcome)
    {
        errors.push(LogValidationError {
            line_number,
            field: "outcome".to_string(),
            message: format!("invalid outcome: '{outcome}'"),
        });
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    match serde_json::from_str::<LogEntry>(line) {
        Ok(entry) => Ok(entry),
        Err(err) => {
            errors.push(LogValidationError {
                line_number,
                field: "<schema>".to_string(),
                message: err.to_string(),
            });
            Err(errors)
        }
    }
}

/// Validate a whole JSONL file. Blank lines are skipped.
///
/// Returns the number of lines that validated cleanly together with every
/// violation found in the rest.
pub fn validate_log_file(
    path: &Path,
) -> Result<(usize, Vec<LogValidationError>), std::io::Error> {
    let content = std::fs::read_to_string(path)?;
    let mut errors = Vec::new();
    let mut validated = 0usize;
    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match validate_log_line(line, index + 1) {
            Ok(_) => validated += 1,
            Err(mut line_errors) => errors.append(&mut line_errors),
        }
    }
    Ok((validated, errors))
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Current UTC time as `YYYY-MM-DDThh:mm:ss.mmmZ`, computed from the system
/// clock without pulling in a date-time crate.
pub(crate) fn now_utc() -> String {
    let duration = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();
    let (year, month, day) = civil_from_days((secs / 86_400) as i64);
    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}.{millis:03}Z",
        (secs % 86_400) / 3_600,
        (secs % 3_600) / 60,
        secs % 60,
    )
}

/// Gregorian date for a count of days since 1970-01-01 (civil-from-days).
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let shifted = days + 719_468;
    let era = shifted.div_euclid(146_097);
    let day_of_era = shifted.rem_euclid(146_097);
    let year_of_era =
        (day_of_era - day_of_era / 1_460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let mp = (5 * day_of_year + 2) / 153;
    let day = (day_of_year - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = year_of_era + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_entries_serialize_without_optional_noise() {
        let entry = LogEntry::new("t::r::001", LogLevel::Info, "soak.begin");
        let line = entry.to_jsonl().expect("entry serializes");
        let value: serde_json::Value = serde_json::from_str(&line).expect("valid JSON");

        assert_eq!(value["trace_id"], "t::r::001");
        assert_eq!(value["level"], "info");
        assert_eq!(value["event"], "soak.begin");
        assert!(
            value.get("detail").is_none(),
            "unset optional fields must be omitted: {line}"
        );
        assert!(value.get("outcome").is_none());
    }

    #[test]
    fn builders_attach_optional_fields() {
        let entry = LogEntry::new("t::r::002", LogLevel::Error, "soak.case")
            .with_case("exit_code_matrix")
            .with_worker(3)
            .with_cycle(17)
            .with_exit_code(-1)
            .with_outcome(Outcome::Fail)
            .with_elapsed_ms(250)
            .with_detail("exit code mismatch");
        let line = entry.to_jsonl().expect("entry serializes");
        let value: serde_json::Value = serde_json::from_str(&line).expect("valid JSON");

        assert_eq!(value["case"], "exit_code_matrix");
        assert_eq!(value["worker"], 3);
        assert_eq!(value["cycle"], 17);
        assert_eq!(value["exit_code"], -1);
        assert_eq!(value["outcome"], "fail");
        assert_eq!(value["elapsed_ms"], 250);
        assert_eq!(value["detail"], "exit code mismatch");
    }

    #[test]
    fn trace_ids_are_sequential_per_emitter() {
        let mut emitter = LogEmitter::to_buffer("unit", "run-7");
        let first = emitter.emit(LogLevel::Info, "a").expect("buffer write");
        let second = emitter.emit(LogLevel::Info, "b").expect("buffer write");
        let third = emitter.emit(LogLevel::Warn, "c").expect("buffer write");

        assert_eq!(first.trace_id, "unit::run-7::001");
        assert_eq!(second.trace_id, "unit::run-7::002");
        assert_eq!(third.trace_id, "unit::run-7::003");
        assert_eq!(third.campaign.as_deref(), Some("unit"));
    }

    #[test]
    fn emit_entry_fills_blank_trace_ids() {
        let mut emitter = LogEmitter::to_buffer("unit", "run-8");
        let entry = LogEntry::new("", LogLevel::Info, "soak.case").with_case("tls_isolation");
        let written = emitter.emit_entry(entry).expect("buffer write");

        assert_eq!(written.trace_id, "unit::run-8::001");
        assert_eq!(written.campaign.as_deref(), Some("unit"));
        assert_eq!(written.case.as_deref(), Some("tls_isolation"));
    }

    #[test]
    fn emitted_lines_validate_cleanly() {
        let mut emitter = LogEmitter::to_buffer("unit", "run-9");
        let entry = emitter
            .emit(LogLevel::Info, "soak.begin")
            .expect("buffer write");
        let line = entry.to_jsonl().expect("entry serializes");

        let validated = validate_log_line(&line, 1).expect("emitted line is schema-clean");
        assert_eq!(validated.event, "soak.begin");
    }

    #[test]
    fn validation_flags_missing_fields_and_bad_vocabulary() {
        let errors =
            validate_log_line(r#"{"timestamp":"x","level":"loud"}"#, 4).expect_err("invalid line");
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();

        assert!(fields.contains(&"trace_id"), "missing trace_id: {fields:?}");
        assert!(fields.contains(&"event"), "missing event: {fields:?}");
        assert!(fields.contains(&"level"), "bad level vocab: {fields:?}");
        for error in &errors {
            assert_eq!(error.line_number, 4);
        }
    }

    #[test]
    fn validation_rejects_non_json_lines() {
        let errors = validate_log_line("not json at all", 1).expect_err("invalid line");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "<json>");
    }

    #[test]
    fn log_files_validate_line_by_line() {
        let path = std::env::temp_dir().join(format!("spindle-log-{}.jsonl", std::process::id()));
        {
            let mut emitter =
                LogEmitter::to_file(&path, "unit", "run-10").expect("temp file creation");
            emitter.emit(LogLevel::Info, "soak.begin").expect("write");
            emitter.emit(LogLevel::Info, "soak.end").expect("write");
            emitter.flush().expect("flush");
        }

        let (validated, errors) = validate_log_file(&path).expect("file is readable");
        let _ = std::fs::remove_file(&path);

        assert_eq!(validated, 2);
        assert!(errors.is_empty(), "clean file reported errors: {errors:?}");
    }

    #[test]
    fn civil_from_days_matches_known_dates() {
        assert_eq!(civil_from_days(0), (1970, 1, 1));
        assert_eq!(civil_from_days(19_723), (2024, 1, 1));
        assert_eq!(civil_from_days(-1), (1969, 12, 31));
        // Leap day.
        assert_eq!(civil_from_days(19_782), (2024, 2, 29));
    }

    #[test]
    fn timestamps_are_iso8601_shaped() {
        let stamp = now_utc();
        assert_eq!(stamp.len(), 24, "unexpected shape: {stamp}");
        assert_eq!(&stamp[10..11], "T");
        assert!(stamp.ends_with('Z'));
    }
}
