//! Soak-testing harness for the spindle thread primitives.
//!
//! This crate provides:
//! - Soak execution: hammer `Thread` and `TlsSlot` with repeatable
//!   lifecycle, exit-code, handshake, TLS-isolation, and naming workloads
//! - Structured logging: one JSONL event per case, schema-validated
//! - Profiles: quick / standard / extended workload depths
//! - Report generation: human-readable markdown + machine-readable JSON

pub mod config;
pub mod report;
pub mod runner;
pub mod structured_log;

pub use config::{SoakParams, SoakProfile};
pub use report::SoakReport;
pub use runner::{CaseResult, SoakRunner};
pub use structured_log::{LogEmitter, LogEntry, LogLevel, Outcome};

use thiserror::Error;

/// Failures surfaced by harness workflows.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Reading or writing a log or report file failed.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// A report or log line did not parse as JSON.
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}
