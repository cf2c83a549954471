//! JSONL audit trail logging.
//!
//! Each controller run appends events to an audit.jsonl file,
//! one JSON object per line.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use fillsplit::{AllocationError, CycleInputs, FinalPosition};
use serde::Serialize;

use crate::error::Result;

/// An audit event written to the JSONL trail.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub event: &'static str,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

/// Append-only audit logger.
pub struct AuditLog {
    writer: BufWriter<std::fs::File>,
}

impl AuditLog {
    /// Open (or create) the audit log file for appending.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Log an event with arbitrary JSON data.
    pub fn log(&mut self, event: &'static str, data: serde_json::Value) -> Result<()> {
        let entry = AuditEvent {
            event,
            ts: Utc::now(),
            data,
        };
        let json = serde_json::to_string(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(self.writer, "{json}")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Log a simple event with no additional data.
    pub fn log_simple(&mut self, event: &'static str) -> Result<()> {
        self.log(event, serde_json::json!({}))
    }
}

/// Convenience: log a cycle start.
pub fn log_cycle_started(audit: &mut AuditLog, cycle: u64) -> Result<()> {
    audit.log("cycle_started", serde_json::json!({ "cycle": cycle }))
}

/// Convenience: log the snapshots a cycle observed.
pub fn log_inputs(audit: &mut AuditLog, cycle: u64, inputs: &CycleInputs) -> Result<()> {
    audit.log(
        "inputs_observed",
        serde_json::json!({
            "cycle": cycle,
            "split": inputs.split,
            "fill": inputs.fill,
            "previous": inputs.previous,
        }),
    )
}

/// Convenience: log a computed allocation.
pub fn log_allocation(audit: &mut AuditLog, cycle: u64, position: &FinalPosition) -> Result<()> {
    audit.log(
        "allocation_computed",
        serde_json::json!({
            "cycle": cycle,
            "ticker": position.ticker(),
            "total": position.total(),
            "positions": position,
        }),
    )
}

/// Convenience: log a failed cycle.
pub fn log_cycle_failed(audit: &mut AuditLog, cycle: u64, error: &AllocationError) -> Result<()> {
    audit.log(
        "cycle_failed",
        serde_json::json!({
            "cycle": cycle,
            "kind": error.kind().to_string(),
            "reason": error.reason(),
        }),
    )
}

/// Convenience: log run completion.
pub fn log_run_completed(audit: &mut AuditLog, cycles: u64, done: u64, failed: u64) -> Result<()> {
    audit.log(
        "run_completed",
        serde_json::json!({
            "cycles": cycles,
            "done": done,
            "failed": failed,
        }),
    )
}
