//! Terminal front end pieces shared by the `schedviz` binary.
#![allow(missing_docs)]

pub mod player;

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::backend::ProcessMetric;
use crate::core::errors::{Result, VizError};
use crate::table::ProcessTable;

/// One process entry in a `--input` file.
#[derive(Debug, Clone, Deserialize)]
struct InputProcess {
    pid: Option<Value>,
    #[serde(alias = "arrival", default)]
    arrival_time: Option<Value>,
    #[serde(alias = "burst", default)]
    burst_time: Option<Value>,
}

/// Replace the table rows with the processes in `path`.
///
/// Accepts a JSON array of `{pid, arrival_time, burst_time}` objects, a
/// `{"processes": [...]}` request body, or plain text with one
/// `PID:ARRIVAL:BURST` per line (`#` starts a comment).
pub fn load_process_file(table: &mut ProcessTable, path: &Path) -> Result<usize> {
    let raw = fs::read_to_string(path).map_err(|source| VizError::io(path, source))?;
    let trimmed = raw.trim_start();
    table.clear();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        let value: Value = serde_json::from_str(trimmed)?;
        let list = match value {
            Value::Object(mut obj) => obj.remove("processes").unwrap_or(Value::Null),
            other => other,
        };
        let entries: Vec<InputProcess> =
            serde_json::from_value(list).map_err(|e| VizError::InvalidProcess {
                input: path.display().to_string(),
                details: e.to_string(),
            })?;
        for entry in entries {
            table.add_row(
                entry.pid.as_ref().map(value_text).as_deref(),
                &entry.arrival_time.as_ref().map_or_else(|| "0".to_string(), value_text),
                &entry.burst_time.as_ref().map_or_else(|| "1".to_string(), value_text),
            );
        }
    } else {
        for line in raw.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            if !line.is_empty() {
                table.add_from_spec_str(line)?;
            }
        }
    }
    Ok(table.len())
}

/// Rebuild the table from a saved response's metrics so playback
/// highlights land on matching rows. Leaves the table alone when the
/// response carries no metrics.
pub fn table_from_metrics(table: &mut ProcessTable, metrics: &[ProcessMetric]) {
    if metrics.is_empty() {
        return;
    }
    table.clear();
    for m in metrics {
        table.add_row(
            Some(&m.pid),
            &m.arrival_time.to_string(),
            &m.burst_time.to_string(),
        );
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
