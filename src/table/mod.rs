//! In-memory process table and the row highlight sink.
//!
//! Rows hold the user's raw input (pid, arrival, burst as typed), the
//! metrics written back after a run, and at most one highlight class.
//! A pid → row-index map is maintained on every add/remove/edit so
//! highlight lookups never scan the table.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::fmt;

use crate::backend::protocol::{ProcessMetric, ProcessSpec};
use crate::core::errors::{Result, VizError};

/// Row highlight class. `Running` and `Done` are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightState {
    Running,
    Done,
}

impl HighlightState {
    /// Presentation class name.
    #[must_use]
    pub const fn class(self) -> &'static str {
        match self {
            Self::Running => "row-running",
            Self::Done => "row-done",
        }
    }
}

impl fmt::Display for HighlightState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Consumer of playback highlight events.
pub trait HighlightSink {
    /// Apply `state` to every row whose pid equals `pid`.
    fn highlight(&mut self, pid: &str, state: HighlightState);
    /// Remove every highlight class from every row.
    fn clear_all(&mut self);
}

/// One editable table row.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRow {
    pid: String,
    arrival: String,
    burst: String,
    pub wait: Option<f64>,
    pub turnaround: Option<f64>,
    pub highlight: Option<HighlightState>,
}

impl ProcessRow {
    #[must_use]
    pub fn pid(&self) -> &str {
        &self.pid
    }

    #[must_use]
    pub fn arrival_input(&self) -> &str {
        &self.arrival
    }

    #[must_use]
    pub fn burst_input(&self) -> &str {
        &self.burst
    }

    /// Wait column text (`-` until a run reports it).
    #[must_use]
    pub fn wait_text(&self) -> String {
        self.wait.map_or_else(|| "-".to_string(), |v| v.to_string())
    }

    /// Turnaround column text (`-` until a run reports it).
    #[must_use]
    pub fn turnaround_text(&self) -> String {
        self.turnaround
            .map_or_else(|| "-".to_string(), |v| v.to_string())
    }

    /// Coerce the raw inputs into a request entry.
    ///
    /// Empty pid → `"P"`; unparsable or negative arrival → 0; unparsable or
    /// non-positive burst → 1. Leading integers are honored (`"3.7"` → 3).
    #[must_use]
    pub fn to_spec(&self) -> ProcessSpec {
        let pid = if self.pid.is_empty() {
            "P".to_string()
        } else {
            self.pid.clone()
        };
        let arrival = parse_leading_int(&self.arrival)
            .filter(|v| *v > 0)
            .map_or(0, clamp_u32);
        let burst = parse_leading_int(&self.burst)
            .filter(|v| *v > 0)
            .map_or(1, clamp_u32);
        ProcessSpec {
            pid,
            arrival_time: arrival,
            burst_time: burst,
        }
    }
}

/// The process table.
#[derive(Debug, Clone, Default)]
pub struct ProcessTable {
    rows: Vec<ProcessRow>,
    by_pid: HashMap<String, Vec<usize>>,
}

impl ProcessTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starter table: `P1 (0,5)`, `P2 (1,3)`, `P3 (2,1)`.
    #[must_use]
    pub fn with_default_rows() -> Self {
        let mut table = Self::new();
        table.add_row(Some("P1"), "0", "5");
        table.add_row(Some("P2"), "1", "3");
        table.add_row(Some("P3"), "2", "1");
        table
    }

    /// Append a row. `pid = None` picks `P{n+1}`. Returns the new row index.
    pub fn add_row(&mut self, pid: Option<&str>, arrival: &str, burst: &str) -> usize {
        let pid = pid.map_or_else(|| format!("P{}", self.rows.len() + 1), str::to_string);
        self.rows.push(ProcessRow {
            pid,
            arrival: arrival.to_string(),
            burst: burst.to_string(),
            wait: None,
            turnaround: None,
            highlight: None,
        });
        let idx = self.rows.len() - 1;
        self.by_pid
            .entry(self.rows[idx].pid.clone())
            .or_default()
            .push(idx);
        idx
    }

    /// Append a row with defaults: next pid, arrival 0, burst 1.
    pub fn add_default_row(&mut self) -> usize {
        self.add_row(None, "0", "1")
    }

    /// Parse `PID:ARRIVAL:BURST` (arrival/burst optional) and append it.
    pub fn add_from_spec_str(&mut self, raw: &str) -> Result<usize> {
        let mut parts = raw.split(':');
        let pid = parts.next().unwrap_or_default().trim();
        let arrival = parts.next().unwrap_or("0").trim();
        let burst = parts.next().unwrap_or("1").trim();
        if parts.next().is_some() {
            return Err(VizError::InvalidProcess {
                input: raw.to_string(),
                details: "expected PID:ARRIVAL:BURST".to_string(),
            });
        }
        let pid = (!pid.is_empty()).then_some(pid);
        Ok(self.add_row(pid, arrival, burst))
    }

    /// Remove the row at `index`. Returns the removed row, if any.
    pub fn remove_row(&mut self, index: usize) -> Option<ProcessRow> {
        if index >= self.rows.len() {
            return None;
        }
        let row = self.rows.remove(index);
        self.reindex();
        Some(row)
    }

    /// Edit a row's pid; highlight lookups follow the new value.
    pub fn set_pid(&mut self, index: usize, pid: &str) -> bool {
        let Some(row) = self.rows.get_mut(index) else {
            return false;
        };
        pid.clone_into(&mut row.pid);
        self.reindex();
        true
    }

    pub fn set_arrival(&mut self, index: usize, arrival: &str) -> bool {
        self.rows
            .get_mut(index)
            .map(|row| arrival.clone_into(&mut row.arrival))
            .is_some()
    }

    pub fn set_burst(&mut self, index: usize, burst: &str) -> bool {
        self.rows
            .get_mut(index)
            .map(|row| burst.clone_into(&mut row.burst))
            .is_some()
    }

    /// Drop every row.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.by_pid.clear();
    }

    #[must_use]
    pub fn rows(&self) -> &[ProcessRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row indices for a pid (empty when no row carries it).
    #[must_use]
    pub fn indices_for(&self, pid: &str) -> &[usize] {
        self.by_pid.get(pid).map_or(&[], Vec::as_slice)
    }

    /// Build request entries for every row, in table order.
    pub fn to_specs(&self) -> Result<Vec<ProcessSpec>> {
        if self.rows.is_empty() {
            return Err(VizError::EmptyProcessTable);
        }
        Ok(self.rows.iter().map(ProcessRow::to_spec).collect())
    }

    /// Write wait/turnaround values back by pid. Rows without a matching
    /// metric keep their previous values; a later metric for the same pid
    /// wins.
    pub fn apply_metrics(&mut self, metrics: &[ProcessMetric]) {
        let by_pid: HashMap<&str, &ProcessMetric> =
            metrics.iter().map(|m| (m.pid.as_str(), m)).collect();
        for row in &mut self.rows {
            if let Some(m) = by_pid.get(row.pid.as_str()) {
                row.wait = Some(m.waiting_time);
                row.turnaround = Some(m.turnaround_time);
            }
        }
    }

    /// Reset wait/turnaround columns to `-`.
    pub fn clear_metrics(&mut self) {
        for row in &mut self.rows {
            row.wait = None;
            row.turnaround = None;
        }
    }

    fn reindex(&mut self) {
        self.by_pid.clear();
        for (idx, row) in self.rows.iter().enumerate() {
            self.by_pid.entry(row.pid.clone()).or_default().push(idx);
        }
    }
}

impl HighlightSink for ProcessTable {
    fn highlight(&mut self, pid: &str, state: HighlightState) {
        let Some(indices) = self.by_pid.get(pid) else {
            return;
        };
        for &idx in indices {
            if let Some(row) = self.rows.get_mut(idx) {
                row.highlight = Some(state);
            }
        }
    }

    fn clear_all(&mut self) {
        for row in &mut self.rows {
            row.highlight = None;
        }
    }
}

/// `parseInt`-style: optional sign then leading digits; `None` when no digits.
fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

fn clamp_u32(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
