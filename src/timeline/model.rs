//! Timeline model: ordered execution segments produced by the simulation service.
//!
//! A [`Timeline`] is validated once on construction and never mutated after
//! that. Sessions share it as `Arc<Timeline>` between the renderer and the
//! playback controller; a new run replaces the whole value.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::{Result, VizError};

/// One contiguous interval during which a process occupies the processor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Process identifier. Unique only in combination with time.
    pub pid: String,
    /// Inclusive start, in simulated time units.
    pub start: f64,
    /// Exclusive end, in simulated time units. Always greater than `start`.
    pub end: f64,
}

impl Segment {
    /// Build a segment without validation; [`Timeline::new`] validates.
    #[must_use]
    pub fn new(pid: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            pid: pid.into(),
            start,
            end,
        }
    }

    /// Length of the interval in time units.
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Chart label, e.g. `P1 (0-5)`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} ({}-{})", self.pid, self.start, self.end)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Validated, immutable sequence of segments for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Segment>", into = "Vec<Segment>")]
pub struct Timeline {
    segments: Vec<Segment>,
    global_start: f64,
    global_end: f64,
}

impl Timeline {
    /// Validate and wrap a segment list.
    ///
    /// Rejects empty pids, negative or non-finite times, `end <= start`,
    /// segments out of `start` order, and overlapping segments of one pid.
    /// An empty list is a valid, empty timeline.
    pub fn new(segments: Vec<Segment>) -> Result<Self> {
        let mut last_end_by_pid: HashMap<&str, f64> = HashMap::new();
        let mut prev_start = f64::NEG_INFINITY;

        for (idx, seg) in segments.iter().enumerate() {
            if seg.pid.is_empty() {
                return Err(VizError::invalid_timeline(format!(
                    "segment {idx} has an empty pid"
                )));
            }
            if !seg.start.is_finite() || !seg.end.is_finite() {
                return Err(VizError::invalid_timeline(format!(
                    "segment {idx} ({}) has a non-finite bound",
                    seg.pid
                )));
            }
            if seg.start < 0.0 {
                return Err(VizError::invalid_timeline(format!(
                    "segment {idx} ({}) starts before 0",
                    seg.pid
                )));
            }
            if seg.end <= seg.start {
                return Err(VizError::invalid_timeline(format!(
                    "segment {idx} ({}) has end {} <= start {}",
                    seg.pid, seg.end, seg.start
                )));
            }
            if seg.start < prev_start {
                return Err(VizError::invalid_timeline(format!(
                    "segment {idx} ({}) starts at {} before the previous segment at {prev_start}",
                    seg.pid, seg.start
                )));
            }
            if let Some(&last_end) = last_end_by_pid.get(seg.pid.as_str())
                && seg.start < last_end
            {
                return Err(VizError::invalid_timeline(format!(
                    "segment {idx} ({}) overlaps an earlier segment ending at {last_end}",
                    seg.pid
                )));
            }
            last_end_by_pid.insert(seg.pid.as_str(), seg.end);
            prev_start = seg.start;
        }

        let global_start = segments
            .iter()
            .map(|s| s.start)
            .fold(f64::INFINITY, f64::min);
        let global_end = segments
            .iter()
            .map(|s| s.end)
            .fold(f64::NEG_INFINITY, f64::max);

        if segments.is_empty() {
            return Ok(Self::empty());
        }

        Ok(Self {
            segments,
            global_start,
            global_end,
        })
    }

    /// The empty timeline. Renders as a blank surface and cannot be played.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            segments: Vec::new(),
            global_start: 0.0,
            global_end: 0.0,
        }
    }

    /// Validate the `timeline` field of a raw backend payload.
    ///
    /// `None` (field absent), `null`, and non-array values are rejected, as
    /// is any entry that is not a `{pid, start, end}` object.
    pub fn from_payload(field: Option<&Value>) -> Result<Self> {
        let items = match field {
            None | Some(Value::Null) => {
                return Err(VizError::invalid_timeline("payload has no timeline field"));
            }
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(VizError::invalid_timeline(format!(
                    "timeline must be a sequence, got {}",
                    json_kind(other)
                )));
            }
        };

        let mut segments = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            let Value::Object(obj) = item else {
                return Err(VizError::invalid_timeline(format!(
                    "segment {idx} must be an object, got {}",
                    json_kind(item)
                )));
            };
            let pid = match obj.get("pid") {
                Some(Value::String(s)) => s.clone(),
                // Numeric pids are accepted and kept in their textual form.
                Some(Value::Number(n)) => n.to_string(),
                _ => {
                    return Err(VizError::invalid_timeline(format!(
                        "segment {idx} has no textual pid"
                    )));
                }
            };
            let start = number_field(obj.get("start"), idx, "start")?;
            let end = number_field(obj.get("end"), idx, "end")?;
            segments.push(Segment { pid, start, end });
        }

        Self::new(segments)
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }

    /// Earliest segment start (0 for an empty timeline).
    #[must_use]
    pub fn global_start(&self) -> f64 {
        self.global_start
    }

    /// Latest segment end (0 for an empty timeline).
    #[must_use]
    pub fn global_end(&self) -> f64 {
        self.global_end
    }

    /// `max(1, global_end - global_start)`; never zero.
    #[must_use]
    pub fn span(&self) -> f64 {
        (self.global_end - self.global_start).max(1.0)
    }

    /// Distinct pids in order of first appearance.
    #[must_use]
    pub fn pids(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for seg in &self.segments {
            if !seen.contains(&seg.pid.as_str()) {
                seen.push(seg.pid.as_str());
            }
        }
        seen
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::empty()
    }
}

impl TryFrom<Vec<Segment>> for Timeline {
    type Error = VizError;

    fn try_from(value: Vec<Segment>) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Timeline> for Vec<Segment> {
    fn from(value: Timeline) -> Self {
        value.segments
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

fn number_field(value: Option<&Value>, idx: usize, name: &str) -> Result<f64> {
    value.and_then(Value::as_f64).ok_or_else(|| {
        VizError::invalid_timeline(format!("segment {idx} has a missing or non-numeric {name}"))
    })
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
