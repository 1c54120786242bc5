//! Wire types for the simulation service.
//!
//! Request: `{processes: [{pid, arrival_time, burst_time}], quantum}`.
//! Response: `{timeline, metrics, averages: {avg_turnaround_time, avg_waiting_time}}`.

#![allow(missing_docs)]

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::{Result, VizError};
use crate::timeline::model::Timeline;

/// One process submitted for simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSpec {
    pub pid: String,
    pub arrival_time: u32,
    pub burst_time: u32,
}

/// Full simulation request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub processes: Vec<ProcessSpec>,
    pub quantum: u32,
}

/// Per-process results computed by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessMetric {
    #[serde(deserialize_with = "pid_text")]
    pub pid: String,
    pub arrival_time: f64,
    pub burst_time: f64,
    pub completion_time: f64,
    pub waiting_time: f64,
    pub turnaround_time: f64,
}

impl fmt::Display for ProcessMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: arrival={}, burst={}, comp={}, wait={}, tat={}",
            self.pid,
            self.arrival_time,
            self.burst_time,
            self.completion_time,
            self.waiting_time,
            self.turnaround_time
        )
    }
}

/// Run-wide averages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Averages {
    pub avg_turnaround_time: f64,
    pub avg_waiting_time: f64,
}

impl Averages {
    /// Two-decimal display pair `(turnaround, waiting)`.
    #[must_use]
    pub fn formatted(&self) -> (String, String) {
        (
            format!("{:.2}", self.avg_turnaround_time),
            format!("{:.2}", self.avg_waiting_time),
        )
    }
}

/// Validated simulation response.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResponse {
    pub timeline: Arc<Timeline>,
    pub metrics: Vec<ProcessMetric>,
    pub averages: Averages,
}

impl SimulationResponse {
    /// Parse a response body. Malformed JSON is a backend failure; a bad
    /// `timeline` field is [`VizError::InvalidTimeline`].
    pub fn from_json_str(body: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(body).map_err(|e| VizError::Backend {
            details: format!("malformed JSON response: {e}"),
        })?;
        Self::from_value(&value)
    }

    /// Validate an already-decoded response payload.
    pub fn from_value(value: &Value) -> Result<Self> {
        if !value.is_object() {
            return Err(VizError::Backend {
                details: "response is not a JSON object".to_string(),
            });
        }

        let timeline = Timeline::from_payload(value.get("timeline"))?;

        let metrics = decode_field::<Vec<ProcessMetric>>(value, "metrics")?;
        let averages = decode_field::<Averages>(value, "averages")?;

        Ok(Self {
            timeline: Arc::new(timeline),
            metrics,
            averages,
        })
    }

    /// Per-process summary lines, one per metric.
    #[must_use]
    pub fn summary_lines(&self) -> Vec<String> {
        self.metrics.iter().map(ToString::to_string).collect()
    }
}

/// Accept a pid as a string or a number, keeping the text form.
fn pid_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::invalid_type(
            serde::de::Unexpected::Other(match other {
                Value::Null => "null",
                Value::Bool(_) => "a boolean",
                Value::Array(_) => "an array",
                _ => "an object",
            }),
            &"a string or number pid",
        )),
    }
}

fn decode_field<T>(value: &Value, name: &str) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let field = value.get(name).ok_or_else(|| VizError::Backend {
        details: format!("response has no {name} field"),
    })?;
    T::deserialize(field).map_err(|e| VizError::Backend {
        details: format!("malformed {name}: {e}"),
    })
}
