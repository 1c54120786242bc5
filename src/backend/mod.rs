//! Simulation service boundary.
//!
//! The scheduling algorithm itself lives behind [`SimulationBackend`]; this
//! crate only builds requests and validates responses.

#[cfg(feature = "http")]
pub mod http;
pub mod protocol;

use serde_json::Value;

use crate::core::errors::{Result, VizError};

pub use protocol::{Averages, ProcessMetric, ProcessSpec, SimulationRequest, SimulationResponse};

/// Request/response collaborator that computes a schedule.
pub trait SimulationBackend {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Where the service is expected to run, for user-facing hints.
    fn location(&self) -> String {
        self.name().to_string()
    }

    /// Submit a request and return the decoded JSON payload unvalidated.
    fn simulate_raw(&self, request: &SimulationRequest) -> Result<Value>;

    /// Submit a request and validate the response.
    fn simulate(&self, request: &SimulationRequest) -> Result<SimulationResponse> {
        let payload = self.simulate_raw(request)?;
        SimulationResponse::from_value(&payload)
    }
}

/// Backend that answers every request with a previously recorded payload.
///
/// Used for offline rendering/playback of saved responses.
#[derive(Debug, Clone)]
pub struct ReplayBackend {
    payload: Value,
}

impl ReplayBackend {
    #[must_use]
    pub const fn new(payload: Value) -> Self {
        Self { payload }
    }

    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }

    /// Load a recorded payload from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| VizError::io(path, source))?;
        let payload: Value = serde_json::from_str(&raw).map_err(|e| VizError::Backend {
            details: format!("malformed JSON in {}: {e}", path.display()),
        })?;
        Ok(Self { payload })
    }
}

impl SimulationBackend for ReplayBackend {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn simulate_raw(&self, _request: &SimulationRequest) -> Result<Value> {
        Ok(self.payload.clone())
    }
}
