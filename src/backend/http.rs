//! HTTP client for the simulation service (`POST` JSON, blocking).
//!
//! No retries: a non-2xx status or an undecodable body is reported once as
//! [`VizError::Backend`] and left to the caller to surface.

#![allow(missing_docs)]

use std::time::Duration;

use serde_json::Value;

use crate::core::config::BackendConfig;
use crate::core::errors::{Result, VizError};

use super::SimulationBackend;
use super::protocol::SimulationRequest;

/// Blocking HTTP backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    url: String,
    client: reqwest::blocking::Client,
}

impl HttpBackend {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VizError::Backend {
                details: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn from_config(cfg: &BackendConfig) -> Result<Self> {
        Self::new(cfg.url.clone(), Duration::from_secs(cfg.timeout_secs))
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl SimulationBackend for HttpBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    fn location(&self) -> String {
        origin_of(&self.url)
    }

    fn simulate_raw(&self, request: &SimulationRequest) -> Result<Value> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .map_err(|e| VizError::Backend {
                details: format!("request to {} failed: {e}", self.url),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(VizError::Backend {
                details: format!("HTTP {}", status.as_u16()),
            });
        }

        let body = response.text()?;
        serde_json::from_str(&body).map_err(|e| VizError::Backend {
            details: format!("malformed JSON response: {e}"),
        })
    }
}

/// `scheme://host[:port]` of a URL; the raw string when it has no origin.
fn origin_of(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(parsed) if parsed.origin().is_tuple() => parsed.origin().ascii_serialization(),
        _ => url.to_string(),
    }
}
