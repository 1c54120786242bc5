//! Status line and user notices.

#![allow(missing_docs)]

use std::fmt;

/// One-line session status shown under the chart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Idle,
    CallingBackend,
    Ready,
    Playing,
    Paused,
    Finished,
    Reset,
    Cleared,
    Error(String),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Status: idle"),
            Self::CallingBackend => write!(f, "Status: calling backend..."),
            Self::Ready => write!(f, "Status: ready - use Play to animate"),
            Self::Playing => write!(f, "Status: playing"),
            Self::Paused => write!(f, "Status: paused"),
            Self::Finished => write!(f, "Status: finished"),
            Self::Reset => write!(f, "Status: reset"),
            Self::Cleared => write!(f, "Status: cleared"),
            Self::Error(reason) => write!(f, "Status: Error - {reason}"),
        }
    }
}

/// Prompt that needs the user's attention (a dialog in a GUI, a stderr
/// message in the CLI).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    RunFirst,
    AddProcess,
    BackendError { message: String, location: String },
    SettingsReset,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RunFirst => write!(f, "Run Start first"),
            Self::AddProcess => write!(f, "Add at least one process"),
            Self::BackendError { message, location } => write!(
                f,
                "Backend error: {message}\n\nMake sure backend runs on {location}"
            ),
            Self::SettingsReset => write!(f, "Settings reset"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings() {
        assert_eq!(Status::default().to_string(), "Status: idle");
        assert_eq!(
            Status::Ready.to_string(),
            "Status: ready - use Play to animate"
        );
        assert_eq!(
            Status::Error("HTTP 500".to_string()).to_string(),
            "Status: Error - HTTP 500"
        );
    }

    #[test]
    fn backend_notice_names_location() {
        let n = Notice::BackendError {
            message: "HTTP 502".to_string(),
            location: "http://127.0.0.1:8000".to_string(),
        };
        assert_eq!(
            n.to_string(),
            "Backend error: HTTP 502\n\nMake sure backend runs on http://127.0.0.1:8000"
        );
    }
}
