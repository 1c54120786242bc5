//! SV-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, VizError>;

/// Top-level error type for schedviz.
#[derive(Debug, Error)]
pub enum VizError {
    #[error("[SV-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[SV-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[SV-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[SV-2001] no timeline loaded: run the simulation first")]
    NoTimeline,

    #[error("[SV-2002] invalid timeline: {details}")]
    InvalidTimeline { details: String },

    #[error("[SV-2101] process table is empty: add at least one process")]
    EmptyProcessTable,

    #[error("[SV-2102] invalid process definition {input:?}: {details}")]
    InvalidProcess { input: String, details: String },

    #[error("[SV-2103] invalid playback speed {value}: must be a positive number")]
    InvalidSpeed { value: f64 },

    #[error("[SV-3001] simulation backend failure: {details}")]
    Backend { details: String },

    #[error("[SV-3101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[SV-3201] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[SV-3202] channel closed in component {component}")]
    ChannelClosed { component: &'static str },
}

impl VizError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "SV-1001",
            Self::MissingConfig { .. } => "SV-1002",
            Self::ConfigParse { .. } => "SV-1003",
            Self::NoTimeline => "SV-2001",
            Self::InvalidTimeline { .. } => "SV-2002",
            Self::EmptyProcessTable => "SV-2101",
            Self::InvalidProcess { .. } => "SV-2102",
            Self::InvalidSpeed { .. } => "SV-2103",
            Self::Backend { .. } => "SV-3001",
            Self::Serialization { .. } => "SV-3101",
            Self::Io { .. } => "SV-3201",
            Self::ChannelClosed { .. } => "SV-3202",
        }
    }

    /// Whether the failure is a prompt for the user rather than a fault.
    ///
    /// Prompts leave all session state untouched.
    #[must_use]
    pub const fn is_user_prompt(&self) -> bool {
        matches!(
            self,
            Self::NoTimeline
                | Self::EmptyProcessTable
                | Self::InvalidProcess { .. }
                | Self::InvalidSpeed { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Convenience constructor for timeline validation failures.
    #[must_use]
    pub fn invalid_timeline(details: impl Into<String>) -> Self {
        Self::InvalidTimeline {
            details: details.into(),
        }
    }
}

impl From<serde_json::Error> for VizError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for VizError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for VizError {
    fn from(value: reqwest::Error) -> Self {
        let details = value.status().map_or_else(
            || value.to_string(),
            |status| format!("HTTP {}", status.as_u16()),
        );
        Self::Backend { details }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_variants() -> Vec<VizError> {
        vec![
            VizError::InvalidConfig {
                details: String::new(),
            },
            VizError::MissingConfig {
                path: PathBuf::new(),
            },
            VizError::ConfigParse {
                context: "",
                details: String::new(),
            },
            VizError::NoTimeline,
            VizError::InvalidTimeline {
                details: String::new(),
            },
            VizError::EmptyProcessTable,
            VizError::InvalidProcess {
                input: String::new(),
                details: String::new(),
            },
            VizError::InvalidSpeed { value: 0.0 },
            VizError::Backend {
                details: String::new(),
            },
            VizError::Serialization {
                context: "",
                details: String::new(),
            },
            VizError::Io {
                path: PathBuf::new(),
                source: std::io::Error::other("test"),
            },
            VizError::ChannelClosed { component: "" },
        ]
    }

    #[test]
    fn error_codes_are_unique() {
        let errors = all_variants();
        let codes: Vec<&str> = errors.iter().map(VizError::code).collect();
        let unique: std::collections::HashSet<&&str> = codes.iter().collect();
        assert_eq!(
            codes.len(),
            unique.len(),
            "error codes must be unique: {codes:?}"
        );
    }

    #[test]
    fn display_carries_code_prefix() {
        for err in all_variants() {
            let rendered = err.to_string();
            assert!(
                rendered.starts_with(&format!("[{}]", err.code())),
                "{rendered} should start with its code"
            );
        }
    }

    #[test]
    fn no_timeline_is_a_prompt_backend_is_not() {
        assert!(VizError::NoTimeline.is_user_prompt());
        assert!(VizError::EmptyProcessTable.is_user_prompt());
        assert!(
            !VizError::Backend {
                details: "HTTP 500".to_string()
            }
            .is_user_prompt()
        );
        assert!(!VizError::invalid_timeline("bad").is_user_prompt());
    }

    #[test]
    fn json_error_maps_to_serialization() {
        let err: VizError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.code(), "SV-3101");
    }

    #[test]
    fn toml_error_maps_to_config_parse() {
        let err: VizError = toml::from_str::<toml::Value>("= nope").unwrap_err().into();
        assert_eq!(err.code(), "SV-1003");
    }
}
