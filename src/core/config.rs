//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, VizError};

/// Full schedviz configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub render: RenderConfig,
    pub playback: PlaybackConfig,
    pub paths: PathsConfig,
}

/// Where and how to reach the simulation service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub timeout_secs: u64,
    pub default_quantum: u32,
}

/// Gantt chart geometry, in surface units (pixels for SVG).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    pub min_width: f64,
    pub pixels_per_unit: f64,
    pub height: f64,
    pub bar_y: f64,
    pub bar_height: f64,
    pub label_inset: f64,
    pub label_baseline: f64,
    pub font_size: f64,
}

/// Playback pacing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Wall-clock milliseconds per simulated time unit at speed 1.
    pub unit_ms: u64,
    /// Floor for any single segment wait.
    pub min_step_ms: u64,
}

/// Filesystem paths used by schedviz.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    pub preferences_file: PathBuf,
    pub activity_log: PathBuf,
    pub chart_output: PathBuf,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8000/api/simulate".to_string(),
            timeout_secs: 30,
            default_quantum: 1,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            min_width: 700.0,
            pixels_per_unit: 30.0,
            height: 120.0,
            bar_y: 30.0,
            bar_height: 50.0,
            label_inset: 4.0,
            label_baseline: 60.0,
            font_size: 12.0,
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            unit_ms: 200,
            min_step_ms: 100,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!("[SV-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths");
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        let cfg = home_dir.join(".config").join("schedviz");
        let data = home_dir.join(".local").join("share").join("schedviz");
        Self {
            config_file: cfg.join("config.toml"),
            preferences_file: cfg.join("preferences.json"),
            activity_log: data.join("activity.jsonl"),
            chart_output: PathBuf::from("gantt.svg"),
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| VizError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(VizError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(env_var)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        // backend
        if let Some(raw) = lookup("SCHEDVIZ_BACKEND_URL") {
            self.backend.url = raw;
        }
        set_parsed(&mut lookup, "SCHEDVIZ_BACKEND_TIMEOUT_SECS", &mut self.backend.timeout_secs)?;
        set_parsed(
            &mut lookup,
            "SCHEDVIZ_BACKEND_DEFAULT_QUANTUM",
            &mut self.backend.default_quantum,
        )?;

        // render
        set_parsed(&mut lookup, "SCHEDVIZ_RENDER_MIN_WIDTH", &mut self.render.min_width)?;
        set_parsed(
            &mut lookup,
            "SCHEDVIZ_RENDER_PIXELS_PER_UNIT",
            &mut self.render.pixels_per_unit,
        )?;
        set_parsed(&mut lookup, "SCHEDVIZ_RENDER_HEIGHT", &mut self.render.height)?;

        // playback
        set_parsed(&mut lookup, "SCHEDVIZ_PLAYBACK_UNIT_MS", &mut self.playback.unit_ms)?;
        set_parsed(
            &mut lookup,
            "SCHEDVIZ_PLAYBACK_MIN_STEP_MS",
            &mut self.playback.min_step_ms,
        )?;

        // paths
        if let Some(raw) = lookup("SCHEDVIZ_PREFERENCES_FILE") {
            self.paths.preferences_file = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("SCHEDVIZ_ACTIVITY_LOG") {
            self.paths.activity_log = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("SCHEDVIZ_CHART_OUTPUT") {
            self.paths.chart_output = PathBuf::from(raw);
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.backend.url.trim().is_empty() {
            return Err(VizError::InvalidConfig {
                details: "backend.url must not be empty".to_string(),
            });
        }
        if self.backend.timeout_secs == 0 {
            return Err(VizError::InvalidConfig {
                details: "backend.timeout_secs must be > 0".to_string(),
            });
        }
        if self.backend.default_quantum == 0 {
            return Err(VizError::InvalidConfig {
                details: "backend.default_quantum must be >= 1".to_string(),
            });
        }

        for (name, val) in [
            ("min_width", self.render.min_width),
            ("pixels_per_unit", self.render.pixels_per_unit),
            ("height", self.render.height),
            ("bar_height", self.render.bar_height),
            ("font_size", self.render.font_size),
        ] {
            if !(val.is_finite() && val > 0.0) {
                return Err(VizError::InvalidConfig {
                    details: format!("render.{name} must be a positive number, got {val}"),
                });
            }
        }
        for (name, val) in [
            ("bar_y", self.render.bar_y),
            ("label_inset", self.render.label_inset),
            ("label_baseline", self.render.label_baseline),
        ] {
            if !(val.is_finite() && val >= 0.0) {
                return Err(VizError::InvalidConfig {
                    details: format!("render.{name} must be >= 0, got {val}"),
                });
            }
        }
        if self.render.bar_y + self.render.bar_height > self.render.height {
            return Err(VizError::InvalidConfig {
                details: format!(
                    "render.bar_y + render.bar_height ({}) must fit in render.height ({})",
                    self.render.bar_y + self.render.bar_height,
                    self.render.height
                ),
            });
        }

        if self.playback.unit_ms == 0 {
            return Err(VizError::InvalidConfig {
                details: "playback.unit_ms must be > 0".to_string(),
            });
        }

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn set_parsed<F, T>(lookup: &mut F, name: &str, slot: &mut T) -> Result<()>
where
    F: FnMut(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(raw) = lookup(name) {
        *slot = raw.trim().parse::<T>().map_err(|error| VizError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })?;
    }
    Ok(())
}
