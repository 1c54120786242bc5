//! Persisted viewer preferences: dark mode and playback speed.
//!
//! Stored as a small JSON object whose values are strings, e.g.
//! `{"darkMode": "true", "speed": "1.5"}`. Native JSON booleans and numbers
//! are accepted on load as well.
//!
//! # Merge Order
//!
//! ```text
//! compiled defaults → persisted preferences → CLI overrides
//! ```
//!
//! Load errors fall back to defaults and never block a command. Save
//! errors are reported to the caller.

#![allow(missing_docs)]

use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, VizError};
use crate::playback::SpeedMultiplier;

// ──────────────────── core preferences ────────────────────

/// Effective viewer preferences.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UserPreferences {
    pub dark_mode: bool,
    pub speed: SpeedMultiplier,
}

/// On-disk shape. Every field optional so partial files load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredPreferences {
    #[serde(rename = "darkMode", default, skip_serializing_if = "Option::is_none")]
    dark_mode: Option<StoredValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    speed: Option<StoredValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredValue {
    Text(String),
    Flag(bool),
    Number(f64),
}

impl StoredValue {
    fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            Self::Text(s) => match s.trim() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            Self::Number(_) => None,
        }
    }

    fn as_speed(&self) -> Option<SpeedMultiplier> {
        match self {
            Self::Number(n) => SpeedMultiplier::new(*n).ok(),
            Self::Text(s) => SpeedMultiplier::parse(s).ok(),
            Self::Flag(_) => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Text(s) => format!("{s:?}"),
            Self::Flag(b) => b.to_string(),
            Self::Number(n) => n.to_string(),
        }
    }
}

impl From<&UserPreferences> for StoredPreferences {
    fn from(prefs: &UserPreferences) -> Self {
        Self {
            dark_mode: Some(StoredValue::Text(prefs.dark_mode.to_string())),
            speed: Some(StoredValue::Text(prefs.speed.to_string())),
        }
    }
}

// ──────────────────── validation ────────────────────

/// Issues found while normalizing loaded preferences.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub warnings: Vec<String>,
    pub applied_defaults: Vec<String>,
}

impl ValidationReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.applied_defaults.is_empty()
    }
}

fn validate(stored: &StoredPreferences) -> (UserPreferences, ValidationReport) {
    let mut prefs = UserPreferences::default();
    let mut report = ValidationReport::default();

    match &stored.dark_mode {
        None => report.applied_defaults.push("darkMode".to_string()),
        Some(v) => match v.as_bool() {
            Some(b) => prefs.dark_mode = b,
            None => {
                report
                    .warnings
                    .push(format!("darkMode={} is not true/false; using false", v.describe()));
                report.applied_defaults.push("darkMode".to_string());
            }
        },
    }

    match &stored.speed {
        None => report.applied_defaults.push("speed".to_string()),
        Some(v) => match v.as_speed() {
            Some(s) => prefs.speed = s,
            None => {
                report
                    .warnings
                    .push(format!("speed={} is not a positive number; using 1", v.describe()));
                report.applied_defaults.push("speed".to_string());
            }
        },
    }

    (prefs, report)
}

// ──────────────────── persistence ────────────────────

/// Load outcome from the persistence layer.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded {
        prefs: UserPreferences,
        report: ValidationReport,
    },
    /// File not found (first launch or after reset).
    Missing,
    /// File exists but is not a JSON object we understand.
    Corrupt { details: String },
    IoError { details: String },
}

impl LoadOutcome {
    /// Effective preferences regardless of load status.
    #[must_use]
    pub fn into_prefs(self) -> UserPreferences {
        match self {
            Self::Loaded { prefs, .. } => prefs,
            Self::Missing | Self::Corrupt { .. } | Self::IoError { .. } => {
                UserPreferences::default()
            }
        }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Loaded { .. } | Self::Missing)
    }
}

/// Load preferences from `path`. Never fails; see [`LoadOutcome`].
pub fn load(path: &Path) -> LoadOutcome {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return LoadOutcome::Missing,
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            return LoadOutcome::Corrupt {
                details: e.to_string(),
            };
        }
        Err(e) => {
            return LoadOutcome::IoError {
                details: e.to_string(),
            };
        }
    };

    let stored: StoredPreferences = match serde_json::from_str(&content) {
        Ok(s) => s,
        Err(e) => {
            return LoadOutcome::Corrupt {
                details: e.to_string(),
            };
        }
    };

    let (prefs, report) = validate(&stored);
    LoadOutcome::Loaded { prefs, report }
}

/// Atomic save: serialize → temp file → fsync → rename.
pub fn save(prefs: &UserPreferences, path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| VizError::io(parent, e))?;
    }

    let json = serde_json::to_string_pretty(&StoredPreferences::from(prefs))?;

    let tmp_path = path.with_extension("json.tmp");
    {
        let mut file = fs::File::create(&tmp_path).map_err(|e| VizError::io(&tmp_path, e))?;
        file.write_all(json.as_bytes())
            .map_err(|e| VizError::io(&tmp_path, e))?;
        file.sync_all().map_err(|e| VizError::io(&tmp_path, e))?;
    }

    fs::rename(&tmp_path, path).map_err(|e| VizError::io(path, e))?;
    Ok(path.to_path_buf())
}

/// Remove the stored preferences. A missing file is not an error.
pub fn clear(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(VizError::io(path, e)),
    }
}

// ──────────────────── store ────────────────────

/// Preferences bound to a file, saved on every change.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: Option<PathBuf>,
    current: UserPreferences,
}

impl PreferenceStore {
    /// Load from `path`, logging (not failing) on corrupt or unreadable files.
    #[must_use]
    pub fn open(path: PathBuf) -> Self {
        let outcome = load(&path);
        match &outcome {
            LoadOutcome::Corrupt { details } | LoadOutcome::IoError { details } => {
                eprintln!(
                    "[SV-PREFS] ignoring {}: {details}; using defaults",
                    path.display()
                );
            }
            LoadOutcome::Loaded { report, .. } => {
                for warning in &report.warnings {
                    eprintln!("[SV-PREFS] {warning}");
                }
            }
            LoadOutcome::Missing => {}
        }
        Self {
            path: Some(path),
            current: outcome.into_prefs(),
        }
    }

    /// Unpersisted store, for one-off sessions and tests.
    #[must_use]
    pub fn in_memory(prefs: UserPreferences) -> Self {
        Self {
            path: None,
            current: prefs,
        }
    }

    #[must_use]
    pub const fn current(&self) -> UserPreferences {
        self.current
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn set_dark_mode(&mut self, dark: bool) -> Result<()> {
        self.current.dark_mode = dark;
        self.persist()
    }

    pub fn set_speed(&mut self, speed: SpeedMultiplier) -> Result<()> {
        self.current.speed = speed;
        self.persist()
    }

    /// Delete the stored file and return to defaults.
    pub fn reset(&mut self) -> Result<()> {
        self.current = UserPreferences::default();
        match &self.path {
            Some(path) => clear(path),
            None => Ok(()),
        }
    }

    fn persist(&self) -> Result<()> {
        match &self.path {
            Some(path) => save(&self.current, path).map(|_| ()),
            None => Ok(()),
        }
    }
}

// ──────────────────── merge ────────────────────

/// Per-invocation overrides. Never persisted.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOverrides {
    pub dark_mode: Option<bool>,
    pub speed: Option<SpeedMultiplier>,
}

#[must_use]
pub fn merge(persisted: &UserPreferences, overrides: &SessionOverrides) -> UserPreferences {
    UserPreferences {
        dark_mode: overrides.dark_mode.unwrap_or(persisted.dark_mode),
        speed: overrides.speed.unwrap_or(persisted.speed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_light_and_normal_speed() {
        let prefs = UserPreferences::default();
        assert!(!prefs.dark_mode);
        assert_eq!(prefs.speed, SpeedMultiplier::NORMAL);
    }

    #[test]
    fn saves_string_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let prefs = UserPreferences {
            dark_mode: true,
            speed: SpeedMultiplier::new(1.5).unwrap(),
        };
        save(&prefs, &path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["darkMode"], "true");
        assert_eq!(raw["speed"], "1.5");

        match load(&path) {
            LoadOutcome::Loaded { prefs: loaded, report } => {
                assert_eq!(loaded, prefs);
                assert!(report.is_clean());
            }
            other => panic!("expected Loaded, got {other:?}"),
        }
    }

    #[test]
    fn native_json_values_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, r#"{"darkMode": true, "speed": 2}"#).unwrap();
        let prefs = load(&path).into_prefs();
        assert!(prefs.dark_mode);
        assert!((prefs.speed.get() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_values_fall_back_with_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, r#"{"darkMode": "yes", "speed": "-1"}"#).unwrap();
        match load(&path) {
            LoadOutcome::Loaded { prefs, report } => {
                assert_eq!(prefs, UserPreferences::default());
                assert_eq!(report.warnings.len(), 2);
                assert_eq!(report.applied_defaults, vec!["darkMode", "speed"]);
            }
            other => panic!("expected Loaded, got {other:?}"),
        }
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, r#"{"speed": "0.5"}"#).unwrap();
        match load(&path) {
            LoadOutcome::Loaded { prefs, report } => {
                assert!(!prefs.dark_mode);
                assert!((prefs.speed.get() - 0.5).abs() < f64::EPSILON);
                assert!(report.warnings.is_empty());
                assert_eq!(report.applied_defaults, vec!["darkMode"]);
            }
            other => panic!("expected Loaded, got {other:?}"),
        }
    }

    #[test]
    fn missing_and_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        assert!(matches!(load(&path), LoadOutcome::Missing));
        assert!(load(&path).is_ok());

        fs::write(&path, "{not json").unwrap();
        let outcome = load(&path);
        assert!(!outcome.is_ok());
        assert!(matches!(outcome, LoadOutcome::Corrupt { .. }));
        assert_eq!(outcome.into_prefs(), UserPreferences::default());
    }

    #[test]
    fn save_creates_parent_dirs_without_tmp_leftover() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("prefs.json");
        save(&UserPreferences::default(), &path).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn store_persists_changes_and_reset_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let mut store = PreferenceStore::open(path.clone());
        assert_eq!(store.current(), UserPreferences::default());
        store.set_dark_mode(true).unwrap();
        store.set_speed(SpeedMultiplier::new(3.0).unwrap()).unwrap();

        let reopened = PreferenceStore::open(path.clone());
        assert!(reopened.current().dark_mode);
        assert!((reopened.current().speed.get() - 3.0).abs() < f64::EPSILON);

        store.reset().unwrap();
        assert!(!path.exists());
        assert_eq!(store.current(), UserPreferences::default());
        // Second reset with the file already gone is fine.
        store.reset().unwrap();
    }

    #[test]
    fn in_memory_store_never_touches_disk() {
        let mut store = PreferenceStore::in_memory(UserPreferences::default());
        store.set_dark_mode(true).unwrap();
        assert!(store.path().is_none());
        assert!(store.current().dark_mode);
    }

    #[test]
    fn merge_override_wins() {
        let persisted = UserPreferences {
            dark_mode: true,
            speed: SpeedMultiplier::new(2.0).unwrap(),
        };
        let merged = merge(&persisted, &SessionOverrides::default());
        assert_eq!(merged, persisted);

        let merged = merge(
            &persisted,
            &SessionOverrides {
                dark_mode: Some(false),
                speed: None,
            },
        );
        assert!(!merged.dark_mode);
        assert_eq!(merged.speed, persisted.speed);
    }
}
