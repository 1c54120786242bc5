//! Typed activity events and the session's log sink.
//!
//! Sessions are single-threaded, so events are written inline rather than
//! handed to a logger thread. `--verbose` mirrors each line to stderr.

#![allow(missing_docs)]

use std::io::{self, Write as _};

use crate::core::errors::VizError;
use crate::playback::PlaybackEvent;

use super::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};

/// Events recorded in the activity log.
#[derive(Debug, Clone, PartialEq)]
pub enum ActivityEvent {
    SimulationRequested {
        backend: String,
        processes: usize,
        quantum: u32,
    },
    SimulationCompleted {
        backend: String,
        segments: usize,
        duration_ms: u64,
    },
    SimulationFailed {
        backend: String,
        code: String,
        message: String,
    },
    TimelineRejected {
        message: String,
    },
    PlaybackStarted {
        segments: usize,
        speed: f64,
    },
    PlaybackPaused {
        index: usize,
    },
    PlaybackResumed {
        index: usize,
    },
    PlaybackReset,
    PlaybackFinished,
    Highlighted {
        index: usize,
        pid: String,
        state: String,
    },
    PreferencesSaved {
        dark_mode: bool,
        speed: f64,
    },
    PreferencesReset,
    TableCleared,
}

impl ActivityEvent {
    /// Build a failure event from an error.
    #[must_use]
    pub fn simulation_failed(backend: &str, err: &VizError) -> Self {
        Self::SimulationFailed {
            backend: backend.to_string(),
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }

    /// Map a playback event; speed changes are not logged here.
    #[must_use]
    pub fn from_playback(event: &PlaybackEvent, speed: f64) -> Option<Self> {
        Some(match event {
            PlaybackEvent::Started { segments } => Self::PlaybackStarted {
                segments: *segments,
                speed,
            },
            PlaybackEvent::Resumed { cursor } => Self::PlaybackResumed { index: *cursor },
            PlaybackEvent::Paused { cursor } => Self::PlaybackPaused { index: *cursor },
            PlaybackEvent::Reset => Self::PlaybackReset,
            PlaybackEvent::Finished => Self::PlaybackFinished,
            PlaybackEvent::Highlight { index, pid, state } => Self::Highlighted {
                index: *index,
                pid: pid.clone(),
                state: state.to_string(),
            },
            PlaybackEvent::SpeedChanged { .. } => return None,
        })
    }

    /// Convert to a JSONL entry.
    #[must_use]
    pub fn to_entry(&self) -> LogEntry {
        match self {
            Self::SimulationRequested {
                backend,
                processes,
                quantum,
            } => {
                let mut e = LogEntry::new(EventType::SimulationRequest, Severity::Info);
                e.backend = Some(backend.clone());
                e.processes = Some(*processes);
                e.quantum = Some(*quantum);
                e
            }
            Self::SimulationCompleted {
                backend,
                segments,
                duration_ms,
            } => {
                let mut e = LogEntry::new(EventType::SimulationComplete, Severity::Info);
                e.backend = Some(backend.clone());
                e.segments = Some(*segments);
                e.duration_ms = Some(*duration_ms);
                e
            }
            Self::SimulationFailed {
                backend,
                code,
                message,
            } => {
                let mut e = LogEntry::new(EventType::SimulationFailed, Severity::Error);
                e.backend = Some(backend.clone());
                e.error_code = Some(code.clone());
                e.error_message = Some(message.clone());
                e
            }
            Self::TimelineRejected { message } => {
                let mut e = LogEntry::new(EventType::TimelineRejected, Severity::Warning);
                e.error_code = Some("SV-2002".to_string());
                e.error_message = Some(message.clone());
                e
            }
            Self::PlaybackStarted { segments, speed } => {
                let mut e = LogEntry::new(EventType::PlaybackStart, Severity::Info);
                e.segments = Some(*segments);
                e.speed = Some(*speed);
                e
            }
            Self::PlaybackPaused { index } => {
                let mut e = LogEntry::new(EventType::PlaybackPause, Severity::Info);
                e.index = Some(*index);
                e
            }
            Self::PlaybackResumed { index } => {
                let mut e = LogEntry::new(EventType::PlaybackResume, Severity::Info);
                e.index = Some(*index);
                e
            }
            Self::PlaybackReset => LogEntry::new(EventType::PlaybackReset, Severity::Info),
            Self::PlaybackFinished => LogEntry::new(EventType::PlaybackFinish, Severity::Info),
            Self::Highlighted { index, pid, state } => {
                let mut e = LogEntry::new(EventType::Highlight, Severity::Info);
                e.index = Some(*index);
                e.pid = Some(pid.clone());
                e.state = Some(state.clone());
                e
            }
            Self::PreferencesSaved { dark_mode, speed } => {
                let mut e = LogEntry::new(EventType::PreferencesSaved, Severity::Info);
                e.dark_mode = Some(*dark_mode);
                e.speed = Some(*speed);
                e
            }
            Self::PreferencesReset => LogEntry::new(EventType::PreferencesReset, Severity::Info),
            Self::TableCleared => LogEntry::new(EventType::TableCleared, Severity::Info),
        }
    }
}

/// Where a session's activity goes.
pub struct ActivityLog {
    writer: JsonlWriter,
    verbose: bool,
    recorded: Option<Vec<ActivityEvent>>,
}

impl ActivityLog {
    /// Log to a JSONL file.
    #[must_use]
    pub fn open(config: JsonlConfig, verbose: bool) -> Self {
        Self {
            writer: JsonlWriter::open(config),
            verbose,
            recorded: None,
        }
    }

    /// Drop all events (optionally mirroring to stderr).
    #[must_use]
    pub fn disabled(verbose: bool) -> Self {
        Self {
            writer: JsonlWriter::discard(),
            verbose,
            recorded: None,
        }
    }

    /// Keep events in memory for inspection.
    #[must_use]
    pub fn recording() -> Self {
        Self {
            writer: JsonlWriter::discard(),
            verbose: false,
            recorded: Some(Vec::new()),
        }
    }

    pub fn record(&mut self, event: ActivityEvent) {
        let entry = event.to_entry();
        if self.verbose
            && let Ok(line) = JsonlWriter::render_line(&entry)
        {
            let _ = write!(io::stderr(), "[SV-LOG] {line}");
        }
        self.writer.write_entry(&entry);
        if let Some(recorded) = self.recorded.as_mut() {
            recorded.push(event);
        }
    }

    /// Events kept by a [`recording`](Self::recording) log.
    #[must_use]
    pub fn recorded(&self) -> &[ActivityEvent] {
        self.recorded.as_deref().unwrap_or(&[])
    }

    pub fn flush(&mut self) {
        self.writer.flush();
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::disabled(false)
    }
}

impl std::fmt::Debug for ActivityLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityLog")
            .field("writer", &self.writer.state())
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}
