//! Playback phase, cursor, and speed.
//!
//! ```text
//! Idle ──play──▶ Playing ──pause──▶ Paused
//!                  │  ▲               │
//!                  │  └─────play──────┘
//!                  ▼
//!              Finished ──play──▶ Playing (cursor 0)
//!
//! reset: any phase ──▶ Idle (cursor 0)
//! ```

#![allow(missing_docs)]

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, VizError};

/// Controller phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackPhase {
    #[default]
    Idle,
    Playing,
    Paused,
    Finished,
}

impl fmt::Display for PlaybackPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Playing => write!(f, "playing"),
            Self::Paused => write!(f, "paused"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

/// Positive, finite factor dividing each segment's wait.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct SpeedMultiplier(f64);

impl SpeedMultiplier {
    pub const NORMAL: Self = Self(1.0);

    pub fn new(value: f64) -> Result<Self> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(VizError::InvalidSpeed { value })
        }
    }

    /// Parse the stringified form stored in preferences (e.g. `"1.5"`).
    pub fn parse(raw: &str) -> Result<Self> {
        let value = raw.trim().parse::<f64>().map_err(|_| VizError::InvalidSpeed {
            value: f64::NAN,
        })?;
        Self::new(value)
    }

    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }
}

impl Default for SpeedMultiplier {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl fmt::Display for SpeedMultiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<f64> for SpeedMultiplier {
    type Error = VizError;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<SpeedMultiplier> for f64 {
    fn from(value: SpeedMultiplier) -> Self {
        value.0
    }
}

/// What a successful `play` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayTransition {
    /// Began from cursor 0 (from `Idle` or `Finished`).
    Started,
    /// Continued from the paused cursor.
    Resumed { cursor: usize },
    /// Already playing; nothing changed.
    AlreadyPlaying,
}

/// Mutable playback state for one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackState {
    phase: PlaybackPhase,
    cursor: usize,
    speed: SpeedMultiplier,
}

impl PlaybackState {
    #[must_use]
    pub fn new(speed: SpeedMultiplier) -> Self {
        Self {
            phase: PlaybackPhase::Idle,
            cursor: 0,
            speed,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub const fn speed(&self) -> SpeedMultiplier {
        self.speed
    }

    pub fn set_speed(&mut self, speed: SpeedMultiplier) {
        self.speed = speed;
    }

    /// Enter `Playing`. `timeline_len == 0` is [`VizError::NoTimeline`] and
    /// leaves the state untouched.
    pub fn play(&mut self, timeline_len: usize) -> Result<PlayTransition> {
        if timeline_len == 0 {
            return Err(VizError::NoTimeline);
        }
        match self.phase {
            PlaybackPhase::Playing => Ok(PlayTransition::AlreadyPlaying),
            PlaybackPhase::Paused => {
                self.phase = PlaybackPhase::Playing;
                Ok(PlayTransition::Resumed {
                    cursor: self.cursor,
                })
            }
            PlaybackPhase::Idle | PlaybackPhase::Finished => {
                self.cursor = 0;
                self.phase = PlaybackPhase::Playing;
                Ok(PlayTransition::Started)
            }
        }
    }

    /// `Playing` → `Paused`. Returns false (no change) from any other phase.
    pub fn pause(&mut self) -> bool {
        if self.phase == PlaybackPhase::Playing {
            self.phase = PlaybackPhase::Paused;
            true
        } else {
            false
        }
    }

    /// Back to `Idle` at cursor 0 from any phase.
    pub fn reset(&mut self) {
        self.phase = PlaybackPhase::Idle;
        self.cursor = 0;
    }

    /// Mark playback complete: `Finished` at cursor 0.
    pub fn finish(&mut self) {
        self.phase = PlaybackPhase::Finished;
        self.cursor = 0;
    }

    /// Move past the current segment. Only valid while `Playing`; on the
    /// last segment the phase becomes `Finished` and the cursor rewinds to 0.
    /// Returns true when playback finished.
    pub fn advance(&mut self, timeline_len: usize) -> bool {
        if self.phase != PlaybackPhase::Playing {
            return false;
        }
        self.cursor += 1;
        if self.cursor >= timeline_len {
            self.finish();
            return true;
        }
        false
    }
}
