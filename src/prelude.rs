//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use schedviz::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{Result, VizError};

// Timeline
pub use crate::timeline::{ColorTable, Segment, Timeline, color_for};

// Rendering
pub use crate::render::svg::SvgSurface;
pub use crate::render::terminal::CellSurface;
pub use crate::render::{DrawSurface, GanttLayout, GanttRenderer, RecordingSurface};

// Playback
pub use crate::playback::{
    Clock, Control, ManualClock, PlaybackController, PlaybackEvent, PlaybackHandle,
    PlaybackPhase, RunOutcome, SpeedMultiplier, SystemClock,
};

// Table, backend, session
#[cfg(feature = "http")]
pub use crate::backend::http::HttpBackend;
pub use crate::backend::{ReplayBackend, SimulationBackend, SimulationRequest, SimulationResponse};
pub use crate::session::{Notice, Session, Status};
pub use crate::table::{HighlightSink, HighlightState, ProcessTable};
