//! Gantt playback: phase state, the segment controller, and the blocking driver.

pub mod controller;
pub mod driver;
pub mod state;

#[cfg(test)]
mod test_properties;

pub use controller::{PlaybackController, PlaybackEvent, PlaybackTiming, Tick};
pub use driver::{
    Clock, Control, ControlChannel, ManualClock, PlaybackHandle, PlaybackListener, RunOutcome,
    SystemClock, Wake, run,
};
pub use state::{PlayTransition, PlaybackPhase, PlaybackState, SpeedMultiplier};
