//! Blocking playback loop.
//!
//! Commands reach a running playback through a bounded crossbeam channel
//! ([`PlaybackHandle`]). Between segment deadlines the loop blocks on that
//! channel with a timeout, so a pause costs nothing: while paused there is
//! no deadline and the loop waits for the next command.

#![allow(missing_docs)]

use std::cell::{Cell, RefCell};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};

use crate::core::errors::{Result, VizError};
use crate::table::HighlightSink;
use crate::timeline::model::Timeline;

use super::controller::{PlaybackController, PlaybackEvent};
use super::state::{PlaybackPhase, SpeedMultiplier};

const CONTROL_CHANNEL_CAP: usize = 64;

// ──────────────────── commands ────────────────────

/// Command delivered to a running playback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control {
    Play,
    Pause,
    /// Pause when playing, resume when paused.
    TogglePause,
    Reset,
    SetSpeed(SpeedMultiplier),
    /// Stop driving without touching highlights or phase.
    Detach,
}

/// Cloneable sender side for [`Control`] commands.
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    tx: Sender<Control>,
}

impl PlaybackHandle {
    /// Non-blocking send. Returns false when the queue is full or the
    /// playback side is gone.
    pub fn send(&self, control: Control) -> bool {
        match self.tx.try_send(control) {
            Ok(()) => true,
            Err(TrySendError::Full(c)) => {
                eprintln!("[SV-PLAYBACK] control queue full, dropped {c:?}");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    pub fn play(&self) -> bool {
        self.send(Control::Play)
    }

    pub fn pause(&self) -> bool {
        self.send(Control::Pause)
    }

    pub fn reset(&self) -> bool {
        self.send(Control::Reset)
    }
}

/// Receiving side owned by the session that drives playback.
#[derive(Debug)]
pub struct ControlChannel {
    tx: Sender<Control>,
    rx: Receiver<Control>,
}

impl Default for ControlChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlChannel {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = bounded(CONTROL_CHANNEL_CAP);
        Self { tx, rx }
    }

    #[must_use]
    pub fn handle(&self) -> PlaybackHandle {
        PlaybackHandle {
            tx: self.tx.clone(),
        }
    }

    #[must_use]
    pub const fn receiver(&self) -> &Receiver<Control> {
        &self.rx
    }

    /// Discard commands queued while nothing was playing.
    pub fn drain(&self) -> usize {
        self.rx.try_iter().count()
    }
}

// ──────────────────── clocks ────────────────────

/// Outcome of waiting on the control channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Wake {
    Control(Control),
    Elapsed,
    /// No command can arrive any more.
    Disconnected,
}

/// Time source plus blocking wait, so tests can run playback instantly.
pub trait Clock {
    fn now(&self) -> Instant;

    /// Wait until `deadline` or the next command, whichever is first.
    /// `None` waits for a command only.
    fn wait(&self, control: &Receiver<Control>, deadline: Option<Instant>) -> Wake;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wait(&self, control: &Receiver<Control>, deadline: Option<Instant>) -> Wake {
        match deadline {
            Some(deadline) => match control.recv_deadline(deadline) {
                Ok(c) => Wake::Control(c),
                Err(RecvTimeoutError::Timeout) => Wake::Elapsed,
                Err(RecvTimeoutError::Disconnected) => Wake::Disconnected,
            },
            None => control
                .recv()
                .map_or(Wake::Disconnected, Wake::Control),
        }
    }
}

/// Virtual clock: waits complete immediately and are recorded.
///
/// A queued command is delivered before any deadline elapses. With no
/// deadline and nothing queued the wait reports `Disconnected`, which ends
/// the run instead of hanging.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<Instant>,
    waits: RefCell<Vec<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Cell::new(Instant::now()),
            waits: RefCell::new(Vec::new()),
        }
    }

    /// Every completed wait, in order.
    #[must_use]
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.borrow().clone()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }

    fn wait(&self, control: &Receiver<Control>, deadline: Option<Instant>) -> Wake {
        if let Ok(c) = control.try_recv() {
            return Wake::Control(c);
        }
        match deadline {
            Some(deadline) => {
                let now = self.now.get();
                let waited = deadline.saturating_duration_since(now);
                self.waits.borrow_mut().push(waited);
                self.now.set(now.max(deadline));
                Wake::Elapsed
            }
            None => Wake::Disconnected,
        }
    }
}

// ──────────────────── loop ────────────────────

/// Highlight sink that also observes controller events.
pub trait PlaybackListener: HighlightSink {
    fn on_event(&mut self, _event: &PlaybackEvent) {}
}

/// How [`run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Finished,
    Reset,
    /// Paused and no further command can arrive.
    Paused,
    Detached,
}

/// Start (or resume) playback and drive it until it finishes, is reset,
/// or is detached.
pub fn run(
    controller: &mut PlaybackController,
    timeline: Option<&Arc<Timeline>>,
    control: &Receiver<Control>,
    clock: &dyn Clock,
    listener: &mut dyn PlaybackListener,
) -> Result<RunOutcome> {
    if let Some(event) = controller.play(timeline, clock.now())? {
        listener.on_event(&event);
    }

    loop {
        let tick = controller.poll(clock.now(), listener);
        for event in &tick.events {
            listener.on_event(event);
        }
        if tick.finished() {
            return Ok(RunOutcome::Finished);
        }

        match clock.wait(control, tick.wake_at) {
            Wake::Elapsed => {}
            Wake::Control(cmd) => {
                if let Some(outcome) = apply(controller, cmd, clock, listener)? {
                    return Ok(outcome);
                }
            }
            Wake::Disconnected => {
                return Ok(if controller.phase() == PlaybackPhase::Paused {
                    RunOutcome::Paused
                } else {
                    RunOutcome::Detached
                });
            }
        }
    }
}

fn apply(
    controller: &mut PlaybackController,
    cmd: Control,
    clock: &dyn Clock,
    listener: &mut dyn PlaybackListener,
) -> Result<Option<RunOutcome>> {
    let event = match cmd {
        Control::Play => resume(controller, clock)?,
        Control::Pause => controller.pause(),
        Control::TogglePause => {
            if controller.phase() == PlaybackPhase::Paused {
                resume(controller, clock)?
            } else {
                controller.pause()
            }
        }
        Control::SetSpeed(speed) => Some(controller.set_speed(speed)),
        Control::Reset => {
            let event = controller.reset(listener);
            listener.on_event(&event);
            return Ok(Some(RunOutcome::Reset));
        }
        Control::Detach => return Ok(Some(RunOutcome::Detached)),
    };
    if let Some(event) = event {
        listener.on_event(&event);
    }
    Ok(None)
}

fn resume(controller: &mut PlaybackController, clock: &dyn Clock) -> Result<Option<PlaybackEvent>> {
    let timeline = controller.timeline().cloned();
    match controller.play(timeline.as_ref(), clock.now()) {
        Ok(event) => Ok(event),
        // Timeline captured at start is never empty.
        Err(VizError::NoTimeline) => Ok(None),
        Err(e) => Err(e),
    }
}
