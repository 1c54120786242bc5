//! Segment-by-segment playback over a [`Timeline`].
//!
//! The controller is a pure state machine driven with explicit instants:
//! callers invoke [`PlaybackController::play`], [`pause`](PlaybackController::pause)
//! and [`reset`](PlaybackController::reset) as commands arrive, and call
//! [`poll`](PlaybackController::poll) whenever the last returned deadline
//! has passed. Nothing here sleeps or reads a clock; see
//! [`driver`](super::driver) for the blocking loop.
//!
//! Per segment the sink receives `Running` when the wait starts and `Done`
//! when it elapses. `Done` for segment *i* always precedes `Running` for
//! segment *i + 1*, including across pause/resume.

#![allow(missing_docs)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::core::config::PlaybackConfig;
use crate::core::errors::{Result, VizError};
use crate::table::{HighlightSink, HighlightState};
use crate::timeline::model::Timeline;

use super::state::{PlayTransition, PlaybackPhase, PlaybackState, SpeedMultiplier};

// ──────────────────── timing ────────────────────

/// Upper bound for any single wait (one year).
pub const MAX_STEP: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Wall-clock pacing for segment waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackTiming {
    /// Wait per simulated time unit at speed 1.
    pub unit: Duration,
    /// Lower bound for any single wait.
    pub min_step: Duration,
}

impl Default for PlaybackTiming {
    fn default() -> Self {
        Self::from(&PlaybackConfig::default())
    }
}

impl From<&PlaybackConfig> for PlaybackTiming {
    fn from(cfg: &PlaybackConfig) -> Self {
        Self {
            unit: Duration::from_millis(cfg.unit_ms),
            min_step: Duration::from_millis(cfg.min_step_ms),
        }
    }
}

impl PlaybackTiming {
    /// `max(min_step, duration_units * unit / speed)`.
    ///
    /// Saturates at [`MAX_STEP`] so tiny speeds wait longest and the
    /// deadline stays representable as an `Instant`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn step_duration(&self, duration_units: f64, speed: SpeedMultiplier) -> Duration {
        let unit_us = self.unit.as_micros() as f64;
        let scaled_us = (duration_units * unit_us / speed.get()).round();
        let scaled = if scaled_us.is_nan() || scaled_us <= 0.0 {
            Duration::ZERO
        } else if scaled_us >= MAX_STEP.as_micros() as f64 {
            MAX_STEP
        } else {
            Duration::from_micros(scaled_us as u64)
        };
        scaled.max(self.min_step)
    }
}

// ──────────────────── events ────────────────────

/// Observable effect of a controller command or poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlaybackEvent {
    Started { segments: usize },
    Resumed { cursor: usize },
    Paused { cursor: usize },
    Reset,
    Highlight {
        index: usize,
        pid: String,
        state: HighlightState,
    },
    SpeedChanged { speed: f64 },
    Finished,
}

/// Result of one [`PlaybackController::poll`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tick {
    /// Events emitted during this poll, in order.
    pub events: Vec<PlaybackEvent>,
    /// When to poll next. `None` while not playing.
    pub wake_at: Option<Instant>,
}

impl Tick {
    #[must_use]
    pub fn finished(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, PlaybackEvent::Finished))
    }
}

// ──────────────────── controller ────────────────────

/// Segment whose `Running` highlight has been emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveStep {
    index: usize,
    /// `None` while paused; restarted in full on resume.
    deadline: Option<Instant>,
}

/// Drives highlight events across a timeline.
#[derive(Debug)]
pub struct PlaybackController {
    state: PlaybackState,
    timing: PlaybackTiming,
    timeline: Option<Arc<Timeline>>,
    step: Option<ActiveStep>,
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new(PlaybackTiming::default(), SpeedMultiplier::NORMAL)
    }
}

impl PlaybackController {
    #[must_use]
    pub fn new(timing: PlaybackTiming, speed: SpeedMultiplier) -> Self {
        Self {
            state: PlaybackState::new(speed),
            timing,
            timeline: None,
            step: None,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> PlaybackPhase {
        self.state.phase()
    }

    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.state.cursor()
    }

    #[must_use]
    pub const fn speed(&self) -> SpeedMultiplier {
        self.state.speed()
    }

    #[must_use]
    pub const fn timing(&self) -> PlaybackTiming {
        self.timing
    }

    /// Timeline being played, if any.
    #[must_use]
    pub fn timeline(&self) -> Option<&Arc<Timeline>> {
        self.timeline.as_ref()
    }

    /// Wait for segment `index` of the current timeline at the current speed.
    #[must_use]
    pub fn step_duration_for(&self, index: usize) -> Option<Duration> {
        let seg = self.timeline.as_ref()?.get(index)?;
        Some(self.timing.step_duration(seg.duration(), self.state.speed()))
    }

    /// Takes effect at the next segment wait; a wait already in progress
    /// keeps its deadline.
    pub fn set_speed(&mut self, speed: SpeedMultiplier) -> PlaybackEvent {
        self.state.set_speed(speed);
        PlaybackEvent::SpeedChanged { speed: speed.get() }
    }

    /// Start or resume playback.
    ///
    /// From `Idle`/`Finished` the given timeline is captured and playback
    /// starts at cursor 0. From `Paused` the captured timeline is kept and
    /// the current segment's wait restarts in full at `now`. `Playing` is a
    /// no-op. Without a non-empty timeline this is [`VizError::NoTimeline`]
    /// and nothing changes.
    pub fn play(
        &mut self,
        timeline: Option<&Arc<Timeline>>,
        now: Instant,
    ) -> Result<Option<PlaybackEvent>> {
        if self.state.phase() == PlaybackPhase::Playing {
            return Ok(None);
        }
        let resuming = self.state.phase() == PlaybackPhase::Paused;
        let target = if resuming {
            self.timeline.clone()
        } else {
            timeline.cloned()
        };
        let len = target.as_ref().map_or(0, |t| t.len());
        if len == 0 {
            return Err(VizError::NoTimeline);
        }

        match self.state.play(len)? {
            PlayTransition::AlreadyPlaying => Ok(None),
            PlayTransition::Resumed { cursor } => {
                if let Some(step) = self.step.as_mut() {
                    let wait = self.timing.step_duration(
                        target
                            .as_ref()
                            .and_then(|t| t.get(step.index))
                            .map_or(0.0, |s| s.duration()),
                        self.state.speed(),
                    );
                    step.deadline = Some(now + wait);
                }
                Ok(Some(PlaybackEvent::Resumed { cursor }))
            }
            PlayTransition::Started => {
                self.timeline = target;
                self.step = None;
                Ok(Some(PlaybackEvent::Started { segments: len }))
            }
        }
    }

    /// Suspend at the current segment. No-op unless `Playing`.
    pub fn pause(&mut self) -> Option<PlaybackEvent> {
        if !self.state.pause() {
            return None;
        }
        if let Some(step) = self.step.as_mut() {
            step.deadline = None;
        }
        Some(PlaybackEvent::Paused {
            cursor: self.state.cursor(),
        })
    }

    /// Abandon playback: clear every row highlight and return to `Idle` at
    /// cursor 0. A segment in progress does not receive `Done`.
    pub fn reset<S: HighlightSink + ?Sized>(&mut self, sink: &mut S) -> PlaybackEvent {
        self.state.reset();
        self.step = None;
        self.timeline = None;
        sink.clear_all();
        PlaybackEvent::Reset
    }

    /// Advance as far as `now` allows, emitting highlights into `sink`.
    pub fn poll<S: HighlightSink + ?Sized>(&mut self, now: Instant, sink: &mut S) -> Tick {
        let mut tick = Tick::default();
        if self.state.phase() != PlaybackPhase::Playing {
            return tick;
        }
        let Some(timeline) = self.timeline.clone() else {
            return tick;
        };

        loop {
            match self.step {
                None => {
                    let index = self.state.cursor();
                    let Some(seg) = timeline.get(index) else {
                        self.finish(&mut tick);
                        return tick;
                    };
                    sink.highlight(&seg.pid, HighlightState::Running);
                    tick.events.push(PlaybackEvent::Highlight {
                        index,
                        pid: seg.pid.clone(),
                        state: HighlightState::Running,
                    });
                    let deadline = now + self.timing.step_duration(seg.duration(), self.speed());
                    self.step = Some(ActiveStep {
                        index,
                        deadline: Some(deadline),
                    });
                    tick.wake_at = Some(deadline);
                    return tick;
                }
                Some(ActiveStep {
                    deadline: Some(deadline),
                    ..
                }) if deadline > now => {
                    tick.wake_at = Some(deadline);
                    return tick;
                }
                Some(ActiveStep { index, .. }) => {
                    if let Some(seg) = timeline.get(index) {
                        sink.highlight(&seg.pid, HighlightState::Done);
                        tick.events.push(PlaybackEvent::Highlight {
                            index,
                            pid: seg.pid.clone(),
                            state: HighlightState::Done,
                        });
                    }
                    self.step = None;
                    if self.state.advance(timeline.len()) {
                        tick.events.push(PlaybackEvent::Finished);
                        return tick;
                    }
                }
            }
        }
    }

    fn finish(&mut self, tick: &mut Tick) {
        self.state.finish();
        self.step = None;
        tick.events.push(PlaybackEvent::Finished);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::model::Segment;

    #[derive(Default)]
    struct Recorder {
        events: Vec<(String, HighlightState)>,
        clears: usize,
    }

    impl HighlightSink for Recorder {
        fn highlight(&mut self, pid: &str, state: HighlightState) {
            self.events.push((pid.to_string(), state));
        }

        fn clear_all(&mut self) {
            self.clears += 1;
        }
    }

    fn timeline(segments: &[(&str, f64, f64)]) -> Arc<Timeline> {
        Arc::new(
            Timeline::new(
                segments
                    .iter()
                    .map(|(pid, s, e)| Segment::new(*pid, *s, *e))
                    .collect(),
            )
            .unwrap(),
        )
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn step_duration_scales_and_floors() {
        let timing = PlaybackTiming::default();
        let half = SpeedMultiplier::new(0.5).unwrap();
        let double = SpeedMultiplier::new(2.0).unwrap();
        assert_eq!(timing.step_duration(5.0, SpeedMultiplier::NORMAL), ms(1000));
        assert_eq!(timing.step_duration(5.0, double), ms(500));
        assert_eq!(timing.step_duration(5.0, half), ms(2000));
        // 1 unit at 4x = 50ms, floored.
        let quad = SpeedMultiplier::new(4.0).unwrap();
        assert_eq!(timing.step_duration(1.0, quad), ms(100));
    }

    #[test]
    fn slower_speeds_never_shorten_the_wait() {
        let timing = PlaybackTiming::default();
        let speeds = [4.0, 1.0, 0.5, 1e-3, 1e-9, 1e-100, 1e-300, f64::MIN_POSITIVE, 1e-310];
        let waits: Vec<Duration> = speeds
            .iter()
            .map(|v| timing.step_duration(5.0, SpeedMultiplier::new(*v).unwrap()))
            .collect();
        for pair in waits.windows(2) {
            assert!(pair[1] >= pair[0], "{:?} then {:?}", pair[0], pair[1]);
        }
        assert_eq!(waits[3], Duration::from_secs(1000));
        assert_eq!(waits[waits.len() - 1], MAX_STEP);
        assert_eq!(
            timing.step_duration(5.0, SpeedMultiplier::new(1e-310).unwrap()),
            MAX_STEP
        );
    }

    #[test]
    fn subnormal_speed_deadline_is_representable() {
        let tl = timeline(&[("P1", 0.0, 5.0)]);
        let mut ctl = PlaybackController::new(
            PlaybackTiming::default(),
            SpeedMultiplier::new(1e-310).unwrap(),
        );
        let now = Instant::now();
        ctl.play(Some(&tl), now).unwrap();
        let mut sink = crate::table::ProcessTable::default();
        let tick = ctl.poll(now, &mut sink);
        assert_eq!(tick.wake_at, Some(now + MAX_STEP));
    }

    #[test]
    fn play_without_timeline_is_rejected() {
        let mut ctl = PlaybackController::default();
        let now = Instant::now();
        assert!(matches!(ctl.play(None, now), Err(VizError::NoTimeline)));
        let empty = Arc::new(Timeline::empty());
        assert!(matches!(ctl.play(Some(&empty), now), Err(VizError::NoTimeline)));
        assert_eq!(ctl.phase(), PlaybackPhase::Idle);
    }

    #[test]
    fn full_run_emits_ordered_pairs() {
        let tl = timeline(&[("P1", 0.0, 5.0), ("P2", 5.0, 8.0), ("P3", 8.0, 9.0)]);
        let mut ctl = PlaybackController::default();
        let mut sink = Recorder::default();
        let t0 = Instant::now();

        ctl.play(Some(&tl), t0).unwrap();
        let tick = ctl.poll(t0, &mut sink);
        assert_eq!(tick.wake_at, Some(t0 + ms(1000)));

        let t1 = t0 + ms(1000);
        let tick = ctl.poll(t1, &mut sink);
        assert_eq!(tick.wake_at, Some(t1 + ms(600)));

        let t2 = t1 + ms(600);
        let tick = ctl.poll(t2, &mut sink);
        assert_eq!(tick.wake_at, Some(t2 + ms(200)));

        let tick = ctl.poll(t2 + ms(200), &mut sink);
        assert!(tick.finished());
        assert_eq!(tick.wake_at, None);

        let expected: Vec<(String, HighlightState)> = ["P1", "P2", "P3"]
            .iter()
            .flat_map(|p| {
                [
                    (p.to_string(), HighlightState::Running),
                    (p.to_string(), HighlightState::Done),
                ]
            })
            .collect();
        assert_eq!(sink.events, expected);
        assert_eq!(ctl.phase(), PlaybackPhase::Finished);
        assert_eq!(ctl.cursor(), 0);
    }

    #[test]
    fn early_poll_does_nothing() {
        let tl = timeline(&[("P1", 0.0, 5.0)]);
        let mut ctl = PlaybackController::default();
        let mut sink = Recorder::default();
        let t0 = Instant::now();
        ctl.play(Some(&tl), t0).unwrap();
        ctl.poll(t0, &mut sink);
        let tick = ctl.poll(t0 + ms(999), &mut sink);
        assert!(tick.events.is_empty());
        assert_eq!(sink.events.len(), 1);
    }

    #[test]
    fn pause_holds_then_resume_restarts_wait() {
        let tl = timeline(&[("P1", 0.0, 5.0), ("P2", 5.0, 8.0)]);
        let mut ctl = PlaybackController::default();
        let mut sink = Recorder::default();
        let t0 = Instant::now();
        ctl.play(Some(&tl), t0).unwrap();
        ctl.poll(t0, &mut sink);

        assert_eq!(ctl.pause(), Some(PlaybackEvent::Paused { cursor: 0 }));
        assert_eq!(ctl.pause(), None);
        let tick = ctl.poll(t0 + ms(5000), &mut sink);
        assert!(tick.events.is_empty());
        assert_eq!(tick.wake_at, None);
        assert_eq!(sink.events.len(), 1);

        let resume_at = t0 + ms(5000);
        assert_eq!(
            ctl.play(None, resume_at).unwrap(),
            Some(PlaybackEvent::Resumed { cursor: 0 })
        );
        let tick = ctl.poll(resume_at, &mut sink);
        assert_eq!(tick.wake_at, Some(resume_at + ms(1000)));
        assert_eq!(sink.events.len(), 1, "running not re-emitted on resume");

        ctl.poll(resume_at + ms(1000), &mut sink);
        assert_eq!(
            sink.events,
            vec![
                ("P1".to_string(), HighlightState::Running),
                ("P1".to_string(), HighlightState::Done),
                ("P2".to_string(), HighlightState::Running),
            ]
        );
    }

    #[test]
    fn reset_mid_segment_suppresses_done() {
        let tl = timeline(&[("P1", 0.0, 5.0), ("P2", 5.0, 8.0)]);
        let mut ctl = PlaybackController::default();
        let mut sink = Recorder::default();
        let t0 = Instant::now();
        ctl.play(Some(&tl), t0).unwrap();
        ctl.poll(t0, &mut sink);

        assert_eq!(ctl.reset(&mut sink), PlaybackEvent::Reset);
        assert_eq!(sink.clears, 1);
        assert_eq!(ctl.phase(), PlaybackPhase::Idle);
        assert_eq!(ctl.cursor(), 0);
        assert!(ctl.timeline().is_none());

        let tick = ctl.poll(t0 + ms(10_000), &mut sink);
        assert!(tick.events.is_empty());
        assert_eq!(sink.events.len(), 1);
    }

    #[test]
    fn speed_change_applies_to_next_segment() {
        let tl = timeline(&[("P1", 0.0, 5.0), ("P2", 5.0, 10.0)]);
        let mut ctl = PlaybackController::default();
        let mut sink = Recorder::default();
        let t0 = Instant::now();
        ctl.play(Some(&tl), t0).unwrap();
        let tick = ctl.poll(t0, &mut sink);
        assert_eq!(tick.wake_at, Some(t0 + ms(1000)));

        ctl.set_speed(SpeedMultiplier::new(2.0).unwrap());
        let t1 = t0 + ms(1000);
        let tick = ctl.poll(t1, &mut sink);
        assert_eq!(tick.wake_at, Some(t1 + ms(500)));
    }

    #[test]
    fn replay_after_finish_starts_from_zero_with_new_timeline() {
        let first = timeline(&[("P1", 0.0, 1.0)]);
        let second = timeline(&[("P9", 0.0, 1.0)]);
        let mut ctl = PlaybackController::default();
        let mut sink = Recorder::default();
        let t0 = Instant::now();
        ctl.play(Some(&first), t0).unwrap();
        ctl.poll(t0, &mut sink);
        assert!(ctl.poll(t0 + ms(200), &mut sink).finished());

        assert_eq!(
            ctl.play(Some(&second), t0).unwrap(),
            Some(PlaybackEvent::Started { segments: 1 })
        );
        ctl.poll(t0, &mut sink);
        assert_eq!(sink.events.last().unwrap().0, "P9");
    }

    #[test]
    fn resume_ignores_replacement_timeline() {
        let first = timeline(&[("P1", 0.0, 1.0), ("P2", 1.0, 2.0)]);
        let other = timeline(&[("X", 0.0, 1.0)]);
        let mut ctl = PlaybackController::default();
        let mut sink = Recorder::default();
        let t0 = Instant::now();
        ctl.play(Some(&first), t0).unwrap();
        ctl.poll(t0, &mut sink);
        ctl.pause();
        ctl.play(Some(&other), t0).unwrap();
        assert!(Arc::ptr_eq(ctl.timeline().unwrap(), &first));
    }
}
