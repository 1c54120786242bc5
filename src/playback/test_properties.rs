//! Property-based tests for playback, timeline, and chart invariants.
//!
//! Arbitrary timelines are driven through the blocking loop on a virtual
//! clock while a scripted listener injects pause/resume/speed commands.

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;

use super::controller::{PlaybackController, PlaybackEvent, PlaybackTiming};
use super::driver::{Control, ControlChannel, ManualClock, PlaybackHandle, PlaybackListener, RunOutcome, run};
use super::state::{PlaybackPhase, SpeedMultiplier};
use crate::render::{GanttLayout, GanttRenderer};
use crate::table::{HighlightSink, HighlightState};
use crate::timeline::color::{ColorTable, color_for, hue_for};
use crate::timeline::model::{Segment, Timeline};

// ──────────────────── strategies ────────────────────

fn arb_timeline() -> impl Strategy<Value = Timeline> {
    prop::collection::vec((0u8..5, 1u32..10, 0u32..3), 1..20).prop_map(|parts| {
        let mut t = 0.0;
        let segments = parts
            .into_iter()
            .map(|(pid, len, gap)| {
                let start = t + f64::from(gap);
                let end = start + f64::from(len);
                t = end;
                Segment::new(format!("P{}", pid + 1), start, end)
            })
            .collect();
        Timeline::new(segments).unwrap()
    })
}

fn arb_control() -> impl Strategy<Value = Control> {
    prop_oneof![
        Just(Control::Pause),
        Just(Control::TogglePause),
        Just(Control::Play),
        (1u32..40).prop_map(|tenths| {
            Control::SetSpeed(SpeedMultiplier::new(f64::from(tenths) / 10.0).unwrap())
        }),
    ]
}

// ──────────────────── scripted listener ────────────────────

struct Scripted {
    handle: PlaybackHandle,
    script: Vec<Control>,
    highlights: Vec<(usize, HighlightState)>,
    finished: usize,
    started: usize,
}

impl HighlightSink for Scripted {
    fn highlight(&mut self, _pid: &str, _state: HighlightState) {}
    fn clear_all(&mut self) {}
}

impl PlaybackListener for Scripted {
    fn on_event(&mut self, event: &PlaybackEvent) {
        match event {
            PlaybackEvent::Highlight {
                index,
                state: HighlightState::Running,
                ..
            } => {
                self.highlights.push((*index, HighlightState::Running));
                if let Some(next) = self.script.pop() {
                    self.handle.send(next);
                }
            }
            PlaybackEvent::Highlight { index, state, .. } => {
                self.highlights.push((*index, *state));
            }
            PlaybackEvent::Finished => self.finished += 1,
            PlaybackEvent::Started { .. } => self.started += 1,
            _ => {}
        }
    }
}

// ──────────────────── property tests ────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Pauses, resumes, and speed changes never skip, repeat, or reorder
    /// segments.
    #[test]
    fn interrupted_playback_visits_every_segment_once(
        timeline in arb_timeline(),
        script in prop::collection::vec(arb_control(), 0..30),
    ) {
        let timeline = Arc::new(timeline);
        let channel = ControlChannel::new();
        let clock = ManualClock::new();
        let mut controller = PlaybackController::default();
        let mut listener = Scripted {
            handle: channel.handle(),
            script,
            highlights: Vec::new(),
            finished: 0,
            started: 0,
        };

        let mut outcome = run(&mut controller, Some(&timeline), channel.receiver(), &clock, &mut listener).unwrap();
        let mut resumes = 0;
        while outcome == RunOutcome::Paused {
            resumes += 1;
            prop_assert!(resumes <= 64, "playback never finished");
            outcome = run(&mut controller, Some(&timeline), channel.receiver(), &clock, &mut listener).unwrap();
        }

        prop_assert_eq!(outcome, RunOutcome::Finished);
        prop_assert_eq!(controller.phase(), PlaybackPhase::Finished);
        prop_assert_eq!(listener.started, 1);
        prop_assert_eq!(listener.finished, 1);

        let expected: Vec<(usize, HighlightState)> = (0..timeline.len())
            .flat_map(|i| [(i, HighlightState::Running), (i, HighlightState::Done)])
            .collect();
        prop_assert_eq!(listener.highlights, expected);
    }

    /// Every segment wait respects the floor, whatever the speed.
    #[test]
    fn waits_never_drop_below_floor(
        timeline in arb_timeline(),
        tenths in 1u32..100,
    ) {
        let timing = PlaybackTiming {
            unit: Duration::from_millis(200),
            min_step: Duration::from_millis(100),
        };
        let speed = SpeedMultiplier::new(f64::from(tenths) / 10.0).unwrap();
        let timeline = Arc::new(timeline);
        let channel = ControlChannel::new();
        let clock = ManualClock::new();
        let mut controller = PlaybackController::new(timing, speed);
        let mut listener = Scripted {
            handle: channel.handle(),
            script: Vec::new(),
            highlights: Vec::new(),
            finished: 0,
            started: 0,
        };
        run(&mut controller, Some(&timeline), channel.receiver(), &clock, &mut listener).unwrap();

        let waits = clock.waits();
        prop_assert_eq!(waits.len(), timeline.len());
        for (wait, seg) in waits.iter().zip(timeline.iter()) {
            prop_assert!(*wait >= timing.min_step);
            prop_assert_eq!(*wait, timing.step_duration(seg.duration(), speed));
        }
    }

    /// Bounds enclose every segment and bars stay on the canvas.
    #[test]
    fn bars_stay_inside_canvas(timeline in arb_timeline(), zoom in 0.1f64..4.0) {
        for seg in timeline.iter() {
            prop_assert!(timeline.global_start() <= seg.start);
            prop_assert!(seg.end <= timeline.global_end());
        }

        let layout = GanttLayout::default().zoomed(zoom);
        let width = layout.canvas_width(&timeline);
        let renderer = GanttRenderer::new(layout, crate::render::ChartPalette::light());
        let bars = renderer.bars(&timeline);
        prop_assert_eq!(bars.len(), timeline.len());
        for bar in &bars {
            prop_assert!(bar.rect.x >= -1e-9);
            prop_assert!(bar.rect.width > 0.0);
            prop_assert!(bar.rect.x + bar.rect.width <= width + 1e-6);
        }
    }

    /// Colors depend only on the pid.
    #[test]
    fn colors_are_stable_per_pid(pid in "\\PC{1,12}") {
        prop_assert!(hue_for(&pid) < 360);
        prop_assert_eq!(color_for(&pid), color_for(&pid));
        let mut table = ColorTable::new();
        let first = table.get(&pid);
        prop_assert_eq!(table.get(&pid), first);
        prop_assert_eq!(first, color_for(&pid));
        prop_assert_eq!(table.len(), 1);
    }
}
