//! End-to-end playback scenarios through the public library API, on a
//! virtual clock.

use std::time::Duration;

use serde_json::{Value, json};

use schedviz::prelude::*;
use schedviz::render::surface::DrawOp;

fn response(timeline: Value) -> Value {
    json!({
        "timeline": timeline,
        "metrics": [
            {"pid": "P1", "arrival_time": 0, "burst_time": 5, "completion_time": 5,
             "waiting_time": 0, "turnaround_time": 5},
            {"pid": "P2", "arrival_time": 1, "burst_time": 3, "completion_time": 8,
             "waiting_time": 4, "turnaround_time": 7}
        ],
        "averages": {"avg_turnaround_time": 6.0, "avg_waiting_time": 2.0}
    })
}

fn two_process_session() -> (Session, RecordingSurface) {
    let mut session = Session::default();
    let table = session.table_mut();
    table.clear();
    table.add_row(Some("P1"), "0", "5");
    table.add_row(Some("P2"), "1", "3");
    let mut surface = RecordingSurface::new(700.0, 120.0);
    session
        .run_simulation(
            &ReplayBackend::new(response(json!([
                {"pid": "P1", "start": 0, "end": 5},
                {"pid": "P2", "start": 5, "end": 8}
            ]))),
            &mut surface,
        )
        .unwrap();
    (session, surface)
}

fn highlight_trace(events: &[PlaybackEvent]) -> Vec<(String, HighlightState)> {
    events
        .iter()
        .filter_map(|e| match e {
            PlaybackEvent::Highlight { pid, state, .. } => Some((pid.clone(), *state)),
            _ => None,
        })
        .collect()
}

#[test]
fn scenario_a_highlights_in_segment_order() {
    let (mut session, _surface) = two_process_session();
    let mut events = Vec::new();
    let outcome = session
        .play(&ManualClock::new(), &mut |_, _, e: &PlaybackEvent| {
            events.push(e.clone());
        })
        .unwrap();

    assert_eq!(outcome, RunOutcome::Finished);
    assert_eq!(session.phase(), PlaybackPhase::Finished);
    assert_eq!(session.status(), &Status::Finished);
    assert_eq!(
        highlight_trace(&events),
        vec![
            ("P1".to_string(), HighlightState::Running),
            ("P1".to_string(), HighlightState::Done),
            ("P2".to_string(), HighlightState::Running),
            ("P2".to_string(), HighlightState::Done),
        ]
    );
    assert!(matches!(events.first(), Some(PlaybackEvent::Started { segments: 2 })));
    assert_eq!(events.last(), Some(&PlaybackEvent::Finished));
    assert!(
        session
            .table()
            .rows()
            .iter()
            .all(|r| r.highlight == Some(HighlightState::Done))
    );
}

#[test]
fn scenario_b_empty_timeline_cannot_play() {
    let mut session = Session::default();
    let mut surface = RecordingSurface::new(700.0, 120.0);
    session
        .run_simulation(&ReplayBackend::new(response(json!([]))), &mut surface)
        .unwrap();

    assert!(surface.ops().iter().all(|op| !matches!(op, DrawOp::FillRect { .. })));
    let err = session
        .play(&ManualClock::new(), &mut |_, _, _: &PlaybackEvent| {})
        .unwrap_err();
    assert!(matches!(err, VizError::NoTimeline));
    assert_eq!(session.take_notices(), vec![Notice::RunFirst]);
    assert_eq!(session.phase(), PlaybackPhase::Idle);
}

#[test]
fn scenario_c_zero_length_segment_is_rejected() {
    let (mut session, _) = two_process_session();
    let mut surface = RecordingSurface::new(700.0, 120.0);
    let err = session
        .run_simulation(
            &ReplayBackend::new(response(json!([{"pid": "P1", "start": 3, "end": 3}]))),
            &mut surface,
        )
        .unwrap_err();

    assert!(matches!(err, VizError::InvalidTimeline { .. }));
    assert!(session.timeline().is_none());
    assert!(matches!(session.status(), Status::Error(_)));
    assert!(
        session
            .play(&ManualClock::new(), &mut |_, _, _: &PlaybackEvent| {})
            .is_err()
    );
}

#[test]
fn scenario_d_double_speed_halves_waits() {
    let waits_at = |speed: f64| {
        let (mut session, _) = two_process_session();
        session.set_speed(speed).unwrap();
        let clock = ManualClock::new();
        session
            .play(&clock, &mut |_, _, _: &PlaybackEvent| {})
            .unwrap();
        clock.waits()
    };

    let normal = waits_at(1.0);
    let double = waits_at(2.0);
    assert_eq!(normal, vec![Duration::from_millis(1000), Duration::from_millis(600)]);
    assert_eq!(double, vec![Duration::from_millis(500), Duration::from_millis(300)]);

    // Very high speeds hit the 100 ms floor.
    let capped = waits_at(50.0);
    assert_eq!(capped, vec![Duration::from_millis(100), Duration::from_millis(100)]);
}

#[test]
fn pause_then_resume_keeps_segment_order() {
    let (mut session, _) = two_process_session();
    let handle = session.playback_handle();
    let clock = ManualClock::new();
    let mut trace = Vec::new();
    let mut paused_once = false;

    let outcome = session
        .play(&clock, &mut |_, _, e: &PlaybackEvent| {
            if matches!(e, PlaybackEvent::Highlight { index: 0, state: HighlightState::Running, .. })
                && !paused_once
            {
                paused_once = true;
                handle.pause();
            }
            trace.push(e.clone());
        })
        .unwrap();
    assert_eq!(outcome, RunOutcome::Paused);
    assert_eq!(session.status(), &Status::Paused);
    assert_eq!(session.cursor(), 0);

    session
        .play(&clock, &mut |_, _, e: &PlaybackEvent| trace.push(e.clone()))
        .unwrap();

    assert!(trace.contains(&PlaybackEvent::Resumed { cursor: 0 }));
    assert_eq!(
        highlight_trace(&trace),
        vec![
            ("P1".to_string(), HighlightState::Running),
            ("P1".to_string(), HighlightState::Done),
            ("P2".to_string(), HighlightState::Running),
            ("P2".to_string(), HighlightState::Done),
        ]
    );
    assert_eq!(session.status(), &Status::Finished);
}

#[test]
fn new_run_replaces_finished_playback() {
    let (mut session, mut surface) = two_process_session();
    session
        .play(&ManualClock::new(), &mut |_, _, _: &PlaybackEvent| {})
        .unwrap();
    assert_eq!(session.phase(), PlaybackPhase::Finished);

    session
        .run_simulation(
            &ReplayBackend::new(response(json!([{"pid": "P2", "start": 0, "end": 3}]))),
            &mut surface,
        )
        .unwrap();
    assert_eq!(session.phase(), PlaybackPhase::Idle);
    assert_eq!(session.cursor(), 0);
    assert!(session.table().rows().iter().all(|r| r.highlight.is_none()));
    assert_eq!(session.timeline().map(|t| t.len()), Some(1));
}
