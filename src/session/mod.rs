//! One viewer session: the process table, the last simulation result, the
//! chart, playback, and preferences.
//!
//! The session is the single owner of the current timeline. A successful run
//! replaces it as a whole; render and playback only read it.

pub mod status;

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use crate::backend::{Averages, ProcessMetric, SimulationBackend, SimulationRequest, SimulationResponse};
use crate::core::config::Config;
use crate::core::errors::{Result, VizError};
use crate::logger::{ActivityEvent, ActivityLog};
use crate::playback::{
    Clock, Control, ControlChannel, PlaybackController, PlaybackEvent, PlaybackHandle,
    PlaybackListener, PlaybackPhase, PlaybackTiming, RunOutcome, SpeedMultiplier,
};
use crate::prefs::{PreferenceStore, UserPreferences};
use crate::render::{ChartPalette, DrawSurface, GanttLayout, GanttRenderer, ThemeMode};
use crate::table::{HighlightSink, HighlightState, ProcessTable};
use crate::timeline::model::Timeline;

pub use status::{Notice, Status};

/// Summary text shown before any run.
pub const NO_RESULTS: &str = "No results yet";

/// Callback invoked after every playback event, with the table already
/// updated.
pub type PlaybackHook<'a> = dyn FnMut(&ProcessTable, &Status, &PlaybackEvent) + 'a;

/// Viewer session state.
#[derive(Debug)]
pub struct Session {
    table: ProcessTable,
    quantum: u32,
    timeline: Option<Arc<Timeline>>,
    metrics: Vec<ProcessMetric>,
    averages: Option<Averages>,
    status: Status,
    notices: Vec<Notice>,
    controller: PlaybackController,
    control: ControlChannel,
    renderer: GanttRenderer,
    prefs: PreferenceStore,
    log: ActivityLog,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(
            &Config::default(),
            PreferenceStore::in_memory(UserPreferences::default()),
            ActivityLog::default(),
        )
    }
}

impl Session {
    /// New session with the three default table rows.
    #[must_use]
    pub fn new(config: &Config, prefs: PreferenceStore, log: ActivityLog) -> Self {
        let current = prefs.current();
        Self {
            table: ProcessTable::with_default_rows(),
            quantum: config.backend.default_quantum,
            timeline: None,
            metrics: Vec::new(),
            averages: None,
            status: Status::Idle,
            notices: Vec::new(),
            controller: PlaybackController::new(
                PlaybackTiming::from(&config.playback),
                current.speed,
            ),
            control: ControlChannel::new(),
            renderer: GanttRenderer::new(
                GanttLayout::from(&config.render),
                ChartPalette::from_mode(ThemeMode::from_dark_flag(current.dark_mode)),
            ),
            prefs,
            log,
        }
    }

    /// Replace the chart layout (terminal sizing, zoom).
    #[must_use]
    pub fn with_layout(mut self, layout: GanttLayout) -> Self {
        let palette = *self.renderer.palette();
        self.renderer = GanttRenderer::new(layout, palette);
        self
    }

    /// Swap the chart layout in place.
    pub fn set_layout(&mut self, layout: GanttLayout) {
        let palette = *self.renderer.palette();
        self.renderer = GanttRenderer::new(layout, palette);
    }

    // ──────────────────── accessors ────────────────────

    #[must_use]
    pub fn table(&self) -> &ProcessTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut ProcessTable {
        &mut self.table
    }

    #[must_use]
    pub fn quantum(&self) -> u32 {
        self.quantum
    }

    /// Set the round-robin quantum; zero becomes 1.
    pub fn set_quantum(&mut self, quantum: u32) {
        self.quantum = quantum.max(1);
    }

    #[must_use]
    pub fn timeline(&self) -> Option<&Arc<Timeline>> {
        self.timeline.as_ref()
    }

    #[must_use]
    pub fn metrics(&self) -> &[ProcessMetric] {
        &self.metrics
    }

    #[must_use]
    pub fn status(&self) -> &Status {
        &self.status
    }

    #[must_use]
    pub fn phase(&self) -> PlaybackPhase {
        self.controller.phase()
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.controller.cursor()
    }

    #[must_use]
    pub fn preferences(&self) -> UserPreferences {
        self.prefs.current()
    }

    #[must_use]
    pub fn renderer(&self) -> &GanttRenderer {
        &self.renderer
    }

    /// Sender for commands to a running [`play`](Self::play).
    #[must_use]
    pub fn playback_handle(&self) -> PlaybackHandle {
        self.control.handle()
    }

    /// Block for the next command while nothing is playing.
    pub fn recv_control(&self) -> Result<Control> {
        self.control
            .receiver()
            .recv()
            .map_err(|_| VizError::ChannelClosed {
                component: "playback control",
            })
    }

    /// Pending notices, oldest first; the queue is emptied.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn log_mut(&mut self) -> &mut ActivityLog {
        &mut self.log
    }

    /// Averages as two-decimal strings, `-` before any run.
    #[must_use]
    pub fn averages_text(&self) -> (String, String) {
        self.averages.map_or_else(
            || ("-".to_string(), "-".to_string()),
            |a| a.formatted(),
        )
    }

    /// One line per metric, or [`NO_RESULTS`].
    #[must_use]
    pub fn summary_text(&self) -> String {
        if self.metrics.is_empty() {
            return NO_RESULTS.to_string();
        }
        self.metrics
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    // ──────────────────── simulation ────────────────────

    /// Request built from the table rows. An empty table raises the
    /// "add a process" notice.
    pub fn build_request(&mut self) -> Result<SimulationRequest> {
        match self.table.to_specs() {
            Ok(processes) => Ok(SimulationRequest {
                processes,
                quantum: self.quantum,
            }),
            Err(e) => {
                if matches!(e, VizError::EmptyProcessTable) {
                    self.notices.push(Notice::AddProcess);
                }
                Err(e)
            }
        }
    }

    /// Submit the table to `backend`, then draw and install the result.
    ///
    /// Returns the raw response payload on success. On a backend failure
    /// the previous timeline, chart, and metrics stay as they were. A
    /// response with an invalid timeline clears the chart and drops the
    /// previous timeline.
    pub fn run_simulation<S>(&mut self, backend: &dyn SimulationBackend, surface: &mut S) -> Result<Value>
    where
        S: DrawSurface + ?Sized,
    {
        let request = self.build_request()?;
        self.status = Status::CallingBackend;
        self.log.record(ActivityEvent::SimulationRequested {
            backend: backend.name().to_string(),
            processes: request.processes.len(),
            quantum: request.quantum,
        });

        let started = Instant::now();
        let outcome = backend
            .simulate_raw(&request)
            .and_then(|raw| SimulationResponse::from_value(&raw).map(|resp| (raw, resp)));

        match outcome {
            Ok((raw, response)) => {
                let segments = response.timeline.len();
                self.install(response, surface);
                self.log.record(ActivityEvent::SimulationCompleted {
                    backend: backend.name().to_string(),
                    segments,
                    duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                });
                Ok(raw)
            }
            Err(err @ VizError::InvalidTimeline { .. }) => {
                self.controller.reset(&mut self.table);
                self.timeline = None;
                self.renderer.draw(None, surface);
                self.status = Status::Error(err.to_string());
                self.log.record(ActivityEvent::TimelineRejected {
                    message: err.to_string(),
                });
                Err(err)
            }
            Err(err) => {
                let message = match &err {
                    VizError::Backend { details } => details.clone(),
                    other => other.to_string(),
                };
                self.status = Status::Error(message.clone());
                self.notices.push(Notice::BackendError {
                    message,
                    location: backend.location(),
                });
                self.log
                    .record(ActivityEvent::simulation_failed(backend.name(), &err));
                Err(err)
            }
        }
    }

    fn install<S>(&mut self, response: SimulationResponse, surface: &mut S)
    where
        S: DrawSurface + ?Sized,
    {
        // A new result invalidates any cursor into the old timeline.
        self.controller.reset(&mut self.table);
        self.renderer.draw(Some(response.timeline.as_ref()), surface);
        self.table.apply_metrics(&response.metrics);
        self.averages = Some(response.averages);
        self.metrics = response.metrics;
        self.timeline = Some(response.timeline);
        self.status = Status::Ready;
    }

    /// Redraw the current timeline (blank when there is none).
    pub fn render<S>(&self, surface: &mut S) -> usize
    where
        S: DrawSurface + ?Sized,
    {
        self.renderer.draw(self.timeline.as_deref(), surface)
    }

    // ──────────────────── playback ────────────────────

    /// Play (or resume) the current timeline until it finishes, is reset,
    /// or is detached. Commands arrive through [`playback_handle`](Self::playback_handle).
    ///
    /// Without a timeline this raises the "run first" notice and returns
    /// [`VizError::NoTimeline`] with the status unchanged.
    pub fn play(&mut self, clock: &dyn Clock, hook: &mut PlaybackHook<'_>) -> Result<RunOutcome> {
        let playable = self.timeline.as_ref().is_some_and(|t| !t.is_empty());
        if !playable && self.controller.phase() != PlaybackPhase::Paused {
            self.notices.push(Notice::RunFirst);
            return Err(VizError::NoTimeline);
        }

        let speed = self.controller.speed().get();
        let mut listener = SessionListener {
            table: &mut self.table,
            status: &mut self.status,
            log: &mut self.log,
            speed,
            hook,
        };
        crate::playback::run(
            &mut self.controller,
            self.timeline.as_ref(),
            self.control.receiver(),
            clock,
            &mut listener,
        )
    }

    /// Pause outside of a running [`play`](Self::play). No-op unless playing.
    pub fn pause(&mut self) -> bool {
        let Some(event) = self.controller.pause() else {
            return false;
        };
        self.status = Status::Paused;
        self.log_playback(&event);
        true
    }

    /// Stop playback, clear highlights, cursor back to 0.
    pub fn reset(&mut self) {
        let event = self.controller.reset(&mut self.table);
        self.control.drain();
        self.status = Status::Reset;
        self.log_playback(&event);
    }

    fn log_playback(&mut self, event: &PlaybackEvent) {
        let speed = self.controller.speed().get();
        if let Some(activity) = ActivityEvent::from_playback(event, speed) {
            self.log.record(activity);
        }
    }

    /// Empty the table, results, timeline, playback, and chart.
    pub fn clear<S>(&mut self, surface: &mut S)
    where
        S: DrawSurface + ?Sized,
    {
        self.controller.reset(&mut self.table);
        self.control.drain();
        self.table.clear();
        self.metrics.clear();
        self.averages = None;
        self.timeline = None;
        surface.clear();
        self.status = Status::Cleared;
        self.log.record(ActivityEvent::TableCleared);
    }

    // ──────────────────── preferences ────────────────────

    /// Change playback speed and persist it. Takes effect at the next
    /// segment wait.
    pub fn set_speed(&mut self, value: f64) -> Result<()> {
        let speed = SpeedMultiplier::new(value)?;
        self.controller.set_speed(speed);
        self.prefs.set_speed(speed)?;
        self.log_preferences();
        Ok(())
    }

    /// Switch chart theme and persist it. Redraw to see the change.
    pub fn set_dark_mode(&mut self, dark: bool) -> Result<()> {
        self.renderer
            .set_palette(ChartPalette::from_mode(ThemeMode::from_dark_flag(dark)));
        self.prefs.set_dark_mode(dark)?;
        self.log_preferences();
        Ok(())
    }

    /// Forget stored preferences: light theme, speed 1.
    pub fn reset_settings(&mut self) -> Result<()> {
        self.prefs.reset()?;
        self.renderer.set_palette(ChartPalette::light());
        self.controller.set_speed(SpeedMultiplier::NORMAL);
        self.notices.push(Notice::SettingsReset);
        self.log.record(ActivityEvent::PreferencesReset);
        Ok(())
    }

    fn log_preferences(&mut self) {
        let current = self.prefs.current();
        self.log.record(ActivityEvent::PreferencesSaved {
            dark_mode: current.dark_mode,
            speed: current.speed.get(),
        });
    }
}

// ──────────────────── playback listener ────────────────────

struct SessionListener<'a, 'h> {
    table: &'a mut ProcessTable,
    status: &'a mut Status,
    log: &'a mut ActivityLog,
    speed: f64,
    hook: &'a mut PlaybackHook<'h>,
}

impl HighlightSink for SessionListener<'_, '_> {
    fn highlight(&mut self, pid: &str, state: HighlightState) {
        self.table.highlight(pid, state);
    }

    fn clear_all(&mut self) {
        self.table.clear_all();
    }
}

impl PlaybackListener for SessionListener<'_, '_> {
    fn on_event(&mut self, event: &PlaybackEvent) {
        match event {
            PlaybackEvent::Started { .. } | PlaybackEvent::Resumed { .. } => {
                *self.status = Status::Playing;
            }
            PlaybackEvent::Paused { .. } => *self.status = Status::Paused,
            PlaybackEvent::Reset => *self.status = Status::Reset,
            PlaybackEvent::Finished => *self.status = Status::Finished,
            PlaybackEvent::SpeedChanged { speed } => self.speed = *speed,
            PlaybackEvent::Highlight { .. } => {}
        }
        if let Some(activity) = ActivityEvent::from_playback(event, self.speed) {
            self.log.record(activity);
        }
        (self.hook)(self.table, self.status, event);
    }
}
