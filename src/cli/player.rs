//! Full-screen terminal player: the Gantt chart, the process table with
//! live highlights, and the status line.
//!
//! Keys are read on a helper thread and forwarded as playback commands, so
//! the main thread only blocks inside the playback loop. The terminal is
//! always restored, even when drawing fails.

#![allow(missing_docs)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::style::{
    Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};

use crate::core::errors::{Result, VizError};
use crate::playback::{Control, PlaybackEvent, PlaybackHandle, RunOutcome, SystemClock};
use crate::render::GanttLayout;
use crate::render::terminal::{Cell, CellSurface};
use crate::session::{Session, Status};
use crate::table::{HighlightState, ProcessTable};
use crate::timeline::color::Rgb;

const KEY_POLL: Duration = Duration::from_millis(50);
const HELP: &str = "space pause/resume   r reset   p play   q quit";
const TABLE_HEADER: &str = "PID       Arrival  Burst  Waiting  Turnaround";

// ──────────────────── options ────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerOptions {
    /// Plain text with `>`/`*` markers instead of colors.
    pub no_color: bool,
    /// Start playing right away instead of waiting for a key.
    pub autoplay: bool,
}

// ──────────────────── frame layout ────────────────────

/// One text line of the lower panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameLine {
    pub text: String,
    pub highlight: Option<HighlightState>,
}

impl FrameLine {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            highlight: None,
        }
    }
}

/// Table rows plus status, averages, and key help.
#[must_use]
pub fn frame_lines(table: &ProcessTable, status: &Status, averages: &(String, String)) -> Vec<FrameLine> {
    let mut lines = Vec::with_capacity(table.len() + 6);
    lines.push(FrameLine::plain(format!("  {TABLE_HEADER}")));
    for row in table.rows() {
        let marker = match row.highlight {
            Some(HighlightState::Running) => '>',
            Some(HighlightState::Done) => '*',
            None => ' ',
        };
        lines.push(FrameLine {
            text: format!(
                "{marker} {:<8}  {:>7}  {:>5}  {:>7}  {:>10}",
                row.pid(),
                row.arrival_input(),
                row.burst_input(),
                row.wait_text(),
                row.turnaround_text(),
            ),
            highlight: row.highlight,
        });
    }
    lines.push(FrameLine::plain(""));
    lines.push(FrameLine::plain(format!(
        "Avg turnaround: {}   Avg waiting: {}",
        averages.0, averages.1
    )));
    lines.push(FrameLine::plain(status.to_string()));
    lines.push(FrameLine::plain(HELP));
    lines
}

fn highlight_colors(state: HighlightState) -> (Color, Color) {
    match state {
        HighlightState::Running => (Color::Black, Color::Rgb { r: 255, g: 213, b: 79 }),
        HighlightState::Done => (Color::Black, Color::Rgb { r: 129, g: 199, b: 132 }),
    }
}

const fn rgb(c: Rgb) -> Color {
    Color::Rgb {
        r: c.r,
        g: c.g,
        b: c.b,
    }
}

// ──────────────────── key mapping ────────────────────

/// Command for a key press, if any.
#[must_use]
pub fn control_for_key(key: &KeyEvent) -> Option<Control> {
    match key.code {
        KeyCode::Char(' ') => Some(Control::TogglePause),
        KeyCode::Char('p') => Some(Control::Play),
        KeyCode::Char('r') => Some(Control::Reset),
        KeyCode::Char('q') | KeyCode::Esc => Some(Control::Detach),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Control::Detach),
        _ => None,
    }
}

fn spawn_key_reader(handle: PlaybackHandle, stop: Arc<AtomicBool>, interrupted: Arc<AtomicBool>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while !stop.load(Ordering::Relaxed) {
            if interrupted.swap(false, Ordering::Relaxed) {
                handle.send(Control::Reset);
                handle.send(Control::Detach);
                return;
            }
            match event::poll(KEY_POLL) {
                Ok(true) => {
                    if let Ok(Event::Key(key)) = event::read()
                        && let Some(control) = control_for_key(&key)
                    {
                        let detach = control == Control::Detach;
                        if !handle.send(control) || detach {
                            return;
                        }
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    eprintln!("[SV-PLAYER] key reader stopped: {e}");
                    handle.send(Control::Detach);
                    return;
                }
            }
        }
    })
}

// ──────────────────── entry point ────────────────────

/// Terminal layout squeezed so a `span`-unit timeline fits in `cols`.
#[must_use]
pub fn fit_layout(cols: u16, span: f64) -> GanttLayout {
    let layout = GanttLayout::terminal(cols);
    let cols = f64::from(cols.max(1));
    if span > cols {
        layout.zoomed(cols / span)
    } else {
        layout
    }
}

/// Run the player on the session's current timeline until the user quits.
pub fn run(session: &mut Session, options: PlayerOptions) -> Result<()> {
    let (cols, _) = terminal::size().map_err(terminal_error)?;
    let layout = fit_layout(cols, session.timeline().map_or(0.0, |t| t.span()));
    let mut chart = CellSurface::new(usize::from(cols), layout.height as usize);
    session.set_layout(layout);
    session.render(&mut chart);

    let interrupted = Arc::new(AtomicBool::new(false));
    if let Err(e) = signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&interrupted)) {
        eprintln!("[SV-PLAYER] SIGINT handler unavailable: {e}");
    }

    let mut stdout = io::stdout();
    terminal::enable_raw_mode().map_err(terminal_error)?;
    if let Err(e) = execute!(stdout, EnterAlternateScreen, Hide) {
        let _ = terminal::disable_raw_mode();
        return Err(terminal_error(e));
    }

    let stop = Arc::new(AtomicBool::new(false));
    let reader = spawn_key_reader(session.playback_handle(), Arc::clone(&stop), interrupted);

    let result = run_inner(&mut stdout, session, &chart, options);

    stop.store(true, Ordering::Relaxed);
    let _ = reader.join();
    let _ = execute!(stdout, Show, LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result
}

fn run_inner(
    stdout: &mut io::Stdout,
    session: &mut Session,
    chart: &CellSurface,
    options: PlayerOptions,
) -> Result<()> {
    let averages = session.averages_text();
    draw_frame(stdout, chart, session.table(), session.status(), &averages, options)
        .map_err(terminal_error)?;

    let mut play_now = options.autoplay;
    loop {
        if play_now {
            let mut draw_error: Option<io::Error> = None;
            let outcome = {
                let mut hook = |table: &ProcessTable, status: &Status, _event: &PlaybackEvent| {
                    if draw_error.is_none()
                        && let Err(e) = draw_frame(stdout, chart, table, status, &averages, options)
                    {
                        draw_error = Some(e);
                    }
                };
                session.play(&SystemClock, &mut hook)?
            };
            if let Some(e) = draw_error {
                return Err(terminal_error(e));
            }
            if outcome == RunOutcome::Detached {
                return Ok(());
            }
        }

        play_now = match session.recv_control()? {
            Control::Play | Control::TogglePause => true,
            Control::Reset => {
                session.reset();
                draw_frame(stdout, chart, session.table(), session.status(), &averages, options)
                    .map_err(terminal_error)?;
                false
            }
            Control::Detach => return Ok(()),
            Control::Pause | Control::SetSpeed(_) => false,
        };
    }
}

fn draw_frame(
    stdout: &mut io::Stdout,
    chart: &CellSurface,
    table: &ProcessTable,
    status: &Status,
    averages: &(String, String),
    options: PlayerOptions,
) -> io::Result<()> {
    queue!(stdout, MoveTo(0, 0), Clear(ClearType::All))?;
    queue!(
        stdout,
        SetAttribute(Attribute::Bold),
        Print("schedviz - round-robin timeline"),
        SetAttribute(Attribute::Reset)
    )?;

    let width = terminal::size().map_or(usize::MAX, |(cols, _)| usize::from(cols));
    let mut row: u16 = 2;
    for line in chart.lines() {
        queue!(stdout, MoveTo(0, row))?;
        draw_cells(stdout, &line[..line.len().min(width)], options.no_color)?;
        row = row.saturating_add(1);
    }
    row = row.saturating_add(1);

    for line in frame_lines(table, status, averages) {
        queue!(stdout, MoveTo(0, row))?;
        match line.highlight {
            Some(state) if !options.no_color => {
                let (fg, bg) = highlight_colors(state);
                queue!(
                    stdout,
                    SetForegroundColor(fg),
                    SetBackgroundColor(bg),
                    Print(&line.text),
                    ResetColor
                )?;
            }
            _ => queue!(stdout, Print(&line.text))?,
        }
        row = row.saturating_add(1);
    }

    stdout.flush()
}

fn draw_cells(stdout: &mut io::Stdout, cells: &[Cell], no_color: bool) -> io::Result<()> {
    for cell in cells {
        if no_color {
            let ch = if cell.ch == ' ' && cell.bg.is_some() { '#' } else { cell.ch };
            queue!(stdout, Print(ch))?;
            continue;
        }
        if let Some(bg) = cell.bg {
            queue!(stdout, SetBackgroundColor(rgb(bg)))?;
        }
        if let Some(fg) = cell.fg {
            queue!(stdout, SetForegroundColor(rgb(fg)))?;
        }
        queue!(stdout, Print(cell.ch), ResetColor)?;
    }
    Ok(())
}

fn terminal_error(e: io::Error) -> VizError {
    VizError::io("terminal", e)
}
