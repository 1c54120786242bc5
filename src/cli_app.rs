//! Top-level CLI definition and dispatch.

use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use schedviz::backend::http::HttpBackend;
use schedviz::backend::{ReplayBackend, SimulationResponse};
use schedviz::cli::player::{self, PlayerOptions};
use schedviz::cli::{load_process_file, table_from_metrics};
use schedviz::core::config::Config;
use schedviz::core::errors::VizError;
use schedviz::logger::ActivityLog;
use schedviz::logger::jsonl::JsonlConfig;
use schedviz::playback::SpeedMultiplier;
use schedviz::prefs::{self, PreferenceStore, SessionOverrides};
use schedviz::render::svg::SvgSurface;
use schedviz::render::{GanttLayout, RecordingSurface};
use schedviz::session::Session;

/// schedviz: CPU-scheduling Gantt viewer.
#[derive(Debug, Parser)]
#[command(
    name = "schedviz",
    author,
    version,
    about = "Round-robin scheduling timelines as Gantt charts, with terminal playback",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Mirror activity log lines to stderr.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Quiet mode (errors only).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Simulate a process table and draw the Gantt chart.
    Run(RunArgs),
    /// Draw the chart for a saved simulation response.
    Render(RenderArgs),
    /// Play a saved simulation response in the terminal.
    Play(PlayArgs),
    /// Show or change saved viewer preferences.
    Prefs(PrefsArgs),
    /// Show configuration.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

/// Per-invocation display settings; never saved.
#[derive(Debug, Clone, Args, Default)]
struct DisplayArgs {
    /// Dark chart theme.
    #[arg(long, conflicts_with = "light")]
    dark: bool,
    /// Light chart theme.
    #[arg(long)]
    light: bool,
    /// Playback speed multiplier.
    #[arg(long, value_parser = parse_speed, value_name = "FACTOR")]
    speed: Option<SpeedMultiplier>,
    /// Horizontal zoom factor for the SVG chart.
    #[arg(long, value_name = "FACTOR")]
    zoom: Option<f64>,
}

impl DisplayArgs {
    fn overrides(&self) -> SessionOverrides {
        let dark_mode = match (self.dark, self.light) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        SessionOverrides {
            dark_mode,
            speed: self.speed,
        }
    }
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
    /// Process as PID:ARRIVAL:BURST; repeat for more. Defaults to P1:0:5 P2:1:3 P3:2:1.
    #[arg(short, long = "process", value_name = "PID:ARRIVAL:BURST", conflicts_with = "input")]
    processes: Vec<String>,
    /// Read processes from a JSON list or a PID:ARRIVAL:BURST text file.
    #[arg(short, long, value_name = "PATH")]
    input: Option<PathBuf>,
    /// Round-robin time quantum.
    #[arg(long, value_name = "UNITS", value_parser = clap::value_parser!(u32).range(1..))]
    quantum: Option<u32>,
    /// Simulation service URL.
    #[arg(long, value_name = "URL")]
    backend_url: Option<String>,
    /// Where to write the SVG chart.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Save the raw service response for `render`/`play`.
    #[arg(long, value_name = "PATH")]
    save_response: Option<PathBuf>,
    /// Play the result in the terminal after drawing it.
    #[arg(long)]
    play: bool,
    #[command(flatten)]
    display: DisplayArgs,
}

#[derive(Debug, Clone, Args)]
struct RenderArgs {
    /// Saved simulation response (JSON).
    #[arg(value_name = "RESPONSE")]
    response: PathBuf,
    /// Where to write the SVG chart.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
    #[command(flatten)]
    display: DisplayArgs,
}

#[derive(Debug, Clone, Args)]
struct PlayArgs {
    /// Saved simulation response (JSON).
    #[arg(value_name = "RESPONSE")]
    response: PathBuf,
    #[command(flatten)]
    display: DisplayArgs,
}

#[derive(Debug, Clone, Args)]
struct PrefsArgs {
    #[command(subcommand)]
    command: Option<PrefsCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum PrefsCommand {
    /// Print saved preferences.
    Show,
    /// Save the chart theme.
    Theme {
        #[arg(value_enum)]
        mode: ThemeChoice,
    },
    /// Save the playback speed multiplier.
    Speed {
        #[arg(value_parser = parse_speed, value_name = "FACTOR")]
        value: SpeedMultiplier,
    },
    /// Forget saved preferences.
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ThemeChoice {
    Light,
    Dark,
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print the config file path.
    Path,
    /// Print the effective configuration.
    Show,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input or configuration.
    #[error("{0}")]
    User(String),
    /// Service, filesystem, or terminal failure.
    #[error("{0}")]
    Runtime(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Json(_) => 3,
        }
    }
}

impl From<VizError> for CliError {
    fn from(err: VizError) -> Self {
        let user = err.is_user_prompt()
            || matches!(
                err,
                VizError::InvalidConfig { .. }
                    | VizError::MissingConfig { .. }
                    | VizError::ConfigParse { .. }
            );
        if user {
            Self::User(err.to_string())
        } else {
            Self::Runtime(err.to_string())
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Run(args) => run_simulate(cli, args),
        Command::Render(args) => run_render(cli, args),
        Command::Play(args) => run_play(cli, args),
        Command::Prefs(args) => run_prefs(cli, args),
        Command::Config(args) => run_config(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

// ──────────────────── commands ────────────────────

fn run_simulate(cli: &Cli, args: &RunArgs) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;
    let mut session = viewer_session(cli, &config, &args.display);
    session.set_quantum(args.quantum.unwrap_or(config.backend.default_quantum));

    if let Some(path) = &args.input {
        load_process_file(session.table_mut(), path)?;
    } else if !args.processes.is_empty() {
        let table = session.table_mut();
        table.clear();
        for raw in &args.processes {
            table.add_from_spec_str(raw)?;
        }
    }

    let url = args
        .backend_url
        .clone()
        .unwrap_or_else(|| config.backend.url.clone());
    let backend = HttpBackend::new(url, Duration::from_secs(config.backend.timeout_secs))?;

    let mut svg = SvgSurface::new();
    let result = session.run_simulation(&backend, &mut svg);
    report_notices(cli, &mut session);
    let raw = result?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config.paths.chart_output.clone());
    let written = write_chart(&svg, &output)?;
    if let Some(path) = &args.save_response {
        save_response(&raw, path)?;
    }
    emit_result(cli, "run", &session, &written)?;

    if args.play {
        play_session(cli, &mut session)?;
    }
    Ok(())
}

fn run_render(cli: &Cli, args: &RenderArgs) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;
    let mut session = viewer_session(cli, &config, &args.display);
    let backend = load_replay(&mut session, &args.response)?;

    let mut svg = SvgSurface::new();
    let result = session.run_simulation(&backend, &mut svg);
    report_notices(cli, &mut session);
    result?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config.paths.chart_output.clone());
    let written = write_chart(&svg, &output)?;
    emit_result(cli, "render", &session, &written)
}

fn run_play(cli: &Cli, args: &PlayArgs) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;
    let mut session = viewer_session(cli, &config, &args.display);
    let backend = load_replay(&mut session, &args.response)?;

    let mut scratch = RecordingSurface::default();
    let result = session.run_simulation(&backend, &mut scratch);
    report_notices(cli, &mut session);
    result?;

    play_session(cli, &mut session)
}

fn run_prefs(cli: &Cli, args: &PrefsArgs) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;
    let store = PreferenceStore::open(config.paths.preferences_file.clone());
    let mut session = Session::new(&config, store, open_log(cli, &config));

    let label = match &args.command {
        None | Some(PrefsCommand::Show) => "prefs show",
        Some(PrefsCommand::Theme { mode }) => {
            session.set_dark_mode(*mode == ThemeChoice::Dark)?;
            "prefs theme"
        }
        Some(PrefsCommand::Speed { value }) => {
            session.set_speed(value.get())?;
            "prefs speed"
        }
        Some(PrefsCommand::Reset) => {
            session.reset_settings()?;
            "prefs reset"
        }
    };
    report_notices(cli, &mut session);
    session.log_mut().flush();

    let current = session.preferences();
    let theme = if current.dark_mode { "dark" } else { "light" };
    match output_mode(cli) {
        OutputMode::Human => {
            if !cli.quiet {
                println!("theme: {theme}");
                println!("speed: {}x", current.speed);
                println!("file:  {}", config.paths.preferences_file.display());
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "command": label,
                "dark_mode": current.dark_mode,
                "speed": current.speed.get(),
                "path": config.paths.preferences_file.to_string_lossy(),
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match &args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config path",
                        "path": path.to_string_lossy(),
                        "exists": exists,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = Config::load(cli.config.as_deref())?;

            match output_mode(cli) {
                OutputMode::Human => {
                    let toml_str = toml::to_string_pretty(&config)
                        .map_err(|e| CliError::Runtime(format!("serialize config: {e}")))?;
                    println!("{toml_str}");
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config show",
                        "config": serde_json::to_value(&config)?,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
    }
}

// ──────────────────── session helpers ────────────────────

/// Session with saved preferences merged with this invocation's display
/// flags. Changes made here are never written back.
fn viewer_session(cli: &Cli, config: &Config, display: &DisplayArgs) -> Session {
    let saved = PreferenceStore::open(config.paths.preferences_file.clone()).current();
    let effective = prefs::merge(&saved, &display.overrides());
    let mut session = Session::new(
        config,
        PreferenceStore::in_memory(effective),
        open_log(cli, config),
    );
    if let Some(zoom) = display.zoom {
        session.set_layout(GanttLayout::from(&config.render).zoomed(zoom));
    }
    session
}

fn open_log(cli: &Cli, config: &Config) -> ActivityLog {
    ActivityLog::open(
        JsonlConfig::at(config.paths.activity_log.clone()),
        cli.verbose,
    )
}

/// Replay backend for a saved response, with the table rebuilt from its
/// metrics so highlights have rows to land on.
fn load_replay(session: &mut Session, path: &Path) -> Result<ReplayBackend, CliError> {
    let backend = ReplayBackend::from_file(path)?;
    if let Ok(response) = SimulationResponse::from_value(backend.payload()) {
        table_from_metrics(session.table_mut(), &response.metrics);
    }
    Ok(backend)
}

fn play_session(cli: &Cli, session: &mut Session) -> Result<(), CliError> {
    if !io::stdout().is_terminal() {
        return Err(CliError::User(
            "playback needs an interactive terminal".to_string(),
        ));
    }
    let options = PlayerOptions {
        no_color: cli.no_color,
        autoplay: true,
    };
    let result = player::run(session, options);
    report_notices(cli, session);
    session.log_mut().flush();
    result?;
    if !cli.quiet {
        println!("{}", session.status());
    }
    Ok(())
}

fn report_notices(cli: &Cli, session: &mut Session) {
    for notice in session.take_notices() {
        if cli.no_color {
            eprintln!("notice: {notice}");
        } else {
            eprintln!("{} {notice}", "notice:".yellow().bold());
        }
    }
}

fn write_chart(svg: &SvgSurface, path: &Path) -> Result<PathBuf, CliError> {
    svg.write_to(path)
        .map_err(|e| CliError::Runtime(format!("failed to write chart {}: {e}", path.display())))
}

fn save_response(raw: &Value, path: &Path) -> Result<(), CliError> {
    let body = serde_json::to_string_pretty(raw)?;
    fs::write(path, body)
        .map_err(|e| CliError::Runtime(format!("failed to save response {}: {e}", path.display())))
}

fn emit_result(cli: &Cli, command: &str, session: &Session, chart: &Path) -> Result<(), CliError> {
    let (avg_turnaround, avg_waiting) = session.averages_text();
    match output_mode(cli) {
        OutputMode::Human => {
            if !cli.quiet {
                println!("{} {}", "chart:".green().bold(), chart.display());
                println!("{}", session.summary_text());
                println!("Avg turnaround: {avg_turnaround}   Avg waiting: {avg_waiting}");
                println!("{}", session.status());
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "command": command,
                "chart": chart.to_string_lossy(),
                "quantum": session.quantum(),
                "segments": session.timeline().map_or(0, |t| t.len()),
                "metrics": serde_json::to_value(session.metrics())?,
                "averages": {
                    "avg_turnaround_time": avg_turnaround,
                    "avg_waiting_time": avg_waiting,
                },
                "status": session.status().to_string(),
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn parse_speed(raw: &str) -> Result<SpeedMultiplier, String> {
    SpeedMultiplier::parse(raw).map_err(|e| e.to_string())
}

// ──────────────────── output ────────────────────

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("SCHEDVIZ_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}
