#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{Value, json};

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_schedviz") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) { "schedviz.exe" } else { "schedviz" };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve schedviz binary path for integration test"),
    }
}

/// Run the binary with `home` as `$HOME`, so preferences and the activity
/// log land in a scratch directory.
pub fn run_cli_case_in(case_name: &str, home: &Path, args: &[&str]) -> CmdResult {
    let root = std::env::temp_dir().join("schedviz-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");

    let log_path = root.join(format!("{}-{}.log", sanitize(case_name), now_millis()));
    let bin_path = resolve_bin_path();

    let output = Command::new(&bin_path)
        .args(args)
        .env("HOME", home)
        .env_remove("SCHEDVIZ_OUTPUT_FORMAT")
        .env_remove("SCHEDVIZ_BACKEND_URL")
        .env_remove("SCHEDVIZ_PREFERENCES_FILE")
        .env_remove("SCHEDVIZ_ACTIVITY_LOG")
        .env_remove("SCHEDVIZ_CHART_OUTPUT")
        .env("RUST_BACKTRACE", "1")
        .current_dir(home)
        .output()
        .expect("execute schedviz command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let mut log_content = String::new();
    log_content.push_str(&format!("case={case_name}\n"));
    log_content.push_str(&format!("bin={}\n", bin_path.display()));
    log_content.push_str(&format!("args={args:?}\n"));
    log_content.push_str(&format!("status={}\n", output.status));
    log_content.push_str("----- stdout -----\n");
    log_content.push_str(&stdout);
    log_content.push('\n');
    log_content.push_str("----- stderr -----\n");
    log_content.push_str(&stderr);
    log_content.push('\n');
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}

pub fn run_cli_case(case_name: &str, args: &[&str]) -> CmdResult {
    let home = tempfile::tempdir().expect("create scratch home");
    run_cli_case_in(case_name, home.path(), args)
}

/// Response for P1(0,5) P2(1,3) P3(2,1) with quantum 2.
pub fn sample_response() -> Value {
    json!({
        "timeline": [
            {"pid": "P1", "start": 0, "end": 2},
            {"pid": "P2", "start": 2, "end": 4},
            {"pid": "P3", "start": 4, "end": 5},
            {"pid": "P1", "start": 5, "end": 7},
            {"pid": "P2", "start": 7, "end": 8},
            {"pid": "P1", "start": 8, "end": 9}
        ],
        "metrics": [
            {"pid": "P1", "arrival_time": 0, "burst_time": 5, "completion_time": 9,
             "waiting_time": 4, "turnaround_time": 9},
            {"pid": "P2", "arrival_time": 1, "burst_time": 3, "completion_time": 8,
             "waiting_time": 4, "turnaround_time": 7},
            {"pid": "P3", "arrival_time": 2, "burst_time": 1, "completion_time": 5,
             "waiting_time": 2, "turnaround_time": 3}
        ],
        "averages": {"avg_turnaround_time": 6.333_333, "avg_waiting_time": 3.333_333}
    })
}

pub fn write_json(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string_pretty(value).expect("serialize")).expect("write json");
    path
}
