//! End-to-end runs against real executables.
#![cfg(unix)]

use std::path::PathBuf;
use std::time::{Duration, Instant};

use cmdperf::{
    BatchReport, CommandSpec, MonitorOptions, Profiler, ReportUnits, Reporter, RunRecord, run_batch,
    write_report,
};

fn spec(name: &str, command: &str) -> CommandSpec {
    CommandSpec {
        name: name.to_string(),
        command: command.to_string(),
    }
}

fn options(interval_ms: u64, timeout: Option<Duration>) -> MonitorOptions {
    MonitorOptions {
        interval: Duration::from_millis(interval_ms),
        timeout,
        grace: Duration::from_secs(2),
        include_children: true,
    }
}

fn temp_workspace(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("cmdperf-it-{name}-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("workspace");
    dir
}

#[test]
fn sleep_runs_to_completion() {
    let mut profiler = Profiler::host(options(100, None));
    let out = profiler.profile(&spec("sleepy", "sleep 2")).expect("profile");
    let p = &out.profile;
    assert_eq!(p.return_code, Some(0));
    assert!(!out.timed_out);
    assert!(p.total_time_nanos >= 1_900_000_000, "elapsed {}", p.total_time_nanos);
    assert!(p.total_time_nanos < 4_000_000_000, "elapsed {}", p.total_time_nanos);
    assert!(p.max_memory_bytes > 0);
}

#[test]
fn timeout_kills_long_sleep() {
    let mut profiler = Profiler::host(options(100, Some(Duration::from_secs(1))));
    let started = Instant::now();
    let out = profiler.profile(&spec("hang", "sleep 5")).expect("profile");
    assert!(out.timed_out);
    assert_eq!(out.profile.return_code, None);
    assert!(out.term_signal.is_some());
    assert!(
        out.profile.total_time_nanos >= 1_000_000_000,
        "elapsed {}",
        out.profile.total_time_nanos
    );
    assert!(started.elapsed() < Duration::from_secs(4));
}

/// Live unless `/proc/<pid>` is gone or the process is a zombie.
#[cfg(target_os = "linux")]
fn is_running(pid: u32) -> bool {
    let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) else {
        return false;
    };
    let state = stat
        .rfind(')')
        .and_then(|i| stat[i + 1..].split_whitespace().next())
        .unwrap_or("X");
    !matches!(state, "Z" | "X")
}

#[cfg(target_os = "linux")]
#[test]
fn timeout_reaches_grandchildren() {
    let ws = temp_workspace("tree");
    let pid_file = ws.join("grandchild.pid");
    let command = format!("sh -c 'sleep 30 & echo $! > {}; sleep 30; wait'", pid_file.display());
    let mut profiler = Profiler::host(options(50, Some(Duration::from_millis(600))));
    let started = Instant::now();
    let out = profiler.profile(&spec("tree", &command)).expect("profile");
    assert!(out.timed_out);
    assert!(started.elapsed() < Duration::from_secs(5));

    let grandchild: u32 = std::fs::read_to_string(&pid_file)
        .expect("pid file")
        .trim()
        .parse()
        .expect("pid");
    let deadline = Instant::now() + Duration::from_secs(1);
    while is_running(grandchild) && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(20));
    }
    assert!(!is_running(grandchild), "grandchild {grandchild} survived the timeout");
}

#[test]
fn instant_exit_still_reports() {
    let mut profiler = Profiler::host(options(100, None));
    let out = profiler.profile(&spec("t", "true")).expect("profile");
    assert_eq!(out.profile.return_code, Some(0));
    assert!(out.profile.user_time >= 0.0);
    assert!(out.profile.cpu_time >= 0.0);
}

#[test]
fn child_memory_counts_toward_peak() {
    let mut profiler = Profiler::host(options(50, None));
    let out = profiler
        .profile(&spec(
            "alloc",
            "sh -c 'dd if=/dev/zero of=/dev/null bs=32M count=100 2>/dev/null; sleep 0.3'",
        ))
        .expect("profile");
    assert_eq!(out.profile.return_code, Some(0));
    assert!(
        out.profile.max_memory_bytes >= 16 * 1024 * 1024,
        "peak {}",
        out.profile.max_memory_bytes
    );
}

#[test]
fn nonzero_exit_is_recorded() {
    let mut profiler = Profiler::host(options(50, None));
    let out = profiler.profile(&spec("f", "sh -c 'exit 7'")).expect("profile");
    assert_eq!(out.profile.return_code, Some(7));
    assert!(!out.timed_out);
}

#[test]
fn batch_survives_bad_commands_and_writes_csv() {
    let ws = temp_workspace("batch");
    let mut profiler = Profiler::host(options(50, None));
    let report: BatchReport = run_batch(
        &mut profiler,
        &[
            spec("quote", "echo 'unterminated"),
            spec("missing", "cmdperf-no-such-binary-xyz"),
            spec("ok", "true"),
        ],
    )
    .expect("batch");
    assert_eq!(report.failed_count(), 2);
    assert!(matches!(report.runs[2], RunRecord::Profiled(_)));

    let path = ws.join("nested").join("report.csv");
    write_report(&report, Reporter::Csv, &ReportUnits::default(), &path).expect("write");
    let csv = std::fs::read_to_string(&path).expect("read");
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("name,command,"));
    assert!(lines[1].starts_with("ok,true,"));
    assert!(lines[1].ends_with(",0"));
}

#[test]
fn json_report_keeps_failures() {
    let ws = temp_workspace("json");
    let mut profiler = Profiler::host(options(50, None));
    let report = run_batch(&mut profiler, &[spec("bad", ""), spec("ok", "true")]).expect("batch");
    let path = ws.join("report.json");
    write_report(&report, Reporter::Json, &ReportUnits::default(), &path).expect("write");
    let back: BatchReport =
        serde_json::from_slice(&std::fs::read(&path).expect("read")).expect("parse");
    assert_eq!(back.runs.len(), 2);
    assert_eq!(back.failed_count(), 1);
}
