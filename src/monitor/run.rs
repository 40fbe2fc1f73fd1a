//! Monitor loop: spawn, sample, enforce the timeout, reap.

use serde::Serialize;

use std::time::{Duration, Instant};

use crate::{
    CmdperfResult, CpuTimes, DEFAULT_GRACE, Launcher, PeakTracker, ProcessHandle, TimeoutEnforcer,
    kill_tree, reap, sample,
};

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorOptions {
    pub interval: Duration,
    pub timeout: Option<Duration>,
    pub grace: Duration,
    pub include_children: bool,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            timeout: None,
            grace: DEFAULT_GRACE,
            include_children: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    Starting,
    Running,
    Completed,
    TimedOut,
    LaunchFailed,
    Reaped,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonitorOutcome {
    pub exit_code: Option<i32>,
    pub term_signal: Option<i32>,
    pub peak_memory_bytes: u64,
    pub peak_cpu_times: CpuTimes,
    pub timed_out: bool,
    pub samples: usize,
}

/// One bounded run of a single command.
#[derive(Debug)]
pub struct Monitor<'a> {
    options: &'a MonitorOptions,
    state: MonitorState,
}

impl<'a> Monitor<'a> {
    pub fn new(options: &'a MonitorOptions) -> Self {
        Self {
            options,
            state: MonitorState::Starting,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Runs `argv` to completion or timeout. A timeout is a normal outcome;
    /// errors are launch failures, wait failures, or a failed reap.
    pub fn run<L: Launcher>(&mut self, launcher: &mut L, argv: &[String]) -> CmdperfResult<MonitorOutcome> {
        self.transition(MonitorState::Starting);
        let mut handle = match launcher.spawn(argv) {
            Ok(handle) => handle,
            Err(err) => {
                self.transition(MonitorState::LaunchFailed);
                return Err(err);
            }
        };
        self.transition(MonitorState::Running);

        let mut peaks = PeakTracker::new();
        let enforcer = TimeoutEnforcer::new(Instant::now(), self.options.timeout);
        let driven = self.drive(&mut handle, &mut peaks, &enforcer);

        let reaped = reap(&mut handle, self.options.grace);
        self.transition(MonitorState::Reaped);
        let termination = reaped?;
        let timed_out = driven?;

        let outcome = MonitorOutcome {
            exit_code: termination.code,
            term_signal: termination.signal,
            peak_memory_bytes: peaks.peak_memory(),
            peak_cpu_times: peaks.peak_cpu(),
            timed_out,
            samples: peaks.samples(),
        };
        tracing::debug!(
            pid = handle.pid(),
            exit_code = ?outcome.exit_code,
            peak_memory_bytes = outcome.peak_memory_bytes,
            samples = outcome.samples,
            timed_out,
            "monitor finished"
        );
        Ok(outcome)
    }

    /// Returns whether the run timed out.
    fn drive<H: ProcessHandle>(
        &mut self,
        handle: &mut H,
        peaks: &mut PeakTracker,
        enforcer: &TimeoutEnforcer,
    ) -> CmdperfResult<bool> {
        let include_children = self.options.include_children;
        // Covers processes that finish before the first interval.
        peaks.observe(&sample(handle, include_children));
        loop {
            let exited = handle.poll()?;
            peaks.observe(&sample(handle, include_children));
            if exited.is_some() {
                self.transition(MonitorState::Completed);
                return Ok(false);
            }
            let now = Instant::now();
            if enforcer.expired(now) {
                tracing::info!(
                    pid = handle.pid(),
                    "timeout after {:?}; killing process tree",
                    enforcer.elapsed(now)
                );
                kill_tree(handle);
                handle.wait()?;
                self.transition(MonitorState::TimedOut);
                return Ok(true);
            }
            std::thread::sleep(self.options.interval);
        }
    }

    fn transition(&mut self, next: MonitorState) {
        tracing::debug!(from = ?self.state, to = ?next, "monitor state");
        self.state = next;
    }
}
