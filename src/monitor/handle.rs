//! Process handle abstraction and the probe type every sampling call returns.

use serde::{Deserialize, Serialize};

use std::time::Duration;

use crate::CmdperfResult;

/// Cumulative CPU time charged to one process, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuTimes {
    pub user: f64,
    pub system: f64,
}

impl CpuTimes {
    pub fn new(user: f64, system: f64) -> Self {
        Self { user, system }
    }

    pub fn total(&self) -> f64 {
        self.user + self.system
    }
}

/// Why a probe produced no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unavailable {
    /// The process exited (or was never visible) when the probe ran.
    Vanished,
    AccessDenied,
    /// The OS answered but the data could not be interpreted.
    Unreadable,
}

/// Result of one sampling call. A vanished process is an expected race, not an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Probe<T> {
    Available(T),
    Unavailable(Unavailable),
}

impl<T> Probe<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Self::Available(v) => Some(v),
            Self::Unavailable(_) => None,
        }
    }
}

impl<T: Default> Probe<T> {
    pub fn unwrap_or_default(self) -> T {
        self.ok().unwrap_or_default()
    }
}

impl<T> From<std::io::Error> for Probe<T> {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::Unavailable(Unavailable::Vanished),
            std::io::ErrorKind::PermissionDenied => Self::Unavailable(Unavailable::AccessDenied),
            _ => Self::Unavailable(Unavailable::Unreadable),
        }
    }
}

/// How a reaped process ended. `code` is absent when a signal killed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Termination {
    pub code: Option<i32>,
    pub signal: Option<i32>,
}

impl Termination {
    pub fn exited(code: i32) -> Self {
        Self { code: Some(code), signal: None }
    }

    pub fn signaled(signal: i32) -> Self {
        Self { code: None, signal: Some(signal) }
    }
}

impl From<std::process::ExitStatus> for Termination {
    fn from(status: std::process::ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = std::os::unix::process::ExitStatusExt::signal(&status);
        #[cfg(not(unix))]
        let signal = None;
        Self {
            code: status.code(),
            signal,
        }
    }
}

/// One spawned OS process plus read access to its live descendants.
///
/// Descendants are addressed by pid. Every query tolerates the target having
/// exited already; only the wait calls can fail.
pub trait ProcessHandle {
    fn pid(&self) -> u32;

    /// Non-blocking exit check. Once `Some`, the process is reaped.
    fn poll(&mut self) -> std::io::Result<Option<Termination>>;

    /// Blocks for at most `timeout`; `None` means still running.
    fn wait_timeout(&mut self, timeout: Duration) -> std::io::Result<Option<Termination>>;

    fn wait(&mut self) -> std::io::Result<Termination>;

    /// Recursive snapshot of live descendants. Empty once the target is gone.
    fn children(&mut self) -> Vec<u32>;

    /// Resident memory of `pid` in bytes.
    fn memory_info(&mut self, pid: u32) -> Probe<u64>;

    fn cpu_times(&mut self, pid: u32) -> Probe<CpuTimes>;

    /// Idempotent: killing a dead process is not an error.
    fn kill(&mut self, pid: u32);
}

/// Starts processes for the monitor loop.
pub trait Launcher {
    type Handle: ProcessHandle;

    /// Starts `argv` with inherited standard streams.
    fn spawn(&mut self, argv: &[String]) -> CmdperfResult<Self::Handle>;
}
