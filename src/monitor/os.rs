//! Host OS adapter: `std::process::Child` for lifecycle, `sysinfo` for the
//! process table and RSS, `/proc/<pid>/stat` for user/system CPU split.

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

use std::collections::{HashMap, HashSet, VecDeque};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use crate::{CmdperfError, CmdperfResult, CpuTimes, Launcher, Probe, ProcessHandle, Termination, Unavailable};

/// Step used by `wait_timeout` between non-blocking exit checks.
const WAIT_POLL_STEP: Duration = Duration::from_millis(10);

#[derive(Debug, Default, Clone, Copy)]
pub struct OsLauncher;

impl Launcher for OsLauncher {
    type Handle = OsProcess;

    fn spawn(&mut self, argv: &[String]) -> CmdperfResult<OsProcess> {
        OsProcess::spawn(argv)
    }
}

pub struct OsProcess {
    child: Child,
    system: System,
    finished: Option<Termination>,
}

impl OsProcess {
    pub fn spawn(argv: &[String]) -> CmdperfResult<Self> {
        let Some((program, args)) = argv.split_first() else {
            return Err(CmdperfError::CommandParse {
                command: String::new(),
                reason: "empty argv".to_string(),
            });
        };
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| CmdperfError::Launch {
                program: program.clone(),
                source,
            })?;
        tracing::debug!(pid = child.id(), %program, "spawned");
        Ok(Self {
            child,
            system: System::new(),
            finished: None,
        })
    }

    fn refresh(&mut self, pid: u32, kind: ProcessRefreshKind) {
        self.system
            .refresh_processes_specifics(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]), true, kind);
    }
}

impl ProcessHandle for OsProcess {
    fn pid(&self) -> u32 {
        self.child.id()
    }

    fn poll(&mut self) -> std::io::Result<Option<Termination>> {
        if let Some(t) = self.finished {
            return Ok(Some(t));
        }
        let status = self.child.try_wait()?;
        self.finished = status.map(Termination::from);
        Ok(self.finished)
    }

    fn wait_timeout(&mut self, timeout: Duration) -> std::io::Result<Option<Termination>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(t) = self.poll()? {
                return Ok(Some(t));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            std::thread::sleep(WAIT_POLL_STEP.min(deadline - now));
        }
    }

    fn wait(&mut self) -> std::io::Result<Termination> {
        if let Some(t) = self.finished {
            return Ok(t);
        }
        let t = Termination::from(self.child.wait()?);
        self.finished = Some(t);
        Ok(t)
    }

    fn children(&mut self) -> Vec<u32> {
        if self.finished.is_some() {
            return Vec::new();
        }
        self.system
            .refresh_processes_specifics(ProcessesToUpdate::All, true, ProcessRefreshKind::nothing());
        let edges = self
            .system
            .processes()
            .iter()
            .filter(|(_, p)| p.thread_kind().is_none())
            .filter_map(|(pid, p)| p.parent().map(|parent| (pid.as_u32(), parent.as_u32())));
        descendants_of(self.pid(), edges)
    }

    fn memory_info(&mut self, pid: u32) -> Probe<u64> {
        self.refresh(pid, ProcessRefreshKind::nothing().with_memory());
        match self.system.process(Pid::from_u32(pid)) {
            Some(p) => Probe::Available(p.memory()),
            None => Probe::Unavailable(Unavailable::Vanished),
        }
    }

    #[cfg(target_os = "linux")]
    fn cpu_times(&mut self, pid: u32) -> Probe<CpuTimes> {
        match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
            Ok(stat) => match parse_proc_stat_times(&stat, clock_ticks_per_sec()) {
                Some(times) => Probe::Available(times),
                None => Probe::Unavailable(Unavailable::Unreadable),
            },
            Err(err) => err.into(),
        }
    }

    // Without procfs only the combined figure is exposed; it is reported as user time.
    #[cfg(not(target_os = "linux"))]
    fn cpu_times(&mut self, pid: u32) -> Probe<CpuTimes> {
        self.refresh(pid, ProcessRefreshKind::nothing().with_cpu());
        match self.system.process(Pid::from_u32(pid)) {
            Some(p) => Probe::Available(CpuTimes::new(p.accumulated_cpu_time() as f64 / 1000.0, 0.0)),
            None => Probe::Unavailable(Unavailable::Vanished),
        }
    }

    fn kill(&mut self, pid: u32) {
        if pid == self.pid() {
            if self.finished.is_none()
                && let Err(err) = self.child.kill()
            {
                tracing::trace!(pid, "kill failed: {err}");
            }
            return;
        }
        match self.system.process(Pid::from_u32(pid)) {
            Some(p) => {
                if !p.kill() {
                    tracing::trace!(pid, "kill signal not delivered");
                }
            }
            None => tracing::trace!(pid, "already gone"),
        }
    }
}

impl Drop for OsProcess {
    fn drop(&mut self) {
        if self.finished.is_none() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Breadth-first walk of `(pid, parent)` edges starting below `root`.
pub(crate) fn descendants_of(root: u32, edges: impl IntoIterator<Item = (u32, u32)>) -> Vec<u32> {
    let mut by_parent: HashMap<u32, Vec<u32>> = HashMap::new();
    for (pid, parent) in edges {
        by_parent.entry(parent).or_default().push(pid);
    }
    let mut seen = HashSet::from([root]);
    let mut out = Vec::new();
    let mut queue = VecDeque::from([root]);
    while let Some(parent) = queue.pop_front() {
        let Some(kids) = by_parent.get_mut(&parent) else {
            continue;
        };
        kids.sort_unstable();
        for &kid in kids.iter() {
            if seen.insert(kid) {
                out.push(kid);
                queue.push_back(kid);
            }
        }
    }
    out
}

/// Extracts utime/stime from a `/proc/<pid>/stat` line.
///
/// The command name may contain spaces and parentheses, so fields are counted
/// from the last `)`.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
pub(crate) fn parse_proc_stat_times(stat: &str, ticks_per_sec: f64) -> Option<CpuTimes> {
    let rest = &stat[stat.rfind(')')? + 1..];
    let fields: Vec<&str> = rest.split_whitespace().collect();
    let utime: u64 = fields.get(11)?.parse().ok()?;
    let stime: u64 = fields.get(12)?.parse().ok()?;
    Some(CpuTimes::new(utime as f64 / ticks_per_sec, stime as f64 / ticks_per_sec))
}

#[cfg(target_os = "linux")]
fn clock_ticks_per_sec() -> f64 {
    // SAFETY: sysconf has no preconditions and only reads a system constant.
    let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if ticks > 0 { ticks as f64 } else { 100.0 }
}
