//! Deterministic `ProcessHandle`/`Launcher` double for monitor tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use crate::{CmdperfError, CmdperfResult, CpuTimes, Launcher, Probe, ProcessHandle, Termination, Unavailable};

const SIGKILL: i32 = 9;

/// What the process tree looks like during one sample.
#[derive(Debug, Clone)]
pub(crate) struct Frame {
    memory: Probe<u64>,
    cpu: Probe<CpuTimes>,
    children: Vec<(u32, Probe<u64>)>,
}

impl Frame {
    pub(crate) fn rss(bytes: u64) -> Self {
        Self {
            memory: Probe::Available(bytes),
            cpu: Probe::Available(CpuTimes::default()),
            children: Vec::new(),
        }
    }

    pub(crate) fn gone() -> Self {
        Self {
            memory: Probe::Unavailable(Unavailable::Vanished),
            cpu: Probe::Unavailable(Unavailable::Vanished),
            children: Vec::new(),
        }
    }

    pub(crate) fn with_cpu(mut self, user: f64, system: f64) -> Self {
        self.cpu = Probe::Available(CpuTimes::new(user, system));
        self
    }

    pub(crate) fn with_child(mut self, pid: u32, memory: Probe<u64>) -> Self {
        self.children.push((pid, memory));
        self
    }
}

#[derive(Debug, Default)]
pub(crate) struct ScriptLog {
    pub killed: Vec<u32>,
    pub polls: usize,
    pub samples: usize,
    pub waits: usize,
}

pub(crate) struct ScriptedProcess {
    pid: u32,
    frames: Vec<Frame>,
    exit: Option<(usize, Termination)>,
    ignores_grace: bool,
    wait_fails: bool,
    poll_fails_at: Option<usize>,
    killed: bool,
    finished: Option<Termination>,
    log: Rc<RefCell<ScriptLog>>,
}

impl ScriptedProcess {
    pub(crate) fn new(pid: u32) -> Self {
        Self {
            pid,
            frames: vec![Frame::gone()],
            exit: None,
            ignores_grace: false,
            wait_fails: false,
            poll_fails_at: None,
            killed: false,
            finished: None,
            log: Rc::new(RefCell::new(ScriptLog::default())),
        }
    }

    /// One frame per sample; the last frame repeats.
    pub(crate) fn frames(mut self, frames: Vec<Frame>) -> Self {
        if !frames.is_empty() {
            self.frames = frames;
        }
        self
    }

    /// Exit on the `polls`-th poll. Without this the process only ends when killed.
    pub(crate) fn exit_after_polls(mut self, polls: usize, termination: Termination) -> Self {
        self.exit = Some((polls, termination));
        self
    }

    /// Bounded waits time out until the process is killed.
    pub(crate) fn ignores_grace(mut self) -> Self {
        self.ignores_grace = true;
        self
    }

    pub(crate) fn wait_fails(mut self) -> Self {
        self.wait_fails = true;
        self
    }

    pub(crate) fn poll_fails_at(mut self, poll: usize) -> Self {
        self.poll_fails_at = Some(poll);
        self
    }

    pub(crate) fn log(&self) -> Rc<RefCell<ScriptLog>> {
        Rc::clone(&self.log)
    }

    fn current(&self) -> &Frame {
        let samples = self.log.borrow().samples;
        let idx = samples.saturating_sub(1).min(self.frames.len() - 1);
        &self.frames[idx]
    }

    fn natural_exit(&self) -> Termination {
        self.exit.map(|(_, t)| t).unwrap_or(Termination::exited(0))
    }
}

impl ProcessHandle for ScriptedProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn poll(&mut self) -> std::io::Result<Option<Termination>> {
        let polls = {
            let mut log = self.log.borrow_mut();
            log.polls += 1;
            log.polls
        };
        if self.poll_fails_at == Some(polls) {
            return Err(std::io::Error::other("scripted poll failure"));
        }
        if self.finished.is_none() {
            if self.killed {
                self.finished = Some(Termination::signaled(SIGKILL));
            } else if let Some((after, t)) = self.exit
                && polls >= after
            {
                self.finished = Some(t);
            }
        }
        Ok(self.finished)
    }

    fn wait_timeout(&mut self, _timeout: Duration) -> std::io::Result<Option<Termination>> {
        if self.finished.is_none() {
            if self.killed {
                self.finished = Some(Termination::signaled(SIGKILL));
            } else if !self.ignores_grace {
                self.finished = Some(self.natural_exit());
            }
        }
        Ok(self.finished)
    }

    fn wait(&mut self) -> std::io::Result<Termination> {
        self.log.borrow_mut().waits += 1;
        if self.wait_fails {
            return Err(std::io::Error::other("scripted wait failure"));
        }
        let t = match self.finished {
            Some(t) => t,
            None if self.killed => Termination::signaled(SIGKILL),
            None => self.natural_exit(),
        };
        self.finished = Some(t);
        Ok(t)
    }

    fn children(&mut self) -> Vec<u32> {
        self.current().children.iter().map(|(pid, _)| *pid).collect()
    }

    fn memory_info(&mut self, pid: u32) -> Probe<u64> {
        if pid == self.pid {
            self.log.borrow_mut().samples += 1;
            return self.current().memory;
        }
        self.current()
            .children
            .iter()
            .find(|(child, _)| *child == pid)
            .map(|(_, probe)| *probe)
            .unwrap_or(Probe::Unavailable(Unavailable::Vanished))
    }

    fn cpu_times(&mut self, _pid: u32) -> Probe<CpuTimes> {
        self.current().cpu
    }

    fn kill(&mut self, pid: u32) {
        self.log.borrow_mut().killed.push(pid);
        if pid == self.pid {
            self.killed = true;
        }
    }
}

/// Hands out prepared processes in order; once empty, fails like a missing executable.
pub(crate) struct ScriptedLauncher {
    queue: VecDeque<ScriptedProcess>,
    pub spawned: Vec<Vec<String>>,
}

impl ScriptedLauncher {
    pub(crate) fn with(process: ScriptedProcess) -> Self {
        Self::queue(vec![process])
    }

    pub(crate) fn queue(processes: Vec<ScriptedProcess>) -> Self {
        Self {
            queue: processes.into(),
            spawned: Vec::new(),
        }
    }

    pub(crate) fn missing_executable() -> Self {
        Self::queue(Vec::new())
    }
}

impl Launcher for ScriptedLauncher {
    type Handle = ScriptedProcess;

    fn spawn(&mut self, argv: &[String]) -> CmdperfResult<ScriptedProcess> {
        self.spawned.push(argv.to_vec());
        self.queue.pop_front().ok_or_else(|| CmdperfError::Launch {
            program: argv.first().cloned().unwrap_or_default(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })
    }
}
