//! One profiled command: monitor run wrapped in wall-clock and network deltas.

use serde::{Deserialize, Serialize};

use std::time::Instant;

use crate::{
    CmdperfError, CmdperfResult, CommandSpec, HostNetwork, Launcher, Monitor, MonitorOptions,
    NetworkCounters, OsLauncher,
};

/// Final measurement record for one command. Field order is the report order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub command: String,
    pub bytes_recv: u64,
    pub bytes_sent: u64,
    /// User-mode CPU seconds.
    pub user_time: f64,
    /// Kernel-mode (system) CPU seconds.
    pub cpu_time: f64,
    pub total_time_nanos: u64,
    pub max_memory_bytes: u64,
    /// Absent when the process was killed by a signal, timeouts included.
    pub return_code: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileOutcome {
    #[serde(flatten)]
    pub profile: Profile,
    pub timed_out: bool,
    pub term_signal: Option<i32>,
}

/// Splits a command string into argv, honouring shell quoting.
pub fn split_command(command: &str) -> CmdperfResult<Vec<String>> {
    let argv = shlex::split(command).ok_or_else(|| CmdperfError::CommandParse {
        command: command.to_string(),
        reason: "unbalanced quotes or trailing escape".to_string(),
    })?;
    if argv.is_empty() {
        return Err(CmdperfError::CommandParse {
            command: command.to_string(),
            reason: "empty command".to_string(),
        });
    }
    Ok(argv)
}

pub struct Profiler<L, N> {
    launcher: L,
    network: N,
    options: MonitorOptions,
}

impl Profiler<OsLauncher, HostNetwork> {
    pub fn host(options: MonitorOptions) -> Self {
        Self::new(OsLauncher, HostNetwork, options)
    }
}

impl<L: Launcher, N: NetworkCounters> Profiler<L, N> {
    pub fn new(launcher: L, network: N, options: MonitorOptions) -> Self {
        Self {
            launcher,
            network,
            options,
        }
    }

    pub fn profile(&mut self, spec: &CommandSpec) -> CmdperfResult<ProfileOutcome> {
        let net_before = self.network.snapshot();
        let started = Instant::now();

        let argv = split_command(&spec.command)?;
        let outcome = Monitor::new(&self.options).run(&mut self.launcher, &argv)?;

        let net_after = self.network.snapshot();
        let elapsed = started.elapsed();
        let net = net_after.delta_since(&net_before);

        let profile = Profile {
            name: spec.name.clone(),
            command: spec.command.clone(),
            bytes_recv: net.bytes_recv,
            bytes_sent: net.bytes_sent,
            user_time: outcome.peak_cpu_times.user,
            cpu_time: outcome.peak_cpu_times.system,
            total_time_nanos: u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX),
            max_memory_bytes: outcome.peak_memory_bytes,
            return_code: outcome.exit_code,
        };
        tracing::debug!(
            name = %profile.name,
            total_time_nanos = profile.total_time_nanos,
            max_memory_bytes = profile.max_memory_bytes,
            return_code = ?profile.return_code,
            "profiled"
        );
        Ok(ProfileOutcome {
            profile,
            timed_out: outcome.timed_out,
            term_signal: outcome.term_signal,
        })
    }
}
