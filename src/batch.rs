//! Sequential batch over a command list.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    CmdperfError, CmdperfResult, CommandSpec, Launcher, NetworkCounters, Profile, ProfileOutcome,
    Profiler,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Launch,
    CommandParse,
}

/// A command that never produced a measurement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFailure {
    pub name: String,
    pub command: String,
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunRecord {
    Profiled(ProfileOutcome),
    Failed(RunFailure),
}

/// Every key in the serialized report is snake_case, nested runs included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    pub runs: Vec<RunRecord>,
}

impl BatchReport {
    pub fn profiles(&self) -> impl Iterator<Item = &Profile> {
        self.runs.iter().filter_map(|r| match r {
            RunRecord::Profiled(o) => Some(&o.profile),
            RunRecord::Failed(_) => None,
        })
    }

    pub fn failed_count(&self) -> usize {
        self.runs
            .iter()
            .filter(|r| matches!(r, RunRecord::Failed(_)))
            .count()
    }

    pub fn timed_out_count(&self) -> usize {
        self.runs
            .iter()
            .filter(|r| matches!(r, RunRecord::Profiled(o) if o.timed_out))
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }
}

/// Profiles each command in order. Launch and parse failures are recorded and
/// the batch moves on; anything else aborts it.
pub fn run_batch<L: Launcher, N: NetworkCounters>(
    profiler: &mut Profiler<L, N>,
    commands: &[CommandSpec],
) -> CmdperfResult<BatchReport> {
    let run_id = Uuid::new_v4();
    let started_at = OffsetDateTime::now_utc();
    tracing::info!(%run_id, commands = commands.len(), "batch started");

    let mut runs = Vec::with_capacity(commands.len());
    for spec in commands {
        match profiler.profile(spec) {
            Ok(outcome) => runs.push(RunRecord::Profiled(outcome)),
            Err(err) if err.is_per_command() => {
                tracing::warn!(name = %spec.name, error = %err, "command skipped");
                runs.push(RunRecord::Failed(failure(spec, &err)));
            }
            Err(err) => {
                tracing::error!(name = %spec.name, error = %err, "batch aborted");
                return Err(err);
            }
        }
    }

    Ok(BatchReport {
        run_id,
        started_at,
        runs,
    })
}

fn failure(spec: &CommandSpec, err: &CmdperfError) -> RunFailure {
    let kind = match err {
        CmdperfError::CommandParse { .. } => FailureKind::CommandParse,
        _ => FailureKind::Launch,
    };
    RunFailure {
        name: spec.name.clone(),
        command: spec.command.clone(),
        kind,
        message: err.to_string(),
    }
}
