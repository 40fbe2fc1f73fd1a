//! Batch profiling command (`cmdperf run ...`).

use clap::Args;
use serde::Serialize;

use std::path::PathBuf;

use cmdperf::{
    BatchReport, CmdDuration, CmdperfError, CmdperfResult, CommandList, Config, MemoryUnit,
    Profiler, Reporter, TimeUnit, run_batch, write_report,
};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// JSON command list: {"commands": [{"name": ..., "command": ...}]}
    #[arg(value_name = "COMMANDS")]
    pub file: PathBuf,
    /// Report destination; defaults to the configured output.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
    #[arg(long)]
    pub format: Option<Reporter>,
    /// Sampling interval, e.g. 250ms.
    #[arg(long)]
    pub interval: Option<CmdDuration>,
    /// Kill a command's process tree after this long.
    #[arg(long)]
    pub timeout: Option<CmdDuration>,
    /// Wait this long for a child to exit on its own before force-killing it.
    #[arg(long)]
    pub grace: Option<CmdDuration>,
    /// Measure only the direct child, not its descendants.
    #[arg(long)]
    pub no_children: bool,
    #[arg(long)]
    pub memory_unit: Option<MemoryUnit>,
    #[arg(long)]
    pub time_unit: Option<TimeUnit>,
}

impl RunArgs {
    /// Flags win over the config file.
    pub fn apply(&self, config: &mut Config) {
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if let Some(format) = self.format {
            config.reporter = format;
        }
        if let Some(interval) = self.interval {
            config.interval = interval;
        }
        if self.timeout.is_some() {
            config.timeout = self.timeout;
        }
        if let Some(grace) = self.grace {
            config.grace = grace;
        }
        if self.no_children {
            config.include_children = false;
        }
        if let Some(unit) = self.memory_unit {
            config.memory_unit = unit;
        }
        if let Some(unit) = self.time_unit {
            config.time_unit = unit;
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunOutput {
    pub report_path: String,
    #[serde(flatten)]
    pub report: BatchReport,
}

pub fn run_command(config: &Config, args: &RunArgs) -> CmdperfResult<RunOutput> {
    let mut config = config.clone();
    args.apply(&mut config);
    config.validate()?;

    let list = CommandList::load(&args.file)?;
    if list.is_empty() {
        return Err(CmdperfError::InvalidArgument(format!(
            "{} lists no commands",
            args.file.display()
        )));
    }
    for name in list.duplicate_names() {
        tracing::warn!(%name, "duplicate command name");
    }

    let mut profiler = Profiler::host(config.monitor_options());
    let report = run_batch(&mut profiler, &list.commands)?;
    write_report(&report, config.reporter, &config.report_units(), &config.output)?;
    tracing::info!(path = %config.output.display(), runs = report.runs.len(), "report written");

    Ok(RunOutput {
        report_path: config.output.display().to_string(),
        report,
    })
}
