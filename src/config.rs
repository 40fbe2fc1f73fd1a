//! `cmdperf.toml` config loading.

use serde::{Deserialize, Serialize};

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{CmdDuration, CmdperfError, CmdperfResult, MemoryUnit, MonitorOptions, ReportUnits, Reporter, TimeUnit};

pub const DEFAULT_CONFIG_FILE: &str = "cmdperf.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct Config {
    /// Delay between two samples of a running command.
    #[serde(default = "default_interval")]
    pub interval: CmdDuration,

    /// Kill the process tree once a command runs longer than this.
    #[serde(default)]
    pub timeout: Option<CmdDuration>,

    /// How long the reaper waits before force-killing a lingering child.
    #[serde(default = "default_grace")]
    pub grace: CmdDuration,

    /// Sum resident memory over all descendants, not only the direct child.
    #[serde(default = "default_include_children")]
    pub include_children: bool,

    /// Report destination.
    #[serde(default = "default_output")]
    pub output: PathBuf,

    #[serde(default = "default_reporter")]
    pub reporter: Reporter,

    #[serde(default)]
    pub memory_unit: MemoryUnit,

    #[serde(default)]
    pub time_unit: TimeUnit,
}

fn default_interval() -> CmdDuration {
    CmdDuration(Duration::from_millis(500))
}

fn default_grace() -> CmdDuration {
    CmdDuration(Duration::from_secs(5))
}

fn default_include_children() -> bool {
    true
}

fn default_output() -> PathBuf {
    PathBuf::from("report.csv")
}

fn default_reporter() -> Reporter {
    Reporter::Csv
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            timeout: None,
            grace: default_grace(),
            include_children: default_include_children(),
            output: default_output(),
            reporter: default_reporter(),
            memory_unit: MemoryUnit::default(),
            time_unit: TimeUnit::default(),
        }
    }
}

impl Config {
    pub fn load_optional(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(s) => match toml::from_str::<Config>(&s) {
                Ok(cfg) => cfg,
                Err(err) => {
                    tracing::warn!("failed to parse config {}: {err}", path.display());
                    Self::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => {
                tracing::warn!("failed to read config {}: {err}", path.display());
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> CmdperfResult<()> {
        if self.interval.0.is_zero() {
            return Err(CmdperfError::Config("interval must be greater than zero".to_string()));
        }
        if self.timeout.is_some_and(|t| t.0.is_zero()) {
            return Err(CmdperfError::Config("timeout must be greater than zero".to_string()));
        }
        Ok(())
    }

    pub fn monitor_options(&self) -> MonitorOptions {
        MonitorOptions {
            interval: self.interval.0,
            timeout: self.timeout.map(|t| t.0),
            grace: self.grace.0,
            include_children: self.include_children,
        }
    }

    pub fn report_units(&self) -> ReportUnits {
        ReportUnits {
            memory: self.memory_unit,
            wall_time: self.time_unit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_workspace(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cmdperf-config-{name}-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("workspace");
        dir
    }

    #[test]
    fn missing_file_yields_defaults() {
        let ws = temp_workspace("missing");
        let cfg = Config::load_optional(&ws.join(DEFAULT_CONFIG_FILE));
        assert_eq!(cfg.interval.0, Duration::from_millis(500));
        assert_eq!(cfg.grace.0, Duration::from_secs(5));
        assert!(cfg.include_children);
        assert!(cfg.timeout.is_none());
        assert_eq!(cfg.output, PathBuf::from("report.csv"));
    }

    #[test]
    fn partial_file_overrides_only_given_keys() {
        let ws = temp_workspace("partial");
        let path = ws.join(DEFAULT_CONFIG_FILE);
        std::fs::write(
            &path,
            "interval = \"100ms\"\ntimeout = \"3s\"\nmemory_unit = \"mib\"\ninclude_children = false\n",
        )
        .expect("write config");
        let cfg = Config::load_optional(&path);
        assert_eq!(cfg.interval.0, Duration::from_millis(100));
        assert_eq!(cfg.timeout.map(|t| t.0), Some(Duration::from_secs(3)));
        assert_eq!(cfg.memory_unit, MemoryUnit::Mib);
        assert!(!cfg.include_children);
        assert_eq!(cfg.grace.0, Duration::from_secs(5));

        let opts = cfg.monitor_options();
        assert_eq!(opts.timeout, Some(Duration::from_secs(3)));
        assert!(!opts.include_children);
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let ws = temp_workspace("invalid");
        let path = ws.join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "interval = 12\n").expect("write config");
        let cfg = Config::load_optional(&path);
        assert_eq!(cfg.interval.0, Duration::from_millis(500));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let cfg = Config {
            interval: CmdDuration(Duration::ZERO),
            ..Config::default()
        };
        assert!(matches!(cfg.validate(), Err(CmdperfError::Config(_))));
        assert!(Config::default().validate().is_ok());
    }
}
