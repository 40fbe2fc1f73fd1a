//! Crate-wide error types.

use thiserror::Error;

pub type CmdperfResult<T> = Result<T, CmdperfError>;

#[derive(Debug, Error)]
pub enum CmdperfError {
    /// The executable could not be found or started. Fatal for one command.
    #[error("failed to launch {program:?}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The command string could not be split into argv. Fatal for one command.
    #[error("cannot parse command {command:?}: {reason}")]
    CommandParse { command: String, reason: String },

    /// The final unbounded wait after a forced kill failed. Aborts the batch.
    #[error("failed to reap pid {pid}: {source}")]
    Reap {
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("report error: {0}")]
    Report(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl CmdperfError {
    /// True for failures that only invalidate the current command.
    pub fn is_per_command(&self) -> bool {
        matches!(self, Self::Launch { .. } | Self::CommandParse { .. })
    }
}
