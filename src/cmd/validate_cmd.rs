//! Dry check of a command list (`cmdperf validate ...`): nothing is spawned.

use serde::Serialize;

use std::path::Path;

use cmdperf::{CmdperfResult, CommandList, split_command};

#[derive(Debug, Serialize)]
pub struct ValidateOutput {
    pub ok: bool,
    pub commands: Vec<CheckedCommand>,
    pub duplicate_names: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckedCommand {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub argv: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn validate_command(file: &Path) -> CmdperfResult<ValidateOutput> {
    let list = CommandList::load(file)?;
    let commands: Vec<CheckedCommand> = list
        .commands
        .iter()
        .map(|spec| match split_command(&spec.command) {
            Ok(argv) => CheckedCommand {
                name: spec.name.clone(),
                argv: Some(argv),
                error: None,
            },
            Err(err) => CheckedCommand {
                name: spec.name.clone(),
                argv: None,
                error: Some(err.to_string()),
            },
        })
        .collect();
    Ok(ValidateOutput {
        ok: !commands.is_empty() && commands.iter().all(|c| c.error.is_none()),
        duplicate_names: list.duplicate_names().into_iter().map(str::to_string).collect(),
        commands,
    })
}
