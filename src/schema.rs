//! Command-list input file and its self-description.

use serde::{Deserialize, Serialize};

use std::path::Path;

use crate::{CmdperfError, CmdperfResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandSpec {
    /// Label used in reports.
    pub name: String,
    /// Command line to execute, split with shell quoting rules.
    pub command: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandList {
    pub commands: Vec<CommandSpec>,
}

impl CommandList {
    pub fn load(path: &Path) -> CmdperfResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            CmdperfError::InvalidArgument(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&bytes).map_err(|e| match e {
            CmdperfError::Json(inner) => {
                CmdperfError::InvalidArgument(format!("{}: {inner}", path.display()))
            }
            other => other,
        })
    }

    pub fn from_json(bytes: &[u8]) -> CmdperfResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Names that appear more than once; they still run but collide in reports.
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut seen = std::collections::BTreeSet::new();
        let mut dups = std::collections::BTreeSet::new();
        for c in &self.commands {
            if !seen.insert(c.name.as_str()) {
                dups.insert(c.name.as_str());
            }
        }
        dups.into_iter().collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaDoc {
    #[serde(rename = "schemaVersion")]
    pub schema_version: String,
    #[serde(rename = "requiredTopLevelKeys")]
    pub required_top_level_keys: Vec<&'static str>,
    #[serde(rename = "commandKeys")]
    pub command_keys: Vec<FieldDoc>,
    #[serde(rename = "reportColumns")]
    pub report_columns: Vec<&'static str>,
    #[serde(rename = "minimalExample")]
    pub minimal_example: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldDoc {
    pub name: &'static str,
    pub description: &'static str,
}

pub fn schema_doc() -> SchemaDoc {
    SchemaDoc {
        schema_version: "cmdperf.commands.v1".to_string(),
        required_top_level_keys: vec!["commands"],
        command_keys: vec![
            FieldDoc {
                name: "name",
                description: "label written to the report's name column",
            },
            FieldDoc {
                name: "command",
                description: "command line; split on whitespace with shell quoting, never run through a shell",
            },
        ],
        report_columns: crate::report_columns(&crate::ReportUnits::default()).to_vec(),
        minimal_example: serde_json::json!({
            "commands": [
                { "name": "sleepy", "command": "sleep 1" },
                { "name": "quoted", "command": "python3 -c \"print('hello')\"" }
            ]
        }),
    }
}
