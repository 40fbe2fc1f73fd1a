//! Report rendering. Units are converted here and nowhere else.

use serde::{Deserialize, Serialize};

use std::path::Path;

use crate::{BatchReport, CmdperfError, CmdperfResult, Profile};

pub const BYTES_PER_KIB: u64 = 1024;
pub const BYTES_PER_MIB: u64 = 1024 * 1024;
pub const NANOS_PER_MILLI: u64 = 1_000_000;
pub const NANOS_PER_SEC: u64 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reporter {
    Csv,
    Json,
}

impl clap::ValueEnum for Reporter {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Csv, Self::Json]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Csv => clap::builder::PossibleValue::new("csv"),
            Self::Json => clap::builder::PossibleValue::new("json"),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryUnit {
    #[default]
    Bytes,
    Kib,
    Mib,
}

impl MemoryUnit {
    pub fn bytes_per_unit(self) -> u64 {
        match self {
            Self::Bytes => 1,
            Self::Kib => BYTES_PER_KIB,
            Self::Mib => BYTES_PER_MIB,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::Bytes => "max_memory_bytes",
            Self::Kib => "max_memory_kib",
            Self::Mib => "max_memory_mib",
        }
    }
}

impl clap::ValueEnum for MemoryUnit {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Bytes, Self::Kib, Self::Mib]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Bytes => clap::builder::PossibleValue::new("bytes"),
            Self::Kib => clap::builder::PossibleValue::new("kib"),
            Self::Mib => clap::builder::PossibleValue::new("mib"),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeUnit {
    #[default]
    #[serde(rename = "ns")]
    Nanos,
    #[serde(rename = "ms")]
    Millis,
    #[serde(rename = "s")]
    Seconds,
}

impl TimeUnit {
    pub fn nanos_per_unit(self) -> u64 {
        match self {
            Self::Nanos => 1,
            Self::Millis => NANOS_PER_MILLI,
            Self::Seconds => NANOS_PER_SEC,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::Nanos => "total_time_nanos",
            Self::Millis => "total_time_ms",
            Self::Seconds => "total_time_secs",
        }
    }
}

impl clap::ValueEnum for TimeUnit {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Nanos, Self::Millis, Self::Seconds]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Nanos => clap::builder::PossibleValue::new("ns"),
            Self::Millis => clap::builder::PossibleValue::new("ms"),
            Self::Seconds => clap::builder::PossibleValue::new("s"),
        })
    }
}

/// Display units for the tabular report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportUnits {
    pub memory: MemoryUnit,
    pub wall_time: TimeUnit,
}

/// Header row, in record field order.
pub fn report_columns(units: &ReportUnits) -> [&'static str; 9] {
    [
        "name",
        "command",
        "bytes_recv",
        "bytes_sent",
        "user_time",
        "cpu_time",
        units.wall_time.column(),
        units.memory.column(),
        "return_code",
    ]
}

pub fn render_csv<'a>(profiles: impl IntoIterator<Item = &'a Profile>, units: &ReportUnits) -> String {
    let mut out = String::new();
    out.push_str(&report_columns(units).join(","));
    out.push('\n');
    for p in profiles {
        let row = [
            csv_field(&p.name),
            csv_field(&p.command),
            p.bytes_recv.to_string(),
            p.bytes_sent.to_string(),
            p.user_time.to_string(),
            p.cpu_time.to_string(),
            scaled(p.total_time_nanos, units.wall_time.nanos_per_unit()),
            scaled(p.max_memory_bytes, units.memory.bytes_per_unit()),
            p.return_code.map(|c| c.to_string()).unwrap_or_default(),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

pub fn write_report(
    report: &BatchReport,
    reporter: Reporter,
    units: &ReportUnits,
    path: &Path,
) -> CmdperfResult<()> {
    let bytes = match reporter {
        Reporter::Csv => render_csv(report.profiles(), units).into_bytes(),
        Reporter::Json => serde_json::to_vec_pretty(report)?,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)
        .map_err(|e| CmdperfError::Report(format!("cannot write {}: {e}", path.display())))
}

fn scaled(value: u64, per_unit: u64) -> String {
    if per_unit <= 1 {
        return value.to_string();
    }
    format!("{:.3}", value as f64 / per_unit as f64)
}

fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}
