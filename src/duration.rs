//! Human duration strings (`500ms`, `2s`, `1m`) for CLI flags and config.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::{CmdperfError, CmdperfResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CmdDuration(pub Duration);

pub fn parse_duration(input: &str) -> CmdperfResult<Duration> {
    let s = input.trim();
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (number, unit) = s.split_at(split);
    if number.is_empty() {
        return Err(CmdperfError::InvalidArgument(format!(
            "invalid duration {input:?} (expected e.g. 500ms, 2s, 1m)"
        )));
    }
    let nanos_per_unit: u64 = match unit.trim() {
        "ns" => 1,
        "us" => 1_000,
        "ms" => 1_000_000,
        "" | "s" => 1_000_000_000,
        "m" => 60 * 1_000_000_000,
        "h" => 3600 * 1_000_000_000,
        other => {
            return Err(CmdperfError::InvalidArgument(format!(
                "unknown duration unit {other:?} in {input:?}"
            )));
        }
    };
    let bad_number =
        || CmdperfError::InvalidArgument(format!("invalid duration number in {input:?}"));
    if number.contains('.') {
        let value: f64 = number.parse().map_err(|_| bad_number())?;
        return Duration::try_from_secs_f64(value * nanos_per_unit as f64 / 1e9).map_err(|e| {
            CmdperfError::InvalidArgument(format!("duration {input:?} out of range: {e}"))
        });
    }
    let value: u64 = number.parse().map_err(|_| bad_number())?;
    value
        .checked_mul(nanos_per_unit)
        .map(Duration::from_nanos)
        .ok_or_else(|| CmdperfError::InvalidArgument(format!("duration {input:?} out of range")))
}

impl FromStr for CmdDuration {
    type Err = CmdperfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_duration(s).map(CmdDuration)
    }
}

impl fmt::Display for CmdDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nanos = self.0.as_nanos();
        if nanos % 1_000_000_000 == 0 {
            write!(f, "{}s", nanos / 1_000_000_000)
        } else if nanos % 1_000_000 == 0 {
            write!(f, "{}ms", nanos / 1_000_000)
        } else {
            write!(f, "{nanos}ns")
        }
    }
}

impl Serialize for CmdDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CmdDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
