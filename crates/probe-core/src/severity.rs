//! Ordinal severity model shared by every probe.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProbeError;

/// Health code reported to the monitoring collector.
///
/// Ordered so that rollup is a plain maximum: `Unknown` sorts last even
/// though it is not semantically "worse" than `Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[default]
    Ok = 0,
    Warning = 1,
    Critical = 2,
    Unknown = 3,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Ok,
        Severity::Warning,
        Severity::Critical,
        Severity::Unknown,
    ];

    /// Combine two severities. Associative, commutative, identity `Ok`.
    pub fn combine(self, other: Severity) -> Severity {
        self.max(other)
    }

    /// Fold any number of severities; an empty input yields `Ok`.
    pub fn combine_all<I>(severities: I) -> Severity
    where
        I: IntoIterator<Item = Severity>,
    {
        severities
            .into_iter()
            .fold(Severity::Ok, Severity::combine)
    }

    /// Numeric code as printed in the first field of a report line.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Process exit status for this severity.
    pub fn exit_code(self) -> i32 {
        i32::from(self.code())
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Ok => "OK",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
            Severity::Unknown => "UNKNOWN",
        }
    }
}

impl TryFrom<u8> for Severity {
    type Error = ProbeError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Severity::Ok),
            1 => Ok(Severity::Warning),
            2 => Ok(Severity::Critical),
            3 => Ok(Severity::Unknown),
            other => Err(ProbeError::InvalidSeverity(other)),
        }
    }
}

/// Map a raw ordinal to its label, rejecting anything outside 0..=3.
pub fn label_for_code(code: u8) -> Result<&'static str, ProbeError> {
    Severity::try_from(code).map(Severity::label)
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
