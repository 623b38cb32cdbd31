//! Report line rendering.
//!
//! Every monitored unit becomes one line that collectors parse positionally:
//!
//! ```text
//! <code> <label> <perfdata|-> <STATUS> - <text>
//! ```
//!
//! `perfdata` is a `|`-separated list of `key=value[unit][;warn;crit;min;max]`
//! fields, or a single `-` when the unit has no quantitative basis.

use std::fmt;

use crate::severity::Severity;

/// Separator used by collectors for namespacing; never allowed in a label.
pub const LABEL_SEPARATOR: char = '/';

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Convert a byte count to gibibytes, for presentation only.
pub fn bytes_to_gib(bytes: u64) -> f64 {
    bytes as f64 / GIB
}

/// Strip the namespacing separator and replace whitespace so a label stays
/// a single positional field.
pub fn sanitize_label(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != LABEL_SEPARATOR)
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// A numeric value in a performance-data field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PerfNumber {
    /// Rendered with two decimals.
    Fixed(f64),
    /// Rendered as an integer.
    Count(u64),
}

impl fmt::Display for PerfNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PerfNumber::Fixed(v) => write!(f, "{v:.2}"),
            PerfNumber::Count(n) => write!(f, "{n}"),
        }
    }
}

/// Warning, critical, floor and ceiling for a bounded value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub warn: PerfNumber,
    pub crit: PerfNumber,
    pub min: PerfNumber,
    pub max: PerfNumber,
}

impl Thresholds {
    /// Bands at 80% and 90% of `quota`, floored at zero.
    pub fn from_quota(quota: f64) -> Self {
        Self {
            warn: PerfNumber::Fixed(quota * 0.8),
            crit: PerfNumber::Fixed(quota * 0.9),
            min: PerfNumber::Count(0),
            max: PerfNumber::Fixed(quota),
        }
    }
}

/// One `key=value` field.
#[derive(Debug, Clone, PartialEq)]
pub struct PerfValue {
    pub key: String,
    pub value: PerfNumber,
    pub unit: &'static str,
    pub thresholds: Option<Thresholds>,
}

impl PerfValue {
    pub fn count(key: impl Into<String>, n: u64) -> Self {
        Self {
            key: key.into(),
            value: PerfNumber::Count(n),
            unit: "",
            thresholds: None,
        }
    }

    pub fn fixed(key: impl Into<String>, v: f64, unit: &'static str) -> Self {
        Self {
            key: key.into(),
            value: PerfNumber::Fixed(v),
            unit,
            thresholds: None,
        }
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }
}

impl fmt::Display for PerfValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = self.unit;
        write!(f, "{}={}{unit}", self.key, self.value)?;
        if let Some(t) = &self.thresholds {
            write!(
                f,
                ";{}{unit};{}{unit};{}{unit};{}{unit}",
                t.warn, t.crit, t.min, t.max
            )?;
        }
        Ok(())
    }
}

/// Ordered list of performance-data fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerfData(pub Vec<PerfValue>);

impl PerfData {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PerfData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

/// Severity, optional text and optional performance data for one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub severity: Severity,
    pub text: String,
    pub perf: Option<PerfData>,
}

impl Classification {
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            severity,
            text: text.into(),
            perf: None,
        }
    }

    pub fn with_perf(mut self, perf: PerfData) -> Self {
        self.perf = Some(perf).filter(|p| !p.is_empty());
        self
    }
}

/// One printed line.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLine {
    pub severity: Severity,
    pub label: String,
    pub text: String,
    pub perf: Option<PerfData>,
}

impl ReportLine {
    pub fn new(label: &str, classification: Classification) -> Self {
        Self {
            severity: classification.severity,
            label: sanitize_label(label),
            text: classification.text,
            perf: classification.perf,
        }
    }

    /// An `Unknown` line carrying the reason a unit could not be checked.
    pub fn unknown(label: &str, reason: impl fmt::Display) -> Self {
        Self::new(label, Classification::new(Severity::Unknown, reason.to_string()))
    }
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.severity.code(), self.label)?;
        match &self.perf {
            Some(perf) if !perf.is_empty() => write!(f, "{perf}")?,
            _ => f.write_str("-")?,
        }
        write!(f, " {}", self.severity.label())?;
        if !self.text.is_empty() {
            write!(f, " - {}", self.text)?;
        }
        Ok(())
    }
}
