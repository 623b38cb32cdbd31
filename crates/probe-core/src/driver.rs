//! Check driver: fetch, classify, evaluate and format one check run.
//!
//! Fetches run one after another. Each fetch is bounded by the plan's
//! timeout; a unit that fails or stalls reports UNKNOWN on its own line and
//! never stops its siblings from being checked.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::classify::classify_snapshot;
use crate::error::{ProbeError, ProbeResult};
use crate::evaluate::evaluate;
use crate::fetch::Fetcher;
use crate::report::ReportLine;
use crate::severity::Severity;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Labels and limits for one check run.
#[derive(Debug, Clone)]
pub struct CheckPlan {
    /// Label of the summary line.
    pub summary_label: String,
    /// Prefix for unit lines (`Bucket_`, `prod_web_`, ...).
    pub unit_prefix: String,
    /// When set, every direct child of the topology root gets its own line
    /// with this prefix.
    pub child_prefix: Option<String>,
    /// Bound on each individual fetch.
    pub timeout: Duration,
}

impl CheckPlan {
    pub fn new(summary_label: impl Into<String>) -> Self {
        Self {
            summary_label: summary_label.into(),
            unit_prefix: String::new(),
            child_prefix: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_unit_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.unit_prefix = prefix.into();
        self
    }

    pub fn with_child_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.child_prefix = Some(prefix.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Report lines of a finished run, in print order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckOutcome {
    pub lines: Vec<ReportLine>,
}

impl CheckOutcome {
    /// Worst severity across every line; `Ok` for an empty run.
    pub fn severity(&self) -> Severity {
        Severity::combine_all(self.lines.iter().map(|l| l.severity))
    }

    pub fn exit_code(&self) -> i32 {
        self.severity().exit_code()
    }

    /// Append another run's lines after this one's.
    pub fn merge(mut self, other: CheckOutcome) -> CheckOutcome {
        self.lines.extend(other.lines);
        self
    }

    pub fn render(&self) -> String {
        self.lines
            .iter()
            .map(ReportLine::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Run `fut`, mapping an elapsed timeout to `Unreachable`.
pub async fn bounded<T, F>(timeout: Duration, fut: F) -> ProbeResult<T>
where
    F: Future<Output = ProbeResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(ProbeError::Unreachable(format!(
            "timed out after {}ms",
            timeout.as_millis()
        ))),
    }
}

/// Execute one check: summary line first, then child lines, then one line
/// per unit in discovery order.
pub async fn run_check<F>(fetcher: &F, plan: &CheckPlan) -> CheckOutcome
where
    F: Fetcher + ?Sized,
{
    let mut lines = Vec::new();

    let topology = match bounded(plan.timeout, fetcher.topology()).await {
        Ok(topology) => topology,
        Err(e) => {
            warn!(check = %plan.summary_label, error = %e, "topology unavailable");
            lines.push(ReportLine::unknown(&plan.summary_label, &e));
            return CheckOutcome { lines };
        }
    };

    let root = evaluate(&topology);
    debug!(
        check = %plan.summary_label,
        nodes = topology.node_count(),
        severity = %root.severity,
        "topology evaluated"
    );
    lines.push(ReportLine::new(&plan.summary_label, root.to_classification()));

    if let Some(prefix) = &plan.child_prefix {
        for (child, evaluation) in topology.children.iter().zip(&root.children) {
            let mut classification = classify_snapshot(&child.snapshot);
            classification.severity = evaluation.severity;
            lines.push(ReportLine::new(
                &format!("{prefix}{}", evaluation.id),
                classification,
            ));
        }
    }

    let units = match bounded(plan.timeout, fetcher.units()).await {
        Ok(units) => units,
        Err(e) => {
            warn!(check = %plan.summary_label, error = %e, "unit discovery failed");
            lines.push(ReportLine::unknown(
                &format!("{}inventory", plan.unit_prefix),
                &e,
            ));
            return CheckOutcome { lines };
        }
    };
    debug!(check = %plan.summary_label, count = units.len(), "units discovered");

    for id in &units {
        let label = format!("{}{id}", plan.unit_prefix);
        let line = match bounded(plan.timeout, fetcher.unit(id)).await {
            Ok(snapshot) => ReportLine::new(&label, classify_snapshot(&snapshot)),
            Err(e) => {
                warn!(unit = %id, error = %e, "unit fetch failed, reporting UNKNOWN");
                ReportLine::unknown(&label, &e)
            }
        };
        lines.push(line);
    }

    CheckOutcome { lines }
}
