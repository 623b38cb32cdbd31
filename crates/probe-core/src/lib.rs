//! probe-core: status aggregation and classification for statusprobe.
//!
//! Turns raw facts about monitored resources into severity-coded report
//! lines for a monitoring collector.
//!
//! # Architecture
//!
//! ```text
//! Fetcher (minio / rancher / traefiker / stub)
//!   ├── topology() → TopologyNode → evaluate() → summary line (+ child lines)
//!   ├── units()    → discovery order
//!   └── unit(id)   → ResourceSnapshot → classify_snapshot() → unit line
//! run_check() folds every line into CheckOutcome::severity() → exit code
//! ```
//!
//! A unit that cannot be fetched still gets a line, marked UNKNOWN. Only a
//! missing topology ends the run early, with a single UNKNOWN line.

pub mod classify;
pub mod driver;
pub mod error;
pub mod evaluate;
pub mod fetch;
pub mod report;
pub mod severity;
pub mod snapshot;

pub use classify::{classify_bucket, classify_ratio, classify_snapshot, classify_usage};
pub use driver::{run_check, CheckOutcome, CheckPlan};
pub use error::{ProbeError, ProbeResult};
pub use evaluate::{evaluate, NodeEvaluation};
pub use fetch::{Fetcher, StubFetcher};
pub use report::{Classification, PerfData, PerfValue, ReportLine};
pub use severity::Severity;
pub use snapshot::{BucketUsage, ResourceKind, ResourceSnapshot, TopologyNode};
