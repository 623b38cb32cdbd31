//! probe-minio: MinIO cluster and bucket checks through the `mc` CLI.
//!
//! Topology comes from `mc admin info`, the bucket inventory from `mc ls`,
//! and per-bucket usage from `mc du` plus `mc quota info`.

pub mod mc;

use async_trait::async_trait;
use tracing::{debug, warn};

use probe_core::{CheckPlan, Fetcher, ProbeResult, ResourceSnapshot, TopologyNode};

pub use mc::{McCommand, McRunner, McSettings};

pub const SUMMARY_LABEL: &str = "MinIO";
pub const BUCKET_PREFIX: &str = "Bucket_";

/// Check plan for a MinIO run.
pub fn plan() -> CheckPlan {
    CheckPlan::new(SUMMARY_LABEL).with_unit_prefix(BUCKET_PREFIX)
}

/// Fetcher backed by an [`McRunner`].
pub struct MinioFetcher<R = McCommand> {
    runner: R,
    alias: String,
}

impl MinioFetcher<McCommand> {
    pub fn new(settings: McSettings) -> Self {
        let alias = settings.alias.clone();
        Self {
            runner: McCommand::new(settings),
            alias,
        }
    }
}

impl<R: McRunner> MinioFetcher<R> {
    pub fn with_runner(runner: R, alias: impl Into<String>) -> Self {
        Self {
            runner,
            alias: alias.into(),
        }
    }

    fn target(&self, bucket: &str) -> String {
        format!("{}/{bucket}", self.alias)
    }

    async fn mc(&self, args: &[&str]) -> ProbeResult<String> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        self.runner.run(&args).await
    }
}

#[async_trait]
impl<R: McRunner> Fetcher for MinioFetcher<R> {
    async fn topology(&self) -> ProbeResult<TopologyNode> {
        let raw = self.mc(&["admin", "info", "--json", self.alias.as_str()]).await?;
        mc::parse_admin_info(&self.alias, &raw)
    }

    async fn units(&self) -> ProbeResult<Vec<String>> {
        let raw = self.mc(&["ls", "--json", self.alias.as_str()]).await?;
        let buckets = mc::parse_bucket_list(&raw)?;
        debug!(alias = %self.alias, count = buckets.len(), "buckets listed");
        Ok(buckets)
    }

    async fn unit(&self, id: &str) -> ProbeResult<ResourceSnapshot> {
        let target = self.target(id);

        let raw = self.mc(&["du", "--json", target.as_str()]).await?;
        let usage = mc::parse_disk_usage(&raw)?;

        // A quota that cannot be read is treated as not set.
        let quota = match self.mc(&["quota", "info", "--json", target.as_str()]).await {
            Ok(raw) => mc::parse_quota(&raw).unwrap_or_else(|e| {
                warn!(bucket = %id, error = %e, "unreadable quota, treating as unset");
                None
            }),
            Err(e) => {
                warn!(bucket = %id, error = %e, "quota lookup failed, treating as unset");
                None
            }
        };

        Ok(ResourceSnapshot::Bucket(mc::bucket_usage(id, usage, quota)))
    }
}
