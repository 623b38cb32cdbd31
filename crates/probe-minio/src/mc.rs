//! `mc` invocation and output parsing.
//!
//! Every command is run with `--json`. `mc ls` emits one JSON object per
//! line; the other commands emit a single object.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use probe_core::{BucketUsage, ProbeError, ProbeResult, ResourceSnapshot, TopologyNode};

pub const DEFAULT_MC_PATH: &str = "/opt/minio-binaries/mc";
pub const DEFAULT_ALIAS: &str = "minio";

/// Resolved settings for talking to one MinIO deployment through `mc`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct McSettings {
    #[serde(default = "default_mc_path")]
    pub mc_path: PathBuf,
    /// `mc` alias of the deployment.
    #[serde(default = "default_alias")]
    pub alias: String,
    /// Pass `--insecure` (skip TLS verification).
    #[serde(default = "default_insecure")]
    pub insecure: bool,
}

fn default_mc_path() -> PathBuf {
    PathBuf::from(DEFAULT_MC_PATH)
}

fn default_alias() -> String {
    DEFAULT_ALIAS.to_string()
}

fn default_insecure() -> bool {
    true
}

impl Default for McSettings {
    fn default() -> Self {
        Self {
            mc_path: default_mc_path(),
            alias: default_alias(),
            insecure: default_insecure(),
        }
    }
}

/// Runs an `mc` subcommand and returns its stdout.
#[async_trait]
pub trait McRunner: Send + Sync {
    async fn run(&self, args: &[String]) -> ProbeResult<String>;
}

/// Runs the real `mc` binary.
#[derive(Debug, Clone)]
pub struct McCommand {
    settings: McSettings,
}

impl McCommand {
    pub fn new(settings: McSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl McRunner for McCommand {
    async fn run(&self, args: &[String]) -> ProbeResult<String> {
        let mut cmd = Command::new(&self.settings.mc_path);
        cmd.args(args).kill_on_drop(true);
        if self.settings.insecure {
            cmd.arg("--insecure");
        }

        debug!("Running: {:?}", cmd);

        let output = cmd.output().await.map_err(|e| {
            ProbeError::Unreachable(format!(
                "failed to execute {}: {e}",
                self.settings.mc_path.display()
            ))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let detail = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(ProbeError::Unreachable(format!(
                "mc {} failed ({}): {detail}",
                args.first().map(String::as_str).unwrap_or_default(),
                output.status
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| ProbeError::MalformedResponse(format!("mc output is not UTF-8: {e}")))
    }
}

// ── Output shapes ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AdminInfo {
    info: ClusterInfo,
}

#[derive(Debug, Deserialize)]
struct ClusterInfo {
    mode: String,
    #[serde(default)]
    servers: Vec<ServerInfo>,
}

#[derive(Debug, Deserialize)]
struct ServerInfo {
    endpoint: String,
    state: String,
    #[serde(default)]
    drives: Vec<DriveInfo>,
}

#[derive(Debug, Deserialize)]
struct DriveInfo {
    endpoint: String,
    state: String,
    #[serde(default)]
    healing: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ListEntry {
    key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DiskUsage {
    size: u64,
    #[serde(default)]
    objects: u64,
}

#[derive(Debug, Deserialize)]
struct QuotaInfo {
    #[serde(default)]
    quota: Option<u64>,
}

// ── Parsers ───────────────────────────────────────────────────────

/// Parse `mc admin info --json` into cluster → servers → drives.
pub fn parse_admin_info(name: &str, raw: &str) -> ProbeResult<TopologyNode> {
    let info: AdminInfo = serde_json::from_str(raw.trim())?;
    let servers = info
        .info
        .servers
        .into_iter()
        .map(|server| {
            let drives = server
                .drives
                .into_iter()
                .map(|drive| {
                    TopologyNode::leaf(ResourceSnapshot::Drive {
                        endpoint: strip_scheme(&drive.endpoint).to_string(),
                        state: drive.state,
                        healing: is_healing(drive.healing.as_ref()),
                    })
                })
                .collect();
            TopologyNode::with_children(
                ResourceSnapshot::Server {
                    endpoint: server.endpoint,
                    state: server.state,
                },
                drives,
            )
        })
        .collect();

    Ok(TopologyNode::with_children(
        ResourceSnapshot::Cluster {
            name: name.to_string(),
            mode: info.info.mode,
        },
        servers,
    ))
}

/// Parse `mc ls --json` into bucket names, in listing order.
pub fn parse_bucket_list(raw: &str) -> ProbeResult<Vec<String>> {
    let mut buckets = Vec::new();
    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let entry: ListEntry = serde_json::from_str(line)?;
        if let Some(key) = entry.key {
            buckets.push(key.trim_end_matches('/').to_string());
        }
    }
    Ok(buckets)
}

/// Parse `mc du --json` into `(size_bytes, objects)`.
pub fn parse_disk_usage(raw: &str) -> ProbeResult<(u64, u64)> {
    let du: DiskUsage = serde_json::from_str(raw.trim())?;
    Ok((du.size, du.objects))
}

/// Parse `mc quota info --json`; zero or missing quota means none is set.
pub fn parse_quota(raw: &str) -> ProbeResult<Option<u64>> {
    let info: QuotaInfo = serde_json::from_str(raw.trim())?;
    Ok(info.quota.filter(|q| *q > 0))
}

pub(crate) fn bucket_usage(
    name: &str,
    usage: (u64, u64),
    quota_bytes: Option<u64>,
) -> BucketUsage {
    BucketUsage {
        name: name.to_string(),
        size_bytes: Some(usage.0),
        quota_bytes,
        objects: Some(usage.1),
    }
}

fn strip_scheme(endpoint: &str) -> &str {
    endpoint
        .strip_prefix("https://")
        .or_else(|| endpoint.strip_prefix("http://"))
        .unwrap_or(endpoint)
}

fn is_healing(flag: Option<&serde_json::Value>) -> bool {
    !matches!(
        flag,
        None | Some(serde_json::Value::Null) | Some(serde_json::Value::Bool(false))
    )
}
