//! probes.toml configuration parser.
//!
//! ```toml
//! [minio.main]
//! mc_path = "/opt/minio-binaries/mc"
//! alias = "minio"
//!
//! [rancher.prod]
//! url = "https://rancher.example.org"
//! env_id = "1a5"
//! env_name = "prod"
//! stack_name = "web"
//! access_key = "..."
//! secret_key = "..."
//! services = ["api", "worker"]
//! timeout = "10s"
//!
//! [traefiker.ci]
//! status_url = "https://ci.example.org/narrative_status/"
//! token = "..."
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use serde::Deserialize;

use probe_minio::McSettings;
use probe_rancher::RancherSettings;
use probe_traefiker::TraefikerSettings;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/statusprobe/probes.toml";

/// One named section: adapter settings plus an optional fetch timeout.
#[derive(Debug, Clone, Deserialize)]
pub struct Section<T> {
    /// Per-fetch bound, e.g. "10s" or "500ms".
    #[serde(default)]
    pub timeout: Option<String>,
    #[serde(flatten)]
    pub settings: T,
}

impl<T> Section<T> {
    pub fn timeout(&self) -> anyhow::Result<Duration> {
        match &self.timeout {
            None => Ok(probe_core::driver::DEFAULT_TIMEOUT),
            Some(raw) => match parse_duration(raw) {
                Some(d) if !d.is_zero() => Ok(d),
                _ => bail!("invalid timeout {raw:?}; expected e.g. \"10s\", \"500ms\", \"2m\""),
            },
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbesConfig {
    #[serde(default)]
    pub minio: BTreeMap<String, Section<McSettings>>,
    #[serde(default)]
    pub rancher: BTreeMap<String, Section<RancherSettings>>,
    #[serde(default)]
    pub traefiker: BTreeMap<String, Section<TraefikerSettings>>,
}

impl ProbesConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: ProbesConfig = toml::from_str(content)?;
        Ok(config)
    }
}

/// Resolve requested section names against the configured ones.
///
/// With no names requested, every configured section is returned in name
/// order. A requested name that is not configured maps to `None`.
pub fn select<'a, T>(
    sections: &'a BTreeMap<String, Section<T>>,
    wanted: &[String],
) -> Vec<(String, Option<&'a Section<T>>)> {
    if wanted.is_empty() {
        sections
            .iter()
            .map(|(name, section)| (name.clone(), Some(section)))
            .collect()
    } else {
        wanted
            .iter()
            .map(|name| (name.clone(), sections.get(name)))
            .collect()
    }
}

/// Parse a duration string like "5s", "500ms", "1m".
fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
