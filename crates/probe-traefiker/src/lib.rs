//! probe-traefiker: narrative service status from Traefiker.
//!
//! Traefiker exposes a `narrative_status/` endpoint listing every running
//! narrative container. The tracker is reported as a single line with
//! per-state counts; narratives in an unexpected state raise a warning.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use probe_core::{CheckPlan, Fetcher, ProbeError, ProbeResult, ResourceSnapshot, TopologyNode};

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "kbase_session";

/// Resolved settings for one Traefiker deployment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TraefikerSettings {
    pub status_url: String,
    pub token: String,
}

/// Check plan for a named Traefiker deployment.
pub fn plan(name: &str) -> CheckPlan {
    CheckPlan::new(format!("traefiker_{name}"))
}

#[derive(Debug, Deserialize)]
struct NarrativeStatus {
    #[serde(default)]
    narrative_services: Vec<NarrativeEntry>,
}

#[derive(Debug, Deserialize)]
struct NarrativeEntry {
    #[serde(default, alias = "instance")]
    name: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

pub struct TraefikerFetcher {
    client: Client,
    name: String,
    settings: TraefikerSettings,
}

impl TraefikerFetcher {
    pub fn new(name: &str, settings: TraefikerSettings, timeout: Duration) -> ProbeResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProbeError::Unreachable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            name: name.to_string(),
            settings,
        })
    }
}

#[async_trait]
impl Fetcher for TraefikerFetcher {
    async fn topology(&self) -> ProbeResult<TopologyNode> {
        let url = &self.settings.status_url;
        debug!(url = %url, "GET request");

        let response = self
            .client
            .get(url)
            .header(COOKIE, format!("{SESSION_COOKIE}={}", self.settings.token))
            .send()
            .await
            .map_err(|e| ProbeError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ProbeError::NotFound(url.clone()));
        }
        if !status.is_success() {
            return Err(ProbeError::Unreachable(format!("HTTP {status} from {url}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ProbeError::Unreachable(e.to_string()))?;
        parse_status(&self.name, &body)
    }

    async fn units(&self) -> ProbeResult<Vec<String>> {
        Ok(Vec::new())
    }

    async fn unit(&self, id: &str) -> ProbeResult<ResourceSnapshot> {
        Err(ProbeError::NotFound(format!("narrative {id}")))
    }
}

/// Build the tracker topology from a `narrative_status/` body.
///
/// Entries without a state are kept and count towards the total with an
/// empty state, which the evaluator flags.
pub fn parse_status(name: &str, body: &[u8]) -> ProbeResult<TopologyNode> {
    let status: NarrativeStatus = serde_json::from_slice(body)?;
    let children = status
        .narrative_services
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            TopologyNode::leaf(ResourceSnapshot::Narrative {
                id: entry.name.unwrap_or_else(|| format!("narrative-{}", i + 1)),
                state: entry.state.unwrap_or_default(),
            })
        })
        .collect();
    Ok(TopologyNode::with_children(
        ResourceSnapshot::Tracker {
            name: name.to_string(),
        },
        children,
    ))
}
