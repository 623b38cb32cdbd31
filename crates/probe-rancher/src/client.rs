//! Rancher v2-beta API client.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use probe_core::{ProbeError, ProbeResult};

/// Resolved settings for one Rancher environment and stack.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RancherSettings {
    /// Base URL, including the port if needed.
    pub url: String,
    pub env_id: String,
    pub env_name: String,
    pub stack_name: String,
    pub access_key: String,
    pub secret_key: String,
    /// Services of the stack to report on.
    #[serde(default)]
    pub services: Vec<String>,
}

/// `{"data": [...]}` envelope used by list endpoints.
#[derive(Debug, Deserialize)]
pub struct Collection<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostLinks {
    pub instances: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Host {
    pub hostname: String,
    pub state: String,
    pub links: Option<HostLinks>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stack {
    pub name: String,
    #[serde(default)]
    pub service_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub name: String,
    #[serde(default)]
    pub health_state: Option<String>,
    #[serde(default)]
    pub current_scale: u32,
}

/// Authenticated client scoped to one project (environment).
#[derive(Clone)]
pub struct RancherClient {
    client: Client,
    base_url: String,
    env_id: String,
    access_key: String,
    secret_key: String,
}

impl RancherClient {
    pub fn new(settings: &RancherSettings, timeout: Duration) -> ProbeResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProbeError::Unreachable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: settings.url.trim_end_matches('/').to_string(),
            env_id: settings.env_id.clone(),
            access_key: settings.access_key.clone(),
            secret_key: settings.secret_key.clone(),
        })
    }

    /// URL of a path below `/v2-beta/projects/<env_id>/`.
    pub fn project_url(&self, path: &str) -> String {
        format!("{}/v2-beta/projects/{}/{path}", self.base_url, self.env_id)
    }

    pub async fn hosts(&self) -> ProbeResult<Vec<Host>> {
        let hosts: Collection<Host> = self.get(&self.project_url("hosts/")).await?;
        Ok(hosts.data)
    }

    /// Number of instances behind a host's `instances` link.
    pub async fn instance_count(&self, link: &str) -> ProbeResult<usize> {
        let instances: Collection<serde_json::Value> = self.get(link).await?;
        Ok(instances.data.len())
    }

    pub async fn stacks(&self) -> ProbeResult<Vec<Stack>> {
        let stacks: Collection<Stack> = self.get(&self.project_url("stacks/")).await?;
        Ok(stacks.data)
    }

    pub async fn service(&self, id: &str) -> ProbeResult<Service> {
        self.get(&self.project_url(&format!("services/{id}"))).await
    }

    /// Make an authenticated GET request and decode the JSON body.
    async fn get<T: DeserializeOwned>(&self, url: &str) -> ProbeResult<T> {
        debug!(url = %url, "GET request");

        let response = self
            .client
            .get(url)
            .basic_auth(&self.access_key, Some(&self.secret_key))
            .send()
            .await
            .map_err(|e| ProbeError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ProbeError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(ProbeError::Unreachable(format!("HTTP {status} from {url}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ProbeError::Unreachable(e.to_string()))?;
        Ok(serde_json::from_slice(&body)?)
    }
}
