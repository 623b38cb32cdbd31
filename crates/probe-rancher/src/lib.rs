//! probe-rancher: Rancher agent and stack service checks.
//!
//! The environment topology is the list of agent hosts, each reported on
//! its own line. The configured services of one stack are the units.

pub mod client;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, OnceCell};
use tokio::time::Instant;
use tracing::{debug, warn};

use probe_core::{CheckPlan, Fetcher, ProbeError, ProbeResult, ResourceSnapshot, TopologyNode};

pub use client::{RancherClient, RancherSettings};

pub const AGENT_PREFIX: &str = "rancher_agent_";

/// Check plan for one environment and stack.
pub fn plan(settings: &RancherSettings) -> CheckPlan {
    CheckPlan::new(format!("rancher_{}", settings.env_name))
        .with_child_prefix(AGENT_PREFIX)
        .with_unit_prefix(format!("{}_{}_", settings.env_name, settings.stack_name))
}

pub struct RancherFetcher {
    client: RancherClient,
    settings: RancherSettings,
    /// Share of the fetch timeout spent on per-host instance counts.
    count_budget: Duration,
    service_ids: OnceCell<ProbeResult<Vec<String>>>,
    services: Mutex<HashMap<String, ProbeResult<client::Service>>>,
}

impl RancherFetcher {
    pub fn new(settings: RancherSettings, timeout: Duration) -> ProbeResult<Self> {
        let client = RancherClient::new(&settings, timeout)?;
        Ok(Self {
            client,
            settings,
            count_budget: timeout * 3 / 4,
            service_ids: OnceCell::new(),
            services: Mutex::new(HashMap::new()),
        })
    }

    /// Service ids of the configured stack, looked up once per run.
    async fn stack_service_ids(&self) -> ProbeResult<&[String]> {
        let ids = self
            .service_ids
            .get_or_init(|| async {
                let stacks = self.client.stacks().await?;
                let stack = find_stack(&stacks, &self.settings.stack_name)?;
                debug!(stack = %stack.name, count = stack.service_ids.len(), "stack resolved");
                Ok::<_, ProbeError>(stack.service_ids.clone())
            })
            .await;
        match ids {
            Ok(ids) => Ok(ids.as_slice()),
            Err(e) => Err(e.clone()),
        }
    }

    /// One service by id. Failures are cached like successes.
    async fn service(&self, id: &str) -> ProbeResult<client::Service> {
        if let Some(cached) = self.services.lock().await.get(id) {
            return cached.clone();
        }
        let fetched = self.client.service(id).await;
        if let Err(e) = &fetched {
            warn!(service_id = %id, error = %e, "service unreadable");
        }
        self.services
            .lock()
            .await
            .insert(id.to_string(), fetched.clone());
        fetched
    }

    /// Container count for one host, bounded by `limit`.
    async fn container_count(&self, host: &client::Host, limit: Duration) -> Option<usize> {
        let link = host.links.as_ref()?.instances.as_deref()?;
        match tokio::time::timeout(limit, self.client.instance_count(link)).await {
            Ok(Ok(n)) => Some(n),
            Ok(Err(e)) => {
                warn!(host = %host.hostname, error = %e, "instance list unavailable");
                None
            }
            Err(_) => {
                warn!(host = %host.hostname, limit_ms = limit.as_millis() as u64, "instance list timed out");
                None
            }
        }
    }
}

#[async_trait]
impl Fetcher for RancherFetcher {
    async fn topology(&self) -> ProbeResult<TopologyNode> {
        let deadline = Instant::now() + self.count_budget;
        let hosts = self.client.hosts().await?;

        // Each host gets an equal share of what is left of the budget, so a
        // stalled agent cannot push the topology past its own bound.
        let total = hosts.len();
        let mut counted = Vec::with_capacity(total);
        for (i, host) in hosts.into_iter().enumerate() {
            let left = deadline.saturating_duration_since(Instant::now());
            let limit = left / (total - i) as u32;
            let containers = self.container_count(&host, limit).await;
            counted.push((host, containers));
        }
        Ok(environment_topology(&self.settings.env_name, counted))
    }

    async fn units(&self) -> ProbeResult<Vec<String>> {
        Ok(self.settings.services.clone())
    }

    /// Walks the stack's services in order until `id` matches by name.
    async fn unit(&self, id: &str) -> ProbeResult<ResourceSnapshot> {
        let stack = &self.settings.stack_name;
        let mut unreadable = Vec::new();
        for service_id in self.stack_service_ids().await? {
            match self.service(service_id).await {
                Ok(service) if service.name == id => return Ok(service_snapshot(&service)),
                Ok(_) => {}
                Err(e) => unreadable.push(e),
            }
        }
        Err(missing_service(id, stack, unreadable))
    }
}

/// Environment root with one host child per agent, in API order.
pub fn environment_topology(
    env_name: &str,
    hosts: Vec<(client::Host, Option<usize>)>,
) -> TopologyNode {
    let children = hosts
        .into_iter()
        .map(|(host, containers)| {
            TopologyNode::leaf(ResourceSnapshot::Host {
                hostname: host.hostname,
                state: host.state,
                containers,
            })
        })
        .collect();
    TopologyNode::with_children(
        ResourceSnapshot::Environment {
            name: env_name.to_string(),
        },
        children,
    )
}

fn find_stack<'a>(stacks: &'a [client::Stack], name: &str) -> ProbeResult<&'a client::Stack> {
    stacks
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| ProbeError::NotFound(format!("stack {name}")))
}

pub fn service_snapshot(service: &client::Service) -> ResourceSnapshot {
    ResourceSnapshot::Service {
        name: service.name.clone(),
        health_state: service.health_state.clone().unwrap_or_default(),
        scale: service.current_scale,
    }
}

/// Error for a service that no readable entry of the stack matched.
///
/// When some services of the stack could not be read, the wanted one may be
/// among them, so the result is `Unreachable` rather than `NotFound`.
fn missing_service(name: &str, stack: &str, unreadable: Vec<ProbeError>) -> ProbeError {
    match unreadable.first() {
        None => ProbeError::NotFound(format!("service {name} in stack {stack}")),
        Some(first) => ProbeError::Unreachable(format!(
            "service {name} not found in stack {stack}; {} service(s) unreadable, first: {first}",
            unreadable.len()
        )),
    }
}
