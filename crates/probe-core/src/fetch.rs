//! Data sources consumed by the driver.
//!
//! A [`Fetcher`] hides the transport (process invocation, HTTP) behind three
//! calls. The core only looks at the returned snapshots or typed failures.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ProbeError, ProbeResult};
use crate::snapshot::{ResourceSnapshot, TopologyNode};

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Structural topology of the monitored system (cluster, environment,
    /// tracker). Failure here means the whole check is UNKNOWN.
    async fn topology(&self) -> ProbeResult<TopologyNode>;

    /// Units reported on their own line, in discovery order.
    async fn units(&self) -> ProbeResult<Vec<String>>;

    /// Snapshot of one unit returned by [`Fetcher::units`].
    async fn unit(&self, id: &str) -> ProbeResult<ResourceSnapshot>;
}

/// In-memory fetcher returning canned results.
#[derive(Debug, Clone)]
pub struct StubFetcher {
    topology: ProbeResult<TopologyNode>,
    units: ProbeResult<Vec<String>>,
    snapshots: HashMap<String, ProbeResult<ResourceSnapshot>>,
    delays: HashMap<String, Duration>,
}

impl StubFetcher {
    pub fn new(topology: TopologyNode) -> Self {
        Self {
            topology: Ok(topology),
            units: Ok(Vec::new()),
            snapshots: HashMap::new(),
            delays: HashMap::new(),
        }
    }

    /// A fetcher whose topology cannot be retrieved.
    pub fn failing(error: ProbeError) -> Self {
        Self {
            topology: Err(error),
            units: Ok(Vec::new()),
            snapshots: HashMap::new(),
            delays: HashMap::new(),
        }
    }

    /// Register a unit that fetches successfully.
    pub fn with_unit(mut self, snapshot: ResourceSnapshot) -> Self {
        let id = snapshot.id().to_string();
        self.push_unit(&id);
        self.snapshots.insert(id, Ok(snapshot));
        self
    }

    /// Register a unit whose fetch fails.
    pub fn with_failed_unit(mut self, id: &str, error: ProbeError) -> Self {
        self.push_unit(id);
        self.snapshots.insert(id.to_string(), Err(error));
        self
    }

    /// Delay the fetch of `id` (topology when `id` is empty).
    pub fn with_delay(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(id.to_string(), delay);
        self
    }

    /// Make unit discovery itself fail.
    pub fn with_units_error(mut self, error: ProbeError) -> Self {
        self.units = Err(error);
        self
    }

    fn push_unit(&mut self, id: &str) {
        if let Ok(units) = &mut self.units {
            units.push(id.to_string());
        }
    }

    async fn pause(&self, id: &str) {
        if let Some(delay) = self.delays.get(id) {
            tokio::time::sleep(*delay).await;
        }
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn topology(&self) -> ProbeResult<TopologyNode> {
        self.pause("").await;
        self.topology.clone()
    }

    async fn units(&self) -> ProbeResult<Vec<String>> {
        self.units.clone()
    }

    async fn unit(&self, id: &str) -> ProbeResult<ResourceSnapshot> {
        self.pause(id).await;
        self.snapshots
            .get(id)
            .cloned()
            .unwrap_or_else(|| Err(ProbeError::NotFound(id.to_string())))
    }
}
