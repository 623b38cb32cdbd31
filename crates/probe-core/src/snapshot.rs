//! Point-in-time facts about monitored resources.
//!
//! A [`ResourceSnapshot`] is produced once per check run by a fetcher and
//! never mutated. A [`TopologyNode`] owns its children outright, so the
//! resource tree is strictly tree-shaped for the duration of a run.

use serde::{Deserialize, Serialize};

use crate::severity::Severity;

/// Discriminant of a [`ResourceSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Bucket,
    Cluster,
    Server,
    Drive,
    Environment,
    Host,
    Service,
    Tracker,
    Narrative,
}

impl ResourceKind {
    /// Highest severity a node of this kind may contribute on its own.
    ///
    /// Redundant or self-healing units (drives, individual narratives) are
    /// capped at `Warning`; structurally essential units are not capped.
    pub fn ceiling(self) -> Severity {
        match self {
            ResourceKind::Drive | ResourceKind::Narrative => Severity::Warning,
            ResourceKind::Bucket
            | ResourceKind::Cluster
            | ResourceKind::Server
            | ResourceKind::Environment
            | ResourceKind::Host
            | ResourceKind::Service
            | ResourceKind::Tracker => Severity::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Bucket => "bucket",
            ResourceKind::Cluster => "cluster",
            ResourceKind::Server => "server",
            ResourceKind::Drive => "drive",
            ResourceKind::Environment => "environment",
            ResourceKind::Host => "host",
            ResourceKind::Service => "service",
            ResourceKind::Tracker => "tracker",
            ResourceKind::Narrative => "narrative",
        }
    }
}

/// Storage usage of a single bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketUsage {
    pub name: String,
    /// Bytes stored; `None` when usage could not be obtained.
    pub size_bytes: Option<u64>,
    /// Hard quota in bytes; `None` or `Some(0)` means no quota is set.
    pub quota_bytes: Option<u64>,
    pub objects: Option<u64>,
}

/// Immutable fact about one monitored unit at check time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceSnapshot {
    Bucket(BucketUsage),
    Cluster {
        name: String,
        /// Cluster mode; healthy token is `online`.
        mode: String,
    },
    Server {
        endpoint: String,
        /// Healthy token is `online`.
        state: String,
    },
    Drive {
        endpoint: String,
        /// Healthy token is `ok`.
        state: String,
        healing: bool,
    },
    Environment {
        name: String,
    },
    Host {
        hostname: String,
        /// Healthy token is `active`.
        state: String,
        /// Running containers; `None` when the instance list was unavailable.
        containers: Option<usize>,
    },
    Service {
        name: String,
        /// `healthy`, `unhealthy`, or anything else (unknown).
        health_state: String,
        scale: u32,
    },
    Tracker {
        name: String,
    },
    Narrative {
        id: String,
        state: String,
    },
}

impl ResourceSnapshot {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceSnapshot::Bucket(_) => ResourceKind::Bucket,
            ResourceSnapshot::Cluster { .. } => ResourceKind::Cluster,
            ResourceSnapshot::Server { .. } => ResourceKind::Server,
            ResourceSnapshot::Drive { .. } => ResourceKind::Drive,
            ResourceSnapshot::Environment { .. } => ResourceKind::Environment,
            ResourceSnapshot::Host { .. } => ResourceKind::Host,
            ResourceSnapshot::Service { .. } => ResourceKind::Service,
            ResourceSnapshot::Tracker { .. } => ResourceKind::Tracker,
            ResourceSnapshot::Narrative { .. } => ResourceKind::Narrative,
        }
    }

    /// Identifier of the unit within its kind.
    pub fn id(&self) -> &str {
        match self {
            ResourceSnapshot::Bucket(usage) => &usage.name,
            ResourceSnapshot::Cluster { name, .. }
            | ResourceSnapshot::Environment { name }
            | ResourceSnapshot::Service { name, .. }
            | ResourceSnapshot::Tracker { name } => name,
            ResourceSnapshot::Server { endpoint, .. } | ResourceSnapshot::Drive { endpoint, .. } => {
                endpoint
            }
            ResourceSnapshot::Host { hostname, .. } => hostname,
            ResourceSnapshot::Narrative { id, .. } => id,
        }
    }
}

/// A snapshot plus the children it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyNode {
    pub snapshot: ResourceSnapshot,
    #[serde(default)]
    pub children: Vec<TopologyNode>,
}

impl TopologyNode {
    pub fn leaf(snapshot: ResourceSnapshot) -> Self {
        Self {
            snapshot,
            children: Vec::new(),
        }
    }

    pub fn with_children(snapshot: ResourceSnapshot, children: Vec<TopologyNode>) -> Self {
        Self { snapshot, children }
    }

    pub fn kind(&self) -> ResourceKind {
        self.snapshot.kind()
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(TopologyNode::node_count)
            .sum::<usize>()
    }
}
