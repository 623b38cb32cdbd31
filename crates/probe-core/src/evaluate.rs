//! Structural health evaluation.
//!
//! Walks a [`TopologyNode`] tree, computes each node's own severity from its
//! declared state (capped at the kind's ceiling), and folds the children's
//! severities upward with [`Severity::combine`].

use crate::report::{Classification, PerfData, PerfValue};
use crate::severity::Severity;
use crate::snapshot::{ResourceKind, ResourceSnapshot, TopologyNode};

/// Narrative states the workflow tracker is expected to report.
pub const NARRATIVE_STATES: [&str; 2] = ["active", "queued"];

/// Evaluated node, mirroring the shape of the input topology.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeEvaluation {
    pub kind: ResourceKind,
    pub id: String,
    /// Severity from this node's own state only.
    pub own: Severity,
    /// `own` combined with every descendant.
    pub severity: Severity,
    /// Description token for this node, if it has anything to say.
    pub token: Option<String>,
    pub perf: Option<PerfData>,
    pub children: Vec<NodeEvaluation>,
}

impl NodeEvaluation {
    /// Tokens of the whole subtree, level by level, joined with spaces.
    ///
    /// Level order keeps the cluster mode first, then every server, then
    /// every flagged drive, regardless of which server owns the drive.
    pub fn describe(&self) -> String {
        let mut tokens = Vec::new();
        let mut level: Vec<&NodeEvaluation> = vec![self];
        while !level.is_empty() {
            tokens.extend(level.iter().filter_map(|n| n.token.as_deref()));
            level = level.iter().flat_map(|n| n.children.iter()).collect();
        }
        tokens.join(" ")
    }

    pub fn to_classification(&self) -> Classification {
        let classification = Classification::new(self.severity, self.describe());
        match &self.perf {
            Some(perf) => classification.with_perf(perf.clone()),
            None => classification,
        }
    }
}

/// Evaluate a topology tree.
pub fn evaluate(node: &TopologyNode) -> NodeEvaluation {
    let own = own_severity(&node.snapshot);
    let children: Vec<NodeEvaluation> = node.children.iter().map(evaluate).collect();
    let severity = own.combine(Severity::combine_all(children.iter().map(|c| c.severity)));

    let (token, perf) = match &node.snapshot {
        ResourceSnapshot::Tracker { .. } => {
            let (token, perf) = tracker_summary(&node.children);
            (Some(token), Some(perf))
        }
        other => (own_token(other, own), None),
    };

    NodeEvaluation {
        kind: node.kind(),
        id: node.snapshot.id().to_string(),
        own,
        severity,
        token,
        perf,
        children,
    }
}

/// Severity contributed by a snapshot's own state, capped at its kind's
/// ceiling.
pub fn own_severity(snapshot: &ResourceSnapshot) -> Severity {
    let raw = match snapshot {
        ResourceSnapshot::Cluster { mode, .. } => expect_state(mode, "online"),
        ResourceSnapshot::Server { state, .. } => expect_state(state, "online"),
        ResourceSnapshot::Drive { state, healing, .. } => {
            if state != "ok" || *healing {
                Severity::Warning
            } else {
                Severity::Ok
            }
        }
        ResourceSnapshot::Host { state, .. } => expect_state(state, "active"),
        ResourceSnapshot::Service { health_state, .. } => match health_state.as_str() {
            "healthy" => Severity::Ok,
            "unhealthy" => Severity::Critical,
            _ => Severity::Unknown,
        },
        ResourceSnapshot::Narrative { state, .. } => {
            if NARRATIVE_STATES.contains(&state.as_str()) {
                Severity::Ok
            } else {
                Severity::Warning
            }
        }
        ResourceSnapshot::Bucket(usage) => {
            crate::classify::classify_usage(usage.size_bytes, usage.quota_bytes)
        }
        ResourceSnapshot::Environment { .. } | ResourceSnapshot::Tracker { .. } => Severity::Ok,
    };
    raw.min(snapshot.kind().ceiling())
}

fn expect_state(actual: &str, healthy: &str) -> Severity {
    if actual == healthy {
        Severity::Ok
    } else {
        Severity::Critical
    }
}

/// Description token for a snapshot whose own severity is `own`.
///
/// Redundant units only speak up when something is wrong with them.
pub fn own_token(snapshot: &ResourceSnapshot, own: Severity) -> Option<String> {
    match snapshot {
        ResourceSnapshot::Cluster { mode, .. } => Some(format!("cluster: {mode}")),
        ResourceSnapshot::Server { endpoint, state } => Some(format!("{endpoint} : {state}")),
        ResourceSnapshot::Drive {
            endpoint,
            state,
            healing,
        } => (own > Severity::Ok).then(|| {
            if *healing {
                format!("{endpoint} : {state} (healing)")
            } else {
                format!("{endpoint} : {state}")
            }
        }),
        ResourceSnapshot::Environment { name } => Some(format!("environment: {name}")),
        ResourceSnapshot::Host {
            hostname, state, ..
        } => Some(format!("{hostname} : {state}")),
        ResourceSnapshot::Service {
            name, health_state, ..
        } => Some(format!("{name} : {health_state}")),
        ResourceSnapshot::Narrative { id, state } => {
            (own > Severity::Ok).then(|| format!("{id} : {state}"))
        }
        ResourceSnapshot::Bucket(_) | ResourceSnapshot::Tracker { .. } => None,
    }
}

fn tracker_summary(children: &[TopologyNode]) -> (String, PerfData) {
    let total = children.len() as u64;
    let count = |wanted: &str| {
        children
            .iter()
            .filter(|c| matches!(&c.snapshot, ResourceSnapshot::Narrative { state, .. } if state == wanted))
            .count() as u64
    };
    let active = count("active");
    let queued = count("queued");

    let token = format!("narratives: {total} total, {active} active, {queued} queued");
    let perf = PerfData(vec![
        PerfValue::count("total", total),
        PerfValue::count("active", active),
        PerfValue::count("queued", queued),
    ]);
    (token, perf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(mode: &str, servers: Vec<TopologyNode>) -> TopologyNode {
        TopologyNode::with_children(
            ResourceSnapshot::Cluster {
                name: "minio".into(),
                mode: mode.into(),
            },
            servers,
        )
    }

    fn server(endpoint: &str, state: &str, drives: Vec<TopologyNode>) -> TopologyNode {
        TopologyNode::with_children(
            ResourceSnapshot::Server {
                endpoint: endpoint.into(),
                state: state.into(),
            },
            drives,
        )
    }

    fn drive(endpoint: &str, state: &str, healing: bool) -> TopologyNode {
        TopologyNode::leaf(ResourceSnapshot::Drive {
            endpoint: endpoint.into(),
            state: state.into(),
            healing,
        })
    }

    fn healthy_server(endpoint: &str) -> TopologyNode {
        server(
            endpoint,
            "online",
            vec![
                drive(&format!("{endpoint}/data1"), "ok", false),
                drive(&format!("{endpoint}/data2"), "ok", false),
            ],
        )
    }

    #[test]
    fn all_healthy_is_ok() {
        let eval = evaluate(&cluster("online", vec![healthy_server("n1:9000"), healthy_server("n2:9000")]));
        assert_eq!(eval.severity, Severity::Ok);
        assert_eq!(eval.describe(), "cluster: online n1:9000 : online n2:9000 : online");
    }

    #[test]
    fn offline_server_is_critical() {
        let down = server("n2:9000", "offline", vec![drive("n2:9000/data1", "ok", false)]);
        let eval = evaluate(&cluster("online", vec![healthy_server("n1:9000"), down]));
        assert_eq!(eval.severity, Severity::Critical);
        assert_eq!(eval.own, Severity::Ok);
        assert_eq!(eval.children[1].own, Severity::Critical);
    }

    #[test]
    fn healing_drive_is_warning_not_critical() {
        let healing = server(
            "n2:9000",
            "online",
            vec![
                drive("n2:9000/data1", "ok", true),
                drive("n2:9000/data2", "ok", false),
            ],
        );
        let eval = evaluate(&cluster("online", vec![healthy_server("n1:9000"), healing]));
        assert_eq!(eval.severity, Severity::Warning);
        assert!(eval.describe().ends_with("n2:9000/data1 : ok (healing)"));
    }

    #[test]
    fn every_drive_failing_stays_at_warning() {
        let failing = server(
            "n1:9000",
            "online",
            vec![
                drive("n1:9000/data1", "offline", false),
                drive("n1:9000/data2", "faulty", false),
            ],
        );
        let eval = evaluate(&cluster("online", vec![failing]));
        assert_eq!(eval.severity, Severity::Warning);
    }

    #[test]
    fn offline_cluster_is_critical() {
        let eval = evaluate(&cluster("offline", vec![healthy_server("n1:9000")]));
        assert_eq!(eval.severity, Severity::Critical);
        assert!(eval.describe().starts_with("cluster: offline"));
    }

    #[test]
    fn drives_listed_after_all_servers() {
        let s1 = server("n1:9000", "online", vec![drive("n1:9000/data1", "offline", false)]);
        let s2 = healthy_server("n2:9000");
        let eval = evaluate(&cluster("online", vec![s1, s2]));
        assert_eq!(
            eval.describe(),
            "cluster: online n1:9000 : online n2:9000 : online n1:9000/data1 : offline"
        );
    }

    #[test]
    fn parent_is_max_of_own_and_children() {
        let s1 = server("n1:9000", "offline", vec![drive("n1:9000/data1", "offline", true)]);
        let eval = evaluate(&s1);
        assert_eq!(eval.own, Severity::Critical);
        assert_eq!(eval.children[0].severity, Severity::Warning);
        assert_eq!(eval.severity, Severity::Critical);
    }

    #[test]
    fn service_states() {
        let service = |state: &str| ResourceSnapshot::Service {
            name: "api".into(),
            health_state: state.into(),
            scale: 1,
        };
        assert_eq!(own_severity(&service("healthy")), Severity::Ok);
        assert_eq!(own_severity(&service("unhealthy")), Severity::Critical);
        assert_eq!(own_severity(&service("initializing")), Severity::Unknown);
    }

    #[test]
    fn environment_rolls_up_hosts() {
        let env = TopologyNode::with_children(
            ResourceSnapshot::Environment { name: "prod".into() },
            vec![
                TopologyNode::leaf(ResourceSnapshot::Host {
                    hostname: "agent-1".into(),
                    state: "active".into(),
                    containers: Some(3),
                }),
                TopologyNode::leaf(ResourceSnapshot::Host {
                    hostname: "agent-2".into(),
                    state: "disconnected".into(),
                    containers: None,
                }),
            ],
        );
        let eval = evaluate(&env);
        assert_eq!(eval.severity, Severity::Critical);
        assert_eq!(
            eval.describe(),
            "environment: prod agent-1 : active agent-2 : disconnected"
        );
    }

    #[test]
    fn tracker_counts_narratives() {
        let narrative = |id: &str, state: &str| {
            TopologyNode::leaf(ResourceSnapshot::Narrative {
                id: id.into(),
                state: state.into(),
            })
        };
        let tracker = TopologyNode::with_children(
            ResourceSnapshot::Tracker { name: "ci".into() },
            vec![
                narrative("n1", "active"),
                narrative("n2", "active"),
                narrative("n3", "queued"),
                narrative("n4", "exploded"),
            ],
        );
        let eval = evaluate(&tracker);
        assert_eq!(eval.severity, Severity::Warning);
        let c = eval.to_classification();
        assert_eq!(c.text, "narratives: 4 total, 2 active, 1 queued n4 : exploded");
        assert_eq!(c.perf.unwrap().to_string(), "total=4|active=2|queued=1");
    }

    #[test]
    fn empty_tracker_is_ok() {
        let eval = evaluate(&TopologyNode::leaf(ResourceSnapshot::Tracker { name: "ci".into() }));
        assert_eq!(eval.severity, Severity::Ok);
        assert_eq!(eval.describe(), "narratives: 0 total, 0 active, 0 queued");
    }
}
