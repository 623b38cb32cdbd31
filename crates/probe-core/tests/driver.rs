//! End-to-end check runs against the in-memory fetcher.

use std::time::Duration;

use probe_core::*;

const GIB: u64 = 1024 * 1024 * 1024;

fn drive(endpoint: &str, state: &str, healing: bool) -> TopologyNode {
    TopologyNode::leaf(ResourceSnapshot::Drive {
        endpoint: endpoint.to_string(),
        state: state.to_string(),
        healing,
    })
}

fn server(endpoint: &str, state: &str, drives: Vec<TopologyNode>) -> TopologyNode {
    TopologyNode::with_children(
        ResourceSnapshot::Server {
            endpoint: endpoint.to_string(),
            state: state.to_string(),
        },
        drives,
    )
}

fn cluster(servers: Vec<TopologyNode>) -> TopologyNode {
    TopologyNode::with_children(
        ResourceSnapshot::Cluster {
            name: "minio".to_string(),
            mode: "online".to_string(),
        },
        servers,
    )
}

fn healthy_cluster() -> TopologyNode {
    cluster(vec![
        server("n1:9000", "online", vec![drive("n1:9000/data", "ok", false)]),
        server("n2:9000", "online", vec![drive("n2:9000/data", "ok", false)]),
    ])
}

fn bucket(name: &str, size: u64, quota: Option<u64>, objects: u64) -> ResourceSnapshot {
    ResourceSnapshot::Bucket(BucketUsage {
        name: name.to_string(),
        size_bytes: Some(size),
        quota_bytes: quota,
        objects: Some(objects),
    })
}

fn minio_plan() -> CheckPlan {
    CheckPlan::new("MinIO").with_unit_prefix("Bucket_")
}

#[tokio::test]
async fn failed_unit_is_isolated() {
    let fetcher = StubFetcher::new(healthy_cluster())
        .with_unit(bucket("alpha", GIB, Some(100 * GIB), 1))
        .with_failed_unit("beta", ProbeError::Unreachable("mc exited with 1".into()))
        .with_unit(bucket("gamma", 2 * GIB, Some(100 * GIB), 2));

    let outcome = run_check(&fetcher, &minio_plan()).await;

    // Summary + three units.
    assert_eq!(outcome.lines.len(), 4);
    assert_eq!(outcome.lines[0].label, "MinIO");
    assert_eq!(outcome.lines[1].label, "Bucket_alpha");
    assert_eq!(outcome.lines[1].severity, Severity::Ok);
    assert_eq!(outcome.lines[2].label, "Bucket_beta");
    assert_eq!(outcome.lines[2].severity, Severity::Unknown);
    assert_eq!(outcome.lines[3].label, "Bucket_gamma");
    assert_eq!(outcome.lines[3].severity, Severity::Ok);
    assert_eq!(outcome.exit_code(), 3);
}

#[tokio::test]
async fn topology_failure_aborts_with_unknown() {
    let fetcher = StubFetcher::failing(ProbeError::Unreachable("connection refused".into()))
        .with_unit(bucket("alpha", GIB, None, 1));

    let outcome = run_check(&fetcher, &minio_plan()).await;

    assert_eq!(outcome.lines.len(), 1);
    assert_eq!(
        outcome.render(),
        "3 MinIO - UNKNOWN - unreachable: connection refused"
    );
    assert_eq!(outcome.exit_code(), 3);
}

#[tokio::test]
async fn critical_server_with_ok_drives_is_critical() {
    let topology = cluster(vec![
        server("n1:9000", "online", vec![drive("n1:9000/data", "ok", false)]),
        server("n2:9000", "offline", vec![drive("n2:9000/data", "ok", false)]),
    ]);
    let outcome = run_check(&StubFetcher::new(topology), &minio_plan()).await;
    assert_eq!(outcome.lines[0].severity, Severity::Critical);
    assert_eq!(outcome.exit_code(), 2);
}

#[tokio::test]
async fn healing_drive_is_warning_only() {
    let topology = cluster(vec![
        server("n1:9000", "online", vec![drive("n1:9000/data", "ok", true)]),
        server("n2:9000", "online", vec![drive("n2:9000/data", "ok", false)]),
    ]);
    let outcome = run_check(&StubFetcher::new(topology), &minio_plan()).await;
    assert_eq!(
        outcome.lines[0].to_string(),
        "1 MinIO - WARNING - cluster: online n1:9000 : online n2:9000 : online n1:9000/data : ok (healing)"
    );
    assert_eq!(outcome.exit_code(), 1);
}

#[tokio::test]
async fn bucket_lines_match_collector_format() {
    let fetcher = StubFetcher::new(healthy_cluster())
        .with_unit(bucket("reports/", 85 * GIB, Some(100 * GIB), 10))
        .with_unit(bucket("scratch", 5 * GIB, None, 0));

    let outcome = run_check(&fetcher, &minio_plan()).await;
    let rendered: Vec<String> = outcome.lines.iter().map(ToString::to_string).collect();

    assert_eq!(
        rendered[0],
        "0 MinIO - OK - cluster: online n1:9000 : online n2:9000 : online"
    );
    assert_eq!(
        rendered[1],
        "1 Bucket_reports used=85.00GiB;80.00GiB;90.00GiB;0GiB;100.00GiB|objects=10 WARNING - Used: 85.00% - 85.00 GiB of 100.00 GiB (10 Objects)"
    );
    assert_eq!(
        rendered[2],
        "1 Bucket_scratch used=5.00GiB|objects=0 WARNING - Used: 5.00 GiB"
    );
    assert_eq!(outcome.severity(), Severity::Warning);
}

#[tokio::test]
async fn unit_discovery_failure_still_reports() {
    let fetcher = StubFetcher::new(healthy_cluster())
        .with_units_error(ProbeError::MalformedResponse("expected JSON".into()));

    let outcome = run_check(&fetcher, &minio_plan()).await;

    assert_eq!(outcome.lines.len(), 2);
    assert_eq!(outcome.lines[1].label, "Bucket_inventory");
    assert_eq!(outcome.lines[1].severity, Severity::Unknown);
}

#[tokio::test(start_paused = true)]
async fn stalled_unit_times_out_to_unknown() {
    let fetcher = StubFetcher::new(healthy_cluster())
        .with_unit(bucket("slow", GIB, Some(100 * GIB), 1))
        .with_unit(bucket("fast", GIB, Some(100 * GIB), 1))
        .with_delay("slow", Duration::from_secs(600));

    let plan = minio_plan().with_timeout(Duration::from_secs(5));
    let outcome = run_check(&fetcher, &plan).await;

    assert_eq!(outcome.lines.len(), 3);
    assert_eq!(outcome.lines[1].severity, Severity::Unknown);
    assert!(outcome.lines[1].text.contains("timed out"));
    assert_eq!(outcome.lines[2].severity, Severity::Ok);
}

#[tokio::test(start_paused = true)]
async fn stalled_topology_times_out() {
    let fetcher = StubFetcher::new(healthy_cluster()).with_delay("", Duration::from_secs(600));
    let plan = minio_plan().with_timeout(Duration::from_secs(1));
    let outcome = run_check(&fetcher, &plan).await;
    assert_eq!(outcome.lines.len(), 1);
    assert_eq!(outcome.exit_code(), 3);
}

#[tokio::test]
async fn child_lines_follow_summary() {
    let environment = TopologyNode::with_children(
        ResourceSnapshot::Environment {
            name: "prod".into(),
        },
        vec![
            TopologyNode::leaf(ResourceSnapshot::Host {
                hostname: "agent-1".into(),
                state: "active".into(),
                containers: Some(12),
            }),
            TopologyNode::leaf(ResourceSnapshot::Host {
                hostname: "agent-2".into(),
                state: "inactive".into(),
                containers: None,
            }),
        ],
    );
    let fetcher = StubFetcher::new(environment)
        .with_unit(ResourceSnapshot::Service {
            name: "api".into(),
            health_state: "healthy".into(),
            scale: 2,
        })
        .with_failed_unit("worker", ProbeError::NotFound("service worker in stack web".into()));

    let plan = CheckPlan::new("rancher_prod")
        .with_child_prefix("rancher_agent_")
        .with_unit_prefix("prod_web_");
    let outcome = run_check(&fetcher, &plan).await;
    let rendered: Vec<String> = outcome.lines.iter().map(ToString::to_string).collect();

    assert_eq!(
        rendered,
        vec![
            "2 rancher_prod - CRITICAL - environment: prod agent-1 : active agent-2 : inactive",
            "0 rancher_agent_agent-1 - OK - host agent-1 running containers: 12",
            "2 rancher_agent_agent-2 - CRITICAL - host agent-2 running containers: unknown",
            "0 prod_web_api - OK - running instances: 2",
            "3 prod_web_worker - UNKNOWN - not found: service worker in stack web",
        ]
    );
    assert_eq!(outcome.exit_code(), 3);
}
