//! Threshold classification.
//!
//! Bands are fixed: usage above 80% of quota warns, 90% or more is
//! critical. Classification always works on the raw byte ratio; gibibyte
//! figures exist only for display so rounding can never flip a band.

use crate::report::{bytes_to_gib, Classification, PerfData, PerfValue, Thresholds};
use crate::severity::Severity;
use crate::snapshot::{BucketUsage, ResourceSnapshot};

pub const WARNING_RATIO: f64 = 0.80;
pub const CRITICAL_RATIO: f64 = 0.90;

/// Map a usage ratio (used / quota) to a severity.
pub fn classify_ratio(ratio: f64) -> Severity {
    if ratio >= CRITICAL_RATIO {
        Severity::Critical
    } else if ratio > WARNING_RATIO {
        Severity::Warning
    } else {
        Severity::Ok
    }
}

/// Classify raw usage against an optional quota.
///
/// A zero quota is treated as absent. Usage without a quota warns, even
/// when usage is zero.
pub fn classify_usage(used: Option<u64>, quota: Option<u64>) -> Severity {
    match (used, quota.filter(|q| *q > 0)) {
        (Some(used), Some(quota)) => classify_ratio(used as f64 / quota as f64),
        (Some(_), None) => Severity::Warning,
        (None, _) => Severity::Unknown,
    }
}

/// Full classification of a bucket: severity, text and performance data.
pub fn classify_bucket(usage: &BucketUsage) -> Classification {
    let severity = classify_usage(usage.size_bytes, usage.quota_bytes);
    let Some(size_bytes) = usage.size_bytes else {
        return Classification::new(severity, "usage unavailable");
    };

    let used_gib = bytes_to_gib(size_bytes);
    let objects = usage.objects.unwrap_or(0);
    let objects_suffix = if objects > 0 {
        format!(" ({objects} Objects)")
    } else {
        String::new()
    };

    match usage.quota_bytes.filter(|q| *q > 0) {
        Some(quota_bytes) => {
            let quota_gib = bytes_to_gib(quota_bytes);
            let percentage = size_bytes as f64 / quota_bytes as f64 * 100.0;
            let perf = PerfData(vec![
                PerfValue::fixed("used", used_gib, "GiB")
                    .with_thresholds(Thresholds::from_quota(quota_gib)),
                PerfValue::count("objects", objects),
            ]);
            Classification::new(
                severity,
                format!(
                    "Used: {percentage:.2}% - {used_gib:.2} GiB of {quota_gib:.2} GiB{objects_suffix}"
                ),
            )
            .with_perf(perf)
        }
        None => {
            let perf = PerfData(vec![
                PerfValue::fixed("used", used_gib, "GiB"),
                PerfValue::count("objects", objects),
            ]);
            Classification::new(severity, format!("Used: {used_gib:.2} GiB{objects_suffix}"))
                .with_perf(perf)
        }
    }
}

/// Classify a standalone unit snapshot.
///
/// Buckets go through the quota bands; hosts and services carry their own
/// line text. Topology-only kinds fall back to their structural rule.
pub fn classify_snapshot(snapshot: &ResourceSnapshot) -> Classification {
    match snapshot {
        ResourceSnapshot::Bucket(usage) => classify_bucket(usage),
        ResourceSnapshot::Host {
            hostname,
            containers,
            ..
        } => {
            let running = containers
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            Classification::new(
                crate::evaluate::own_severity(snapshot),
                format!("host {hostname} running containers: {running}"),
            )
        }
        ResourceSnapshot::Service { scale, .. } => Classification::new(
            crate::evaluate::own_severity(snapshot),
            format!("running instances: {scale}"),
        ),
        ResourceSnapshot::Cluster { .. }
        | ResourceSnapshot::Server { .. }
        | ResourceSnapshot::Drive { .. }
        | ResourceSnapshot::Environment { .. }
        | ResourceSnapshot::Tracker { .. }
        | ResourceSnapshot::Narrative { .. } => {
            let severity = crate::evaluate::own_severity(snapshot);
            let text = crate::evaluate::own_token(snapshot, severity)
                .unwrap_or_else(|| format!("{}: {}", snapshot.kind().as_str(), snapshot.id()));
            Classification::new(severity, text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIB: u64 = 1024 * 1024 * 1024;

    fn bucket(size: Option<u64>, quota: Option<u64>, objects: Option<u64>) -> BucketUsage {
        BucketUsage {
            name: "data".to_string(),
            size_bytes: size,
            quota_bytes: quota,
            objects,
        }
    }

    #[test]
    fn ratio_band_boundaries() {
        assert_eq!(classify_ratio(0.0), Severity::Ok);
        assert_eq!(classify_ratio(0.80), Severity::Ok);
        assert_eq!(classify_ratio(0.800_000_01), Severity::Warning);
        assert_eq!(classify_ratio(0.899_999), Severity::Warning);
        assert_eq!(classify_ratio(0.90), Severity::Critical);
        assert_eq!(classify_ratio(1.5), Severity::Critical);
    }

    #[test]
    fn ratio_is_monotonic() {
        let mut previous = Severity::Ok;
        for step in 0..=1200 {
            let severity = classify_ratio(step as f64 / 1000.0);
            assert!(severity >= previous, "band inverted at {step}");
            previous = severity;
        }
    }

    #[test]
    fn exact_eighty_percent_of_quota_is_ok() {
        assert_eq!(classify_usage(Some(80 * GIB), Some(100 * GIB)), Severity::Ok);
        assert_eq!(classify_usage(Some(90 * GIB), Some(100 * GIB)), Severity::Critical);
    }

    #[test]
    fn quota_absent_warns() {
        assert_eq!(classify_usage(Some(5 * GIB), None), Severity::Warning);
        assert_eq!(classify_usage(Some(u64::MAX), None), Severity::Warning);
    }

    // An empty bucket without a quota still warns. Changing this is a
    // product decision; keep this test in step with it.
    #[test]
    fn quota_absent_and_empty_still_warns() {
        assert_eq!(classify_usage(Some(0), None), Severity::Warning);
    }

    #[test]
    fn zero_quota_is_absent() {
        assert_eq!(classify_usage(Some(GIB), Some(0)), Severity::Warning);
        assert_eq!(classify_usage(Some(0), Some(0)), Severity::Warning);
    }

    #[test]
    fn usage_unobtainable_is_unknown() {
        assert_eq!(classify_usage(None, None), Severity::Unknown);
        assert_eq!(classify_usage(None, Some(GIB)), Severity::Unknown);
    }

    #[test]
    fn bucket_with_quota_in_warning_band() {
        let c = classify_bucket(&bucket(Some(85 * GIB), Some(100 * GIB), Some(10)));
        assert_eq!(c.severity, Severity::Warning);
        assert_eq!(
            c.perf.unwrap().to_string(),
            "used=85.00GiB;80.00GiB;90.00GiB;0GiB;100.00GiB|objects=10"
        );
        assert_eq!(c.text, "Used: 85.00% - 85.00 GiB of 100.00 GiB (10 Objects)");
    }

    #[test]
    fn bucket_without_quota() {
        let c = classify_bucket(&bucket(Some(5 * GIB), None, Some(0)));
        assert_eq!(c.severity, Severity::Warning);
        assert_eq!(c.perf.unwrap().to_string(), "used=5.00GiB|objects=0");
        assert_eq!(c.text, "Used: 5.00 GiB");
        assert!(!c.text.contains('%'));
    }

    #[test]
    fn bucket_without_usage_has_no_perf() {
        let c = classify_bucket(&bucket(None, Some(GIB), None));
        assert_eq!(c.severity, Severity::Unknown);
        assert!(c.perf.is_none());
    }

    #[test]
    fn bucket_under_quota_is_ok() {
        let c = classify_bucket(&bucket(Some(10 * GIB), Some(100 * GIB), Some(3)));
        assert_eq!(c.severity, Severity::Ok);
        assert!(c.text.starts_with("Used: 10.00%"));
    }

    #[test]
    fn host_snapshot_text() {
        let c = classify_snapshot(&ResourceSnapshot::Host {
            hostname: "agent-1".into(),
            state: "reconnecting".into(),
            containers: Some(7),
        });
        assert_eq!(c.severity, Severity::Critical);
        assert_eq!(c.text, "host agent-1 running containers: 7");
    }

    #[test]
    fn service_snapshot_text() {
        let c = classify_snapshot(&ResourceSnapshot::Service {
            name: "api".into(),
            health_state: "healthy".into(),
            scale: 3,
        });
        assert_eq!(c.severity, Severity::Ok);
        assert_eq!(c.text, "running instances: 3");
    }
}
