//! The analyzer: a pure function from snapshot inputs to a finding stream.
//!
//! Collectors (inspector, Atlas client, scanner) run upstream, possibly
//! concurrently, and are joined into an [`AuditSnapshot`] before analysis.
//! [`run_audit`] invokes every family its inputs enable, concatenates the
//! streams in a fixed order, applies ignore filtering and optionally diffs
//! against a baseline. Nothing here touches the network or the clock.

pub mod baseline;
pub mod common;
pub mod compare;
pub mod ignore;
pub mod rules;
pub mod thresholds;

#[cfg(test)]
mod tests;

pub use baseline::{diff_findings, load_baseline};
pub use compare::compare_clusters;
pub use ignore::{IgnoreList, IgnoreRule};

use chrono::{DateTime, Utc};

use crate::models::{
    AtlasSnapshot, BaselineFinding, CollectionInfo, FieldSampleResult, Finding, ProfileEntry,
    ReplicaSetInfo, Report, ScanResult, SecurityInfo, Severity, ShardingInfo, UserInfo,
    max_severity,
};

/// Everything one audit run observes, fully materialized.
#[derive(Debug, Clone, Default)]
pub struct AuditSnapshot {
    /// Connection string as given; linted passively, never re-dialed.
    pub uri: Option<String>,
    /// Capture time, recorded by the caller; used for elapsed-time phrasing
    /// so the analyzer itself never reads the clock.
    pub taken_at: Option<DateTime<Utc>>,
    pub collections: Vec<CollectionInfo>,
    pub users: Vec<UserInfo>,
    pub security: Option<SecurityInfo>,
    pub replica_set: Option<ReplicaSetInfo>,
    pub sharding: Option<ShardingInfo>,
    pub samples: Vec<FieldSampleResult>,
    pub profile_entries: Vec<ProfileEntry>,
    pub scan: Option<ScanResult>,
    pub atlas: Option<AtlasSnapshot>,
}

/// Result of one audit run.
#[derive(Debug, Clone)]
pub struct AuditOutcome {
    /// Retained findings, post-ignore, in family order.
    pub findings: Vec<Finding>,
    /// Findings removed by the ignore engine.
    pub suppressed: usize,
    /// Baseline classification when a baseline was supplied.
    pub baseline: Option<Vec<BaselineFinding>>,
    pub max_severity: Severity,
}

impl AuditOutcome {
    pub fn exit_code(&self) -> i32 {
        self.max_severity.exit_code()
    }
}

/// Run every applicable audit family over the snapshot.
///
/// Family order is part of the contract: it determines user-visible
/// ordering and the diff output. Within a family, ordering follows the
/// family's own documented tie-breaks.
pub fn run_audit(
    snapshot: &AuditSnapshot,
    baseline: Option<&Report>,
    ignore: &IgnoreList,
) -> AuditOutcome {
    let mut findings = Vec::new();

    if let Some(uri) = &snapshot.uri {
        findings.extend(rules::lint_uri(uri));
    }

    findings.extend(rules::audit_collections(&snapshot.collections));
    findings.extend(rules::audit_users(&snapshot.users));

    if let Some(security) = &snapshot.security {
        findings.extend(rules::audit_security(security));
    }
    if let Some(replica_set) = &snapshot.replica_set {
        findings.extend(rules::audit_replica_set(replica_set));
    }
    if let Some(sharding) = &snapshot.sharding {
        findings.extend(rules::audit_sharding(sharding, &snapshot.collections));
    }

    if let Some(scan) = &snapshot.scan {
        findings.extend(rules::audit_schema_drift(&snapshot.samples, scan));
    }
    findings.extend(rules::audit_anti_patterns(&snapshot.samples));

    if let Some(prior) = baseline
        && !prior.collections.is_empty()
    {
        let elapsed = match (prior.metadata.timestamp, snapshot.taken_at) {
            (Some(then), Some(now)) => Some(common::format_elapsed(now - then)),
            _ => None,
        };
        findings.extend(rules::audit_growth(
            &snapshot.collections,
            &prior.collections,
            elapsed.as_deref(),
        ));
    }

    if let Some(scan) = &snapshot.scan {
        findings.extend(rules::audit_validators(&snapshot.collections, scan));
        findings.extend(rules::audit_code_cluster(scan, &snapshot.collections));
    }
    findings.extend(rules::correlate_profiler(
        snapshot.scan.as_ref(),
        &snapshot.profile_entries,
    ));

    if let Some(atlas) = &snapshot.atlas {
        findings.extend(rules::audit_atlas_users(&atlas.users));
        if !atlas.users.is_empty() {
            findings.extend(rules::detect_inactive_users(&atlas.users, &atlas.access_logs));
        }
        findings.extend(rules::audit_suggested_indexes(
            &atlas.suggested_indexes,
            snapshot.scan.as_ref(),
        ));
        findings.extend(rules::audit_alerts(&atlas.alerts));
        if let Some(cluster) = &atlas.cluster {
            findings.extend(rules::audit_cluster_tier(cluster, &snapshot.collections));
            findings.extend(rules::audit_cluster_version(cluster, &atlas.available_versions));
        }
    }

    let (retained, suppressed) = ignore.filter(findings);
    let baseline_diff = baseline.map(|prior| diff_findings(&retained, &prior.findings));
    let severity = max_severity(&retained);

    AuditOutcome {
        findings: retained,
        suppressed,
        baseline: baseline_diff,
        max_severity: severity,
    }
}
