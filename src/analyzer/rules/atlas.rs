//! Atlas advisor correlation: Performance Advisor output, alerts, tier
//! sizing and version currency.
//!
//! ## Rule list:
//! - ATLAS_INDEX_SUGGESTION: advisor suggestion, weighted by code overlap
//! - ATLAS_ALERT_ACTIVE: alert not in a known-closed state
//! - ATLAS_TIER_MISMATCH: low tier carrying a large data volume
//! - ATLAS_VERSION_BEHIND: cluster below the newest offered version

use std::cmp::Ordering;

use crate::analyzer::common::{compare_versions, format_bytes, split_namespace};
use crate::analyzer::thresholds;
use crate::models::{
    AtlasAlert, AtlasCluster, CollectionInfo, Finding, FindingType, ScanResult, Severity,
    SuggestedIndex,
};

/// Alert statuses that mean the alert no longer needs attention.
const CLOSED_ALERT_STATUSES: &[&str] = &["CLOSED", "RESOLVED", "CANCELLED"];

/// Alert event fragments that indicate availability trouble.
fn is_critical_event(event: &str) -> bool {
    let upper = event.to_ascii_uppercase();
    upper.contains("OUTSIDE_METRIC_THRESHOLD")
        || upper.contains("NO_PRIMARY")
        || (upper.contains("HOST") && upper.contains("DOWN"))
}

pub fn audit_suggested_indexes(
    suggestions: &[SuggestedIndex],
    scan: Option<&ScanResult>,
) -> Vec<Finding> {
    let mut findings = Vec::new();

    for suggestion in suggestions {
        let (database, collection) = match split_namespace(&suggestion.namespace) {
            Some((db, coll)) => (db.to_string(), coll.to_string()),
            None if suggestion.namespace.is_empty() => ("atlas".to_string(), String::new()),
            None => ("atlas".to_string(), suggestion.namespace.clone()),
        };

        let matched_in_code = scan.is_some_and(|s| {
            suggestion.fields.iter().any(|field| {
                s.field_refs.iter().any(|r| {
                    r.field == *field
                        && (collection.is_empty() || r.collection.eq_ignore_ascii_case(&collection))
                })
            })
        });

        let severity = if matched_in_code { Severity::Low } else { Severity::Info };
        let confirmation = if matched_in_code {
            "; the scanned code queries these fields"
        } else {
            ""
        };
        findings.push(
            Finding::new(
                FindingType::AtlasIndexSuggestion,
                severity,
                format!(
                    "Atlas suggests an index on '{}' over [{}]{}",
                    suggestion.namespace,
                    suggestion.fields.join(", "),
                    confirmation
                ),
            )
            .database(&database)
            .collection(&collection),
        );
    }

    findings
}

pub fn audit_alerts(alerts: &[AtlasAlert]) -> Vec<Finding> {
    let mut findings = Vec::new();

    for alert in alerts {
        let status = alert.status.to_ascii_uppercase();
        let active = status.is_empty()
            || matches!(status.as_str(), "OPEN" | "TRACKING" | "CREATED")
            || !CLOSED_ALERT_STATUSES.contains(&status.as_str());
        if !active {
            continue;
        }
        let severity = if is_critical_event(&alert.event_type_name) {
            Severity::High
        } else {
            Severity::Medium
        };
        findings.push(Finding::new(
            FindingType::AtlasAlertActive,
            severity,
            format!(
                "Atlas alert '{}' is {}",
                alert.event_type_name,
                if alert.status.is_empty() { "active" } else { alert.status.as_str() }
            ),
        ));
    }

    findings
}

pub fn audit_cluster_tier(cluster: &AtlasCluster, collections: &[CollectionInfo]) -> Vec<Finding> {
    let mut findings = Vec::new();

    if let Some(tier) = low_tier_number(&cluster.instance_size_name) {
        let total_storage: i64 = collections.iter().map(|c| c.storage_size).sum();
        if total_storage >= thresholds::ATLAS_TIER_STORAGE_BYTES {
            findings.push(Finding::new(
                FindingType::AtlasTierMismatch,
                Severity::High,
                format!(
                    "cluster tier M{} carries {} of storage; the tier is undersized for the data volume",
                    tier,
                    format_bytes(total_storage)
                ),
            ));
        }
    }

    findings
}

pub fn audit_cluster_version(
    cluster: &AtlasCluster,
    available_versions: &[String],
) -> Vec<Finding> {
    let mut findings = Vec::new();

    let newest = available_versions
        .iter()
        .max_by(|a, b| compare_versions(a, b))
        .cloned();
    if let Some(newest) = newest
        && compare_versions(&cluster.mongo_db_version, &newest) == Ordering::Less
    {
        findings.push(Finding::new(
            FindingType::AtlasVersionBehind,
            Severity::Medium,
            format!(
                "cluster runs MongoDB {} while {} is available",
                cluster.mongo_db_version, newest
            ),
        ));
    }

    findings
}

/// Parse `M<n>` tiers; only M1..=M10 count as low tiers.
fn low_tier_number(instance_size: &str) -> Option<u64> {
    let n = instance_size.strip_prefix('M')?.parse::<u64>().ok()?;
    (1..=thresholds::ATLAS_LOW_TIER_MAX).contains(&n).then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldRef;

    fn cluster(tier: &str, version: &str) -> AtlasCluster {
        AtlasCluster {
            name: "cluster0".into(),
            instance_size_name: tier.into(),
            mongo_db_version: version.into(),
            state_name: "IDLE".into(),
        }
    }

    fn storage(total_gib: i64) -> Vec<CollectionInfo> {
        vec![CollectionInfo {
            database: "app".into(),
            name: "big".into(),
            storage_size: total_gib * thresholds::GIB,
            ..Default::default()
        }]
    }

    #[test]
    fn m10_with_large_storage_is_mismatched() {
        let findings = audit_cluster_tier(&cluster("M10", "7.0"), &storage(550));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingType::AtlasTierMismatch);
        assert_eq!(findings[0].severity, Severity::High);
    }

    #[test]
    fn higher_tiers_are_exempt() {
        let findings = audit_cluster_tier(&cluster("M30", "7.0"), &storage(550));
        assert!(findings.is_empty());
    }

    #[test]
    fn small_storage_on_low_tier_is_fine() {
        let findings = audit_cluster_tier(&cluster("M10", "7.0"), &storage(100));
        assert!(findings.is_empty());
    }

    #[test]
    fn version_behind_detected_with_normalization() {
        let findings = audit_cluster_version(
            &cluster("M10", "6.0.11"),
            &["6.0".into(), "7.0".into(), "8.0".into()],
        );
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("8.0"));
    }

    #[test]
    fn current_version_is_quiet() {
        let findings = audit_cluster_version(&cluster("M10", "8.0"), &["7.0".into(), "8.0".into()]);
        assert!(findings.is_empty());
    }

    #[test]
    fn suggestion_with_code_overlap_is_low() {
        let scan = ScanResult {
            field_refs: vec![FieldRef {
                collection: "orders".into(),
                field: "status".into(),
                file: "app.js".into(),
                line: 3,
            }],
            ..Default::default()
        };
        let suggestion = SuggestedIndex {
            namespace: "app.orders".into(),
            fields: vec!["status".into()],
            weight: 4.2,
        };
        let findings = audit_suggested_indexes(&[suggestion], Some(&scan));
        assert_eq!(findings[0].severity, Severity::Low);
        assert_eq!(findings[0].database, "app");
        assert_eq!(findings[0].collection, "orders");
    }

    #[test]
    fn suggestion_without_overlap_is_info() {
        let suggestion = SuggestedIndex {
            namespace: "app.orders".into(),
            fields: vec!["status".into()],
            weight: 1.0,
        };
        let findings = audit_suggested_indexes(&[suggestion], None);
        assert_eq!(findings[0].severity, Severity::Info);
    }

    #[test]
    fn namespace_without_dot_falls_back_to_atlas_db() {
        let suggestion = SuggestedIndex {
            namespace: "orders".into(),
            fields: vec!["status".into()],
            weight: 1.0,
        };
        let findings = audit_suggested_indexes(&[suggestion], None);
        assert_eq!(findings[0].database, "atlas");
        assert_eq!(findings[0].collection, "orders");
    }

    #[test]
    fn open_and_unknown_statuses_are_active() {
        let alerts = vec![
            AtlasAlert { status: "OPEN".into(), event_type_name: "CPU".into(), ..Default::default() },
            AtlasAlert { status: "WEIRD".into(), event_type_name: "CPU".into(), ..Default::default() },
            AtlasAlert { status: String::new(), event_type_name: "CPU".into(), ..Default::default() },
        ];
        assert_eq!(audit_alerts(&alerts).len(), 3);
    }

    #[test]
    fn closed_statuses_are_quiet() {
        for status in ["CLOSED", "RESOLVED", "CANCELLED", "closed"] {
            let alert = AtlasAlert {
                status: status.into(),
                event_type_name: "CPU".into(),
                ..Default::default()
            };
            assert!(audit_alerts(&[alert]).is_empty(), "{}", status);
        }
    }

    #[test]
    fn critical_events_are_high() {
        for event in ["OUTSIDE_METRIC_THRESHOLD", "NO_PRIMARY", "HOST_IS_DOWN"] {
            let alert = AtlasAlert {
                status: "OPEN".into(),
                event_type_name: event.into(),
                ..Default::default()
            };
            let findings = audit_alerts(&[alert]);
            assert_eq!(findings[0].severity, Severity::High, "{}", event);
        }

        let alert = AtlasAlert {
            status: "OPEN".into(),
            event_type_name: "CREDIT_CARD_ABOUT_TO_EXPIRE".into(),
            ..Default::default()
        };
        assert_eq!(audit_alerts(&[alert])[0].severity, Severity::Medium);
    }
}
