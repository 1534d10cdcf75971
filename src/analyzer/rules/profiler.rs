//! Profiler correlation: attribute slow profiler entries to the source
//! locations that most plausibly issued them.
//!
//! ## Rule list:
//! - SLOW_QUERY_SOURCE: average duration and sample count per location
//! - COLLECTION_SCAN_SOURCE: attributed entries that ran as COLLSCAN
//! - FREQUENT_SLOW_QUERY: one query shape recurring past the threshold
//!
//! Attribution scores each known source location of the entry's collection
//! by overlapping (or dot-prefix-equivalent) fields and credits every
//! location tied for the best non-zero score. When nothing overlaps but
//! locations exist the entry is credited to the first location in
//! `(file, line)` order; a deliberate approximation that keeps every slow
//! entry visible.

use std::collections::{BTreeMap, BTreeSet};

use crate::analyzer::thresholds;
use crate::models::{Finding, FindingType, ProfileEntry, ScanResult, Severity};

#[derive(Debug, Default)]
struct LocationStats {
    total_millis: i64,
    samples: usize,
    collscans: usize,
}

type LocationKey = (String, String, String, u32); // (db, collection, file, line)
type ShapeKey = (String, String, Vec<String>, Vec<String>, Vec<String>);

#[derive(Debug, Default)]
struct ShapeStats {
    count: usize,
    sources: BTreeSet<(String, u32)>,
}

pub fn correlate_profiler(scan: Option<&ScanResult>, entries: &[ProfileEntry]) -> Vec<Finding> {
    let Some(scan) = scan else {
        return Vec::new();
    };

    // (file, line) -> referenced fields, grouped by lowercased collection.
    let mut locations: BTreeMap<String, BTreeMap<(String, u32), BTreeSet<String>>> =
        BTreeMap::new();
    for r in &scan.refs {
        locations
            .entry(r.collection.to_ascii_lowercase())
            .or_default()
            .entry((r.file.clone(), r.line))
            .or_default();
    }
    for r in &scan.field_refs {
        locations
            .entry(r.collection.to_ascii_lowercase())
            .or_default()
            .entry((r.file.clone(), r.line))
            .or_default()
            .insert(r.field.clone());
    }

    let mut per_location: BTreeMap<LocationKey, LocationStats> = BTreeMap::new();
    let mut per_shape: BTreeMap<ShapeKey, ShapeStats> = BTreeMap::new();

    for entry in entries {
        let Some(collection_locations) = locations.get(&entry.collection.to_ascii_lowercase())
        else {
            continue;
        };
        if collection_locations.is_empty() {
            continue;
        }

        let mut entry_fields: BTreeSet<&str> = BTreeSet::new();
        entry_fields.extend(entry.filter_fields.iter().map(String::as_str));
        entry_fields.extend(entry.sort_fields.iter().map(String::as_str));
        entry_fields.extend(entry.projection_fields.iter().map(String::as_str));

        // Score every location; keep all tied for the best non-zero score.
        let mut best_score = 0usize;
        let mut scored: Vec<(&(String, u32), usize)> = Vec::new();
        for (loc, fields) in collection_locations {
            let score = entry_fields
                .iter()
                .filter(|f| fields.iter().any(|lf| fields_equivalent(f, lf)))
                .count();
            best_score = best_score.max(score);
            scored.push((loc, score));
        }

        let attributed: Vec<&(String, u32)> = if best_score > 0 {
            scored
                .iter()
                .filter(|(_, s)| *s == best_score)
                .map(|(loc, _)| *loc)
                .collect()
        } else {
            // BTreeMap iteration already sorts by (file, line).
            vec![scored[0].0]
        };

        let is_collscan = entry.plan_summary.to_ascii_uppercase().contains("COLLSCAN");
        for (file, line) in &attributed {
            let key = (
                entry.database.clone(),
                entry.collection.clone(),
                file.clone(),
                *line,
            );
            let stats = per_location.entry(key).or_default();
            stats.total_millis += entry.duration_millis;
            stats.samples += 1;
            if is_collscan {
                stats.collscans += 1;
            }
        }

        let shape_key: ShapeKey = (
            entry.database.clone(),
            entry.collection.clone(),
            sorted(&entry.filter_fields),
            sorted(&entry.sort_fields),
            sorted(&entry.projection_fields),
        );
        let shape = per_shape.entry(shape_key).or_default();
        shape.count += 1;
        shape
            .sources
            .extend(attributed.iter().map(|(f, l)| (f.clone(), *l)));
    }

    let mut findings = Vec::new();

    for ((database, collection, file, line), stats) in &per_location {
        let avg = stats.total_millis as f64 / stats.samples as f64;
        findings.push(
            Finding::new(
                FindingType::SlowQuerySource,
                Severity::Medium,
                format!(
                    "slow queries against '{}.{}' traced to {}:{} (avg {:.0}ms over {} samples)",
                    database, collection, file, line, avg, stats.samples
                ),
            )
            .database(database)
            .collection(collection),
        );
        if stats.collscans > 0 {
            findings.push(
                Finding::new(
                    FindingType::CollectionScanSource,
                    Severity::High,
                    format!(
                        "{} full collection scan(s) against '{}.{}' traced to {}:{}",
                        stats.collscans, database, collection, file, line
                    ),
                )
                .database(database)
                .collection(collection),
            );
        }
    }

    for ((database, collection, filter, sort, projection), stats) in &per_shape {
        if stats.count < thresholds::FREQUENT_QUERY_MIN_COUNT {
            continue;
        }
        let sources: Vec<String> = stats
            .sources
            .iter()
            .take(thresholds::SHAPE_SOURCE_CAP)
            .map(|(f, l)| format!("{}:{}", f, l))
            .collect();
        let more = stats.sources.len().saturating_sub(thresholds::SHAPE_SOURCE_CAP);
        let mut source_list = sources.join(", ");
        if more > 0 {
            source_list.push_str(&format!(" (+{} more)", more));
        }
        findings.push(
            Finding::new(
                FindingType::FrequentSlowQuery,
                Severity::Medium,
                format!(
                    "query shape on '{}.{}' (filter: [{}], sort: [{}], projection: [{}]) ran {} times; sources: {}",
                    database,
                    collection,
                    filter.join(", "),
                    sort.join(", "),
                    projection.join(", "),
                    stats.count,
                    source_list
                ),
            )
            .database(database)
            .collection(collection),
        );
    }

    findings
}

/// Fields match when equal or when one is a dot-prefix of the other, so a
/// profiler's `address.city` credits code that touches `address`.
fn fields_equivalent(a: &str, b: &str) -> bool {
    a == b
        || a.strip_prefix(b).is_some_and(|rest| rest.starts_with('.'))
        || b.strip_prefix(a).is_some_and(|rest| rest.starts_with('.'))
}

fn sorted(fields: &[String]) -> Vec<String> {
    let mut v = fields.to_vec();
    v.sort_unstable();
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CollectionRef, FieldRef};

    fn scan_users() -> ScanResult {
        ScanResult {
            collections: vec!["users".into()],
            refs: vec![CollectionRef {
                collection: "users".into(),
                file: "app/models/user.go".into(),
                line: 15,
            }],
            field_refs: vec![FieldRef {
                collection: "users".into(),
                field: "status".into(),
                file: "app/models/user.go".into(),
                line: 15,
            }],
            ..Default::default()
        }
    }

    fn entry(filter: &[&str], duration: i64, plan: &str) -> ProfileEntry {
        ProfileEntry {
            database: "app".into(),
            collection: "users".into(),
            filter_fields: filter.iter().map(|f| (*f).to_string()).collect(),
            duration_millis: duration,
            plan_summary: plan.into(),
            ..Default::default()
        }
    }

    #[test]
    fn collscan_entry_produces_both_findings() {
        let findings =
            correlate_profiler(Some(&scan_users()), &[entry(&["status"], 850, "COLLSCAN")]);

        let slow = findings
            .iter()
            .find(|f| f.kind == FindingType::SlowQuerySource)
            .unwrap();
        assert_eq!(slow.severity, Severity::Medium);
        assert!(slow.message.contains("app/models/user.go:15"));
        assert!(slow.message.contains("850"));

        let scan_finding = findings
            .iter()
            .find(|f| f.kind == FindingType::CollectionScanSource)
            .unwrap();
        assert_eq!(scan_finding.severity, Severity::High);
        assert!(scan_finding.message.contains("app/models/user.go:15"));
    }

    #[test]
    fn plan_summary_match_is_case_insensitive() {
        let findings =
            correlate_profiler(Some(&scan_users()), &[entry(&["status"], 100, "CollScan")]);
        assert!(findings.iter().any(|f| f.kind == FindingType::CollectionScanSource));
    }

    #[test]
    fn missing_scan_returns_nothing() {
        assert!(correlate_profiler(None, &[entry(&["status"], 850, "COLLSCAN")]).is_empty());
    }

    #[test]
    fn entry_without_locations_is_skipped() {
        let mut e = entry(&["status"], 850, "COLLSCAN");
        e.collection = "orders".into();
        assert!(correlate_profiler(Some(&scan_users()), &[e]).is_empty());
    }

    #[test]
    fn ties_credit_every_best_location() {
        let mut scan = scan_users();
        scan.field_refs.push(FieldRef {
            collection: "users".into(),
            field: "status".into(),
            file: "app/handlers/list.go".into(),
            line: 40,
        });
        let findings = correlate_profiler(Some(&scan), &[entry(&["status"], 100, "IXSCAN")]);
        let slow: Vec<&Finding> = findings
            .iter()
            .filter(|f| f.kind == FindingType::SlowQuerySource)
            .collect();
        assert_eq!(slow.len(), 2);
    }

    #[test]
    fn zero_overlap_falls_back_to_first_location() {
        let mut scan = scan_users();
        scan.field_refs.push(FieldRef {
            collection: "users".into(),
            field: "email".into(),
            file: "zz/later.go".into(),
            line: 1,
        });
        let findings = correlate_profiler(Some(&scan), &[entry(&["unrelated"], 100, "IXSCAN")]);
        let slow: Vec<&Finding> = findings
            .iter()
            .filter(|f| f.kind == FindingType::SlowQuerySource)
            .collect();
        assert_eq!(slow.len(), 1);
        assert!(slow[0].message.contains("app/models/user.go:15"));
    }

    #[test]
    fn prefix_equivalent_fields_overlap() {
        let findings =
            correlate_profiler(Some(&scan_users()), &[entry(&["status.code"], 100, "IXSCAN")]);
        let slow = findings
            .iter()
            .find(|f| f.kind == FindingType::SlowQuerySource)
            .unwrap();
        assert!(slow.message.contains("app/models/user.go:15"));
    }

    #[test]
    fn frequent_shape_detected_at_threshold() {
        let entries: Vec<ProfileEntry> =
            (0..50).map(|_| entry(&["status"], 20, "IXSCAN")).collect();
        let findings = correlate_profiler(Some(&scan_users()), &entries);
        let frequent: Vec<&Finding> = findings
            .iter()
            .filter(|f| f.kind == FindingType::FrequentSlowQuery)
            .collect();
        assert_eq!(frequent.len(), 1);
        assert!(frequent[0].message.contains("50 times"));

        let entries: Vec<ProfileEntry> =
            (0..49).map(|_| entry(&["status"], 20, "IXSCAN")).collect();
        let findings = correlate_profiler(Some(&scan_users()), &entries);
        assert!(findings.iter().all(|f| f.kind != FindingType::FrequentSlowQuery));
    }

    #[test]
    fn shape_distinguishes_sort_fields() {
        let mut sorted_entry = entry(&["status"], 20, "IXSCAN");
        sorted_entry.sort_fields = vec!["date".into()];
        let mut entries: Vec<ProfileEntry> =
            (0..30).map(|_| entry(&["status"], 20, "IXSCAN")).collect();
        entries.extend((0..30).map(|_| sorted_entry.clone()));
        let findings = correlate_profiler(Some(&scan_users()), &entries);
        // 30 + 30 of two different shapes: neither crosses the threshold.
        assert!(findings.iter().all(|f| f.kind != FindingType::FrequentSlowQuery));
    }

    #[test]
    fn averages_accumulate_across_entries() {
        let findings = correlate_profiler(
            Some(&scan_users()),
            &[entry(&["status"], 100, "IXSCAN"), entry(&["status"], 300, "IXSCAN")],
        );
        let slow = findings
            .iter()
            .find(|f| f.kind == FindingType::SlowQuerySource)
            .unwrap();
        assert!(slow.message.contains("avg 200ms"));
        assert!(slow.message.contains("2 samples"));
    }
}
