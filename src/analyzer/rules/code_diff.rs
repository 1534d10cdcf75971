//! Code ↔ cluster diff: what the source tree expects vs. what the cluster
//! actually holds.
//!
//! ## Rule list:
//! - MISSING_COLLECTION: referenced in code, absent from the cluster
//! - OK: referenced collection exists
//! - UNUSED_COLLECTION: empty cluster collection nothing references
//! - ORPHANED_INDEX: idle index on an unreferenced collection
//! - UNINDEXED_QUERY: queried field not leading any index
//! - SUGGEST_INDEX: concrete index suggestion for a sizable collection
//!
//! A MISSING_COLLECTION suppresses UNINDEXED_QUERY and SUGGEST_INDEX for
//! the same collection within the run: fields of a collection that does
//! not exist are never scored against indexes.

use std::collections::BTreeSet;

use crate::analyzer::common::{find_collection, is_system_database};
use crate::analyzer::thresholds;
use crate::models::{CollectionInfo, Finding, FindingType, ScanResult, Severity};

pub fn audit_code_cluster(scan: &ScanResult, collections: &[CollectionInfo]) -> Vec<Finding> {
    let mut findings = Vec::new();

    // Referenced collections, deduplicated and sorted for stable emission.
    let referenced: BTreeSet<String> = scan
        .collections
        .iter()
        .map(|c| c.to_ascii_lowercase())
        .collect();

    let mut missing: BTreeSet<String> = BTreeSet::new();
    for name in &referenced {
        match find_collection(collections, name) {
            None => {
                missing.insert(name.clone());
                findings.push(
                    Finding::new(
                        FindingType::MissingCollection,
                        Severity::High,
                        format!("collection '{}' is referenced in code but does not exist in the cluster", name),
                    )
                    .collection(name),
                );
            },
            Some(coll) => {
                findings.push(
                    Finding::new(
                        FindingType::Ok,
                        Severity::Info,
                        format!("collection '{}.{}' is referenced in code and exists", coll.database, coll.name),
                    )
                    .database(&coll.database)
                    .collection(&coll.name),
                );
            },
        }
    }

    // Cluster-side leftovers.
    for coll in collections {
        if coll.is_view() || is_system_database(&coll.database) {
            continue;
        }
        let unreferenced = !referenced.contains(&coll.name.to_ascii_lowercase());
        if unreferenced && coll.doc_count == 0 {
            findings.push(
                Finding::new(
                    FindingType::UnusedCollection,
                    Severity::Medium,
                    format!(
                        "collection '{}.{}' is empty and nothing in the scanned code references it",
                        coll.database, coll.name
                    ),
                )
                .database(&coll.database)
                .collection(&coll.name),
            );
        }
        if unreferenced {
            for index in &coll.indexes {
                if index.is_id() {
                    continue;
                }
                if let Some(stats) = &index.stats
                    && stats.ops == 0
                {
                    findings.push(
                        Finding::new(
                            FindingType::OrphanedIndex,
                            Severity::Low,
                            format!(
                                "index '{}' on unreferenced collection '{}.{}' has never been used",
                                index.name, coll.database, coll.name
                            ),
                        )
                        .database(&coll.database)
                        .collection(&coll.name)
                        .index(&index.name),
                    );
                }
            }
        }
    }

    // Field-level checks for collections that exist.
    for name in &referenced {
        if missing.contains(name) {
            continue;
        }
        let Some(coll) = find_collection(collections, name) else {
            continue;
        };

        let queried: BTreeSet<&str> = scan
            .field_refs
            .iter()
            .filter(|r| r.collection.eq_ignore_ascii_case(name))
            .map(|r| r.field.as_str())
            .collect();

        let mut suggestions = 0usize;
        for field in &queried {
            if *field == "_id" {
                continue;
            }
            let leads_index = coll
                .indexes
                .iter()
                .any(|i| i.key.first().map(|k| k.field.as_str()) == Some(*field));
            if leads_index {
                continue;
            }
            findings.push(
                Finding::new(
                    FindingType::UnindexedQuery,
                    Severity::Medium,
                    format!(
                        "field '{}' of '{}.{}' is queried in code but no index leads with it",
                        field, coll.database, coll.name
                    ),
                )
                .database(&coll.database)
                .collection(&coll.name),
            );
            if coll.doc_count >= thresholds::SUGGEST_INDEX_MIN_DOCS
                && suggestions < thresholds::SUGGEST_INDEX_CAP
            {
                suggestions += 1;
                findings.push(
                    Finding::new(
                        FindingType::SuggestIndex,
                        Severity::Info,
                        format!(
                            "consider: db.{}.createIndex({{\"{}\": 1}}) ({} documents)",
                            coll.name, field, coll.doc_count
                        ),
                    )
                    .database(&coll.database)
                    .collection(&coll.name),
                );
            }
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldRef, IndexInfo, IndexKey, IndexStats};

    fn coll(name: &str, doc_count: i64, index_fields: &[&str]) -> CollectionInfo {
        let mut indexes = vec![IndexInfo {
            name: "_id_".into(),
            key: vec![IndexKey::new("_id", 1)],
            ..Default::default()
        }];
        for f in index_fields {
            indexes.push(IndexInfo {
                name: format!("{}_1", f),
                key: vec![IndexKey::new(*f, 1)],
                ..Default::default()
            });
        }
        CollectionInfo {
            database: "app".into(),
            name: name.into(),
            doc_count,
            indexes,
            ..Default::default()
        }
    }

    fn scan(collections: &[&str], fields: &[(&str, &str)]) -> ScanResult {
        ScanResult {
            collections: collections.iter().map(|c| (*c).to_string()).collect(),
            field_refs: fields
                .iter()
                .map(|(c, f)| FieldRef {
                    collection: (*c).into(),
                    field: (*f).into(),
                    file: "app/models/user.go".into(),
                    line: 15,
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn missing_collection_suppresses_field_findings() {
        let findings = audit_code_cluster(&scan(&["ghost"], &[("ghost", "status")]), &[]);
        assert!(findings.iter().any(|f| f.kind == FindingType::MissingCollection));
        assert!(findings.iter().all(|f| f.kind != FindingType::UnindexedQuery));
        assert!(findings.iter().all(|f| f.kind != FindingType::SuggestIndex));
    }

    #[test]
    fn existing_collection_gets_ok() {
        let findings =
            audit_code_cluster(&scan(&["users"], &[]), &[coll("users", 10, &["status"])]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingType::Ok);
    }

    #[test]
    fn collection_match_is_case_insensitive() {
        let findings =
            audit_code_cluster(&scan(&["Users"], &[]), &[coll("users", 10, &[])]);
        assert!(findings.iter().all(|f| f.kind != FindingType::MissingCollection));
    }

    #[test]
    fn unindexed_query_detected() {
        let findings = audit_code_cluster(
            &scan(&["users"], &[("users", "email")]),
            &[coll("users", 10, &["status"])],
        );
        assert!(findings.iter().any(|f| f.kind == FindingType::UnindexedQuery));
    }

    #[test]
    fn id_field_is_immune() {
        let findings = audit_code_cluster(
            &scan(&["users"], &[("users", "_id")]),
            &[coll("users", 10_000, &[])],
        );
        assert!(findings.iter().all(|f| f.kind != FindingType::UnindexedQuery));
        assert!(findings.iter().all(|f| f.kind != FindingType::SuggestIndex));
    }

    #[test]
    fn leading_index_field_is_quiet() {
        let findings = audit_code_cluster(
            &scan(&["users"], &[("users", "status")]),
            &[coll("users", 10, &["status"])],
        );
        assert!(findings.iter().all(|f| f.kind != FindingType::UnindexedQuery));
    }

    #[test]
    fn suggestion_needs_document_count() {
        let findings = audit_code_cluster(
            &scan(&["users"], &[("users", "email")]),
            &[coll("users", 999, &[])],
        );
        assert!(findings.iter().all(|f| f.kind != FindingType::SuggestIndex));

        let findings = audit_code_cluster(
            &scan(&["users"], &[("users", "email")]),
            &[coll("users", 1_000, &[])],
        );
        assert!(findings.iter().any(|f| f.kind == FindingType::SuggestIndex));
    }

    #[test]
    fn suggestions_capped_at_five() {
        let fields: Vec<(&str, &str)> = vec![
            ("users", "a"),
            ("users", "b"),
            ("users", "c"),
            ("users", "d"),
            ("users", "e"),
            ("users", "f"),
            ("users", "g"),
        ];
        let findings =
            audit_code_cluster(&scan(&["users"], &fields), &[coll("users", 5_000, &[])]);
        let suggested = findings.iter().filter(|f| f.kind == FindingType::SuggestIndex).count();
        assert_eq!(suggested, thresholds::SUGGEST_INDEX_CAP);
        let unindexed = findings.iter().filter(|f| f.kind == FindingType::UnindexedQuery).count();
        assert_eq!(unindexed, 7);
    }

    #[test]
    fn unreferenced_empty_collection_flagged() {
        let findings = audit_code_cluster(&scan(&[], &[]), &[coll("stale", 0, &[])]);
        assert!(findings.iter().any(|f| f.kind == FindingType::UnusedCollection));
    }

    #[test]
    fn orphaned_idle_index_on_unreferenced_collection() {
        let mut c = coll("stale", 50, &["status"]);
        c.indexes[1].stats = Some(IndexStats { ops: 0, since: None });
        let findings = audit_code_cluster(&scan(&[], &[]), &[c]);
        let orphans: Vec<&Finding> = findings
            .iter()
            .filter(|f| f.kind == FindingType::OrphanedIndex)
            .collect();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].index, "status_1");
    }

    #[test]
    fn referenced_collection_keeps_its_idle_indexes() {
        let mut c = coll("users", 50, &["status"]);
        c.indexes[1].stats = Some(IndexStats { ops: 0, since: None });
        let findings = audit_code_cluster(&scan(&["users"], &[]), &[c]);
        assert!(findings.iter().all(|f| f.kind != FindingType::OrphanedIndex));
    }
}
