//! Cluster-vs-cluster drift: collections and indexes present on one side
//! and not the other.
//!
//! Emits `CompareFinding` records (a sibling of `Finding` with source and
//! target detail columns):
//! - MISSING_IN_TARGET (high): collection on the source only
//! - MISSING_IN_SOURCE (medium): collection on the target only
//! - INDEX_DRIFT: per-index divergence between matched collections

use crate::models::{CollectionInfo, CompareFinding, CompareFindingType, Severity};

pub fn compare_clusters(
    source: &[CollectionInfo],
    target: &[CollectionInfo],
) -> Vec<CompareFinding> {
    let mut findings = Vec::new();

    for coll in source {
        if find(target, &coll.database, &coll.name).is_none() {
            findings.push(CompareFinding {
                kind: CompareFindingType::MissingInTarget,
                severity: Severity::High,
                database: coll.database.clone(),
                collection: coll.name.clone(),
                index: String::new(),
                message: format!(
                    "collection '{}.{}' exists on the source but not the target",
                    coll.database, coll.name
                ),
                source_detail: format!("{} documents", coll.doc_count),
                target_detail: "absent".to_string(),
            });
        }
    }

    for coll in target {
        if find(source, &coll.database, &coll.name).is_none() {
            findings.push(CompareFinding {
                kind: CompareFindingType::MissingInSource,
                severity: Severity::Medium,
                database: coll.database.clone(),
                collection: coll.name.clone(),
                index: String::new(),
                message: format!(
                    "collection '{}.{}' exists on the target but not the source",
                    coll.database, coll.name
                ),
                source_detail: "absent".to_string(),
                target_detail: format!("{} documents", coll.doc_count),
            });
        }
    }

    for coll in source {
        let Some(other) = find(target, &coll.database, &coll.name) else {
            continue;
        };
        compare_indexes(coll, other, &mut findings);
    }

    findings
}

fn compare_indexes(source: &CollectionInfo, target: &CollectionInfo, out: &mut Vec<CompareFinding>) {
    for index in &source.indexes {
        match target.indexes.iter().find(|i| i.name == index.name) {
            None => {
                // A unique index enforces an invariant; losing it is worse
                // than losing a plain one.
                let severity = if index.unique { Severity::High } else { Severity::Medium };
                out.push(drift(source, &index.name, severity,
                    format!(
                        "index '{}' on '{}.{}' is missing from the target",
                        index.name, source.database, source.name
                    ),
                    index.key_spec(),
                    "absent".to_string(),
                ));
            },
            Some(other) if other.key != index.key => {
                out.push(drift(source, &index.name, Severity::Medium,
                    format!(
                        "index '{}' on '{}.{}' has a different key on the target",
                        index.name, source.database, source.name
                    ),
                    index.key_spec(),
                    other.key_spec(),
                ));
            },
            Some(_) => {},
        }
    }

    for index in &target.indexes {
        if !source.indexes.iter().any(|i| i.name == index.name) {
            out.push(drift(source, &index.name, Severity::Low,
                format!(
                    "index '{}' on '{}.{}' exists only on the target",
                    index.name, source.database, source.name
                ),
                "absent".to_string(),
                index.key_spec(),
            ));
        }
    }
}

fn drift(
    coll: &CollectionInfo,
    index: &str,
    severity: Severity,
    message: String,
    source_detail: String,
    target_detail: String,
) -> CompareFinding {
    CompareFinding {
        kind: CompareFindingType::IndexDrift,
        severity,
        database: coll.database.clone(),
        collection: coll.name.clone(),
        index: index.to_string(),
        message,
        source_detail,
        target_detail,
    }
}

fn find<'a>(
    collections: &'a [CollectionInfo],
    database: &str,
    name: &str,
) -> Option<&'a CollectionInfo> {
    collections.iter().find(|c| {
        c.database.eq_ignore_ascii_case(database) && c.name.eq_ignore_ascii_case(name)
    })
}
