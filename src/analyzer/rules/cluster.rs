//! Cluster audit: per-collection index and size hygiene.
//!
//! ## Rule list:
//! - UNUSED_COLLECTION: collection holds no documents
//! - UNUSED_INDEX: index reports zero operations
//! - MISSING_INDEX: large collection with only the `_id_` index
//! - DUPLICATE_INDEX: index key is a strict prefix of another index
//! - OVERSIZED_COLLECTION: storage size beyond the oversize threshold
//! - MISSING_TTL: time-named field indexed without a TTL index
//! - INDEX_BLOAT: indexes take more space than the data
//! - WRITE_HEAVY_OVER_INDEXED: too many indexes on one collection
//! - SINGLE_FIELD_REDUNDANT: single-field index covered by a compound prefix
//! - LARGE_INDEX: single index beyond the large-index threshold
//!
//! Views are skipped entirely; the `_id_` index is never flagged; system
//! databases are excluded.

use crate::analyzer::common::{
    format_bytes, is_key_prefix, is_strict_key_prefix, is_system_database, is_ttl_candidate_field,
};
use crate::analyzer::thresholds;
use crate::models::{CollectionInfo, Finding, FindingType, IndexInfo, Severity};

/// Run every cluster rule over the collection snapshot. Collections are
/// visited in input order; indexes in catalog order; pairwise index
/// comparisons use `(i < j)`.
pub fn audit_collections(collections: &[CollectionInfo]) -> Vec<Finding> {
    let mut findings = Vec::new();

    for coll in collections {
        if coll.is_view() || is_system_database(&coll.database) {
            continue;
        }

        check_unused_collection(coll, &mut findings);
        check_unused_indexes(coll, &mut findings);
        check_missing_index(coll, &mut findings);
        check_duplicate_indexes(coll, &mut findings);
        check_oversized(coll, &mut findings);
        check_missing_ttl(coll, &mut findings);
        check_index_bloat(coll, &mut findings);
        check_over_indexed(coll, &mut findings);
        check_single_field_redundant(coll, &mut findings);
        check_large_indexes(coll, &mut findings);
    }

    findings
}

fn finding_for(coll: &CollectionInfo, kind: FindingType, severity: Severity, msg: String) -> Finding {
    Finding::new(kind, severity, msg)
        .database(&coll.database)
        .collection(&coll.name)
}

fn check_unused_collection(coll: &CollectionInfo, out: &mut Vec<Finding>) {
    if coll.doc_count == 0 {
        out.push(finding_for(
            coll,
            FindingType::UnusedCollection,
            Severity::Medium,
            format!("collection '{}.{}' holds no documents", coll.database, coll.name),
        ));
    }
}

fn check_unused_indexes(coll: &CollectionInfo, out: &mut Vec<Finding>) {
    for index in non_id_indexes(coll) {
        if let Some(stats) = &index.stats
            && stats.ops == 0
        {
            out.push(
                finding_for(
                    coll,
                    FindingType::UnusedIndex,
                    Severity::Medium,
                    format!(
                        "index '{}' on '{}.{}' has never been used since stats collection began",
                        index.name, coll.database, coll.name
                    ),
                )
                .index(&index.name),
            );
        }
    }
}

fn check_missing_index(coll: &CollectionInfo, out: &mut Vec<Finding>) {
    let has_secondary = coll.indexes.iter().any(|i| !i.is_id());
    if coll.doc_count >= thresholds::MISSING_INDEX_MIN_DOCS && !has_secondary {
        out.push(finding_for(
            coll,
            FindingType::MissingIndex,
            Severity::High,
            format!(
                "collection '{}.{}' has {} documents but no secondary index",
                coll.database, coll.name, coll.doc_count
            ),
        ));
    }
}

fn check_duplicate_indexes(coll: &CollectionInfo, out: &mut Vec<Finding>) {
    let indexes: Vec<&IndexInfo> = non_id_indexes(coll).collect();
    for i in 0..indexes.len() {
        for j in (i + 1)..indexes.len() {
            let (a, b) = (indexes[i], indexes[j]);
            if is_strict_key_prefix(&a.key, &b.key) {
                out.push(
                    finding_for(
                        coll,
                        FindingType::DuplicateIndex,
                        Severity::Low,
                        format!(
                            "index '{}' {} is a prefix of '{}' {} and can be dropped",
                            a.name,
                            a.key_spec(),
                            b.name,
                            b.key_spec()
                        ),
                    )
                    .index(&a.name),
                );
            }
        }
    }
}

fn check_oversized(coll: &CollectionInfo, out: &mut Vec<Finding>) {
    if coll.storage_size >= thresholds::OVERSIZED_COLLECTION_BYTES {
        out.push(finding_for(
            coll,
            FindingType::OversizedCollection,
            Severity::Low,
            format!(
                "collection '{}.{}' uses {} of storage; consider archiving or sharding",
                coll.database,
                coll.name,
                format_bytes(coll.storage_size)
            ),
        ));
    }
}

fn check_missing_ttl(coll: &CollectionInfo, out: &mut Vec<Finding>) {
    let mut seen: Vec<String> = Vec::new();

    for index in &coll.indexes {
        for key in &index.key {
            if !is_ttl_candidate_field(&key.field) {
                continue;
            }
            let lower = key.field.to_ascii_lowercase();
            if seen.contains(&lower) {
                continue;
            }
            let covered = coll
                .indexes
                .iter()
                .any(|i| i.is_ttl() && i.key.iter().any(|k| k.field.eq_ignore_ascii_case(&key.field)));
            seen.push(lower);
            if !covered {
                out.push(finding_for(
                    coll,
                    FindingType::MissingTtl,
                    Severity::Low,
                    format!(
                        "field '{}' on '{}.{}' looks time-based but no TTL index expires it",
                        key.field, coll.database, coll.name
                    ),
                ));
            }
        }
    }
}

fn check_index_bloat(coll: &CollectionInfo, out: &mut Vec<Finding>) {
    if coll.size > 0 && coll.total_index_size > coll.size {
        out.push(finding_for(
            coll,
            FindingType::IndexBloat,
            Severity::Medium,
            format!(
                "indexes on '{}.{}' take {} while the data takes {}",
                coll.database,
                coll.name,
                format_bytes(coll.total_index_size),
                format_bytes(coll.size)
            ),
        ));
    }
}

fn check_over_indexed(coll: &CollectionInfo, out: &mut Vec<Finding>) {
    if coll.indexes.len() > thresholds::MAX_INDEXES_PER_COLLECTION {
        out.push(finding_for(
            coll,
            FindingType::WriteHeavyOverIndexed,
            Severity::Medium,
            format!(
                "collection '{}.{}' carries {} indexes; every write maintains all of them",
                coll.database,
                coll.name,
                coll.indexes.len()
            ),
        ));
    }
}

fn check_single_field_redundant(coll: &CollectionInfo, out: &mut Vec<Finding>) {
    for index in non_id_indexes(coll) {
        if index.key.len() != 1 {
            continue;
        }
        let covered_by = coll
            .indexes
            .iter()
            .find(|other| other.key.len() > 1 && is_key_prefix(&index.key, &other.key));
        if let Some(compound) = covered_by {
            out.push(
                finding_for(
                    coll,
                    FindingType::SingleFieldRedundant,
                    Severity::Low,
                    format!(
                        "single-field index '{}' is covered by the prefix of compound index '{}'",
                        index.name, compound.name
                    ),
                )
                .index(&index.name),
            );
        }
    }
}

fn check_large_indexes(coll: &CollectionInfo, out: &mut Vec<Finding>) {
    for index in non_id_indexes(coll) {
        if index.size >= thresholds::LARGE_INDEX_BYTES {
            out.push(
                finding_for(
                    coll,
                    FindingType::LargeIndex,
                    Severity::Low,
                    format!(
                        "index '{}' on '{}.{}' is {}",
                        index.name,
                        coll.database,
                        coll.name,
                        format_bytes(index.size)
                    ),
                )
                .index(&index.name),
            );
        }
    }
}

fn non_id_indexes(coll: &CollectionInfo) -> impl Iterator<Item = &IndexInfo> {
    coll.indexes.iter().filter(|i| !i.is_id())
}
