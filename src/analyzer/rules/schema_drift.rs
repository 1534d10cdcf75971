//! Schema drift: sampled document shapes vs. fields the code relies on.
//!
//! ## Rule list:
//! - MISSING_FIELD: code reads or writes a field the samples never show
//! - RARE_FIELD: code relies on a field present in under 10% of documents
//! - TYPE_INCONSISTENCY: a field carries two or more non-null BSON types
//! - UNDOCUMENTED_FIELD: a near-universal field no code path touches
//!
//! Collection names compare case-insensitively; paths compare with `[]`
//! array hops stripped.

use std::collections::BTreeSet;

use crate::analyzer::common::{is_system_database, normalize_field_path};
use crate::analyzer::thresholds;
use crate::models::{FieldSampleResult, Finding, FindingType, ScanResult, Severity};

pub fn audit_schema_drift(samples: &[FieldSampleResult], scan: &ScanResult) -> Vec<Finding> {
    let mut findings = Vec::new();

    for sample in samples {
        if is_system_database(&sample.database) {
            continue;
        }
        let code_fields = code_fields_for(scan, &sample.collection);

        // Code-declared fields the samples contradict.
        for field in &code_fields {
            let entry = sample
                .fields
                .iter()
                .find(|f| normalize_field_path(&f.path) == *field);
            match entry {
                None => {
                    findings.push(
                        Finding::new(
                            FindingType::MissingField,
                            Severity::Medium,
                            format!(
                                "field '{}' is used in code but absent from {} sampled documents of '{}'",
                                field, sample.sample_size, sample.collection
                            ),
                        )
                        .database(&sample.database)
                        .collection(&sample.collection),
                    );
                },
                Some(f) if sample.sample_size > 0 => {
                    let ratio = f.count as f64 / sample.sample_size as f64;
                    if ratio < thresholds::RARE_FIELD_RATIO {
                        findings.push(
                            Finding::new(
                                FindingType::RareField,
                                Severity::Low,
                                format!(
                                    "field '{}' is used in code but present in only {:.0}% of sampled documents",
                                    field,
                                    ratio * 100.0
                                ),
                            )
                            .database(&sample.database)
                            .collection(&sample.collection),
                        );
                    }
                },
                Some(_) => {},
            }
        }

        // Sampled shapes the code does not explain.
        for field in &sample.fields {
            let non_null_types: Vec<&String> =
                field.types.keys().filter(|t| t.as_str() != "null").collect();
            if non_null_types.len() >= 2 {
                let listing = non_null_types
                    .iter()
                    .map(|t| t.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                findings.push(
                    Finding::new(
                        FindingType::TypeInconsistency,
                        Severity::Medium,
                        format!("field '{}' appears with multiple types: {}", field.path, listing),
                    )
                    .database(&sample.database)
                    .collection(&sample.collection),
                );
            }

            if sample.sample_size > 0 {
                let ratio = field.count as f64 / sample.sample_size as f64;
                let normalized = normalize_field_path(&field.path);
                let is_system = normalized == "_id" || normalized.starts_with("_id.");
                if ratio >= thresholds::UNDOCUMENTED_FIELD_RATIO
                    && !is_system
                    && !code_fields.contains(&normalized)
                {
                    findings.push(
                        Finding::new(
                            FindingType::UndocumentedField,
                            Severity::Info,
                            format!(
                                "field '{}' is present in {:.0}% of documents but never referenced in code",
                                field.path,
                                ratio * 100.0
                            ),
                        )
                        .database(&sample.database)
                        .collection(&sample.collection),
                    );
                }
            }
        }
    }

    findings
}

/// Every field the code reads or writes on `collection`, normalized and
/// sorted for deterministic emission.
fn code_fields_for(scan: &ScanResult, collection: &str) -> BTreeSet<String> {
    let mut fields = BTreeSet::new();
    for r in &scan.field_refs {
        if r.collection.eq_ignore_ascii_case(collection) {
            fields.insert(normalize_field_path(&r.field));
        }
    }
    for w in &scan.write_refs {
        if w.collection.eq_ignore_ascii_case(collection) {
            fields.insert(normalize_field_path(&w.field));
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldRef, FieldSample};

    fn sample(collection: &str, fields: Vec<FieldSample>) -> FieldSampleResult {
        FieldSampleResult {
            database: "app".into(),
            collection: collection.into(),
            sample_size: 100,
            fields,
            ..Default::default()
        }
    }

    fn field(path: &str, count: i64, types: &[(&str, i64)]) -> FieldSample {
        FieldSample {
            path: path.into(),
            count,
            types: types.iter().map(|(t, c)| ((*t).to_string(), *c)).collect(),
        }
    }

    fn scan_with_fields(collection: &str, fields: &[&str]) -> ScanResult {
        ScanResult {
            collections: vec![collection.to_string()],
            field_refs: fields
                .iter()
                .map(|f| FieldRef {
                    collection: collection.into(),
                    field: (*f).into(),
                    file: "app/db.js".into(),
                    line: 1,
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn missing_field_detected() {
        let findings = audit_schema_drift(
            &[sample("users", vec![field("status", 90, &[("string", 90)])])],
            &scan_with_fields("users", &["status", "ghost"]),
        );
        let missing: Vec<&Finding> = findings
            .iter()
            .filter(|f| f.kind == FindingType::MissingField)
            .collect();
        assert_eq!(missing.len(), 1);
        assert!(missing[0].message.contains("ghost"));
    }

    #[test]
    fn rare_field_below_ten_percent() {
        let findings = audit_schema_drift(
            &[sample("users", vec![field("legacy", 9, &[("string", 9)])])],
            &scan_with_fields("users", &["legacy"]),
        );
        assert!(findings.iter().any(|f| f.kind == FindingType::RareField));

        let findings = audit_schema_drift(
            &[sample("users", vec![field("legacy", 10, &[("string", 10)])])],
            &scan_with_fields("users", &["legacy"]),
        );
        assert!(findings.iter().all(|f| f.kind != FindingType::RareField));
    }

    #[test]
    fn type_inconsistency_needs_two_non_null_types() {
        let findings = audit_schema_drift(
            &[sample("users", vec![field("age", 100, &[("int", 60), ("string", 40)])])],
            &ScanResult::default(),
        );
        assert!(findings.iter().any(|f| f.kind == FindingType::TypeInconsistency));

        // null alongside one real type does not trigger.
        let findings = audit_schema_drift(
            &[sample("users", vec![field("age", 100, &[("int", 60), ("null", 40)])])],
            &ScanResult::default(),
        );
        assert!(findings.iter().all(|f| f.kind != FindingType::TypeInconsistency));
    }

    #[test]
    fn undocumented_field_over_ninety_percent() {
        let findings = audit_schema_drift(
            &[sample("users", vec![field("shadow", 95, &[("string", 95)])])],
            &scan_with_fields("users", &["other"]),
        );
        assert!(findings.iter().any(|f| f.kind == FindingType::UndocumentedField));
    }

    #[test]
    fn id_fields_are_immune() {
        let findings = audit_schema_drift(
            &[sample(
                "users",
                vec![
                    field("_id", 100, &[("objectId", 100)]),
                    field("_id.ts", 100, &[("date", 100)]),
                ],
            )],
            &ScanResult::default(),
        );
        assert!(findings.iter().all(|f| f.kind != FindingType::UndocumentedField));
    }

    #[test]
    fn referenced_field_is_documented() {
        let findings = audit_schema_drift(
            &[sample("users", vec![field("email", 100, &[("string", 100)])])],
            &scan_with_fields("users", &["email"]),
        );
        assert!(findings.iter().all(|f| f.kind != FindingType::UndocumentedField));
    }

    #[test]
    fn collection_match_is_case_insensitive() {
        let findings = audit_schema_drift(
            &[sample("Users", vec![field("status", 50, &[("string", 50)])])],
            &scan_with_fields("users", &["missing"]),
        );
        assert!(findings.iter().any(|f| f.kind == FindingType::MissingField));
    }

    #[test]
    fn array_hops_strip_for_matching() {
        let findings = audit_schema_drift(
            &[sample("orders", vec![field("items[].sku", 80, &[("string", 80)])])],
            &scan_with_fields("orders", &["items.sku"]),
        );
        assert!(findings.iter().all(|f| f.kind != FindingType::MissingField));
    }
}
