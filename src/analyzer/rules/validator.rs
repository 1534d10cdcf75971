//! Validator drift: JSON-schema validators vs. what the code writes.
//!
//! ## Rule list:
//! - VALIDATOR_MISSING: collection written from code without a validator
//! - VALIDATOR_STRICT_RISK: strict/error validator will reject drifted writes
//! - VALIDATOR_WARN_ONLY: warn-level validator never blocks bad writes
//! - FIELD_NOT_IN_VALIDATOR: code writes a field a closed schema rejects
//! - VALIDATOR_STALE: code writes a type the schema does not allow
//!
//! Only collections the code writes to are audited. BSON type names are
//! normalized before comparison (int/long/double/decimal fold to number,
//! boolean to bool); "unknown" write types are ignored.

use std::collections::BTreeSet;

use crate::analyzer::common::{find_collection, is_system_database};
use crate::models::{CollectionInfo, Finding, FindingType, ScanResult, Severity, ValidatorInfo};

pub fn audit_validators(collections: &[CollectionInfo], scan: &ScanResult) -> Vec<Finding> {
    let mut findings = Vec::new();

    let written: BTreeSet<String> = scan
        .write_refs
        .iter()
        .map(|w| w.collection.to_ascii_lowercase())
        .collect();

    for name in &written {
        let Some(coll) = find_collection(collections, name) else {
            continue;
        };
        if coll.is_view() || is_system_database(&coll.database) {
            continue;
        }

        let Some(validator) = &coll.validator else {
            findings.push(
                Finding::new(
                    FindingType::ValidatorMissing,
                    Severity::Medium,
                    format!(
                        "collection '{}.{}' is written from code but has no schema validator",
                        coll.database, coll.name
                    ),
                )
                .database(&coll.database)
                .collection(&coll.name),
            );
            continue;
        };

        if validator.is_strict_error() {
            findings.push(
                Finding::new(
                    FindingType::ValidatorStrictRisk,
                    Severity::Low,
                    format!(
                        "validator on '{}.{}' is strict/error; schema drift in code will surface as write failures",
                        coll.database, coll.name
                    ),
                )
                .database(&coll.database)
                .collection(&coll.name),
            );
        }

        if validator.action() == "warn" {
            findings.push(
                Finding::new(
                    FindingType::ValidatorWarnOnly,
                    Severity::Info,
                    format!(
                        "validator on '{}.{}' only warns; non-conforming writes still land",
                        coll.database, coll.name
                    ),
                )
                .database(&coll.database)
                .collection(&coll.name),
            );
        }

        if !validator.properties.is_empty() {
            check_schema_drift(coll, validator, scan, &mut findings);
        }
    }

    findings
}

fn check_schema_drift(
    coll: &CollectionInfo,
    validator: &ValidatorInfo,
    scan: &ScanResult,
    out: &mut Vec<Finding>,
) {
    let drift_severity = if validator.is_strict_error() { Severity::High } else { Severity::Medium };
    let closed_schema = validator.additional_properties == Some(false);

    // (field, value_type) pairs written to this collection, deduplicated.
    let mut writes: BTreeSet<(String, String)> = BTreeSet::new();
    for w in &scan.write_refs {
        if w.collection.eq_ignore_ascii_case(&coll.name) {
            writes.insert((top_level_field(&w.field), w.value_type.clone()));
        }
    }

    let mut flagged_missing: BTreeSet<String> = BTreeSet::new();
    let mut flagged_stale: BTreeSet<String> = BTreeSet::new();

    for (field, value_type) in &writes {
        match validator.properties.get(field) {
            None => {
                if closed_schema && flagged_missing.insert(field.clone()) {
                    out.push(
                        Finding::new(
                            FindingType::FieldNotInValidator,
                            drift_severity,
                            format!(
                                "code writes field '{}' to '{}.{}' but the closed schema does not allow it",
                                field, coll.database, coll.name
                            ),
                        )
                        .database(&coll.database)
                        .collection(&coll.name),
                    );
                }
            },
            Some(allowed) => {
                let written_type = normalize_bson_type(value_type);
                if written_type == "unknown" {
                    continue;
                }
                let permitted = allowed
                    .iter()
                    .any(|t| normalize_bson_type(t) == written_type);
                if !permitted && flagged_stale.insert(field.clone()) {
                    out.push(
                        Finding::new(
                            FindingType::ValidatorStale,
                            drift_severity,
                            format!(
                                "code writes '{}' as {} but the validator on '{}.{}' allows only: {}",
                                field,
                                written_type,
                                coll.database,
                                coll.name,
                                allowed.join(", ")
                            ),
                        )
                        .database(&coll.database)
                        .collection(&coll.name),
                    );
                }
            },
        }
    }
}

/// The validator's `properties` describe top-level fields only.
fn top_level_field(field: &str) -> String {
    field
        .split('.')
        .next()
        .unwrap_or(field)
        .trim_end_matches("[]")
        .to_string()
}

/// Fold driver-level type names onto JSON-schema BSON aliases.
fn normalize_bson_type(t: &str) -> String {
    match t {
        "int" | "long" | "double" | "decimal" | "number" => "number".to_string(),
        "boolean" | "bool" => "bool".to_string(),
        other => other.to_string(),
    }
}
