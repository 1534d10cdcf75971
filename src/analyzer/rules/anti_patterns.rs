//! Document-modeling anti-patterns, detected from samples alone.
//!
//! ## Rule list:
//! - UNBOUNDED_ARRAY: arrays past the growth threshold
//! - DEEP_NESTING: field paths nested deeper than the depth threshold
//! - LARGE_DOCUMENT: documents near the BSON size limit
//! - FIELD_NAME_COLLISION: one path holding both objects and scalars
//! - EXCESSIVE_FIELD_COUNT: documents with very wide shapes
//! - NUMERIC_FIELD_NAMES: integers used as field names (map-as-object)

use crate::analyzer::common::{field_path_depth, format_bytes, is_system_database};
use crate::analyzer::thresholds;
use crate::models::{FieldSampleResult, Finding, FindingType, Severity};

/// BSON type names that are neither scalars nor missing values.
const NON_SCALAR_TYPES: &[&str] = &["object", "array", "null"];

pub fn audit_anti_patterns(samples: &[FieldSampleResult]) -> Vec<Finding> {
    let mut findings = Vec::new();

    for sample in samples {
        if is_system_database(&sample.database) {
            continue;
        }
        for (path, length) in &sample.array_lengths {
            if *length > thresholds::MAX_ARRAY_ELEMENTS {
                findings.push(
                    Finding::new(
                        FindingType::UnboundedArray,
                        Severity::Low,
                        format!(
                            "array '{}' reaches {} elements; unbounded arrays degrade updates and index size",
                            path, length
                        ),
                    )
                    .database(&sample.database)
                    .collection(&sample.collection),
                );
            }
        }

        for field in &sample.fields {
            if field_path_depth(&field.path) > thresholds::MAX_FIELD_DEPTH {
                findings.push(
                    Finding::new(
                        FindingType::DeepNesting,
                        Severity::Low,
                        format!(
                            "field '{}' is nested {} levels deep",
                            field.path,
                            field_path_depth(&field.path)
                        ),
                    )
                    .database(&sample.database)
                    .collection(&sample.collection),
                );
            }
        }

        if sample.max_doc_size > thresholds::LARGE_DOCUMENT_BYTES {
            findings.push(
                Finding::new(
                    FindingType::LargeDocument,
                    Severity::Low,
                    format!(
                        "largest sampled document is {}; large documents strain the cache and network",
                        format_bytes(sample.max_doc_size)
                    ),
                )
                .database(&sample.database)
                .collection(&sample.collection),
            );
        }

        for field in &sample.fields {
            let has_object = field.types.contains_key("object");
            let has_scalar = field
                .types
                .keys()
                .any(|t| !NON_SCALAR_TYPES.contains(&t.as_str()));
            if has_object && has_scalar {
                findings.push(
                    Finding::new(
                        FindingType::FieldNameCollision,
                        Severity::Low,
                        format!(
                            "field '{}' holds sub-documents in some documents and scalars in others",
                            field.path
                        ),
                    )
                    .database(&sample.database)
                    .collection(&sample.collection),
                );
            }
        }

        if sample.max_field_count > thresholds::MAX_FIELD_COUNT {
            findings.push(
                Finding::new(
                    FindingType::ExcessiveFieldCount,
                    Severity::Info,
                    format!(
                        "documents carry up to {} fields; consider restructuring wide documents",
                        sample.max_field_count
                    ),
                )
                .database(&sample.database)
                .collection(&sample.collection),
            );
        }

        for field in &sample.fields {
            if has_numeric_segment(&field.path) {
                findings.push(
                    Finding::new(
                        FindingType::NumericFieldNames,
                        Severity::Info,
                        format!(
                            "field path '{}' uses a number as a field name; data is likely stored as an object keyed by id",
                            field.path
                        ),
                    )
                    .database(&sample.database)
                    .collection(&sample.collection),
                );
            }
        }
    }

    findings
}

/// Whether any non-array segment of the path parses as an integer.
fn has_numeric_segment(path: &str) -> bool {
    path.split('.').any(|segment| {
        !segment.ends_with("[]") && !segment.is_empty() && segment.parse::<i64>().is_ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldSample;

    fn sample() -> FieldSampleResult {
        FieldSampleResult {
            database: "app".into(),
            collection: "orders".into(),
            sample_size: 100,
            ..Default::default()
        }
    }

    fn field(path: &str, types: &[(&str, i64)]) -> FieldSample {
        FieldSample {
            path: path.into(),
            count: 100,
            types: types.iter().map(|(t, c)| ((*t).to_string(), *c)).collect(),
        }
    }

    #[test]
    fn array_length_boundary() {
        let mut s = sample();
        s.array_lengths.insert("tags".into(), 100);
        assert!(audit_anti_patterns(&[s]).is_empty());

        let mut s = sample();
        s.array_lengths.insert("tags".into(), 101);
        let findings = audit_anti_patterns(&[s]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingType::UnboundedArray);
    }

    #[test]
    fn nesting_depth_boundary() {
        let mut s = sample();
        s.fields.push(field("a.b.c.d.e", &[("string", 100)]));
        assert!(audit_anti_patterns(&[s]).is_empty());

        let mut s = sample();
        s.fields.push(field("a.b.c.d.e.f", &[("string", 100)]));
        let findings = audit_anti_patterns(&[s]);
        assert!(findings.iter().any(|f| f.kind == FindingType::DeepNesting));
    }

    #[test]
    fn array_hops_do_not_count_toward_depth() {
        let mut s = sample();
        s.fields.push(field("items[].a.b.c.d", &[("string", 100)]));
        assert!(
            audit_anti_patterns(&[s])
                .iter()
                .all(|f| f.kind != FindingType::DeepNesting)
        );
    }

    #[test]
    fn large_document_threshold() {
        let mut s = sample();
        s.max_doc_size = 1_000_001;
        let findings = audit_anti_patterns(&[s]);
        assert!(findings.iter().any(|f| f.kind == FindingType::LargeDocument));
    }

    #[test]
    fn object_scalar_collision() {
        let mut s = sample();
        s.fields.push(field("address", &[("object", 60), ("string", 40)]));
        let findings = audit_anti_patterns(&[s]);
        assert!(findings.iter().any(|f| f.kind == FindingType::FieldNameCollision));
    }

    #[test]
    fn object_with_null_is_not_a_collision() {
        let mut s = sample();
        s.fields.push(field("address", &[("object", 60), ("null", 40)]));
        assert!(
            audit_anti_patterns(&[s])
                .iter()
                .all(|f| f.kind != FindingType::FieldNameCollision)
        );
    }

    #[test]
    fn object_with_array_is_not_a_collision() {
        let mut s = sample();
        s.fields.push(field("address", &[("object", 60), ("array", 40)]));
        assert!(
            audit_anti_patterns(&[s])
                .iter()
                .all(|f| f.kind != FindingType::FieldNameCollision)
        );
    }

    #[test]
    fn excessive_field_count() {
        let mut s = sample();
        s.max_field_count = 201;
        let findings = audit_anti_patterns(&[s]);
        assert!(findings.iter().any(|f| f.kind == FindingType::ExcessiveFieldCount));
    }

    #[test]
    fn numeric_segment_detection() {
        let mut s = sample();
        s.fields.push(field("scores.12345.value", &[("int", 100)]));
        let findings = audit_anti_patterns(&[s]);
        assert!(findings.iter().any(|f| f.kind == FindingType::NumericFieldNames));
    }

    #[test]
    fn array_hop_segments_are_not_numeric_names() {
        let mut s = sample();
        s.fields.push(field("items[].sku", &[("string", 100)]));
        assert!(
            audit_anti_patterns(&[s])
                .iter()
                .all(|f| f.kind != FindingType::NumericFieldNames)
        );
    }
}
