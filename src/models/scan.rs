//! Records produced by the code scanner.

use serde::{Deserialize, Serialize};

/// A collection access site found in source code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CollectionRef {
    pub collection: String,
    pub file: String,
    pub line: u32,
}

/// A field referenced in a query, sort or projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FieldRef {
    pub collection: String,
    pub field: String,
    pub file: String,
    pub line: u32,
}

/// A field written by an insert/update call, with the literal value type
/// when the scanner could infer one ("unknown" otherwise).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WriteRef {
    pub collection: String,
    pub field: String,
    pub file: String,
    pub line: u32,
    pub value_type: String,
}

/// Full output of one scanner run over a source tree.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScanResult {
    /// Distinct collection names referenced anywhere, in first-seen order.
    pub collections: Vec<String>,
    pub refs: Vec<CollectionRef>,
    pub field_refs: Vec<FieldRef>,
    pub write_refs: Vec<WriteRef>,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
            && self.refs.is_empty()
            && self.field_refs.is_empty()
            && self.write_refs.is_empty()
    }

    /// Whether any reference names the collection (case-insensitive).
    pub fn references_collection(&self, name: &str) -> bool {
        self.collections.iter().any(|c| c.eq_ignore_ascii_case(name))
    }
}
