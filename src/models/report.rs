//! Persisted report format. The JSON report written by one run is the
//! baseline consumed by the next.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cluster::CollectionInfo;
use super::finding::Finding;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ReportMetadata {
    /// RFC3339 run timestamp; absent in hand-built baselines, which
    /// disables elapsed-time phrasing in growth findings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tool_version: String,
    /// Audited URI with any password redacted.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub uri: String,
}

/// Report blob: `{metadata, findings, collections}`. Missing fields are
/// tolerated on load; an absent `collections` disables growth analysis.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub findings: Vec<Finding>,
    pub collections: Vec<CollectionInfo>,
}

impl Report {
    pub fn new(findings: Vec<Finding>, collections: Vec<CollectionInfo>) -> Self {
        Self {
            metadata: ReportMetadata {
                timestamp: Some(Utc::now()),
                tool_version: env!("CARGO_PKG_VERSION").to_string(),
                uri: String::new(),
            },
            findings,
            collections,
        }
    }
}
