//! Records returned by the Atlas Admin API client.
//!
//! Field names mirror the Atlas v2 wire format (camelCase) so the client
//! can deserialize API payloads directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cluster description from `GET /groups/{groupId}/clusters/{name}`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct AtlasCluster {
    pub name: String,
    /// Instance tier, e.g. `M10`.
    pub instance_size_name: String,
    pub mongo_db_version: String,
    pub state_name: String,
}

/// One entry from the Performance Advisor suggested-indexes endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct SuggestedIndex {
    /// `db.collection` namespace; may be empty on older payloads.
    pub namespace: String,
    /// Suggested key fields in index order.
    pub fields: Vec<String>,
    /// Advisor weight (higher means more impact); informational only.
    pub weight: f64,
}

/// One alert from `GET /groups/{groupId}/alerts`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct AtlasAlert {
    pub id: String,
    pub event_type_name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct AtlasRole {
    pub role_name: String,
    pub database_name: String,
}

/// A named cluster restriction on a database user; an empty scope list
/// grants access to every cluster in the project.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct AtlasScope {
    pub name: String,
    #[serde(rename = "type")]
    pub scope_type: String,
}

/// One database user from `GET /groups/{groupId}/databaseUsers`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct DatabaseUser {
    pub username: String,
    pub database_name: String,
    pub roles: Vec<AtlasRole>,
    pub scopes: Vec<AtlasScope>,
}

impl DatabaseUser {
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        self.roles.iter().any(|r| roles.contains(&r.role_name.as_str()))
    }
}

/// One authentication attempt from the database access logs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct AccessLogEntry {
    pub username: String,
    pub auth_result: bool,
    pub ip_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Everything the Atlas collector hands to the analyzer in one snapshot.
#[derive(Debug, Clone, Default)]
pub struct AtlasSnapshot {
    pub cluster: Option<AtlasCluster>,
    pub suggested_indexes: Vec<SuggestedIndex>,
    pub alerts: Vec<AtlasAlert>,
    pub users: Vec<DatabaseUser>,
    /// Access-log entries for the trailing log window.
    pub access_logs: Vec<AccessLogEntry>,
    /// MongoDB versions currently offered by Atlas.
    pub available_versions: Vec<String>,
}
