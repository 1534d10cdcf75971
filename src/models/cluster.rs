//! Snapshot records produced by the MongoDB inspector.
//!
//! These are plain data carriers: the inspector fills them from driver
//! calls and the analyzer borrows them read-only. Every associative value a
//! detector iterates is a `BTreeMap` so emission order is total.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Collection object type as reported by `listCollections`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CollectionType {
    #[default]
    Collection,
    View,
}

/// Per-collection statistics, indexes and validator, as gathered from
/// `listCollections`, `collStats` and `$indexStats`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CollectionInfo {
    pub database: String,
    pub name: String,
    #[serde(rename = "type")]
    pub coll_type: CollectionType,
    pub doc_count: i64,
    /// Uncompressed data size in bytes.
    pub size: i64,
    pub avg_obj_size: i64,
    /// On-disk storage size in bytes.
    pub storage_size: i64,
    pub total_index_size: i64,
    pub indexes: Vec<IndexInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validator: Option<ValidatorInfo>,
}

impl CollectionInfo {
    pub fn is_view(&self) -> bool {
        self.coll_type == CollectionType::View
    }

    /// `database.name` namespace form used by the sharding catalog.
    pub fn namespace(&self) -> String {
        format!("{}.{}", self.database, self.name)
    }
}

/// One key component of an index, `(field, direction)`. Direction is 1 or
/// -1 for ordered keys and 0 for non-ordered kinds (hashed, text, 2dsphere).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexKey {
    pub field: String,
    pub direction: i32,
}

impl IndexKey {
    pub fn new(field: impl Into<String>, direction: i32) -> Self {
        Self { field: field.into(), direction }
    }
}

/// Usage counters from `$indexStats`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct IndexStats {
    pub ops: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct IndexInfo {
    pub name: String,
    pub key: Vec<IndexKey>,
    pub unique: bool,
    pub sparse: bool,
    /// `expireAfterSeconds` when the index is a TTL index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_seconds: Option<i64>,
    pub size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<IndexStats>,
}

impl IndexInfo {
    pub fn is_id(&self) -> bool {
        self.name == "_id_"
    }

    pub fn is_ttl(&self) -> bool {
        self.ttl_seconds.is_some()
    }

    /// Human-readable key spec, e.g. `{status: 1, date: -1}`.
    pub fn key_spec(&self) -> String {
        let parts: Vec<String> = self
            .key
            .iter()
            .map(|k| format!("{}: {}", k.field, k.direction))
            .collect();
        format!("{{{}}}", parts.join(", "))
    }
}

/// JSON-schema validator summary for a collection.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ValidatorInfo {
    /// `validationAction`; empty means the server default ("error").
    pub validation_action: String,
    /// `validationLevel`; empty means the server default ("strict").
    pub validation_level: String,
    /// Top-level properties of the `$jsonSchema`, field name to the allowed
    /// BSON type names. Empty when the validator carries no schema.
    pub properties: BTreeMap<String, Vec<String>>,
    /// `additionalProperties` of the `$jsonSchema` when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<bool>,
}

impl ValidatorInfo {
    pub fn action(&self) -> &str {
        if self.validation_action.is_empty() { "error" } else { &self.validation_action }
    }

    pub fn level(&self) -> &str {
        if self.validation_level.is_empty() { "strict" } else { &self.validation_level }
    }

    /// Strict validators reject non-conforming writes outright.
    pub fn is_strict_error(&self) -> bool {
        self.action() == "error" && self.level() == "strict"
    }
}

/// One field observed while sampling documents. `path` uses dot notation
/// with `[]` marking array hops, e.g. `items[].sku`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FieldSample {
    pub path: String,
    /// Number of sampled documents containing the field.
    pub count: i64,
    /// BSON type name to occurrence count.
    pub types: BTreeMap<String, i64>,
}

/// Result of sampling one collection.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FieldSampleResult {
    pub database: String,
    pub collection: String,
    pub sample_size: i64,
    pub fields: Vec<FieldSample>,
    /// Maximum observed array length per path.
    pub array_lengths: BTreeMap<String, i64>,
    pub max_doc_size: i64,
    pub max_field_count: i64,
}

/// One entry read from `system.profile`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProfileEntry {
    pub database: String,
    pub collection: String,
    pub filter_fields: Vec<String>,
    pub sort_fields: Vec<String>,
    pub projection_fields: Vec<String>,
    pub duration_millis: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub plan_summary: String,
}

/// Server security posture from `getCmdLineOpts` and friends. Privileged
/// commands that fail leave fields at their zero value; detectors treat
/// missing data as no finding only where the zero value is unambiguous.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SecurityInfo {
    pub auth_enabled: bool,
    /// Comma-separated bind addresses as configured.
    pub bind_ip: String,
    /// `net.tls.mode`; empty when TLS is not configured.
    pub tls_mode: String,
    pub tls_allow_invalid_certs: bool,
    pub audit_log_enabled: bool,
    pub localhost_auth_bypass: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ReplicaSetMember {
    pub name: String,
    pub state_str: String,
    pub health: i32,
    pub priority: f64,
    pub votes: i32,
    pub hidden: bool,
}

/// Replica-set topology; `name` is empty on standalone deployments.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ReplicaSetInfo {
    pub name: String,
    pub members: Vec<ReplicaSetMember>,
    /// Time between first and last oplog entry; 0 when unknown.
    pub oplog_window_hours: f64,
}

/// One sharded collection from `config.collections` + `config.chunks`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ShardedCollection {
    /// `db.collection` namespace.
    pub namespace: String,
    pub shard_key: Vec<IndexKey>,
    /// Chunk count per shard name.
    pub chunk_counts: BTreeMap<String, i64>,
    pub jumbo_chunks: i64,
    /// True when chunk enumeration was truncated at the sampling cap.
    pub chunk_limit_hit: bool,
}

/// Sharding catalog snapshot; `enabled` is false on non-sharded
/// deployments (namespace-not-found from the driver maps here).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ShardingInfo {
    pub enabled: bool,
    pub balancer_enabled: bool,
    /// All shard names known to the cluster.
    pub shards: Vec<String>,
    pub collections: Vec<ShardedCollection>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UserRole {
    pub role: String,
    pub database: String,
}

/// One user from `usersInfo`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UserInfo {
    pub username: String,
    /// Authentication database the user is defined in.
    pub database: String,
    pub roles: Vec<UserRole>,
}

impl UserInfo {
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        self.roles.iter().any(|r| roles.contains(&r.role.as_str()))
    }
}
