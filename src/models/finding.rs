//! Core finding model shared by every audit family.
//!
//! A `Finding` is one diagnostic record emitted by a detector. Types and
//! severities are closed enumerations with stable string forms so that
//! ignore files and baseline reports stay portable across versions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity level for findings, totally ordered `info < low < medium < high`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Low,
    Medium,
    High,
}

impl Severity {
    /// Process exit code contribution: high→2, medium→1, else 0.
    pub fn exit_code(self) -> i32 {
        match self {
            Severity::High => 2,
            Severity::Medium => 1,
            Severity::Low | Severity::Info => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fold the severity lattice over a finding stream. Empty stream folds to
/// `info`.
pub fn max_severity(findings: &[Finding]) -> Severity {
    findings
        .iter()
        .map(|f| f.severity)
        .max()
        .unwrap_or(Severity::Info)
}

/// Exit code for a finding stream.
pub fn exit_code(findings: &[Finding]) -> i32 {
    max_severity(findings).exit_code()
}

/// Finding type codes. Renaming a code is a breaking change: baseline
/// reports and ignore files refer to these strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingType {
    // Cluster audit
    UnusedCollection,
    UnusedIndex,
    MissingIndex,
    DuplicateIndex,
    OversizedCollection,
    MissingTtl,
    IndexBloat,
    WriteHeavyOverIndexed,
    SingleFieldRedundant,
    LargeIndex,
    // User audit
    AdminInDataDb,
    DuplicateUser,
    OverprivilegedUser,
    MultipleAdminUsers,
    AtlasUserNoScope,
    FailedAuthOnly,
    InactivePrivilegedUser,
    InactiveUser,
    // Security audit
    AuthDisabled,
    BindAllInterfaces,
    TlsDisabled,
    TlsAllowInvalidCerts,
    AuditLogDisabled,
    LocalhostExceptionActive,
    // Replica set audit
    SingleMemberReplset,
    EvenMemberCount,
    MemberUnhealthy,
    OplogSmall,
    NoHiddenMember,
    PriorityZeroMajority,
    // Sharding audit
    MonotonicShardKey,
    UnbalancedChunks,
    JumboChunks,
    UnshardedLarge,
    BalancerDisabled,
    // Schema drift
    MissingField,
    RareField,
    TypeInconsistency,
    UndocumentedField,
    // Anti-patterns
    UnboundedArray,
    DeepNesting,
    LargeDocument,
    FieldNameCollision,
    ExcessiveFieldCount,
    NumericFieldNames,
    // Growth
    RapidGrowth,
    IndexGrowthOutpacingData,
    ApproachingLimit,
    StorageReclaim,
    // Validator drift
    ValidatorMissing,
    ValidatorStrictRisk,
    ValidatorWarnOnly,
    FieldNotInValidator,
    ValidatorStale,
    // URI lint
    UriNoAuth,
    UriNoTls,
    UriNoRetryWrites,
    UriPlaintextPassword,
    UriDefaultAuthSource,
    UriShortTimeout,
    UriNoReadPreference,
    UriDirectConnection,
    // Code <-> cluster diff
    MissingCollection,
    OrphanedIndex,
    UnindexedQuery,
    SuggestIndex,
    Ok,
    // Profiler correlation
    SlowQuerySource,
    CollectionScanSource,
    FrequentSlowQuery,
    // Atlas advisor correlation
    AtlasIndexSuggestion,
    AtlasAlertActive,
    AtlasTierMismatch,
    AtlasVersionBehind,
}

impl FindingType {
    pub fn as_str(self) -> &'static str {
        use FindingType::*;
        match self {
            UnusedCollection => "UNUSED_COLLECTION",
            UnusedIndex => "UNUSED_INDEX",
            MissingIndex => "MISSING_INDEX",
            DuplicateIndex => "DUPLICATE_INDEX",
            OversizedCollection => "OVERSIZED_COLLECTION",
            MissingTtl => "MISSING_TTL",
            IndexBloat => "INDEX_BLOAT",
            WriteHeavyOverIndexed => "WRITE_HEAVY_OVER_INDEXED",
            SingleFieldRedundant => "SINGLE_FIELD_REDUNDANT",
            LargeIndex => "LARGE_INDEX",
            AdminInDataDb => "ADMIN_IN_DATA_DB",
            DuplicateUser => "DUPLICATE_USER",
            OverprivilegedUser => "OVERPRIVILEGED_USER",
            MultipleAdminUsers => "MULTIPLE_ADMIN_USERS",
            AtlasUserNoScope => "ATLAS_USER_NO_SCOPE",
            FailedAuthOnly => "FAILED_AUTH_ONLY",
            InactivePrivilegedUser => "INACTIVE_PRIVILEGED_USER",
            InactiveUser => "INACTIVE_USER",
            AuthDisabled => "AUTH_DISABLED",
            BindAllInterfaces => "BIND_ALL_INTERFACES",
            TlsDisabled => "TLS_DISABLED",
            TlsAllowInvalidCerts => "TLS_ALLOW_INVALID_CERTS",
            AuditLogDisabled => "AUDIT_LOG_DISABLED",
            LocalhostExceptionActive => "LOCALHOST_EXCEPTION_ACTIVE",
            SingleMemberReplset => "SINGLE_MEMBER_REPLSET",
            EvenMemberCount => "EVEN_MEMBER_COUNT",
            MemberUnhealthy => "MEMBER_UNHEALTHY",
            OplogSmall => "OPLOG_SMALL",
            NoHiddenMember => "NO_HIDDEN_MEMBER",
            PriorityZeroMajority => "PRIORITY_ZERO_MAJORITY",
            MonotonicShardKey => "MONOTONIC_SHARD_KEY",
            UnbalancedChunks => "UNBALANCED_CHUNKS",
            JumboChunks => "JUMBO_CHUNKS",
            UnshardedLarge => "UNSHARDED_LARGE",
            BalancerDisabled => "BALANCER_DISABLED",
            MissingField => "MISSING_FIELD",
            RareField => "RARE_FIELD",
            TypeInconsistency => "TYPE_INCONSISTENCY",
            UndocumentedField => "UNDOCUMENTED_FIELD",
            UnboundedArray => "UNBOUNDED_ARRAY",
            DeepNesting => "DEEP_NESTING",
            LargeDocument => "LARGE_DOCUMENT",
            FieldNameCollision => "FIELD_NAME_COLLISION",
            ExcessiveFieldCount => "EXCESSIVE_FIELD_COUNT",
            NumericFieldNames => "NUMERIC_FIELD_NAMES",
            RapidGrowth => "RAPID_GROWTH",
            IndexGrowthOutpacingData => "INDEX_GROWTH_OUTPACING_DATA",
            ApproachingLimit => "APPROACHING_LIMIT",
            StorageReclaim => "STORAGE_RECLAIM",
            ValidatorMissing => "VALIDATOR_MISSING",
            ValidatorStrictRisk => "VALIDATOR_STRICT_RISK",
            ValidatorWarnOnly => "VALIDATOR_WARN_ONLY",
            FieldNotInValidator => "FIELD_NOT_IN_VALIDATOR",
            ValidatorStale => "VALIDATOR_STALE",
            UriNoAuth => "URI_NO_AUTH",
            UriNoTls => "URI_NO_TLS",
            UriNoRetryWrites => "URI_NO_RETRY_WRITES",
            UriPlaintextPassword => "URI_PLAINTEXT_PASSWORD",
            UriDefaultAuthSource => "URI_DEFAULT_AUTH_SOURCE",
            UriShortTimeout => "URI_SHORT_TIMEOUT",
            UriNoReadPreference => "URI_NO_READ_PREFERENCE",
            UriDirectConnection => "URI_DIRECT_CONNECTION",
            MissingCollection => "MISSING_COLLECTION",
            OrphanedIndex => "ORPHANED_INDEX",
            UnindexedQuery => "UNINDEXED_QUERY",
            SuggestIndex => "SUGGEST_INDEX",
            Ok => "OK",
            SlowQuerySource => "SLOW_QUERY_SOURCE",
            CollectionScanSource => "COLLECTION_SCAN_SOURCE",
            FrequentSlowQuery => "FREQUENT_SLOW_QUERY",
            AtlasIndexSuggestion => "ATLAS_INDEX_SUGGESTION",
            AtlasAlertActive => "ATLAS_ALERT_ACTIVE",
            AtlasTierMismatch => "ATLAS_TIER_MISMATCH",
            AtlasVersionBehind => "ATLAS_VERSION_BEHIND",
        }
    }
}

impl fmt::Display for FindingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FindingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use FindingType::*;
        let t = match s {
            "UNUSED_COLLECTION" => UnusedCollection,
            "UNUSED_INDEX" => UnusedIndex,
            "MISSING_INDEX" => MissingIndex,
            "DUPLICATE_INDEX" => DuplicateIndex,
            "OVERSIZED_COLLECTION" => OversizedCollection,
            "MISSING_TTL" => MissingTtl,
            "INDEX_BLOAT" => IndexBloat,
            "WRITE_HEAVY_OVER_INDEXED" => WriteHeavyOverIndexed,
            "SINGLE_FIELD_REDUNDANT" => SingleFieldRedundant,
            "LARGE_INDEX" => LargeIndex,
            "ADMIN_IN_DATA_DB" => AdminInDataDb,
            "DUPLICATE_USER" => DuplicateUser,
            "OVERPRIVILEGED_USER" => OverprivilegedUser,
            "MULTIPLE_ADMIN_USERS" => MultipleAdminUsers,
            "ATLAS_USER_NO_SCOPE" => AtlasUserNoScope,
            "FAILED_AUTH_ONLY" => FailedAuthOnly,
            "INACTIVE_PRIVILEGED_USER" => InactivePrivilegedUser,
            "INACTIVE_USER" => InactiveUser,
            "AUTH_DISABLED" => AuthDisabled,
            "BIND_ALL_INTERFACES" => BindAllInterfaces,
            "TLS_DISABLED" => TlsDisabled,
            "TLS_ALLOW_INVALID_CERTS" => TlsAllowInvalidCerts,
            "AUDIT_LOG_DISABLED" => AuditLogDisabled,
            "LOCALHOST_EXCEPTION_ACTIVE" => LocalhostExceptionActive,
            "SINGLE_MEMBER_REPLSET" => SingleMemberReplset,
            "EVEN_MEMBER_COUNT" => EvenMemberCount,
            "MEMBER_UNHEALTHY" => MemberUnhealthy,
            "OPLOG_SMALL" => OplogSmall,
            "NO_HIDDEN_MEMBER" => NoHiddenMember,
            "PRIORITY_ZERO_MAJORITY" => PriorityZeroMajority,
            "MONOTONIC_SHARD_KEY" => MonotonicShardKey,
            "UNBALANCED_CHUNKS" => UnbalancedChunks,
            "JUMBO_CHUNKS" => JumboChunks,
            "UNSHARDED_LARGE" => UnshardedLarge,
            "BALANCER_DISABLED" => BalancerDisabled,
            "MISSING_FIELD" => MissingField,
            "RARE_FIELD" => RareField,
            "TYPE_INCONSISTENCY" => TypeInconsistency,
            "UNDOCUMENTED_FIELD" => UndocumentedField,
            "UNBOUNDED_ARRAY" => UnboundedArray,
            "DEEP_NESTING" => DeepNesting,
            "LARGE_DOCUMENT" => LargeDocument,
            "FIELD_NAME_COLLISION" => FieldNameCollision,
            "EXCESSIVE_FIELD_COUNT" => ExcessiveFieldCount,
            "NUMERIC_FIELD_NAMES" => NumericFieldNames,
            "RAPID_GROWTH" => RapidGrowth,
            "INDEX_GROWTH_OUTPACING_DATA" => IndexGrowthOutpacingData,
            "APPROACHING_LIMIT" => ApproachingLimit,
            "STORAGE_RECLAIM" => StorageReclaim,
            "VALIDATOR_MISSING" => ValidatorMissing,
            "VALIDATOR_STRICT_RISK" => ValidatorStrictRisk,
            "VALIDATOR_WARN_ONLY" => ValidatorWarnOnly,
            "FIELD_NOT_IN_VALIDATOR" => FieldNotInValidator,
            "VALIDATOR_STALE" => ValidatorStale,
            "URI_NO_AUTH" => UriNoAuth,
            "URI_NO_TLS" => UriNoTls,
            "URI_NO_RETRY_WRITES" => UriNoRetryWrites,
            "URI_PLAINTEXT_PASSWORD" => UriPlaintextPassword,
            "URI_DEFAULT_AUTH_SOURCE" => UriDefaultAuthSource,
            "URI_SHORT_TIMEOUT" => UriShortTimeout,
            "URI_NO_READ_PREFERENCE" => UriNoReadPreference,
            "URI_DIRECT_CONNECTION" => UriDirectConnection,
            "MISSING_COLLECTION" => MissingCollection,
            "ORPHANED_INDEX" => OrphanedIndex,
            "UNINDEXED_QUERY" => UnindexedQuery,
            "SUGGEST_INDEX" => SuggestIndex,
            "OK" => Ok,
            "SLOW_QUERY_SOURCE" => SlowQuerySource,
            "COLLECTION_SCAN_SOURCE" => CollectionScanSource,
            "FREQUENT_SLOW_QUERY" => FrequentSlowQuery,
            "ATLAS_INDEX_SUGGESTION" => AtlasIndexSuggestion,
            "ATLAS_ALERT_ACTIVE" => AtlasAlertActive,
            "ATLAS_TIER_MISMATCH" => AtlasTierMismatch,
            "ATLAS_VERSION_BEHIND" => AtlasVersionBehind,
            other => return Err(format!("unknown finding type: {}", other)),
        };
        Result::Ok(t)
    }
}

/// One diagnostic record emitted by a detector.
///
/// `database`, `collection` and `index` are empty where not applicable;
/// cluster-wide findings leave all three empty. The message is
/// human-readable and never carries secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "type")]
    pub kind: FindingType,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub database: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub collection: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub index: String,
    pub message: String,
}

impl Finding {
    pub fn new(kind: FindingType, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            database: String::new(),
            collection: String::new(),
            index: String::new(),
            message: message.into(),
        }
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    /// Identity key for baseline diffing: `type|database|collection[|index]`.
    /// The message is deliberately excluded so wording changes do not re-open
    /// findings.
    pub fn identity(&self) -> String {
        if self.index.is_empty() {
            format!("{}|{}|{}", self.kind, self.database, self.collection)
        } else {
            format!("{}|{}|{}|{}", self.kind, self.database, self.collection, self.index)
        }
    }
}

/// Baseline diff status for a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaselineStatus {
    New,
    Unchanged,
    Resolved,
}

impl BaselineStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BaselineStatus::New => "new",
            BaselineStatus::Unchanged => "unchanged",
            BaselineStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for BaselineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finding annotated with its baseline diff status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineFinding {
    #[serde(flatten)]
    pub finding: Finding,
    pub status: BaselineStatus,
}

/// Cross-cluster drift record types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompareFindingType {
    MissingInTarget,
    MissingInSource,
    IndexDrift,
}

impl CompareFindingType {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareFindingType::MissingInTarget => "MISSING_IN_TARGET",
            CompareFindingType::MissingInSource => "MISSING_IN_SOURCE",
            CompareFindingType::IndexDrift => "INDEX_DRIFT",
        }
    }
}

impl fmt::Display for CompareFindingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cluster-vs-cluster drift record. Kept as a sibling of `Finding`: the
/// source/target detail fields are structural, not cosmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareFinding {
    #[serde(rename = "type")]
    pub kind: CompareFindingType,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub database: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub collection: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub index: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_detail: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target_detail: String,
}
