//! Detection thresholds.
//!
//! Module-level constants, named so tests can reference the same values
//! the detectors use. Nothing here is mutated at runtime.

pub const GIB: i64 = 1024 * 1024 * 1024;

/// Minimum document count before a collection with only `_id_` is flagged.
pub const MISSING_INDEX_MIN_DOCS: i64 = 10_000;

/// Storage size above which a collection is flagged oversized.
pub const OVERSIZED_COLLECTION_BYTES: i64 = 10 * GIB;

/// Index size above which a single index is flagged large.
pub const LARGE_INDEX_BYTES: i64 = GIB;

/// Index count above which a collection is considered over-indexed for a
/// write-heavy workload.
pub const MAX_INDEXES_PER_COLLECTION: usize = 10;

/// Presence ratio below which a code-referenced field is considered rare.
pub const RARE_FIELD_RATIO: f64 = 0.10;

/// Presence ratio above which an unreferenced field is reported as
/// undocumented.
pub const UNDOCUMENTED_FIELD_RATIO: f64 = 0.90;

/// Array length above which an array is considered unbounded.
pub const MAX_ARRAY_ELEMENTS: i64 = 100;

/// Field path depth above which nesting is flagged.
pub const MAX_FIELD_DEPTH: usize = 5;

/// Document size (bytes) above which a document is flagged large.
pub const LARGE_DOCUMENT_BYTES: i64 = 1_000_000;

/// Field count above which a document shape is flagged.
pub const MAX_FIELD_COUNT: i64 = 200;

/// Relative data growth (percent) that counts as rapid.
pub const RAPID_GROWTH_PCT: f64 = 50.0;

/// Absolute data growth (bytes) that counts as rapid.
pub const RAPID_GROWTH_BYTES: i64 = GIB;

/// Data size at which a collection approaches practical limits.
pub const APPROACHING_LIMIT_BYTES: i64 = 12 * GIB;

/// Query-shape repetition count that makes a slow query frequent.
pub const FREQUENT_QUERY_MIN_COUNT: usize = 50;

/// Minimum document count before an index suggestion is worthwhile.
pub const SUGGEST_INDEX_MIN_DOCS: i64 = 1_000;

/// Index suggestions are capped per collection.
pub const SUGGEST_INDEX_CAP: usize = 5;

/// Shape-source lists in messages are truncated to this many locations.
pub const SHAPE_SOURCE_CAP: usize = 3;

/// Atlas tiers M1..=M10 are considered low tiers.
pub const ATLAS_LOW_TIER_MAX: u64 = 10;

/// Aggregate storage above which a low tier is mismatched.
pub const ATLAS_TIER_STORAGE_BYTES: i64 = 500 * GIB;

/// Oplog windows shorter than this (hours) are flagged.
pub const MIN_OPLOG_WINDOW_HOURS: f64 = 24.0;

/// URI lint: minimum acceptable connect timeout.
pub const URI_MIN_CONNECT_TIMEOUT_MS: i64 = 5_000;

/// URI lint: minimum acceptable server-selection timeout.
pub const URI_MIN_SERVER_SELECTION_TIMEOUT_MS: i64 = 10_000;

/// Access-log window (days) the Atlas collector fetches for inactive-user
/// detection.
pub const ACCESS_LOG_WINDOW_DAYS: i64 = 7;

/// Chunk enumeration cap; collections that hit it carry an annotation.
pub const CHUNK_SAMPLE_LIMIT: i64 = 10_000;

/// Default number of documents sampled per collection.
pub const DEFAULT_SAMPLE_SIZE: i64 = 100;

/// Default number of profiler entries read.
pub const DEFAULT_PROFILE_LIMIT: i64 = 500;
