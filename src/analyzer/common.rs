//! Detector primitives shared across audit families.
//!
//! Everything here is pure and allocation-light; detectors lean on these
//! helpers so threshold logic stays the only interesting code in a rule.

use chrono::Duration;
use std::cmp::Ordering;

use crate::models::{CollectionInfo, IndexKey};

/// Databases excluded from schema-level detections.
pub const SYSTEM_DATABASES: &[&str] = &["admin", "local", "config"];

pub fn is_system_database(database: &str) -> bool {
    SYSTEM_DATABASES.contains(&database)
}

/// Whether `a` is a strict key prefix of `b`: shorter, and equal on both
/// field name and direction from position 0. A single direction mismatch
/// breaks the prefix.
pub fn is_strict_key_prefix(a: &[IndexKey], b: &[IndexKey]) -> bool {
    if a.is_empty() || a.len() >= b.len() {
        return false;
    }
    a.iter().zip(b.iter()).all(|(x, y)| x.field == y.field && x.direction == y.direction)
}

/// Whether `a` equals or is a prefix of `b` (non-strict).
pub fn is_key_prefix(a: &[IndexKey], b: &[IndexKey]) -> bool {
    if a.is_empty() || a.len() > b.len() {
        return false;
    }
    a.iter().zip(b.iter()).all(|(x, y)| x.field == y.field && x.direction == y.direction)
}

/// Nesting depth of a dot-notation field path: `1 + count('.')` after
/// stripping `[]` array-hop markers. `a.b[].c` has depth 3.
pub fn field_path_depth(path: &str) -> usize {
    let stripped = path.replace("[]", "");
    1 + stripped.matches('.').count()
}

/// Strip `[]` array-hop markers so code field paths compare against
/// sampled paths.
pub fn normalize_field_path(path: &str) -> String {
    path.replace("[]", "")
}

/// Case-insensitive collection lookup.
pub fn find_collection<'a>(
    collections: &'a [CollectionInfo],
    name: &str,
) -> Option<&'a CollectionInfo> {
    collections.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

/// Split a `db.collection` namespace at the first dot. Collection names may
/// themselves contain dots.
pub fn split_namespace(namespace: &str) -> Option<(&str, &str)> {
    namespace.split_once('.')
}

/// Format bytes to a human-readable string.
pub fn format_bytes(bytes: i64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes.max(0) as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes.max(0), UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// Format an elapsed duration as `N days`, `N hours` or `N minutes`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let minutes = elapsed.num_minutes().max(0);
    if minutes >= 24 * 60 {
        format!("{} days", minutes / (24 * 60))
    } else if minutes >= 60 {
        format!("{} hours", minutes / 60)
    } else {
        format!("{} minutes", minutes)
    }
}

/// Normalize a server version string to `(major, minor, patch)`. Accepts a
/// leading `v` and a missing patch component (defaults to 0). Returns None
/// when the string has no parsable major component.
pub fn parse_version(version: &str) -> Option<(u64, u64, u64)> {
    let trimmed = version.trim().trim_start_matches('v');
    let mut parts = trimmed.split('.');
    let major = parts.next()?.trim().parse::<u64>().ok()?;
    let minor = parts
        .next()
        .and_then(|p| p.trim().parse::<u64>().ok())
        .unwrap_or(0);
    let patch = parts
        .next()
        .and_then(|p| p.trim().parse::<u64>().ok())
        .unwrap_or(0);
    Some((major, minor, patch))
}

/// Compare two version strings after normalization. Unparsable versions
/// compare equal so missing data never produces a finding.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (parse_version(a), parse_version(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => Ordering::Equal,
    }
}

/// Match `value` against `pattern` where a trailing `*` makes the pattern a
/// prefix match. Comparison is case-insensitive (Mongo name semantics).
pub fn glob_match(pattern: &str, value: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if let Some(prefix) = pattern.strip_suffix('*') {
        value.to_ascii_lowercase().starts_with(&prefix.to_ascii_lowercase())
    } else {
        pattern.eq_ignore_ascii_case(value)
    }
}

/// Lowercase field names that suggest a document expires or tracks time,
/// used by the TTL-candidate rule.
pub const TTL_CANDIDATE_FIELDS: &[&str] = &[
    "created",
    "updated",
    "timestamp",
    "expires",
    "expiry",
    "ttl",
    "lastmodified",
    "createdat",
    "updatedat",
    "expiresat",
];

pub fn is_ttl_candidate_field(field: &str) -> bool {
    TTL_CANDIDATE_FIELDS.contains(&field.to_ascii_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(spec: &[(&str, i32)]) -> Vec<IndexKey> {
        spec.iter().map(|(f, d)| IndexKey::new(*f, *d)).collect()
    }

    #[test]
    fn strict_prefix_requires_same_direction() {
        let a = keys(&[("status", 1)]);
        let b = keys(&[("status", 1), ("date", 1)]);
        let c = keys(&[("status", -1), ("date", 1)]);
        assert!(is_strict_key_prefix(&a, &b));
        assert!(!is_strict_key_prefix(&a, &c));
        assert!(!is_strict_key_prefix(&b, &a));
        assert!(!is_strict_key_prefix(&a, &a));
    }

    #[test]
    fn field_depth_ignores_array_hops() {
        assert_eq!(field_path_depth("status"), 1);
        assert_eq!(field_path_depth("a.b.c"), 3);
        assert_eq!(field_path_depth("items[].sku"), 2);
        assert_eq!(field_path_depth("a.b.c.d.e.f"), 6);
    }

    #[test]
    fn version_normalization() {
        assert_eq!(parse_version("v7.0"), Some((7, 0, 0)));
        assert_eq!(parse_version("6.0.11"), Some((6, 0, 11)));
        assert_eq!(compare_versions("6.0", "7.0.2"), Ordering::Less);
        assert_eq!(compare_versions("7.0.0", "v7.0"), Ordering::Equal);
        assert_eq!(compare_versions("garbage", "7.0"), Ordering::Equal);
    }

    #[test]
    fn glob_matching() {
        assert!(glob_match("*", "anything"));
        assert!(glob_match("users", "Users"));
        assert!(glob_match("user*", "users_archive"));
        assert!(!glob_match("user", "users"));
    }

    #[test]
    fn elapsed_formatting() {
        assert_eq!(format_elapsed(Duration::minutes(30)), "30 minutes");
        assert_eq!(format_elapsed(Duration::hours(5)), "5 hours");
        assert_eq!(format_elapsed(Duration::days(3)), "3 days");
    }

    #[test]
    fn byte_formatting() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(10 * 1024 * 1024 * 1024), "10.00 GB");
    }
}
