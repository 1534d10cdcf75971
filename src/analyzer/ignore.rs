//! Ignore engine: suppress findings by typed rules from
//! `.mongospectreignore`.
//!
//! Rule grammar, one rule per line:
//!
//! ```text
//! TYPE TARGET
//! # comment
//! UNUSED_INDEX app.users.idx_old
//! MISSING_TTL sessions
//! * staging.*
//! ```
//!
//! `TYPE` is a finding-type code or `*`. `TARGET` is `collection`,
//! `db.collection` or `db.collection.index`; a bare collection matches any
//! database. A trailing `*` on db or collection is a prefix glob. An
//! unspecified index matches any index.

use std::fs;
use std::path::Path;

use crate::analyzer::common::glob_match;
use crate::models::{Finding, FindingType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreRule {
    /// None matches every finding type (`*`).
    pub kind: Option<FindingType>,
    pub database: String,
    pub collection: String,
    /// None matches any index.
    pub index: Option<String>,
}

impl IgnoreRule {
    /// Parse one `TYPE TARGET` line. Returns None for lines that are not
    /// rules (blank, comments) or cannot be parsed.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let (type_part, target) = line.split_once(char::is_whitespace)?;
        let target = target.trim();
        if target.is_empty() {
            return None;
        }

        let kind = if type_part == "*" {
            None
        } else {
            match type_part.parse::<FindingType>() {
                Ok(kind) => Some(kind),
                Err(_) => return None,
            }
        };

        let parts: Vec<&str> = target.splitn(3, '.').collect();
        let (database, collection, index) = match parts.as_slice() {
            [collection] => ("*".to_string(), (*collection).to_string(), None),
            [database, collection] => ((*database).to_string(), (*collection).to_string(), None),
            [database, collection, index] => (
                (*database).to_string(),
                (*collection).to_string(),
                Some((*index).to_string()),
            ),
            _ => return None,
        };

        Some(Self { kind, database, collection, index })
    }

    pub fn matches(&self, finding: &Finding) -> bool {
        if let Some(kind) = self.kind
            && kind != finding.kind
        {
            return false;
        }
        if !glob_match(&self.database, &finding.database) {
            return false;
        }
        if !glob_match(&self.collection, &finding.collection) {
            return false;
        }
        if let Some(index) = &self.index
            && index != &finding.index
        {
            return false;
        }
        true
    }
}

/// A parsed ignore file.
#[derive(Debug, Clone, Default)]
pub struct IgnoreList {
    pub rules: Vec<IgnoreRule>,
}

impl IgnoreList {
    /// Load rules from a file. A missing file yields the empty list; lines
    /// that fail to parse are skipped with a warning.
    pub fn load(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Self {
        let mut rules = Vec::new();
        for (number, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            match IgnoreRule::parse(line) {
                Some(rule) => rules.push(rule),
                None => {
                    tracing::warn!("skipping unparsable ignore rule at line {}: {}", number + 1, trimmed);
                },
            }
        }
        Self { rules }
    }

    /// Split findings into the retained stream and a suppression count. A
    /// finding is suppressed when any rule matches all of its fields.
    pub fn filter(&self, findings: Vec<Finding>) -> (Vec<Finding>, usize) {
        if self.rules.is_empty() {
            return (findings, 0);
        }
        let mut retained = Vec::with_capacity(findings.len());
        let mut suppressed = 0usize;
        for finding in findings {
            if self.rules.iter().any(|r| r.matches(&finding)) {
                suppressed += 1;
            } else {
                retained.push(finding);
            }
        }
        (retained, suppressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use std::io::Write;

    fn finding(kind: FindingType, db: &str, coll: &str, index: &str) -> Finding {
        Finding::new(kind, Severity::Medium, "msg")
            .database(db)
            .collection(coll)
            .index(index)
    }

    #[test]
    fn parses_three_target_forms() {
        let rule = IgnoreRule::parse("UNUSED_INDEX users").unwrap();
        assert_eq!(rule.database, "*");
        assert_eq!(rule.collection, "users");
        assert_eq!(rule.index, None);

        let rule = IgnoreRule::parse("UNUSED_INDEX app.users").unwrap();
        assert_eq!(rule.database, "app");

        let rule = IgnoreRule::parse("UNUSED_INDEX app.users.idx_old").unwrap();
        assert_eq!(rule.index.as_deref(), Some("idx_old"));
    }

    #[test]
    fn wildcard_type_matches_everything() {
        let rule = IgnoreRule::parse("* app.users").unwrap();
        assert!(rule.matches(&finding(FindingType::UnusedIndex, "app", "users", "x")));
        assert!(rule.matches(&finding(FindingType::MissingTtl, "app", "users", "")));
        assert!(!rule.matches(&finding(FindingType::MissingTtl, "app", "orders", "")));
    }

    #[test]
    fn unspecified_index_matches_any() {
        let rule = IgnoreRule::parse("UNUSED_INDEX app.users").unwrap();
        assert!(rule.matches(&finding(FindingType::UnusedIndex, "app", "users", "a")));
        assert!(rule.matches(&finding(FindingType::UnusedIndex, "app", "users", "b")));
    }

    #[test]
    fn explicit_index_is_exact() {
        let rule = IgnoreRule::parse("UNUSED_INDEX app.users.idx_old").unwrap();
        assert!(rule.matches(&finding(FindingType::UnusedIndex, "app", "users", "idx_old")));
        assert!(!rule.matches(&finding(FindingType::UnusedIndex, "app", "users", "idx_new")));
    }

    #[test]
    fn trailing_star_is_a_prefix_glob() {
        let rule = IgnoreRule::parse("* staging.*").unwrap();
        assert!(rule.matches(&finding(FindingType::UnusedIndex, "staging", "anything", "")));
        assert!(!rule.matches(&finding(FindingType::UnusedIndex, "prod", "anything", "")));

        let rule = IgnoreRule::parse("* app.tmp_*").unwrap();
        assert!(rule.matches(&finding(FindingType::UnusedIndex, "app", "tmp_import", "")));
        assert!(!rule.matches(&finding(FindingType::UnusedIndex, "app", "users", "")));
    }

    #[test]
    fn comments_blanks_and_garbage_are_skipped() {
        let list = IgnoreList::parse(
            "# header\n\nUNUSED_INDEX app.users\nNOT_A_REAL_TYPE app.users\njust-one-token\n",
        );
        assert_eq!(list.rules.len(), 1);
    }

    #[test]
    fn filter_reports_suppression_count() {
        let list = IgnoreList::parse("UNUSED_INDEX app.users\n");
        let findings = vec![
            finding(FindingType::UnusedIndex, "app", "users", "a"),
            finding(FindingType::UnusedIndex, "app", "orders", "b"),
            finding(FindingType::MissingTtl, "app", "users", ""),
        ];
        let (retained, suppressed) = list.filter(findings);
        assert_eq!(suppressed, 1);
        assert_eq!(retained.len(), 2);
        assert!(retained.iter().all(|f| !(f.collection == "users" && f.kind == FindingType::UnusedIndex)));
    }

    #[test]
    fn missing_file_is_empty_list() {
        let list = IgnoreList::load(Path::new("/nope/.mongospectreignore"));
        assert!(list.rules.is_empty());
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# ignore the archive").unwrap();
        writeln!(file, "* app.archive_*").unwrap();
        let list = IgnoreList::load(file.path());
        assert_eq!(list.rules.len(), 1);
        let (retained, suppressed) = list.filter(vec![finding(
            FindingType::OversizedCollection,
            "app",
            "archive_2023",
            "",
        )]);
        assert!(retained.is_empty());
        assert_eq!(suppressed, 1);
    }

    #[test]
    fn db_and_collection_match_case_insensitively() {
        let rule = IgnoreRule::parse("UNUSED_INDEX App.Users").unwrap();
        assert!(rule.matches(&finding(FindingType::UnusedIndex, "app", "users", "i")));
    }
}
