//! Growth analysis: the current snapshot against the collections stored in
//! a prior report.
//!
//! ## Rule list:
//! - RAPID_GROWTH: data grew 50% or 1 GiB since the baseline
//! - INDEX_GROWTH_OUTPACING_DATA: index growth rate above data growth rate
//! - APPROACHING_LIMIT: data size near practical collection limits
//! - STORAGE_RECLAIM: storage footprint more than double the live data
//!
//! Collections match by `(database, name)` case-insensitively; views and
//! system databases are skipped. When the baseline has no timestamp the
//! elapsed phrasing is dropped from messages.

use crate::analyzer::common::{format_bytes, is_system_database};
use crate::analyzer::thresholds;
use crate::models::{CollectionInfo, Finding, FindingType, Severity};

pub fn audit_growth(
    current: &[CollectionInfo],
    baseline: &[CollectionInfo],
    elapsed: Option<&str>,
) -> Vec<Finding> {
    let mut findings = Vec::new();

    for coll in current {
        if coll.is_view() || is_system_database(&coll.database) {
            continue;
        }
        let Some(prior) = baseline.iter().find(|b| {
            b.database.eq_ignore_ascii_case(&coll.database) && b.name.eq_ignore_ascii_case(&coll.name)
        }) else {
            continue;
        };

        let since = match elapsed {
            Some(e) => format!(" in {}", e),
            None => " since the baseline".to_string(),
        };

        let data_growth = coll.size - prior.size;
        let data_growth_pct = if prior.size > 0 {
            data_growth as f64 / prior.size as f64 * 100.0
        } else {
            0.0
        };

        if data_growth_pct >= thresholds::RAPID_GROWTH_PCT
            || data_growth >= thresholds::RAPID_GROWTH_BYTES
        {
            findings.push(
                Finding::new(
                    FindingType::RapidGrowth,
                    Severity::Medium,
                    format!(
                        "collection '{}.{}' grew by {} ({:.0}%){}",
                        coll.database,
                        coll.name,
                        format_bytes(data_growth),
                        data_growth_pct,
                        since
                    ),
                )
                .database(&coll.database)
                .collection(&coll.name),
            );
        }

        let index_growth = coll.total_index_size - prior.total_index_size;
        if data_growth > 0 && index_growth > 0 && prior.size > 0 && prior.total_index_size > 0 {
            let index_growth_pct = index_growth as f64 / prior.total_index_size as f64 * 100.0;
            if index_growth_pct > data_growth_pct {
                findings.push(
                    Finding::new(
                        FindingType::IndexGrowthOutpacingData,
                        Severity::Low,
                        format!(
                            "indexes on '{}.{}' grew {:.0}% while data grew {:.0}%{}",
                            coll.database, coll.name, index_growth_pct, data_growth_pct, since
                        ),
                    )
                    .database(&coll.database)
                    .collection(&coll.name),
                );
            }
        }

        if coll.size >= thresholds::APPROACHING_LIMIT_BYTES {
            findings.push(
                Finding::new(
                    FindingType::ApproachingLimit,
                    Severity::Medium,
                    format!(
                        "collection '{}.{}' holds {} of data; plan sharding or archiving before it grows further",
                        coll.database,
                        coll.name,
                        format_bytes(coll.size)
                    ),
                )
                .database(&coll.database)
                .collection(&coll.name),
            );
        }

        if coll.size > 0 && coll.storage_size > 2 * coll.size {
            findings.push(
                Finding::new(
                    FindingType::StorageReclaim,
                    Severity::Low,
                    format!(
                        "collection '{}.{}' occupies {} on disk for {} of data; compact would reclaim space",
                        coll.database,
                        coll.name,
                        format_bytes(coll.storage_size),
                        format_bytes(coll.size)
                    ),
                )
                .database(&coll.database)
                .collection(&coll.name),
            );
        }
    }

    findings
}
