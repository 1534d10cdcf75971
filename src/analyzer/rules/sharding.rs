//! Sharding audit over the config-server catalog.
//!
//! ## Rule list:
//! - MONOTONIC_SHARD_KEY: single-field key on a monotonically growing field
//! - UNBALANCED_CHUNKS: chunk distribution skewed across shards
//! - JUMBO_CHUNKS: unsplittable chunks present
//! - UNSHARDED_LARGE: big collection not sharded at all
//! - BALANCER_DISABLED: the balancer is switched off
//!
//! Non-sharded deployments (`enabled == false`) produce nothing.

use crate::analyzer::common::format_bytes;
use crate::analyzer::thresholds;
use crate::models::{CollectionInfo, Finding, FindingType, Severity, ShardingInfo};

/// Fields whose single-field shard keys grow monotonically and pin all
/// inserts to one shard.
const MONOTONIC_FIELDS: &[&str] = &["_id", "created_at", "createdat"];

pub fn audit_sharding(sharding: &ShardingInfo, collections: &[CollectionInfo]) -> Vec<Finding> {
    if !sharding.enabled {
        return Vec::new();
    }

    let mut findings = Vec::new();

    for sharded in &sharding.collections {
        let (database, collection) = match sharded.namespace.split_once('.') {
            Some((db, coll)) => (db.to_string(), coll.to_string()),
            None => (String::new(), sharded.namespace.clone()),
        };

        if sharded.shard_key.len() == 1
            && MONOTONIC_FIELDS.contains(&sharded.shard_key[0].field.to_ascii_lowercase().as_str())
        {
            findings.push(
                Finding::new(
                    FindingType::MonotonicShardKey,
                    Severity::Medium,
                    format!(
                        "shard key '{}' on '{}' grows monotonically; all inserts land on one shard",
                        sharded.shard_key[0].field, sharded.namespace
                    ),
                )
                .database(&database)
                .collection(&collection),
            );
        }

        // Per-shard chunk counts, including named shards that hold zero.
        let mut distribution: Vec<(String, i64)> = sharding
            .shards
            .iter()
            .map(|shard| (shard.clone(), sharded.chunk_counts.get(shard).copied().unwrap_or(0)))
            .collect();
        for (shard, count) in &sharded.chunk_counts {
            if !sharding.shards.contains(shard) {
                distribution.push((shard.clone(), *count));
            }
        }
        distribution.sort_by(|a, b| a.0.cmp(&b.0));

        if !distribution.is_empty() {
            let min = distribution.iter().map(|(_, c)| *c).min().unwrap_or(0);
            let max = distribution.iter().map(|(_, c)| *c).max().unwrap_or(0);
            if max > 0 && (min == 0 || max > 2 * min) {
                let spread = distribution
                    .iter()
                    .map(|(shard, count)| format!("{}={}", shard, count))
                    .collect::<Vec<_>>()
                    .join(", ");
                let mut message = format!(
                    "chunks for '{}' are unevenly distributed: {}",
                    sharded.namespace, spread
                );
                if sharded.chunk_limit_hit {
                    message.push_str(" (first 10000 chunks sampled)");
                }
                findings.push(
                    Finding::new(FindingType::UnbalancedChunks, Severity::High, message)
                        .database(&database)
                        .collection(&collection),
                );
            }
        }

        if sharded.jumbo_chunks > 0 {
            findings.push(
                Finding::new(
                    FindingType::JumboChunks,
                    Severity::High,
                    format!(
                        "'{}' has {} jumbo chunk(s) the balancer cannot move",
                        sharded.namespace, sharded.jumbo_chunks
                    ),
                )
                .database(&database)
                .collection(&collection),
            );
        }
    }

    // Large collections left unsharded.
    for coll in collections {
        if coll.is_view() {
            continue;
        }
        let ns = coll.namespace();
        let is_sharded = sharding
            .collections
            .iter()
            .any(|s| s.namespace.eq_ignore_ascii_case(&ns));
        if !is_sharded && coll.storage_size >= thresholds::OVERSIZED_COLLECTION_BYTES {
            findings.push(
                Finding::new(
                    FindingType::UnshardedLarge,
                    Severity::Medium,
                    format!(
                        "collection '{}' uses {} but is not sharded",
                        ns,
                        format_bytes(coll.storage_size)
                    ),
                )
                .database(&coll.database)
                .collection(&coll.name),
            );
        }
    }

    if !sharding.balancer_enabled {
        findings.push(Finding::new(
            FindingType::BalancerDisabled,
            Severity::Medium,
            "the balancer is disabled; chunk distribution will drift",
        ));
    }

    findings
}
