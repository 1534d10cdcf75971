//! Replica-set audit.
//!
//! ## Rule list:
//! - SINGLE_MEMBER_REPLSET: no failover partner
//! - EVEN_MEMBER_COUNT: even number of voting members risks election ties
//! - MEMBER_UNHEALTHY: member down or in a transitional state
//! - OPLOG_SMALL: oplog window under a day
//! - NO_HIDDEN_MEMBER: larger sets benefit from a hidden backup member
//! - PRIORITY_ZERO_MAJORITY: most members can never become primary
//!
//! Standalone deployments (`name` empty) are skipped.

use crate::analyzer::thresholds;
use crate::models::{Finding, FindingType, ReplicaSetInfo, Severity};

/// States in which a member is not serving as a healthy primary/secondary.
const UNHEALTHY_STATES: &[&str] = &[
    "RECOVERING",
    "STARTUP",
    "STARTUP2",
    "DOWN",
    "ROLLBACK",
    "REMOVED",
    "UNKNOWN",
];

pub fn audit_replica_set(replset: &ReplicaSetInfo) -> Vec<Finding> {
    if replset.name.is_empty() {
        return Vec::new();
    }

    let mut findings = Vec::new();
    let member_count = replset.members.len();

    if member_count <= 1 {
        findings.push(Finding::new(
            FindingType::SingleMemberReplset,
            Severity::High,
            format!(
                "replica set '{}' has {} member(s); no failover is possible",
                replset.name, member_count
            ),
        ));
    }

    let voting = replset.members.iter().filter(|m| m.votes > 0).count();
    if voting > 0 && voting % 2 == 0 {
        findings.push(Finding::new(
            FindingType::EvenMemberCount,
            Severity::Medium,
            format!(
                "replica set '{}' has {} voting members; an even count risks election ties",
                replset.name, voting
            ),
        ));
    }

    for member in &replset.members {
        let unhealthy =
            member.health == 0 || UNHEALTHY_STATES.contains(&member.state_str.as_str());
        if unhealthy {
            findings.push(Finding::new(
                FindingType::MemberUnhealthy,
                Severity::High,
                format!(
                    "member '{}' of '{}' is {} (health={})",
                    member.name, replset.name, member.state_str, member.health
                ),
            ));
        }
    }

    if replset.oplog_window_hours > 0.0
        && replset.oplog_window_hours < thresholds::MIN_OPLOG_WINDOW_HOURS
    {
        findings.push(Finding::new(
            FindingType::OplogSmall,
            Severity::Medium,
            format!(
                "oplog window is {:.1} hours; secondaries falling behind for longer need a full resync",
                replset.oplog_window_hours
            ),
        ));
    }

    if member_count > 3 && !replset.members.iter().any(|m| m.hidden) {
        findings.push(Finding::new(
            FindingType::NoHiddenMember,
            Severity::Info,
            format!(
                "replica set '{}' has {} members but no hidden member for backups or analytics",
                replset.name, member_count
            ),
        ));
    }

    let zero_priority = replset.members.iter().filter(|m| m.priority == 0.0).count();
    if zero_priority * 2 > member_count {
        findings.push(Finding::new(
            FindingType::PriorityZeroMajority,
            Severity::High,
            format!(
                "{} of {} members have priority 0 and can never be elected primary",
                zero_priority, member_count
            ),
        ));
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReplicaSetMember;

    fn member(name: &str, priority: f64) -> ReplicaSetMember {
        ReplicaSetMember {
            name: name.into(),
            state_str: "SECONDARY".into(),
            health: 1,
            priority,
            votes: 1,
            hidden: false,
        }
    }

    fn replset(members: Vec<ReplicaSetMember>) -> ReplicaSetInfo {
        ReplicaSetInfo { name: "rs0".into(), members, oplog_window_hours: 48.0 }
    }

    #[test]
    fn standalone_is_skipped() {
        let standalone = ReplicaSetInfo::default();
        assert!(audit_replica_set(&standalone).is_empty());
    }

    #[test]
    fn single_member_is_high() {
        let findings = audit_replica_set(&replset(vec![member("a:27017", 1.0)]));
        assert!(findings.iter().any(|f| f.kind == FindingType::SingleMemberReplset));
    }

    #[test]
    fn even_voting_count_flagged() {
        let rs = replset(vec![
            member("a", 1.0),
            member("b", 1.0),
            member("c", 1.0),
            member("d", 1.0),
        ]);
        let findings = audit_replica_set(&rs);
        assert!(findings.iter().any(|f| f.kind == FindingType::EvenMemberCount));
    }

    #[test]
    fn non_voting_members_do_not_count_toward_parity() {
        let mut rs = replset(vec![member("a", 1.0), member("b", 1.0), member("c", 1.0)]);
        rs.members.push(ReplicaSetMember { votes: 0, ..member("d", 0.0) });
        let findings = audit_replica_set(&rs);
        assert!(findings.iter().all(|f| f.kind != FindingType::EvenMemberCount));
    }

    #[test]
    fn unhealthy_states_flagged() {
        let mut rs = replset(vec![member("a", 1.0), member("b", 1.0), member("c", 1.0)]);
        rs.members[1].state_str = "RECOVERING".into();
        let findings = audit_replica_set(&rs);
        let unhealthy: Vec<&Finding> = findings
            .iter()
            .filter(|f| f.kind == FindingType::MemberUnhealthy)
            .collect();
        assert_eq!(unhealthy.len(), 1);
        assert!(unhealthy[0].message.contains("b"));
    }

    #[test]
    fn oplog_window_boundaries() {
        let mut rs = replset(vec![member("a", 1.0), member("b", 1.0), member("c", 1.0)]);
        rs.oplog_window_hours = 12.0;
        assert!(
            audit_replica_set(&rs)
                .iter()
                .any(|f| f.kind == FindingType::OplogSmall)
        );

        rs.oplog_window_hours = 0.0;
        assert!(
            audit_replica_set(&rs)
                .iter()
                .all(|f| f.kind != FindingType::OplogSmall)
        );

        rs.oplog_window_hours = 24.0;
        assert!(
            audit_replica_set(&rs)
                .iter()
                .all(|f| f.kind != FindingType::OplogSmall)
        );
    }

    #[test]
    fn priority_zero_majority_boundary() {
        // {1, 0, 0}: two of three can never be primary.
        let rs = replset(vec![member("a", 1.0), member("b", 0.0), member("c", 0.0)]);
        assert!(
            audit_replica_set(&rs)
                .iter()
                .any(|f| f.kind == FindingType::PriorityZeroMajority)
        );

        // {1, 1, 0}: majority can still be elected.
        let rs = replset(vec![member("a", 1.0), member("b", 1.0), member("c", 0.0)]);
        assert!(
            audit_replica_set(&rs)
                .iter()
                .all(|f| f.kind != FindingType::PriorityZeroMajority)
        );
    }

    #[test]
    fn hidden_member_advice_only_for_larger_sets() {
        let rs = replset(vec![member("a", 1.0), member("b", 1.0), member("c", 1.0)]);
        assert!(
            audit_replica_set(&rs)
                .iter()
                .all(|f| f.kind != FindingType::NoHiddenMember)
        );

        let mut large = replset(vec![
            member("a", 1.0),
            member("b", 1.0),
            member("c", 1.0),
            member("d", 1.0),
            member("e", 1.0),
        ]);
        assert!(
            audit_replica_set(&large)
                .iter()
                .any(|f| f.kind == FindingType::NoHiddenMember)
        );

        large.members[4].hidden = true;
        assert!(
            audit_replica_set(&large)
                .iter()
                .all(|f| f.kind != FindingType::NoHiddenMember)
        );
    }
}
