//! User audit: server users, Atlas database users, and access-log
//! cross-referencing.
//!
//! ## Rule list:
//! - ADMIN_IN_DATA_DB: admin-grade role granted outside the admin database
//! - DUPLICATE_USER: same username defined in admin and a data database
//! - OVERPRIVILEGED_USER: cluster-wide role on a regular user
//! - MULTIPLE_ADMIN_USERS: more than one distinct cluster administrator
//! - ATLAS_USER_NO_SCOPE: Atlas user with roles but no cluster scope
//! - FAILED_AUTH_ONLY / INACTIVE_PRIVILEGED_USER / INACTIVE_USER: access-log
//!   correlation over the trailing log window

use std::collections::BTreeMap;

use crate::models::{AccessLogEntry, DatabaseUser, Finding, FindingType, Severity, UserInfo};

/// Roles that administer databases; suspicious outside `admin`.
const DB_ADMIN_ROLES: &[&str] = &["dbAdmin", "dbOwner", "root", "userAdmin"];

/// Roles that grant cluster-wide control.
const CLUSTER_ADMIN_ROLES: &[&str] =
    &["root", "clusterAdmin", "userAdminAnyDatabase", "dbAdminAnyDatabase"];

/// Roles that make an inactive account a serious risk.
const PRIVILEGED_ROLES: &[&str] = &[
    "root",
    "clusterAdmin",
    "userAdminAnyDatabase",
    "dbAdminAnyDatabase",
    "readWriteAnyDatabase",
];

/// Audit server users from `usersInfo`.
pub fn audit_users(users: &[UserInfo]) -> Vec<Finding> {
    let mut findings = Vec::new();

    for user in users {
        if user.database != "admin" && user.has_any_role(DB_ADMIN_ROLES) {
            findings.push(
                Finding::new(
                    FindingType::AdminInDataDb,
                    Severity::High,
                    format!(
                        "user '{}' holds an admin-grade role in data database '{}'",
                        user.username, user.database
                    ),
                )
                .database(&user.database),
            );
        }
        if user.has_any_role(CLUSTER_ADMIN_ROLES) {
            findings.push(
                Finding::new(
                    FindingType::OverprivilegedUser,
                    Severity::Medium,
                    format!(
                        "user '{}' in '{}' holds a cluster-wide role",
                        user.username, user.database
                    ),
                )
                .database(&user.database),
            );
        }
    }

    // Usernames defined both in admin and in a data database.
    let mut databases_by_user: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for user in users {
        databases_by_user
            .entry(user.username.as_str())
            .or_default()
            .push(user.database.as_str());
    }
    for (username, databases) in &databases_by_user {
        let in_admin = databases.iter().any(|d| *d == "admin");
        let data_dbs: Vec<&&str> = databases.iter().filter(|d| **d != "admin").collect();
        if in_admin && !data_dbs.is_empty() {
            findings.push(Finding::new(
                FindingType::DuplicateUser,
                Severity::Medium,
                format!(
                    "username '{}' is defined in admin and also in: {}",
                    username,
                    data_dbs
                        .iter()
                        .map(|d| d.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            ));
        }
    }

    let mut admins: Vec<&str> = Vec::new();
    for user in users {
        if user.has_any_role(CLUSTER_ADMIN_ROLES) && !admins.contains(&user.username.as_str()) {
            admins.push(user.username.as_str());
        }
    }
    if admins.len() > 1 {
        admins.sort_unstable();
        findings.push(Finding::new(
            FindingType::MultipleAdminUsers,
            Severity::Medium,
            format!(
                "{} users hold cluster-admin roles: {}",
                admins.len(),
                admins.join(", ")
            ),
        ));
    }

    findings
}

/// Audit Atlas project database users.
pub fn audit_atlas_users(users: &[DatabaseUser]) -> Vec<Finding> {
    let mut findings = Vec::new();

    for user in users {
        if !user.roles.is_empty() && user.scopes.is_empty() {
            findings.push(
                Finding::new(
                    FindingType::AtlasUserNoScope,
                    Severity::Info,
                    format!(
                        "Atlas user '{}' is not scoped to any cluster and can reach every cluster in the project",
                        user.username
                    ),
                )
                .database(&user.database_name),
            );
        }
    }

    findings
}

/// Cross-reference Atlas users with the access logs of the trailing log
/// window. A successful authentication clears the user; failures-only and
/// silence are flagged by privilege level.
pub fn detect_inactive_users(users: &[DatabaseUser], logs: &[AccessLogEntry]) -> Vec<Finding> {
    let mut findings = Vec::new();

    for user in users {
        let mut seen = false;
        let mut succeeded = false;
        for entry in logs {
            if entry.username == user.username {
                seen = true;
                if entry.auth_result {
                    succeeded = true;
                    break;
                }
            }
        }

        if succeeded {
            continue;
        }

        if seen {
            findings.push(
                Finding::new(
                    FindingType::FailedAuthOnly,
                    Severity::Medium,
                    format!(
                        "user '{}' only appears in the access log with failed authentications",
                        user.username
                    ),
                )
                .database(&user.database_name),
            );
        } else if user.has_any_role(PRIVILEGED_ROLES) {
            findings.push(
                Finding::new(
                    FindingType::InactivePrivilegedUser,
                    Severity::High,
                    format!(
                        "privileged user '{}' has not authenticated in the log window; dormant credentials with broad access",
                        user.username
                    ),
                )
                .database(&user.database_name),
            );
        } else {
            findings.push(
                Finding::new(
                    FindingType::InactiveUser,
                    Severity::Medium,
                    format!("user '{}' has not authenticated in the log window", user.username),
                )
                .database(&user.database_name),
            );
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AtlasRole, AtlasScope, UserRole};

    fn user(username: &str, database: &str, roles: &[&str]) -> UserInfo {
        UserInfo {
            username: username.into(),
            database: database.into(),
            roles: roles
                .iter()
                .map(|r| UserRole { role: (*r).into(), database: database.into() })
                .collect(),
        }
    }

    fn atlas_user(username: &str, roles: &[&str], scoped: bool) -> DatabaseUser {
        DatabaseUser {
            username: username.into(),
            database_name: "admin".into(),
            roles: roles
                .iter()
                .map(|r| AtlasRole { role_name: (*r).into(), database_name: "admin".into() })
                .collect(),
            scopes: if scoped {
                vec![AtlasScope { name: "cluster0".into(), scope_type: "CLUSTER".into() }]
            } else {
                vec![]
            },
        }
    }

    fn log(username: &str, ok: bool) -> AccessLogEntry {
        AccessLogEntry { username: username.into(), auth_result: ok, ..Default::default() }
    }

    #[test]
    fn admin_role_in_data_database() {
        let findings = audit_users(&[user("svc", "app", &["dbOwner"])]);
        assert!(findings.iter().any(|f| f.kind == FindingType::AdminInDataDb));
    }

    #[test]
    fn duplicate_user_across_admin_and_data() {
        let findings = audit_users(&[
            user("alice", "admin", &["read"]),
            user("alice", "app", &["readWrite"]),
        ]);
        assert!(findings.iter().any(|f| f.kind == FindingType::DuplicateUser));
    }

    #[test]
    fn same_db_twice_is_not_duplicate() {
        let findings = audit_users(&[
            user("alice", "app", &["read"]),
            user("bob", "app", &["read"]),
        ]);
        assert!(findings.iter().all(|f| f.kind != FindingType::DuplicateUser));
    }

    #[test]
    fn multiple_cluster_admins() {
        let findings = audit_users(&[
            user("root1", "admin", &["root"]),
            user("root2", "admin", &["clusterAdmin"]),
        ]);
        let multi: Vec<&Finding> = findings
            .iter()
            .filter(|f| f.kind == FindingType::MultipleAdminUsers)
            .collect();
        assert_eq!(multi.len(), 1);
        assert!(multi[0].message.contains("root1, root2"));
    }

    #[test]
    fn single_admin_is_fine() {
        let findings = audit_users(&[user("root1", "admin", &["root"])]);
        assert!(findings.iter().all(|f| f.kind != FindingType::MultipleAdminUsers));
    }

    #[test]
    fn atlas_user_without_scope() {
        let findings = audit_atlas_users(&[
            atlas_user("open", &["readWrite"], false),
            atlas_user("scoped", &["readWrite"], true),
            atlas_user("roleless", &[], false),
        ]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingType::AtlasUserNoScope);
        assert!(findings[0].message.contains("open"));
    }

    #[test]
    fn successful_auth_clears_user() {
        let findings = detect_inactive_users(
            &[atlas_user("alice", &["readWrite"], true)],
            &[log("alice", false), log("alice", true)],
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn failed_auth_only() {
        let findings = detect_inactive_users(
            &[atlas_user("alice", &["readWrite"], true)],
            &[log("alice", false)],
        );
        assert_eq!(findings[0].kind, FindingType::FailedAuthOnly);
        assert_eq!(findings[0].severity, Severity::Medium);
    }

    #[test]
    fn silent_privileged_user_is_high() {
        let findings =
            detect_inactive_users(&[atlas_user("dba", &["readWriteAnyDatabase"], true)], &[]);
        assert_eq!(findings[0].kind, FindingType::InactivePrivilegedUser);
        assert_eq!(findings[0].severity, Severity::High);
    }

    #[test]
    fn silent_regular_user_is_medium() {
        let findings = detect_inactive_users(&[atlas_user("app", &["readWrite"], true)], &[]);
        assert_eq!(findings[0].kind, FindingType::InactiveUser);
        assert_eq!(findings[0].severity, Severity::Medium);
    }
}
