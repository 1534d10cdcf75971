//! Security audit over the server's startup configuration.
//!
//! ## Rule list:
//! - AUTH_DISABLED: authorization is off
//! - BIND_ALL_INTERFACES: server listens on 0.0.0.0 or ::
//! - TLS_DISABLED: TLS mode empty or disabled
//! - TLS_ALLOW_INVALID_CERTS: certificate validation bypassed
//! - AUDIT_LOG_DISABLED: no audit destination configured
//! - LOCALHOST_EXCEPTION_ACTIVE: localhost auth bypass enabled

use crate::models::{Finding, FindingType, SecurityInfo, Severity};

pub fn audit_security(security: &SecurityInfo) -> Vec<Finding> {
    let mut findings = Vec::new();

    if !security.auth_enabled {
        findings.push(Finding::new(
            FindingType::AuthDisabled,
            Severity::High,
            "authorization is disabled; anyone who can reach the server has full access",
        ));
    }

    for addr in security.bind_ip.split(',') {
        let addr = addr.trim();
        if addr == "0.0.0.0" || addr == "::" {
            findings.push(Finding::new(
                FindingType::BindAllInterfaces,
                Severity::High,
                format!("server binds to all interfaces ({})", addr),
            ));
        }
    }

    let tls = security.tls_mode.trim().to_ascii_lowercase();
    if tls.is_empty() || tls == "disabled" {
        findings.push(Finding::new(
            FindingType::TlsDisabled,
            Severity::High,
            "TLS is disabled; traffic including credentials travels in cleartext",
        ));
    }

    if security.tls_allow_invalid_certs {
        findings.push(Finding::new(
            FindingType::TlsAllowInvalidCerts,
            Severity::Medium,
            "tlsAllowInvalidCertificates is set; certificate validation is bypassed",
        ));
    }

    if !security.audit_log_enabled {
        findings.push(Finding::new(
            FindingType::AuditLogDisabled,
            Severity::Medium,
            "no audit log destination is configured",
        ));
    }

    if security.localhost_auth_bypass {
        findings.push(Finding::new(
            FindingType::LocalhostExceptionActive,
            Severity::Low,
            "the localhost exception is active; local connections can create the first user",
        ));
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hardened() -> SecurityInfo {
        SecurityInfo {
            auth_enabled: true,
            bind_ip: "127.0.0.1,10.0.0.5".into(),
            tls_mode: "requireTLS".into(),
            tls_allow_invalid_certs: false,
            audit_log_enabled: true,
            localhost_auth_bypass: false,
        }
    }

    #[test]
    fn hardened_server_is_clean() {
        assert!(audit_security(&hardened()).is_empty());
    }

    #[test]
    fn auth_disabled_is_high() {
        let mut sec = hardened();
        sec.auth_enabled = false;
        let findings = audit_security(&sec);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingType::AuthDisabled);
        assert_eq!(findings[0].severity, Severity::High);
    }

    #[test]
    fn bind_all_detected_in_list() {
        let mut sec = hardened();
        sec.bind_ip = "127.0.0.1, 0.0.0.0".into();
        let findings = audit_security(&sec);
        assert!(findings.iter().any(|f| f.kind == FindingType::BindAllInterfaces));
    }

    #[test]
    fn ipv6_wildcard_detected() {
        let mut sec = hardened();
        sec.bind_ip = "::".into();
        assert!(
            audit_security(&sec)
                .iter()
                .any(|f| f.kind == FindingType::BindAllInterfaces)
        );
    }

    #[test]
    fn tls_mode_comparison_is_case_insensitive() {
        let mut sec = hardened();
        sec.tls_mode = "Disabled".into();
        assert!(
            audit_security(&sec)
                .iter()
                .any(|f| f.kind == FindingType::TlsDisabled)
        );
    }

    #[test]
    fn empty_tls_mode_counts_as_disabled() {
        let mut sec = hardened();
        sec.tls_mode = String::new();
        assert!(
            audit_security(&sec)
                .iter()
                .any(|f| f.kind == FindingType::TlsDisabled)
        );
    }
}
