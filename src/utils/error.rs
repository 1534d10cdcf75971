//! Error types shared by collectors and the CLI edge.
//!
//! Detectors never produce errors; everything here belongs to the outer
//! ring (driver calls, Atlas API, file I/O, configuration).

use thiserror::Error;

/// Errors surfaced by mongospectre collectors and I/O.
#[derive(Debug, Error)]
pub enum SpectreError {
    #[error("cannot connect to MongoDB: {detail}{hint}")]
    Connection { detail: String, hint: String },

    #[error("MongoDB command failed: {0}")]
    Driver(#[from] mongodb::error::Error),

    #[error("Atlas API request failed ({status}): {detail}")]
    AtlasApi { status: u16, detail: String },

    #[error("Atlas API transport error: {0}")]
    AtlasTransport(#[from] reqwest::Error),

    #[error("cannot load baseline '{path}': {detail}")]
    Baseline { path: String, detail: String },

    #[error("cannot scan source tree '{path}': {detail}")]
    Scan { path: String, detail: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SpectreError {
    /// Wrap a driver connection failure with an actionable hint derived
    /// from the error text.
    pub fn connection(err: &mongodb::error::Error) -> Self {
        let detail = err.to_string();
        let lower = detail.to_ascii_lowercase();
        let hint = if lower.contains("authentication") || lower.contains("auth") {
            "; check the username/password and authSource in the URI"
        } else if lower.contains("timed out") || lower.contains("timeout") {
            "; check network reachability, firewall rules, and the --timeout value"
        } else if lower.contains("tls") || lower.contains("ssl") || lower.contains("certificate") {
            "; check the TLS settings; Atlas requires tls=true (implied by mongodb+srv)"
        } else if lower.contains("dns") || lower.contains("resolve") {
            "; check the hostname; SRV URIs need working DNS"
        } else {
            ""
        };
        Self::Connection { detail, hint: hint.to_string() }
    }
}

/// Result type alias for collector operations.
pub type SpectreResult<T> = Result<T, SpectreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_error_carries_path() {
        let err = SpectreError::Baseline { path: "old.json".into(), detail: "gone".into() };
        assert!(err.to_string().contains("old.json"));
    }

    #[test]
    fn config_error_displays_reason() {
        let err = SpectreError::Config("missing --uri".into());
        assert!(err.to_string().contains("missing --uri"));
    }
}
