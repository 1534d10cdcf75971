//! mongospectre library
//!
//! Audits a MongoDB deployment (self-managed or Atlas) and the source
//! repository that consumes it, emitting typed, severity-tagged findings.
//!
//! The crate splits into an analyzer core and a collector ring:
//! - [`analyzer`] is pure: snapshot in, findings out. Detection rules,
//!   baseline diffing, ignore filtering, and cluster comparison live here.
//! - [`services`] owns all I/O: the Mongo inspector, the Atlas Admin API
//!   client, the code scanner, and report rendering.
//! - [`models`] is the shared data model, with [`models::Finding`] at the
//!   center.

pub mod analyzer;
pub mod config;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use analyzer::{AuditOutcome, AuditSnapshot, IgnoreList, compare_clusters, run_audit};
pub use config::Config;
pub use models::{Finding, FindingType, Severity};
pub use services::{AtlasClient, CodeScanner, MongoInspector};
pub use utils::{SpectreError, SpectreResult};
