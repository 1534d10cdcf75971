//! Baseline handling: load a prior report and classify the current finding
//! stream as new, unchanged or resolved.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::models::{BaselineFinding, BaselineStatus, Finding, Report};
use crate::utils::error::{SpectreError, SpectreResult};

/// Load a baseline report from disk. A missing file and malformed JSON are
/// both errors; missing fields inside valid JSON are tolerated (the model
/// defaults them), which degrades growth analysis instead of failing it.
pub fn load_baseline(path: &Path) -> SpectreResult<Report> {
    let content = fs::read_to_string(path).map_err(|source| SpectreError::Baseline {
        path: path.display().to_string(),
        detail: source.to_string(),
    })?;
    let report: Report =
        serde_json::from_str(&content).map_err(|source| SpectreError::Baseline {
            path: path.display().to_string(),
            detail: format!("invalid report JSON: {}", source),
        })?;
    Ok(report)
}

/// Diff the current stream against the baseline. Every current finding is
/// emitted first (input order) tagged `unchanged` when its identity exists
/// in the baseline and `new` otherwise; baseline findings whose identity
/// vanished follow (baseline order) tagged `resolved`.
pub fn diff_findings(current: &[Finding], baseline: &[Finding]) -> Vec<BaselineFinding> {
    let baseline_keys: HashSet<String> = baseline.iter().map(Finding::identity).collect();
    let current_keys: HashSet<String> = current.iter().map(Finding::identity).collect();

    let mut out = Vec::with_capacity(current.len());
    for finding in current {
        let status = if baseline_keys.contains(&finding.identity()) {
            BaselineStatus::Unchanged
        } else {
            BaselineStatus::New
        };
        out.push(BaselineFinding { finding: finding.clone(), status });
    }
    for finding in baseline {
        if !current_keys.contains(&finding.identity()) {
            out.push(BaselineFinding {
                finding: finding.clone(),
                status: BaselineStatus::Resolved,
            });
        }
    }
    out
}
