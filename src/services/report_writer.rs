//! Report rendering: terminal text, Markdown, and the JSON blob that
//! doubles as the next run's baseline.

use std::collections::BTreeMap;

use crate::analyzer::AuditOutcome;
use crate::models::{BaselineStatus, CompareFinding, Finding, Report, Severity};
use crate::utils::SpectreResult;

pub fn to_json(report: &Report) -> SpectreResult<String> {
    Ok(serde_json::to_string_pretty(report).map_err(|e| {
        crate::utils::SpectreError::Config(format!("cannot serialize report: {}", e))
    })?)
}

/// Plain-text rendering, grouped by severity, highest first.
pub fn render_text(outcome: &AuditOutcome) -> String {
    let mut out = String::new();

    if outcome.findings.is_empty() {
        out.push_str("no findings\n");
    }

    for severity in [Severity::High, Severity::Medium, Severity::Low, Severity::Info] {
        let group: Vec<&Finding> = outcome
            .findings
            .iter()
            .filter(|f| f.severity == severity)
            .collect();
        if group.is_empty() {
            continue;
        }
        out.push_str(&format!("{} ({})\n", severity.as_str().to_uppercase(), group.len()));
        for finding in group {
            out.push_str(&format!(
                "  [{}] {}{}\n",
                finding.kind,
                location_prefix(finding),
                finding.message
            ));
        }
        out.push('\n');
    }

    if let Some(diff) = &outcome.baseline {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for entry in diff {
            *counts.entry(entry.status.as_str()).or_insert(0) += 1;
        }
        out.push_str(&format!(
            "baseline: {} new, {} unchanged, {} resolved\n",
            counts.get("new").copied().unwrap_or(0),
            counts.get("unchanged").copied().unwrap_or(0),
            counts.get("resolved").copied().unwrap_or(0)
        ));
        for entry in diff.iter().filter(|d| d.status == BaselineStatus::Resolved) {
            out.push_str(&format!(
                "  resolved: [{}] {}\n",
                entry.finding.kind, entry.finding.message
            ));
        }
    }

    if outcome.suppressed > 0 {
        out.push_str(&format!("{} finding(s) suppressed by ignore rules\n", outcome.suppressed));
    }

    out
}

/// Markdown rendering: a summary header and one table of findings sorted
/// by severity (descending), then input order.
pub fn render_markdown(outcome: &AuditOutcome) -> String {
    let mut out = String::new();
    out.push_str("# mongospectre report\n\n");

    let mut counts: BTreeMap<Severity, usize> = BTreeMap::new();
    for finding in &outcome.findings {
        *counts.entry(finding.severity).or_insert(0) += 1;
    }
    out.push_str(&format!(
        "**{} finding(s)**: high {}, medium {}, low {}, info {}",
        outcome.findings.len(),
        counts.get(&Severity::High).copied().unwrap_or(0),
        counts.get(&Severity::Medium).copied().unwrap_or(0),
        counts.get(&Severity::Low).copied().unwrap_or(0),
        counts.get(&Severity::Info).copied().unwrap_or(0),
    ));
    if outcome.suppressed > 0 {
        out.push_str(&format!(" ({} suppressed)", outcome.suppressed));
    }
    out.push_str("\n\n");

    if outcome.findings.is_empty() {
        out.push_str("No findings.\n");
        return out;
    }

    out.push_str("| severity | type | location | message |\n");
    out.push_str("|---|---|---|---|\n");
    let mut sorted: Vec<&Finding> = outcome.findings.iter().collect();
    sorted.sort_by(|a, b| b.severity.cmp(&a.severity));
    for finding in sorted {
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            finding.severity,
            finding.kind,
            location(finding),
            finding.message.replace('|', "\\|")
        ));
    }

    if let Some(diff) = &outcome.baseline {
        out.push_str("\n## Baseline\n\n| status | type | location |\n|---|---|---|\n");
        for entry in diff {
            out.push_str(&format!(
                "| {} | {} | {} |\n",
                entry.status,
                entry.finding.kind,
                location(&entry.finding)
            ));
        }
    }

    out
}

/// Plain-text rendering of a cluster comparison.
pub fn render_compare(findings: &[CompareFinding]) -> String {
    if findings.is_empty() {
        return "clusters match\n".to_string();
    }
    let mut out = String::new();
    for finding in findings {
        out.push_str(&format!(
            "[{}] {} (source: {}, target: {})\n",
            finding.kind, finding.message, finding.source_detail, finding.target_detail
        ));
    }
    out
}

fn location(finding: &Finding) -> String {
    let mut parts = Vec::new();
    if !finding.database.is_empty() {
        parts.push(finding.database.clone());
    }
    if !finding.collection.is_empty() {
        parts.push(finding.collection.clone());
    }
    if !finding.index.is_empty() {
        parts.push(finding.index.clone());
    }
    if parts.is_empty() { "-".to_string() } else { parts.join(".") }
}

fn location_prefix(finding: &Finding) -> String {
    let loc = location(finding);
    if loc == "-" { String::new() } else { format!("{}: ", loc) }
}
