//! Report rendering.
//!
//! Renders the merged analysis report as JSON (wire-compatible with the
//! HTTP endpoint) or as a human-readable Markdown document.

use crate::models::{AnalysisReport, ReportMetadata, SpecialtyFindings};
use anyhow::{Context, Result};

/// Serialize the report as pretty-printed JSON.
pub fn generate_json_report(report: &AnalysisReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize analysis report")
}

/// Render the report as a Markdown document.
pub fn generate_markdown_report(report: &AnalysisReport, metadata: &ReportMetadata) -> String {
    let mut output = String::new();

    output.push_str("# Health Analysis Report\n\n");
    output.push_str(&generate_metadata_section(metadata));
    output.push_str(&generate_summary_section(&report.summary));

    for (specialty, findings) in &report.per_specialty {
        output.push_str(&generate_specialty_section(specialty, findings));
    }

    output.push_str(&generate_footer());
    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Model Used:** `{}`\n", metadata.model_used));
    section.push_str(&format!(
        "- **Categories Analyzed:** {}\n",
        metadata.categories_analyzed
    ));
    section.push_str(&format!(
        "- **Analysis Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_summary_section(summary: &str) -> String {
    format!("## Summary\n\n{}\n\n", summary)
}

fn generate_specialty_section(specialty: &str, findings: &SpecialtyFindings) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", specialty));

    if findings.statistics.is_empty() {
        section.push_str("_No metric data available._\n\n");
    } else {
        section.push_str("| Metric | Average | Min | Max | Total |\n");
        section.push_str("|--------|---------|-----|-----|-------|\n");
        for (metric, stats) in &findings.statistics {
            section.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                metric, stats.average, stats.min, stats.max, stats.total
            ));
        }
        section.push('\n');
    }

    section.push_str("**Comments:**\n\n");
    for comment in &findings.comments {
        section.push_str(&format!("- {}\n", comment));
    }
    section.push('\n');

    section
}

fn generate_footer() -> String {
    format!(
        "---\n\n_Generated by VitalSwarm v{}_\n",
        env!("CARGO_PKG_VERSION")
    )
}
