use std::fs;
use std::path::Path;
use std::time::Duration;

use tracing::info;

use crate::error::Error;
use crate::model::{DeletionReport, ScanReport};
use crate::timer::format_elapsed;

const RULE_WIDTH: usize = 80;

/// Run-level facts printed at the top of the summary.
#[derive(Debug, Clone)]
pub struct Overview {
    pub account: String,
    pub database: String,
    pub document_count: u64,
    pub deletion_mode: bool,
    pub threshold: usize,
    pub generated_at: String,
    pub elapsed: Duration,
}

/// Render the human-readable summary. The deletion block appears only when
/// the deletion phase ran.
pub fn summarize(
    overview: &Overview,
    scan: &ScanReport,
    deletion: Option<&DeletionReport>,
) -> String {
    let mut lines = Vec::new();

    section(&mut lines, "Overview");
    field(&mut lines, "Cloudant Account", &overview.account);
    field(&mut lines, "Cloudant Database", &overview.database);
    field(&mut lines, "Total Documents", overview.document_count);
    field(&mut lines, "Deletion Mode", overview.deletion_mode);
    field(&mut lines, "Revision Threshold", overview.threshold);
    field(&mut lines, "Generated", &overview.generated_at);
    field(&mut lines, "Elapsed Time", format_elapsed(overview.elapsed));

    section(&mut lines, "Scan Details");
    field(&mut lines, "Total Conflicted Documents", scan.total_conflicted_documents);
    field(&mut lines, "Total Conflicted Revisions", scan.total_conflicted_revisions);
    field(&mut lines, "Total Invalid Rows", scan.total_invalid_rows);
    if overview.deletion_mode {
        field(&mut lines, "Total Omitted Documents", scan.total_omitted_documents);
    }
    field(&mut lines, "Elapsed Time", format_elapsed(scan.elapsed));

    if let Some(deletion) = deletion {
        section(&mut lines, "Deletion Details");
        field(&mut lines, "Total Conflicted Documents", deletion.total_conflicted_documents);
        field(&mut lines, "Total Resolved Documents", deletion.total_resolved_documents);
        field(&mut lines, "Total Conflicted Revisions", deletion.total_conflicted_revisions);
        field(&mut lines, "Total Deleted Revisions", deletion.total_deleted_revisions);
        field(&mut lines, "Elapsed Time", format_elapsed(deletion.elapsed));
    }

    lines.push(String::new());
    lines.join("\n")
}

fn section(lines: &mut Vec<String>, title: &str) {
    let rule = "=".repeat(RULE_WIDTH);
    lines.push(String::new());
    lines.push(rule.clone());
    lines.push(title.to_string());
    lines.push(rule);
    lines.push(String::new());
}

fn field(lines: &mut Vec<String>, label: &str, value: impl std::fmt::Display) {
    lines.push(format!("- {:<36}{}", format!("{}:", label), value));
}

pub fn write_summary(path: &Path, content: &str) -> Result<(), Error> {
    info!("Creating text file: {}...", path.display());
    fs::write(path, content)?;
    info!("Successfully created text file: {}.", path.display());
    Ok(())
}
