//! Plain-text report for terminals.

use std::collections::BTreeSet;
use std::fmt::Write;

use crate::data::{CommitRecord, Report};

use super::truncate_hash;

/// Renders `report` as indented plain text.
pub fn render(report: &Report) -> String {
    let mut out = String::new();

    if report.is_empty() {
        let _ = writeln!(
            out,
            "No commits found introducing \"{}\" ({}).",
            report.search, report.scope
        );
        return out;
    }

    let _ = writeln!(
        out,
        "Commits introducing \"{}\" ({}): {}",
        report.search,
        report.scope,
        report.commits.len()
    );
    for record in &report.commits {
        out.push('\n');
        write_record(&mut out, record);
    }

    let branches: Vec<&str> = all_branches(&report.commits).into_iter().collect();
    if !branches.is_empty() {
        let _ = writeln!(out, "\nBranches involved: {}", branches.join(", "));
    }
    out
}

/// Branch names across a set of records, for the summary line.
fn all_branches(records: &[CommitRecord]) -> BTreeSet<&str> {
    records
        .iter()
        .flat_map(|r| r.branches.iter().map(String::as_str))
        .collect()
}

fn write_record(out: &mut String, record: &CommitRecord) {
    let _ = writeln!(
        out,
        "{}  {}  {}",
        record.date.to_rfc3339(),
        truncate_hash(&record.hash),
        record.author
    );
    let _ = writeln!(out, "    {}", record.subject);

    let branches = if record.branches.is_empty() {
        "(none)".to_string()
    } else {
        record
            .branches
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };
    let _ = writeln!(out, "    branches: {branches}");

    for entry in &record.context {
        let _ = writeln!(out, "    {}: {}", entry.file, entry.line.trim());
    }
}
