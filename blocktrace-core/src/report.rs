//! Reporting and output generation
//!
//! Global invariants enforced:
//! - Deterministic output ordering
//! - Byte-for-byte identical output across runs

use crate::instrument::{FileOutcome, FileStatus};
use serde::Serialize;

/// Totals over all files of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunTotals {
    pub files: usize,
    pub instrumented: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub skipped: usize,
    pub functions: usize,
    pub blocks: usize,
    pub insertions: usize,
}

/// Everything a run did
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub dry_run: bool,
    pub files: Vec<FileOutcome>,
    pub totals: RunTotals,
}

impl RunReport {
    /// Build a report; `skipped` counts sources filtered out by configuration.
    pub fn new(mut files: Vec<FileOutcome>, skipped: usize, dry_run: bool) -> Self {
        files.sort_by(|a, b| a.file.cmp(&b.file));

        let mut totals = RunTotals {
            files: files.len(),
            skipped,
            ..Default::default()
        };
        for file in &files {
            match file.status {
                FileStatus::Instrumented => totals.instrumented += 1,
                FileStatus::Unchanged => totals.unchanged += 1,
                FileStatus::Failed => totals.failed += 1,
            }
            totals.functions += file.functions.len();
            totals.blocks += file.blocks;
            totals.insertions += file.insertions;
        }

        RunReport {
            dry_run,
            files,
            totals,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.totals.failed > 0
    }
}

/// Render a report as text output
pub fn render_text(report: &RunReport) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{:<13} {:<40} {:>9} {:>6} {:>10}\n",
        "STATUS", "FILE", "FUNCTIONS", "BLOCKS", "INSERTIONS"
    ));

    for file in &report.files {
        output.push_str(&format!(
            "{:<13} {:<40} {:>9} {:>6} {:>10}\n",
            file.status.as_str(),
            truncate_or_pad(&file.file.display().to_string(), 40),
            file.functions.len(),
            file.blocks,
            file.insertions,
        ));
        if let Some(ref error) = file.error {
            output.push_str(&format!("              error: {}\n", error));
        }
    }

    let t = &report.totals;
    output.push_str(&format!(
        "\n{} files: {} instrumented, {} unchanged, {} failed, {} skipped; {} insertions in {} blocks of {} functions{}\n",
        t.files,
        t.instrumented,
        t.unchanged,
        t.failed,
        t.skipped,
        t.insertions,
        t.blocks,
        t.functions,
        if report.dry_run { " (dry run)" } else { "" },
    ));

    output
}

/// Render a report as JSON output
pub fn render_json(report: &RunReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
}

/// Truncate or pad string to fixed width
fn truncate_or_pad(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let keep: String = s
            .chars()
            .rev()
            .take(width.saturating_sub(3))
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("...{}", keep)
    } else {
        format!("{:<width$}", s, width = width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::Identifier;
    use crate::instrument::FunctionRecord;
    use std::path::{Path, PathBuf};

    fn outcome(file: &str, status: FileStatus, insertions: usize) -> FileOutcome {
        FileOutcome {
            file: PathBuf::from(file),
            language: Some("C++".to_string()),
            status,
            functions: vec![FunctionRecord {
                identifier: Identifier::new("f()"),
                line: 1,
                blocks: insertions.max(1),
                insertions,
            }],
            blocks: insertions.max(1),
            insertions,
            error: None,
        }
    }

    fn sample() -> RunReport {
        RunReport::new(
            vec![
                outcome("src/z.cpp", FileStatus::Unchanged, 0),
                outcome("src/a.cpp", FileStatus::Instrumented, 3),
                FileOutcome::failed(Path::new("src/m.cpp"), "compile command not found".to_string()),
            ],
            2,
            false,
        )
    }

    #[test]
    fn test_totals_and_ordering() {
        let report = sample();
        let files: Vec<String> = report
            .files
            .iter()
            .map(|f| f.file.display().to_string())
            .collect();
        assert_eq!(files, ["src/a.cpp", "src/m.cpp", "src/z.cpp"]);
        assert_eq!(
            report.totals,
            RunTotals {
                files: 3,
                instrumented: 1,
                unchanged: 1,
                failed: 1,
                skipped: 2,
                functions: 2,
                blocks: 4,
                insertions: 3,
            }
        );
        assert!(report.has_failures());
    }

    #[test]
    fn test_render_text() {
        let text = render_text(&sample());
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("STATUS"));
        assert!(lines[1].starts_with("instrumented  src/a.cpp"));
        assert!(lines[2].starts_with("failed        src/m.cpp"));
        assert_eq!(lines[3], "              error: compile command not found");
        assert!(text.ends_with(
            "3 files: 1 instrumented, 1 unchanged, 1 failed, 2 skipped; 3 insertions in 4 blocks of 2 functions\n"
        ));
    }

    #[test]
    fn test_render_json() {
        let json = render_json(&sample());
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["totals"]["insertions"], 3);
        assert_eq!(value["files"][0]["status"], "instrumented");
        assert_eq!(value["files"][0]["functions"][0]["identifier"], "f()");
        assert_eq!(value["files"][1]["error"], "compile command not found");
        assert!(value["files"][0].get("error").is_none());
    }

    #[test]
    fn test_truncate_or_pad() {
        assert_eq!(truncate_or_pad("abc", 5), "abc  ");
        assert_eq!(truncate_or_pad("abcdefgh", 6), "...fgh");
    }
}
