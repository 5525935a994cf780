use chrono::Utc;
use sha2::{Digest, Sha256};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use crate::report::{FileReport, RunSummary, Severity};

pub const SUMMARY_FILE: &str = "SUMMARY.md";

/// Deterministic report file name derived from the source file's relative
/// path. A short digest keeps `a_b.py` and `a/b.py` from colliding.
pub fn report_file_name(source: &str) -> String {
    let sanitized: String = source
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    let digest = format!("{:x}", hasher.finalize());

    format!("{}-{}.md", sanitized, &digest[..8])
}

/// Write one per-file report. Goes through a temp file plus rename so a
/// cancelled run never leaves a torn report on disk.
pub fn write_file_report(
    dir: &Path,
    report: &FileReport,
) -> Result<PathBuf, Box<dyn Error + Send + Sync>> {
    let name = report_file_name(&report.source);
    let target = dir.join(&name);
    let tmp = dir.join(format!(".{}.tmp", name));

    fs::write(&tmp, render_file_report(report))?;
    fs::rename(&tmp, &target)?;

    Ok(target)
}

pub fn render_file_report(report: &FileReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("# Security Analysis — `{}`\n\n", report.source));
    out.push_str(&format!("_Language: {}_\n\n", report.language));

    if let Some(error) = &report.error {
        out.push_str("## Analysis failed\n\n");
        out.push_str(&format!("⚠️ The model call for this file did not complete: {}\n", error));
        return out;
    }

    if report.findings.is_empty() {
        out.push_str("## Findings\n\nNo findings were extracted for this file.\n");
    } else {
        out.push_str("## Findings\n");
        for finding in &report.findings {
            out.push_str(&format!(
                "\n### {} {} — {}\n\n",
                finding.severity.icon(),
                finding.severity.label(),
                finding.title
            ));

            if let Some(line) = finding.line {
                out.push_str(&format!("- **Line:** {}\n", line));
            }

            if !finding.explanation.is_empty() {
                out.push_str(&format!("\n{}\n", finding.explanation));
            }

            if let Some(fix) = &finding.suggested_fix {
                out.push_str(&format!("\n**Suggested fix:** {}\n", fix));
            }
        }
    }

    if let Some(notes) = &report.unparsed_notes {
        out.push_str("\n## Unparsed notes\n\n");
        out.push_str(notes);
        out.push('\n');
    }

    out
}

/// Write the aggregate summary. Always written last, once per run.
pub fn write_summary(
    dir: &Path,
    summary: &RunSummary,
    reports: &[FileReport],
) -> Result<PathBuf, Box<dyn Error + Send + Sync>> {
    let target = dir.join(SUMMARY_FILE);
    let tmp = dir.join(format!(".{}.tmp", SUMMARY_FILE));

    fs::write(&tmp, render_summary(summary, reports))?;
    fs::rename(&tmp, &target)?;

    Ok(target)
}

fn render_summary(summary: &RunSummary, reports: &[FileReport]) -> String {
    let mut out = String::new();

    out.push_str("# Sentinel Analysis Summary\n\n");
    out.push_str(&format!(
        "_Generated: {} UTC_\n\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S")
    ));

    out.push_str(&format!("- Files analyzed: {}\n", summary.files_analyzed));
    out.push_str(&format!("- Files failed: {}\n", summary.files_failed));
    out.push_str(&format!("- Total findings: {}\n\n", summary.total_findings()));

    out.push_str("## Findings by severity\n\n");
    out.push_str("| Severity | Count |\n|---|---|\n");
    for severity in Severity::ALL {
        out.push_str(&format!(
            "| {} {} | {} |\n",
            severity.icon(),
            severity.label(),
            summary.count(severity)
        ));
    }

    out.push_str("\n## Reports\n\n");
    for report in reports {
        if report.is_failure() {
            out.push_str(&format!("- ⚠️ `{}` — analysis failed\n", report.source));
        } else {
            out.push_str(&format!(
                "- `{}` — {} finding(s) ([report]({}))\n",
                report.source,
                report.findings.len(),
                report_file_name(&report.source)
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Finding;

    fn sample_report() -> FileReport {
        FileReport {
            source: "src/main.py".to_string(),
            language: "Python".to_string(),
            findings: vec![Finding {
                severity: Severity::Critical,
                title: "unsafe eval usage".to_string(),
                line: Some(7),
                explanation: "eval() on user input".to_string(),
                suggested_fix: Some("use ast.literal_eval".to_string()),
            }],
            unparsed_notes: Some("general remarks".to_string()),
            error: None,
        }
    }

    #[test]
    fn report_names_are_deterministic_and_collision_free() {
        assert_eq!(report_file_name("a/b.py"), report_file_name("a/b.py"));
        assert_ne!(report_file_name("a/b.py"), report_file_name("a_b.py"));
        assert!(report_file_name("src/main.py").starts_with("src_main.py-"));
    }

    #[test]
    fn rendered_report_carries_findings_and_notes() {
        let text = render_file_report(&sample_report());

        assert!(text.contains("`src/main.py`"));
        assert!(text.contains("Critical — unsafe eval usage"));
        assert!(text.contains("**Line:** 7"));
        assert!(text.contains("use ast.literal_eval"));
        assert!(text.contains("## Unparsed notes"));
        assert!(text.contains("general remarks"));
    }

    #[test]
    fn failed_report_renders_failure_section() {
        let report = FileReport::failed(
            "a.py".to_string(),
            "Python".to_string(),
            "timed out".to_string(),
        );
        let text = render_file_report(&report);

        assert!(text.contains("## Analysis failed"));
        assert!(text.contains("timed out"));
    }

    #[test]
    fn written_report_lands_at_deterministic_path() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample_report();

        let path = write_file_report(dir.path(), &report).unwrap();

        assert!(path.exists());
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            report_file_name(&report.source)
        );
        // No temp file left behind.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
