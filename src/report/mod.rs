pub mod parser;
pub mod writer;

use serde::{Deserialize, Serialize};

/// Severity label attached to a finding, as reported by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
            Severity::Info => "Info",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Critical => "🔴",
            Severity::High => "🟠",
            Severity::Medium => "🟡",
            Severity::Low => "🔵",
            Severity::Info => "⚪",
        }
    }

    /// Map a model-reported label onto a severity. The model is free text, so
    /// common aliases are accepted.
    pub fn from_label(label: &str) -> Option<Severity> {
        match label.trim().to_ascii_lowercase().as_str() {
            "critical" | "severe" => Some(Severity::Critical),
            "high" | "major" => Some(Severity::High),
            "medium" | "moderate" | "warning" => Some(Severity::Medium),
            "low" | "minor" => Some(Severity::Low),
            "info" | "note" => Some(Severity::Info),
            _ => None,
        }
    }
}

/// One issue extracted from the model's review of a single file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub title: String,
    /// Best-effort line reference, as reported by the model.
    pub line: Option<usize>,
    pub explanation: String,
    pub suggested_fix: Option<String>,
}

/// The review result for one source file. Written once as a markdown report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    /// Source file identifier (path relative to the analyzed root).
    pub source: String,
    pub language: String,
    pub findings: Vec<Finding>,
    /// Model text that matched no extraction heuristic. Never dropped.
    pub unparsed_notes: Option<String>,
    /// Set when the model call failed terminally for this file.
    pub error: Option<String>,
}

impl FileReport {
    pub fn failed(source: String, language: String, error: String) -> Self {
        Self {
            source,
            language,
            findings: Vec::new(),
            unparsed_notes: None,
            error: Some(error),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Aggregate counts for an entire run. Reduced single-threaded after all
/// per-file results are collected.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub files_analyzed: usize,
    pub files_failed: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
}

impl RunSummary {
    pub fn record(&mut self, report: &FileReport) {
        if report.is_failure() {
            self.files_failed += 1;
        } else {
            self.files_analyzed += 1;
        }

        for finding in &report.findings {
            match finding.severity {
                Severity::Critical => self.critical += 1,
                Severity::High => self.high += 1,
                Severity::Medium => self.medium += 1,
                Severity::Low => self.low += 1,
                Severity::Info => self.info += 1,
            }
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
            Severity::Info => self.info,
        }
    }

    pub fn total_findings(&self) -> usize {
        self.critical + self.high + self.medium + self.low + self.info
    }
}
