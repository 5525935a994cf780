use once_cell::sync::Lazy;
use regex::Regex;

use crate::report::{Finding, Severity};

// The model output is natural language, not a grammar. These heuristics pull
// out severity-tagged bullet items; anything that matches nothing falls
// through to the unparsed-notes buffer so no information is lost.

static SEVERITY_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?:[-*•]\s*)?(?:#{1,4}\s*)?(?:\*\*|__)?(critical|severe|high|major|medium|moderate|warning|low|minor|info|note)(?:\*\*|__)?\s*[:\-–—]\s*(.+)$",
    )
    .unwrap()
});

static FIX_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?:[-*•]\s*)?(?:\*\*|__)?(?:suggested\s+fix|fix|suggestion|recommendation)(?:\*\*|__)?\s*[:\-–—]\s*(.+)$",
    )
    .unwrap()
});

static LINE_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\blines?\s+(\d+)").unwrap());

/// Best-effort extraction of findings from raw model text. Returns the
/// findings plus any leftover text that matched no heuristic.
pub fn parse_findings(raw: &str) -> (Vec<Finding>, Option<String>) {
    let mut findings: Vec<Finding> = Vec::new();
    let mut unparsed: Vec<&str> = Vec::new();

    for line in raw.lines() {
        if let Some(caps) = SEVERITY_LINE.captures(line) {
            let severity = match Severity::from_label(&caps[1]) {
                Some(s) => s,
                None => {
                    unparsed.push(line);
                    continue;
                }
            };

            let title = strip_emphasis(caps[2].trim());
            findings.push(Finding {
                severity,
                line: extract_line_ref(line),
                title,
                explanation: String::new(),
                suggested_fix: None,
            });
            continue;
        }

        if let Some(caps) = FIX_LINE.captures(line) {
            if let Some(current) = findings.last_mut() {
                let fix = strip_emphasis(caps[1].trim());
                match &mut current.suggested_fix {
                    Some(existing) => {
                        existing.push(' ');
                        existing.push_str(&fix);
                    }
                    None => current.suggested_fix = Some(fix),
                }
                continue;
            }
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match findings.last_mut() {
            Some(current) => {
                if current.line.is_none() {
                    current.line = extract_line_ref(trimmed);
                }
                if !current.explanation.is_empty() {
                    current.explanation.push('\n');
                }
                current.explanation.push_str(trimmed);
            }
            None => unparsed.push(line),
        }
    }

    let notes = if unparsed.is_empty() {
        None
    } else {
        Some(unparsed.join("\n").trim().to_string())
    };

    (findings, notes)
}

fn extract_line_ref(text: &str) -> Option<usize> {
    LINE_REF
        .captures(text)
        .and_then(|caps| caps[1].parse::<usize>().ok())
}

fn strip_emphasis(text: &str) -> String {
    text.trim_matches(|c| c == '*' || c == '_' || c == '`')
        .trim()
        .to_string()
}
