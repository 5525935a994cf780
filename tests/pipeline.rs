use async_trait::async_trait;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use sentinel::analyzer::ModelBackend;
use sentinel::config::Config;
use sentinel::pipeline;
use sentinel::report::writer::{report_file_name, SUMMARY_FILE};
use sentinel::report::Severity;

/// Replays a canned review for every file, optionally failing for sources
/// whose prompt contains a marker string.
struct MockBackend {
    response: String,
    fail_on: Option<String>,
}

impl MockBackend {
    fn canned(response: &str) -> Arc<dyn ModelBackend> {
        Arc::new(Self {
            response: response.to_string(),
            fail_on: None,
        })
    }

    fn failing_on(response: &str, marker: &str) -> Arc<dyn ModelBackend> {
        Arc::new(Self {
            response: response.to_string(),
            fail_on: Some(marker.to_string()),
        })
    }
}

#[async_trait]
impl ModelBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn review(&self, prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
        if let Some(marker) = &self.fail_on {
            if prompt.contains(marker) {
                return Err("simulated model outage".into());
            }
        }
        Ok(self.response.clone())
    }
}

fn test_config() -> Config {
    Config {
        api_key: "test-key".to_string(),
        model: "mock".to_string(),
        github_token: None,
        github_repo: None,
        concurrency: 2,
        request_timeout: Duration::from_secs(1),
        max_retries: 1,
        verbose: false,
    }
}

fn write_file(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

const CRITICAL_REVIEW: &str = "Critical: unsafe eval usage, line 7\n\
    User input reaches eval() without sanitization.\n\
    Fix: use ast.literal_eval instead.";

#[tokio::test]
async fn critical_finding_lands_in_report_and_summary() {
    let project = tempfile::tempdir().unwrap();
    write_file(project.path(), "app.py", "eval(input())\n");

    let out = project.path().join("issues");
    let backend = MockBackend::canned(CRITICAL_REVIEW);

    let outcome = pipeline::run(project.path(), &out, backend, &test_config(), None)
        .await
        .unwrap();

    assert_eq!(outcome.reports.len(), 1);
    assert!(outcome.summary.count(Severity::Critical) >= 1);

    let report_path = out.join(report_file_name("app.py"));
    let report = fs::read_to_string(report_path).unwrap();
    assert!(report.contains("unsafe eval usage"));
    assert!(report.contains("**Line:** 7"));

    let summary = fs::read_to_string(out.join(SUMMARY_FILE)).unwrap();
    assert!(summary.contains("| 🔴 Critical | 1 |"));
}

#[tokio::test]
async fn failure_for_one_file_never_suppresses_others() {
    let project = tempfile::tempdir().unwrap();
    write_file(project.path(), "broken.py", "MARKER_FAIL\n");
    write_file(project.path(), "fine.py", "print('ok')\n");

    let out = project.path().join("issues");
    let backend = MockBackend::failing_on(CRITICAL_REVIEW, "MARKER_FAIL");

    let outcome = pipeline::run(project.path(), &out, backend, &test_config(), None)
        .await
        .unwrap();

    assert_eq!(outcome.reports.len(), 2);
    assert_eq!(outcome.summary.files_failed, 1);
    assert_eq!(outcome.summary.files_analyzed, 1);

    // Both reports exist on disk, the failed one recording its error.
    let failed = fs::read_to_string(out.join(report_file_name("broken.py"))).unwrap();
    assert!(failed.contains("Analysis failed"));
    assert!(failed.contains("simulated model outage"));

    let fine = fs::read_to_string(out.join(report_file_name("fine.py"))).unwrap();
    assert!(fine.contains("unsafe eval usage"));
}

#[tokio::test]
async fn summary_counts_match_sum_of_per_file_counts() {
    let project = tempfile::tempdir().unwrap();
    for i in 0..5 {
        write_file(project.path(), &format!("f{}.py", i), "code\n");
    }

    let out = project.path().join("issues");
    let review = "High: first issue on line 1\nLow: second issue on line 2\n";
    let backend = MockBackend::canned(review);

    let outcome = pipeline::run(project.path(), &out, backend, &test_config(), None)
        .await
        .unwrap();

    let per_file: usize = outcome.reports.iter().map(|r| r.findings.len()).sum();
    assert_eq!(outcome.summary.total_findings(), per_file);
    assert_eq!(outcome.summary.count(Severity::High), 5);
    assert_eq!(outcome.summary.count(Severity::Low), 5);
}

#[tokio::test]
async fn max_file_cap_limits_processing() {
    let project = tempfile::tempdir().unwrap();
    for i in 0..10 {
        write_file(project.path(), &format!("f{}.py", i), "code\n");
    }

    let out = project.path().join("issues");
    let backend = MockBackend::canned(CRITICAL_REVIEW);

    let outcome = pipeline::run(project.path(), &out, backend, &test_config(), Some(3))
        .await
        .unwrap();

    assert_eq!(outcome.reports.len(), 3);
}

#[tokio::test]
async fn rerunning_with_fixed_model_output_is_idempotent() {
    let project = tempfile::tempdir().unwrap();
    write_file(project.path(), "app.py", "eval(input())\n");

    let out = project.path().join("issues");
    let config = test_config();

    pipeline::run(
        project.path(),
        &out,
        MockBackend::canned(CRITICAL_REVIEW),
        &config,
        None,
    )
    .await
    .unwrap();
    let first = fs::read_to_string(out.join(report_file_name("app.py"))).unwrap();

    pipeline::run(
        project.path(),
        &out,
        MockBackend::canned(CRITICAL_REVIEW),
        &config,
        None,
    )
    .await
    .unwrap();
    let second = fs::read_to_string(out.join(report_file_name("app.py"))).unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn empty_directory_produces_no_reports() {
    let project = tempfile::tempdir().unwrap();
    write_file(project.path(), "README.md", "docs only\n");

    let out = project.path().join("issues");
    let backend = MockBackend::canned(CRITICAL_REVIEW);

    let outcome = pipeline::run(project.path(), &out, backend, &test_config(), None)
        .await
        .unwrap();

    assert!(outcome.reports.is_empty());
    assert_eq!(outcome.summary.total_findings(), 0);
}
