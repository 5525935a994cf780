use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::analyzer::{prompt, AnalysisRequest, ModelBackend};
use crate::config::Config;
use crate::report::{parser, writer, FileReport, RunSummary};
use crate::scanner::{engine, language};

/// Everything a finished run produced. `reports` is sorted by source path.
pub struct RunOutcome {
    pub reports: Vec<FileReport>,
    pub summary: RunSummary,
    pub output_dir: PathBuf,
}

/// Collect → analyze (bounded fan-out) → format. Per-file failures are
/// isolated: they become failure reports and never abort the run.
pub async fn run(
    root: &Path,
    output_dir: &Path,
    backend: Arc<dyn ModelBackend>,
    config: &Config,
    max_files: Option<usize>,
) -> Result<RunOutcome, Box<dyn Error + Send + Sync>> {
    if !root.exists() {
        return Err(format!("path not found: {}", root.display()).into());
    }

    let files = engine::collect_files(root, max_files);
    println!("📁 Found {} code file(s) to analyze", files.len());

    if files.is_empty() {
        return Ok(RunOutcome {
            reports: Vec::new(),
            summary: RunSummary::default(),
            output_dir: output_dir.to_path_buf(),
        });
    }

    fs::create_dir_all(output_dir)?;

    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let mut tasks: JoinSet<FileReport> = JoinSet::new();

    for path in files {
        let contents = match engine::read_source(&path) {
            Some(c) => c,
            None => continue, // skipped and logged by the reader
        };

        let request = AnalysisRequest {
            source: engine::relative_source(root, &path),
            language: language::language_for(&path),
            contents,
            path,
        };

        let backend = Arc::clone(&backend);
        let semaphore = Arc::clone(&semaphore);
        let out_dir = output_dir.to_path_buf();
        let verbose = config.verbose;

        tasks.spawn(async move {
            // Closed-semaphore is unreachable here; run unthrottled if it
            // ever happens rather than dropping the file.
            let _permit = semaphore.acquire_owned().await.ok();

            if verbose {
                println!("🔍 Analyzing: {}", request.path.display());
            }

            let report = analyze_one(request, backend.as_ref()).await;

            // Emit the report immediately so a cancelled run keeps what is
            // already done. A write failure still keeps the in-memory report.
            if let Err(e) = writer::write_file_report(&out_dir, &report) {
                eprintln!("✗ Could not write report for {}: {}", report.source, e);
            } else if report.is_failure() {
                println!("✗ Failed: {}", report.source);
            } else {
                println!("✓ Completed: {} ({} finding(s))", report.source, report.findings.len());
            }

            report
        });
    }

    let mut reports = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(report) => reports.push(report),
            Err(e) => eprintln!("✗ Analysis task panicked: {}", e),
        }
    }

    // Completion order is arbitrary; keep the summary listing stable.
    reports.sort_by(|a, b| a.source.cmp(&b.source));

    let mut summary = RunSummary::default();
    for report in &reports {
        summary.record(report);
    }

    writer::write_summary(output_dir, &summary, &reports)?;

    Ok(RunOutcome {
        reports,
        summary,
        output_dir: output_dir.to_path_buf(),
    })
}

/// Analyze a single file. Terminal model errors become a failure report for
/// that file only.
pub async fn analyze_one(request: AnalysisRequest, backend: &dyn ModelBackend) -> FileReport {
    let prompt = prompt::build_prompt(&request.contents, request.language);

    match backend.review(&prompt).await {
        Ok(text) => {
            let (findings, unparsed_notes) = parser::parse_findings(&text);
            FileReport {
                source: request.source,
                language: request.language.to_string(),
                findings,
                unparsed_notes,
                error: None,
            }
        }
        Err(e) => FileReport::failed(
            request.source,
            request.language.to_string(),
            e.to_string(),
        ),
    }
}
