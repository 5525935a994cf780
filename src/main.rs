use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use sentinel::analyzer::gemini::GeminiClient;
use sentinel::analyzer::ModelBackend;
use sentinel::config::Config;
use sentinel::pipeline;
use sentinel::publisher::{self, PublishOutcome};
use sentinel::report::Severity;
use sentinel::server;

#[derive(Parser)]
#[command(
    name = "sentinel",
    version,
    about = "Sentinel Code Agent — automated security and code quality analysis"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a project directory (or single file) and write markdown reports
    Analyze {
        /// Path to the project to analyze
        path: PathBuf,

        /// Push the generated reports to GitHub after analysis
        #[arg(long)]
        push: bool,

        /// GitHub personal access token (or set GITHUB_TOKEN)
        #[arg(long)]
        github_token: Option<String>,

        /// Maximum number of files to analyze
        #[arg(long)]
        max_files: Option<usize>,

        /// Concurrent model calls
        #[arg(long)]
        concurrency: Option<usize>,

        /// Report output directory (default: <path>/issues)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Serve the analysis API over HTTP
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 8001)]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // A cancelled run keeps whatever reports it already wrote.
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n⚠️  Analysis interrupted");
            process::exit(130);
        }
    });

    let code = match cli.command {
        Command::Analyze {
            path,
            push,
            github_token,
            max_files,
            concurrency,
            output_dir,
            verbose,
        } => {
            run_analyze(
                path,
                push,
                github_token,
                max_files,
                concurrency,
                output_dir,
                verbose,
            )
            .await
        }
        Command::Serve { host, port } => run_serve(host, port).await,
    };

    process::exit(code);
}

#[allow(clippy::too_many_arguments)]
async fn run_analyze(
    path: PathBuf,
    push: bool,
    github_token: Option<String>,
    max_files: Option<usize>,
    concurrency: Option<usize>,
    output_dir: Option<PathBuf>,
    verbose: bool,
) -> i32 {
    let mut config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("✗ {}", e);
            return 1;
        }
    };

    if let Some(token) = github_token {
        config.github_token = Some(token);
    }
    if let Some(n) = concurrency {
        config.concurrency = n.max(1);
    }
    config.verbose = verbose;

    let backend = match GeminiClient::new(
        config.api_key.clone(),
        config.model.clone(),
        config.request_timeout,
        config.max_retries,
    ) {
        Ok(client) => Arc::new(client) as Arc<dyn ModelBackend>,
        Err(e) => {
            eprintln!("✗ Could not build model client: {}", e);
            return 1;
        }
    };

    let output_dir = output_dir.unwrap_or_else(|| {
        if path.is_dir() {
            path.join("issues")
        } else {
            PathBuf::from("issues")
        }
    });

    println!("{}", "=".repeat(70));
    println!("🛡️  SENTINEL CODE AGENT — Security Analysis Starting");
    println!("{}", "=".repeat(70));
    println!("Model: {}", backend.name());

    let outcome = match pipeline::run(&path, &output_dir, backend, &config, max_files).await {
        Ok(o) => o,
        Err(e) => {
            eprintln!("✗ {}", e);
            return 1;
        }
    };

    if outcome.reports.is_empty() {
        eprintln!("⚠️  No reports were produced");
        return 1;
    }

    print_summary(&outcome);

    if push {
        println!("{}", "─".repeat(70));
        println!("📤 Pushing reports to GitHub...");

        match publisher::publish_reports(&path, &outcome.output_dir, &config).await {
            Ok(PublishOutcome::Published { branch, commit }) => {
                println!(
                    "✓ Reports pushed to branch '{}' ({})",
                    branch,
                    &commit[..8.min(commit.len())]
                );
            }
            Ok(PublishOutcome::LocalOnly { reason }) => {
                eprintln!("⚠️  Publish skipped: {}", reason);
                eprintln!(
                    "   Reports remain available locally in {}",
                    outcome.output_dir.display()
                );
            }
            Err(e) => {
                // Local reports stay valid; exit status reflects report
                // production only.
                eprintln!("✗ GitHub push failed: {}", e);
                eprintln!(
                    "   Reports remain available locally in {}",
                    outcome.output_dir.display()
                );
            }
        }
    }

    println!("{}", "=".repeat(70));
    println!("🛡️  SENTINEL CODE AGENT — Analysis Complete");
    println!("{}", "=".repeat(70));

    0
}

fn print_summary(outcome: &pipeline::RunOutcome) {
    let summary = &outcome.summary;

    println!("{}", "─".repeat(70));
    println!("📊 Summary");
    println!("   Files analyzed: {}", summary.files_analyzed);
    println!("   Files failed:   {}", summary.files_failed);
    println!("   Total findings: {}", summary.total_findings());

    for severity in Severity::ALL {
        let count = summary.count(severity);
        if count == 0 {
            continue;
        }

        let label = match severity {
            Severity::Critical => severity.label().red().bold(),
            Severity::High => severity.label().red(),
            Severity::Medium => severity.label().yellow(),
            Severity::Low => severity.label().blue(),
            Severity::Info => severity.label().white(),
        };

        println!("   {} {}: {}", severity.icon(), label, count);
    }

    println!("📂 Reports saved to: {}", outcome.output_dir.display());
}

async fn run_serve(host: String, port: u16) -> i32 {
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("✗ {}", e);
            return 1;
        }
    };

    let backend = match GeminiClient::new(
        config.api_key.clone(),
        config.model.clone(),
        config.request_timeout,
        config.max_retries,
    ) {
        Ok(client) => Arc::new(client) as Arc<dyn ModelBackend>,
        Err(e) => {
            eprintln!("✗ Could not build model client: {}", e);
            return 1;
        }
    };

    let addr = format!("{}:{}", host, port);
    let handle = tokio::runtime::Handle::current();

    let served = tokio::task::spawn_blocking(move || server::run(&addr, backend, handle)).await;

    match served {
        Ok(Ok(())) => 0,
        Ok(Err(e)) => {
            eprintln!("✗ Server error: {}", e);
            1
        }
        Err(e) => {
            eprintln!("✗ Server task failed: {}", e);
            1
        }
    }
}
