pub mod github;
pub mod repo;

use std::error::Error;
use std::fs;
use std::path::Path;

use crate::config::Config;
use github::GitHubPublisher;

/// What happened to the generated reports after the run.
#[derive(Debug)]
pub enum PublishOutcome {
    Published { branch: String, commit: String },
    /// Publishing was skipped, not failed: credentials or remote
    /// configuration were missing. Local reports remain valid.
    LocalOnly { reason: String },
}

/// Commit the reports in `output_dir` to the report branch. Missing
/// credentials degrade to local-only; a remote rejection is a hard `Err` and
/// is the caller's to surface.
pub async fn publish_reports(
    project_root: &Path,
    output_dir: &Path,
    config: &Config,
) -> Result<PublishOutcome, Box<dyn Error + Send + Sync>> {
    let token = match &config.github_token {
        Some(token) => token.clone(),
        None => {
            return Ok(PublishOutcome::LocalOnly {
                reason: format!("{} is not set", crate::config::ENV_GITHUB_TOKEN),
            })
        }
    };

    let slug = match config
        .github_repo
        .clone()
        .or_else(|| repo::discover_slug(project_root))
    {
        Some(slug) => slug,
        None => {
            return Ok(PublishOutcome::LocalOnly {
                reason: format!(
                    "no repository identifier: set {} or run inside a checkout with a GitHub 'origin' remote",
                    crate::config::ENV_GITHUB_REPO
                ),
            })
        }
    };

    let files = collect_report_files(output_dir)?;
    if files.is_empty() {
        return Ok(PublishOutcome::LocalOnly {
            reason: "no report files to publish".to_string(),
        });
    }

    let dir_name = output_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "issues".to_string());

    let publisher = GitHubPublisher::new(token, slug);
    let commit = publisher.push_reports(&dir_name, &files).await?;

    Ok(PublishOutcome::Published {
        branch: github::REPORT_BRANCH.to_string(),
        commit,
    })
}

/// Markdown reports in the output directory, sorted by name so commits are
/// stable across runs.
fn collect_report_files(
    dir: &Path,
) -> Result<Vec<(String, String)>, Box<dyn Error + Send + Sync>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        files.push((name, fs::read_to_string(&path)?));
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::time::Duration;

    fn local_config() -> Config {
        Config {
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
            github_token: None,
            github_repo: None,
            concurrency: 1,
            request_timeout: Duration::from_secs(1),
            max_retries: 1,
            verbose: false,
        }
    }

    #[tokio::test]
    async fn missing_credentials_fall_back_to_local_only() {
        let dir = tempfile::tempdir().unwrap();
        let config = local_config();

        let outcome = publish_reports(dir.path(), dir.path(), &config)
            .await
            .unwrap();

        match outcome {
            PublishOutcome::LocalOnly { reason } => {
                assert!(reason.contains("GITHUB_TOKEN"));
            }
            other => panic!("expected local-only outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn token_without_repo_slug_is_local_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = local_config();
        config.github_token = Some("ghp_test".to_string());

        let outcome = publish_reports(dir.path(), dir.path(), &config)
            .await
            .unwrap();

        match outcome {
            PublishOutcome::LocalOnly { reason } => {
                assert!(reason.contains("repository identifier"));
            }
            other => panic!("expected local-only outcome, got {:?}", other),
        }
    }

    #[test]
    fn report_files_are_collected_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.md"), "two").unwrap();
        fs::write(dir.path().join("a.md"), "one").unwrap();
        fs::write(dir.path().join("skip.txt"), "no").unwrap();

        let files = collect_report_files(dir.path()).unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].0, "a.md");
        assert_eq!(files[1].0, "b.md");
    }
}
