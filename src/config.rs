use std::env;
use std::error::Error;
use std::time::Duration;

pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_GITHUB_REPO: &str = "SENTINEL_GITHUB_REPO";
pub const ENV_MODEL: &str = "SENTINEL_MODEL";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";
pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Runtime configuration, assembled from environment variables with CLI
/// overrides applied on top.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    /// Publish credentials. Optional; without both a token and a resolvable
    /// repository slug the run stays local-only.
    pub github_token: Option<String>,
    pub github_repo: Option<String>,
    pub concurrency: usize,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub verbose: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn Error + Send + Sync>> {
        let api_key = env::var(ENV_API_KEY).map_err(|_| {
            format!(
                "{} is not set — an API key for the model service is required",
                ENV_API_KEY
            )
        })?;

        Ok(Self {
            api_key,
            model: env::var(ENV_MODEL).unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            github_token: env::var(ENV_GITHUB_TOKEN).ok().filter(|t| !t.is_empty()),
            github_repo: env::var(ENV_GITHUB_REPO).ok().filter(|r| !r.is_empty()),
            concurrency: DEFAULT_CONCURRENCY,
            request_timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            verbose: false,
        })
    }
}
