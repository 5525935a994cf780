pub mod gemini;
pub mod prompt;

use async_trait::async_trait;
use std::error::Error;
use std::path::PathBuf;

/// One file's worth of work for the model. Created per collected file and
/// discarded after the model call returns.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub path: PathBuf,
    /// Source identifier, relative to the analyzed root.
    pub source: String,
    pub contents: String,
    pub language: &'static str,
}

/// Capability boundary around the external completion service. The response
/// is opaque free text; callers must parse defensively.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Send one review prompt and return the model's raw text. Transient
    /// failures are retried inside the implementation; an `Err` here is
    /// terminal for the file being analyzed.
    async fn review(&self, prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>>;
}
