use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::error::Error;
use std::time::Duration;
use tokio::time::sleep;

use crate::analyzer::ModelBackend;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Client for the Gemini `generateContent` endpoint. Applies a per-request
/// timeout and retries transient failures a bounded number of times.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    max_retries: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    parts: Option<Vec<Part>>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        model: String,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            model,
            max_retries,
        })
    }

    /// Endpoint URL. The API key travels in a header, never here, so error
    /// messages and retry logs that quote the URL cannot leak it.
    fn request_url(&self) -> String {
        format!("{}/models/{}:generateContent", GEMINI_API_BASE, self.model)
    }

    async fn call_once(&self, prompt: &str) -> Result<String, CallError> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .client
            .post(self.request_url())
            .header("User-Agent", "sentinel")
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if status.as_u16() == 429 || status.is_server_error() {
            return Err(CallError::Transient(format!("HTTP {}", status)));
        }

        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(CallError::Terminal(format!(
                "model API rejected the request: {} {}",
                status, detail
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| CallError::Terminal(format!("unreadable model response: {}", e)))?;

        let text: String = parsed
            .candidates
            .unwrap_or_default()
            .into_iter()
            .filter_map(|c| c.content)
            .filter_map(|c| c.parts)
            .flatten()
            .filter_map(|p| p.text)
            .collect::<Vec<String>>()
            .join("\n");

        if text.is_empty() {
            return Err(CallError::Terminal(
                "model returned no text candidates".to_string(),
            ));
        }

        Ok(text)
    }
}

#[async_trait]
impl ModelBackend for GeminiClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn review(&self, prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
        let mut last_error = String::new();

        for attempt in 1..=self.max_retries {
            match self.call_once(prompt).await {
                Ok(text) => return Ok(text),
                Err(CallError::Terminal(e)) => return Err(e.into()),
                Err(CallError::Transient(e)) => {
                    last_error = e;
                    if attempt < self.max_retries {
                        let backoff = Duration::from_secs(1u64 << attempt.min(5));
                        eprintln!(
                            "⏳ Model call failed (attempt {}/{}): {} — retrying in {:?}",
                            attempt, self.max_retries, last_error, backoff
                        );
                        sleep(backoff).await;
                    }
                }
            }
        }

        Err(format!(
            "model call failed after {} attempts: {}",
            self.max_retries, last_error
        )
        .into())
    }
}

enum CallError {
    /// Worth retrying: timeout, connection failure, 429, 5xx.
    Transient(String),
    /// Not worth retrying: auth errors, malformed request, empty response.
    Terminal(String),
}

/// Only timeouts and connection drops are worth another attempt; anything
/// else about the request itself will fail the same way every time.
fn classify_send_error(e: reqwest::Error) -> CallError {
    if e.is_timeout() || e.is_connect() {
        CallError::Transient(e.to_string())
    } else {
        CallError::Terminal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeminiClient {
        GeminiClient::new(
            "super-secret-key".to_string(),
            "gemini-test".to_string(),
            Duration::from_secs(1),
            1,
        )
        .unwrap()
    }

    #[test]
    fn request_url_never_carries_the_api_key() {
        let url = client().request_url();

        assert!(url.contains("gemini-test"));
        assert!(url.ends_with(":generateContent"));
        assert!(!url.contains("super-secret-key"));
        assert!(!url.contains("key="));
    }

    #[tokio::test]
    async fn connection_refused_is_transient() {
        // Bind then drop a local port so the connect attempt is refused.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap()
            .get(format!("http://{}/", addr))
            .send()
            .await
            .unwrap_err();

        assert!(matches!(
            classify_send_error(err),
            CallError::Transient(_)
        ));
    }
}
