//! Client for the external text-generation provider.
//!
//! Single-shot prompt-in/text-out — no streaming, no session state. Failures
//! here never become HTTP errors: the analysis layer converts every variant
//! into a deterministic fallback so admin pages always render.

use async_trait::async_trait;
use serde_json::Value;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation client is not configured (GENERATION_API_KEY is unset)")]
    Unconfigured,
    #[error("generation request failed: {0}")]
    Request(String),
    #[error("generation response contained no text content")]
    EmptyResponse,
}

#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// OpenAI-compatible chat-completions client configured from the environment:
///
/// - `GENERATION_API_KEY`: bearer key; when unset, calls fail as `Unconfigured`
///   and analysis degrades to fallbacks instead of blocking startup
/// - `GENERATION_BASE_URL` (default `https://api.openai.com/v1`)
/// - `GENERATION_MODEL` (default `gpt-4o-mini`)
/// - `GENERATION_TIMEOUT_SECS` (default 20) — bounds every request so a slow
///   provider cannot stall a dashboard render
pub struct HttpGenerationClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl HttpGenerationClient {
    pub fn from_env() -> Self {
        let api_key = non_empty_env("GENERATION_API_KEY");
        if api_key.is_none() {
            tracing::warn!("GENERATION_API_KEY is unset; AI analysis will return fallbacks");
        }

        let base_url = non_empty_env("GENERATION_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let model = non_empty_env("GENERATION_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let timeout_secs = non_empty_env("GENERATION_TIMEOUT_SECS")
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("failed to build generation HTTP client");

        Self {
            client,
            api_key,
            base_url,
            model,
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self.api_key.as_deref().ok_or(GenerationError::Unconfigured)?;

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&serde_json::json!({
                "model": self.model,
                "messages": [{"role": "user", "content": prompt}],
            }))
            .send()
            .await
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "generation provider returned non-success status");
            return Err(GenerationError::Request(format!(
                "provider returned status {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        body["choices"][0]["message"]["content"]
            .as_str()
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(GenerationError::EmptyResponse)
    }
}
