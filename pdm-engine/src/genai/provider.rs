//! Generation provider clients
//!
//! Thin typed wrappers over the external generative-text HTTP APIs. The
//! [`GenerationProvider`] trait is the seam the rest of the engine (and
//! the test suite) programs against.

use async_trait::async_trait;
use pdm_common::config::GenerationConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

const MAX_COMPLETION_TOKENS: u32 = 8192;
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Provider client errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Empty completion in provider response")]
    EmptyCompletion,

    #[error("No generation API key configured (set ANTHROPIC_API_KEY or OPENAI_API_KEY)")]
    NotConfigured,
}

/// Call contract for an external generative-text provider.
///
/// Implementations return the raw completion text; JSON extraction,
/// repair, and validation live in the generation client on top.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, ProviderError>;
}

/// Select a provider from configuration.
///
/// Environment variables win over the TOML fallback; Anthropic is
/// preferred when both keys are present.
pub fn provider_from_config(
    config: &GenerationConfig,
) -> Result<Arc<dyn GenerationProvider>, ProviderError> {
    let anthropic_key = std::env::var("ANTHROPIC_API_KEY")
        .ok()
        .filter(|k| !k.is_empty())
        .or_else(|| config.anthropic_api_key.clone());
    if let Some(key) = anthropic_key {
        return Ok(Arc::new(AnthropicProvider::new(key, config.model.clone())?));
    }

    let openai_key = std::env::var("OPENAI_API_KEY")
        .ok()
        .filter(|k| !k.is_empty())
        .or_else(|| config.openai_api_key.clone());
    if let Some(key) = openai_key {
        return Ok(Arc::new(OpenAiProvider::new(key, config.model.clone())?));
    }

    Err(ProviderError::NotConfigured)
}

fn build_http_client() -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| ProviderError::Network(e.to_string()))
}

// ── Anthropic ──

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    #[serde(default)]
    text: String,
}

/// Anthropic Messages API client
pub struct AnthropicProvider {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
}

impl AnthropicProvider {
    pub fn new(api_key: String, model: Option<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            http_client: build_http_client()?,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string()),
        })
    }
}

#[async_trait]
impl GenerationProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, ProviderError> {
        let request = AnthropicRequest {
            model: &self.model,
            max_tokens: MAX_COMPLETION_TOKENS,
            temperature,
            messages: vec![AnthropicMessage {
                role: "user",
                content: format!(
                    "{}\n\nIMPORTANT: Return ONLY valid JSON, no markdown, no explanation, no code fences.",
                    prompt
                ),
            }],
        };

        tracing::debug!(model = %self.model, "Calling Anthropic messages API");

        let response = self
            .http_client
            .post(ANTHROPIC_BASE_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(status.as_u16(), error_text));
        }

        let parsed: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        parsed
            .content
            .into_iter()
            .map(|block| block.text)
            .find(|text| !text.is_empty())
            .ok_or(ProviderError::EmptyCompletion)
    }
}

// ── OpenAI ──

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    temperature: f32,
    response_format: OpenAiResponseFormat,
    messages: Vec<OpenAiMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct OpenAiResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    #[serde(default)]
    content: String,
}

/// OpenAI chat completions client (JSON response mode)
pub struct OpenAiProvider {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: Option<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            http_client: build_http_client()?,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
        })
    }
}

#[async_trait]
impl GenerationProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, ProviderError> {
        let request = OpenAiRequest {
            model: &self.model,
            temperature,
            response_format: OpenAiResponseFormat {
                format_type: "json_object",
            },
            messages: vec![
                OpenAiMessage {
                    role: "system",
                    content: "You are a privacy assessment analyst. Always respond with valid JSON only.",
                },
                OpenAiMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        tracing::debug!(model = %self.model, "Calling OpenAI chat completions API");

        let response = self
            .http_client
            .post(OPENAI_BASE_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(status.as_u16(), error_text));
        }

        let parsed: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .map(|choice| choice.message.content)
            .find(|content| !content.is_empty())
            .ok_or(ProviderError::EmptyCompletion)
    }
}
