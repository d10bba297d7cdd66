//! Structured generation client: provider call + JSON extraction + shape
//! repair + typed validation, with linear-backoff retries

use super::extract::extract_json;
use super::provider::{GenerationProvider, ProviderError};
use super::repair::apply_repairs;
use pdm_common::config::GenerationConfig;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Default retry count: every call gets `max_retries + 1` attempts
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Structured generation failure
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The external provider returned a non-success response
    #[error("Provider call failed: {0}")]
    Provider(#[from] ProviderError),

    /// No parseable JSON payload in the model output
    #[error("Failed to parse JSON payload: {0}")]
    Parse(#[from] serde_json::Error),

    /// Parsed output does not conform to the target schema even after
    /// shape repair
    #[error("Schema validation failed: {0}")]
    Validation(String),

    /// All attempts exhausted; carries the last underlying failure
    #[error("Generation failed after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<GenerationError>,
    },
}

/// Client for schema-validated calls to a generation provider.
///
/// Validation is typed deserialization into the caller's target type; a
/// call either yields a value conforming to that schema or fails. Invalid
/// output is never silently accepted.
pub struct GenerationClient {
    provider: Arc<dyn GenerationProvider>,
}

impl GenerationClient {
    pub fn new(provider: Arc<dyn GenerationProvider>) -> Self {
        Self { provider }
    }

    /// Build a client from configuration (env keys with TOML fallback)
    pub fn from_config(config: &GenerationConfig) -> Result<Self, ProviderError> {
        Ok(Self::new(super::provider::provider_from_config(config)?))
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Call the provider and validate the response against `T`.
    ///
    /// Per attempt: provider call → JSON payload extraction → parse →
    /// shape repair → typed deserialize. Any step failure waits
    /// `1s × attempt number` and retries, up to `max_retries + 1` attempts
    /// total; the final error carries the last underlying cause.
    pub async fn call<T: DeserializeOwned>(
        &self,
        prompt: &str,
        temperature: f32,
        max_retries: u32,
    ) -> Result<T, GenerationError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.attempt(prompt, temperature).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt <= max_retries => {
                    warn!(
                        provider = self.provider.name(),
                        attempt = attempt,
                        error = %e,
                        "Generation attempt failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(1000 * attempt as u64)).await;
                }
                Err(e) => {
                    return Err(GenerationError::Exhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
            }
        }
    }

    async fn attempt<T: DeserializeOwned>(
        &self,
        prompt: &str,
        temperature: f32,
    ) -> Result<T, GenerationError> {
        let raw = self.provider.complete(prompt, temperature).await?;
        let payload = extract_json(&raw);
        let mut value: serde_json::Value = serde_json::from_str(payload)?;
        apply_repairs(&mut value);
        serde_json::from_value(value).map_err(|e| GenerationError::Validation(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde::Deserialize;
    use std::sync::Mutex;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Target {
        answer: String,
        count: u32,
    }

    /// Scripted provider: pops one canned response per call
    struct ScriptedProvider {
        responses: Mutex<Vec<Result<String, ProviderError>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Result<String, ProviderError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(0),
            }
        }

        fn call_count(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl GenerationProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn complete(&self, _prompt: &str, _temperature: f32) -> Result<String, ProviderError> {
            *self.calls.lock().unwrap() += 1;
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(ProviderError::EmptyCompletion);
            }
            responses.remove(0)
        }
    }

    #[tokio::test]
    async fn test_valid_response_first_attempt() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(
            "{\"answer\": \"ok\", \"count\": 3}".to_string(),
        )]));
        let client = GenerationClient::new(provider.clone());

        let result: Target = client.call("prompt", 0.1, 2).await.unwrap();
        assert_eq!(
            result,
            Target {
                answer: "ok".to_string(),
                count: 3
            }
        );
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_fenced_response_accepted() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(
            "```json\n{\"answer\": \"ok\", \"count\": 1}\n```".to_string(),
        )]));
        let client = GenerationClient::new(provider);

        let result: Target = client.call("prompt", 0.1, 0).await.unwrap();
        assert_eq!(result.count, 1);
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        tokio::time::pause();
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok("not json at all".to_string()),
            Err(ProviderError::Api(503, "overloaded".to_string())),
            Ok("{\"answer\": \"third time\", \"count\": 3}".to_string()),
        ]));
        let client = GenerationClient::new(provider.clone());

        let result: Target = client.call("prompt", 0.1, 2).await.unwrap();
        assert_eq!(result.answer, "third time");
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_carries_last_error() {
        tokio::time::pause();
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok("{\"wrong\": true}".to_string()),
            Ok("{\"wrong\": true}".to_string()),
        ]));
        let client = GenerationClient::new(provider.clone());

        let err = client.call::<Target>("prompt", 0.1, 1).await.unwrap_err();
        match err {
            GenerationError::Exhausted { attempts, last } => {
                assert_eq!(attempts, 2);
                assert!(matches!(*last, GenerationError::Validation(_)));
            }
            other => panic!("expected Exhausted, got {:?}", other),
        }
        assert_eq!(provider.call_count(), 2);
    }
}
