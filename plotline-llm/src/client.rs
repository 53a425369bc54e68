//! LLM Client — unified interface for Ollama and OpenAI-compatible backends.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};

use plotline_core::generate::TextGenerator;

use crate::error::LlmError;
use crate::types::{LlmRequest, LlmResponse, ModelTier};

/// Provider backend for text generation.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    /// Ollama running locally.
    Ollama {
        /// Base URL, e.g. `http://localhost:11434`.
        base_url: String,
    },
    /// Any OpenAI-compatible chat-completions API.
    OpenAiCompatible {
        /// Base URL up to (not including) `/v1`.
        base_url: String,
        /// Bearer token.
        api_key: String,
    },
    /// No backend — every call errors, so callers use their templates.
    None,
}

/// Routes generation requests to the configured backend with bounded retry.
pub struct LlmClient {
    provider: LlmProvider,
    http: Client,
    cheap_model: String,
    capable_model: String,
    max_retries: u32,
}

impl LlmClient {
    /// Create a client for a provider with the two model names.
    #[must_use]
    pub fn new(
        provider: LlmProvider,
        cheap_model: impl Into<String>,
        capable_model: impl Into<String>,
        max_retries: u32,
    ) -> Self {
        Self {
            provider,
            http: Client::new(),
            cheap_model: cheap_model.into(),
            capable_model: capable_model.into(),
            max_retries,
        }
    }

    /// A client with no backend; every call errors.
    #[must_use]
    pub fn none() -> Self {
        Self {
            provider: LlmProvider::None,
            http: Client::new(),
            cheap_model: String::new(),
            capable_model: String::new(),
            max_retries: 0,
        }
    }

    /// Whether a backend is configured.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !matches!(self.provider, LlmProvider::None)
    }

    fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Cheap => &self.cheap_model,
            ModelTier::Capable => &self.capable_model,
        }
    }

    /// Generate a response.
    ///
    /// # Errors
    /// [`LlmError::Unavailable`] with no backend;
    /// [`LlmError::RetriesExhausted`] when every attempt failed.
    pub async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        match &self.provider {
            LlmProvider::None => Err(LlmError::Unavailable("no LLM provider configured".into())),
            LlmProvider::Ollama { base_url } => self.generate_ollama(base_url, request).await,
            LlmProvider::OpenAiCompatible { base_url, api_key } => {
                self.generate_openai(base_url, api_key, request).await
            }
        }
    }

    async fn generate_ollama(
        &self,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse, LlmError> {
        let model = self.model_for(request.tier);
        let url = format!("{base_url}/api/generate");
        let body = json!({
            "model": model,
            "prompt": format!("{}\n\n{}", request.system, request.user),
            "stream": false,
            "options": {
                "temperature": request.temperature,
                "num_predict": request.max_tokens,
            }
        });

        let mut last_error = String::new();
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                debug!(attempt, max = self.max_retries, "retrying Ollama call");
            }

            let start = Instant::now();
            let result = self
                .http
                .post(&url)
                .json(&body)
                .timeout(Duration::from_millis(request.timeout_ms))
                .send()
                .await;
            let latency_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(resp) => {
                    if resp.status().is_success() {
                        let json: serde_json::Value = resp
                            .json()
                            .await
                            .map_err(|e| LlmError::ParseError(e.to_string()))?;
                        return Ok(LlmResponse {
                            text: json["response"].as_str().unwrap_or("").to_string(),
                            tokens_generated: json["eval_count"].as_u64().unwrap_or(0) as u32,
                            latency_ms,
                            model: model.to_string(),
                        });
                    }
                    last_error = format!(
                        "HTTP {}: {}",
                        resp.status(),
                        resp.text().await.unwrap_or_default()
                    );
                    warn!("Ollama returned error: {last_error}");
                }
                Err(e) => {
                    last_error = e.to_string();
                    if e.is_timeout() {
                        warn!("Ollama request timed out after {}ms", request.timeout_ms);
                    } else {
                        warn!("Ollama request failed: {last_error}");
                    }
                }
            }
        }

        Err(LlmError::RetriesExhausted {
            attempts: self.max_retries + 1,
            last_error,
        })
    }

    async fn generate_openai(
        &self,
        base_url: &str,
        api_key: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse, LlmError> {
        let model = self.model_for(request.tier);
        let url = format!("{base_url}/v1/chat/completions");
        let body = json!({
            "model": model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        let mut last_error = String::new();
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                debug!(attempt, max = self.max_retries, "retrying chat-completions call");
            }

            let start = Instant::now();
            let result = self
                .http
                .post(&url)
                .header("Authorization", format!("Bearer {api_key}"))
                .json(&body)
                .timeout(Duration::from_millis(request.timeout_ms))
                .send()
                .await;
            let latency_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(resp) => {
                    if resp.status().is_success() {
                        let json: serde_json::Value = resp
                            .json()
                            .await
                            .map_err(|e| LlmError::ParseError(e.to_string()))?;
                        return Ok(LlmResponse {
                            text: json["choices"][0]["message"]["content"]
                                .as_str()
                                .unwrap_or("")
                                .to_string(),
                            tokens_generated: json["usage"]["completion_tokens"]
                                .as_u64()
                                .unwrap_or(0) as u32,
                            latency_ms,
                            model: model.to_string(),
                        });
                    }
                    last_error = format!("HTTP {}", resp.status());
                    warn!("chat-completions API returned error: {last_error}");
                }
                Err(e) => {
                    last_error = e.to_string();
                    warn!("chat-completions request failed: {last_error}");
                }
            }
        }

        Err(LlmError::RetriesExhausted {
            attempts: self.max_retries + 1,
            last_error,
        })
    }
}

/// A [`TextGenerator`] view of the client pinned to one model tier.
///
/// The core asks for prose through this seam; build one per tier with
/// [`generator_for`].
pub struct TieredGenerator {
    client: Arc<LlmClient>,
    tier: ModelTier,
}

/// Pin a client to a model tier for use as the core's text generator.
#[must_use]
pub fn generator_for(client: Arc<LlmClient>, tier: ModelTier) -> TieredGenerator {
    TieredGenerator { client, tier }
}

#[async_trait]
impl TextGenerator for TieredGenerator {
    async fn complete(&self, system: &str, prompt: &str) -> plotline_core::error::Result<String> {
        let request = match self.tier {
            ModelTier::Cheap => LlmRequest::cheap(system, prompt),
            ModelTier::Capable => LlmRequest::capable(system, prompt),
        };
        let response = self.client.generate(&request).await?;
        Ok(response.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_client_errors_immediately() {
        let client = LlmClient::none();
        assert!(!client.is_available());
        let err = client
            .generate(&LlmRequest::cheap("sys", "user"))
            .await
            .expect_err("no backend");
        assert!(matches!(err, LlmError::Unavailable(_)));
    }

    #[tokio::test]
    async fn tiered_generator_maps_errors_into_core() {
        let generator = generator_for(Arc::new(LlmClient::none()), ModelTier::Capable);
        let err = generator.complete("sys", "user").await.expect_err("none");
        assert!(matches!(err, plotline_core::CoreError::TextGen(_)));
    }

    #[test]
    fn model_selection_follows_tier() {
        let client = LlmClient::new(
            LlmProvider::Ollama {
                base_url: "http://localhost:11434".into(),
            },
            "phi3:mini",
            "llama3:70b",
            3,
        );
        assert_eq!(client.model_for(ModelTier::Cheap), "phi3:mini");
        assert_eq!(client.model_for(ModelTier::Capable), "llama3:70b");
    }
}
