//! Request and response types for text generation.

use serde::{Deserialize, Serialize};

/// Which model class serves a request.
///
/// Tier-1 (short generative) turns go to the cheap model; the full pipeline
/// and scene reconciliation go to the capable one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    /// Small, fast model for one-line narration.
    Cheap,
    /// Larger model for full narrative and structured scene output.
    Capable,
}

/// A request to the text-generation backend.
#[derive(Debug, Clone, Serialize)]
pub struct LlmRequest {
    /// System prompt (narrator voice, world rules, output contract).
    pub system: String,
    /// User prompt (scene context, player input, instructions).
    pub user: String,
    /// Which model class serves this.
    pub tier: ModelTier,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl LlmRequest {
    /// A short-narration request (tier-1 turns, reaction checks).
    #[must_use]
    pub fn cheap(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            tier: ModelTier::Cheap,
            max_tokens: 160,
            temperature: 0.7,
            timeout_ms: 8000,
        }
    }

    /// A full-context request (scene merge, full-pipeline narrative).
    #[must_use]
    pub fn capable(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            tier: ModelTier::Capable,
            max_tokens: 600,
            temperature: 0.8,
            timeout_ms: 20000,
        }
    }

    /// Override the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Override the token budget.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// A completed generation.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmResponse {
    /// The generated text, as returned.
    pub text: String,
    /// Tokens generated, when the backend reports it.
    pub tokens_generated: u32,
    /// Wall-clock latency in milliseconds.
    pub latency_ms: u64,
    /// Model that served the request.
    pub model: String,
}
