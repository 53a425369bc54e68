//! # plotline-llm — Text-Generation Backend for Plotline
//!
//! Implements the core's [`plotline_core::generate::TextGenerator`] seam
//! over real backends:
//!   - **Ollama** (local, recommended default)
//!   - **OpenAI-compatible API** (any chat-completions endpoint)
//!
//! All model calls go through this crate, ensuring:
//!   - Two-tier model routing (cheap one-liners vs. full narrative)
//!   - Timeout management and bounded retry
//!   - Graceful degradation — an unconfigured client errors cleanly and
//!     the core falls back to its templates

pub mod client;
pub mod error;
pub mod prompt;
pub mod types;

pub use client::{LlmClient, LlmProvider, TieredGenerator, generator_for};
pub use error::LlmError;
pub use types::{LlmRequest, LlmResponse, ModelTier};
