//! Text-generation collaborator interface.
//!
//! The core never talks to a model directly; it asks an implementor of
//! [`TextGenerator`] for prose or structured JSON and tolerates malformed
//! output. Retry and backoff live behind the trait, not in the core.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{CoreError, Result};

/// External prose/JSON producer.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce free text for a prompt.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;

    /// Produce text expected to parse as a JSON object.
    ///
    /// The default implementation completes and then extracts JSON
    /// tolerantly; implementors with native structured output may override.
    async fn complete_json(&self, system: &str, prompt: &str) -> Result<Value> {
        let raw = self.complete(system, prompt).await?;
        extract_json(&raw)
            .ok_or_else(|| CoreError::TextGen(format!("no JSON object in response: {raw:.80}")))
    }
}

/// Pull the first JSON object out of a possibly chatty response.
///
/// Strips Markdown code fences and scans for a balanced `{ ... }` span.
/// Returns `None` when nothing in the text parses.
#[must_use]
pub fn extract_json(raw: &str) -> Option<Value> {
    let text = strip_fences(raw);
    if let Ok(value) = serde_json::from_str::<Value>(text)
        && value.is_object()
    {
        return Some(value);
    }
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let candidate = &text[start..=start + offset];
                    return serde_json::from_str(candidate).ok();
                }
            }
            _ => {}
        }
    }
    None
}

fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_start_matches(['\r', '\n'])
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

/// Generator that refuses every call.
///
/// Used where generation is disabled; callers fall back to their templated
/// lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullGenerator;

#[async_trait]
impl TextGenerator for NullGenerator {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String> {
        Err(CoreError::TextGen("text generation disabled".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_plain_json() {
        let value = extract_json(r#"{"tension": "calm"}"#).expect("parses");
        assert_eq!(value["tension"], json!("calm"));
    }

    #[test]
    fn extracts_fenced_json() {
        let raw = "```json\n{\"reaction\": \"none\"}\n```";
        let value = extract_json(raw).expect("parses");
        assert_eq!(value["reaction"], json!("none"));
    }

    #[test]
    fn extracts_embedded_object_from_chatty_text() {
        let raw = "Sure! Here is the scene:\n{\"npcs\": [{\"name\": \"Mira {the} Bold\"}]}\nHope that helps.";
        let value = extract_json(raw).expect("parses");
        assert_eq!(value["npcs"][0]["name"], json!("Mira {the} Bold"));
    }

    #[test]
    fn garbage_yields_none() {
        assert!(extract_json("no json here").is_none());
        assert!(extract_json("{broken").is_none());
    }

    #[tokio::test]
    async fn null_generator_always_errors() {
        let err = NullGenerator
            .complete("sys", "prompt")
            .await
            .expect_err("disabled");
        assert!(matches!(err, CoreError::TextGen(_)));
    }
}
