//! Generation provider — the single point of entry for all Gemini calls.
//!
//! ARCHITECTURAL RULE: No other module may call the Gemini API directly.
//! All text, audio, and image generation MUST go through this module.

pub mod gemini;

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("provider returned empty content")]
    EmptyContent,

    #[error("provider returned undecodable binary payload: {0}")]
    BadPayload(String),
}

/// The multi-modal generation capability the orchestrator runs against.
/// Every call is network-bound and may fail with `RateLimited` or a
/// transport/API error; the orchestrator treats all of them as job-fatal.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate_text(&self, prompt: &str, system: &str) -> Result<String, ProviderError>;

    async fn generate_audio(&self, text: &str, voice: &str) -> Result<Bytes, ProviderError>;

    async fn generate_image(&self, prompt: &str) -> Result<Bytes, ProviderError>;
}

/// Deserializes a JSON payload out of LLM text output.
/// The prompt must instruct the model to return valid JSON.
pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, ProviderError> {
    let text = strip_json_fences(text);
    serde_json::from_str(text).map_err(ProviderError::Parse)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_parse_json_through_fences() {
        #[derive(serde::Deserialize)]
        struct Payload {
            key: String,
        }
        let parsed: Payload = parse_json("```json\n{\"key\": \"value\"}\n```").unwrap();
        assert_eq!(parsed.key, "value");
    }
}
