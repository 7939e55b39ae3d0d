//! Gemini HTTP client with bounded retries and typed payload extraction.
//!
//! Model ids are hardcoded — do not make configurable to prevent drift
//! between the text, TTS, and image pipelines.

use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::provider::{GenerationProvider, ProviderError};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const TEXT_MODEL: &str = "gemini-2.5-flash";
pub const TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const IMAGE_MODEL: &str = "gemini-2.5-flash-image";
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: String,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// The single Gemini client used by both generation pipelines.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    /// Posts a generateContent request, retrying 429 and 5xx responses
    /// with exponential backoff.
    async fn call(&self, model: &str, body: &GeminiRequest) -> Result<GeminiResponse, ProviderError> {
        let url = format!("{GEMINI_API_BASE}/{model}:generateContent");

        let mut last_error: Option<ProviderError> = None;
        let mut last_status_was_429 = false;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Gemini call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .header("content-type", "application/json")
                .json(body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_status_was_429 = false;
                    last_error = Some(ProviderError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let message = response.text().await.unwrap_or_default();
                warn!("Gemini API returned {}: {}", status, message);
                last_status_was_429 = status.as_u16() == 429;
                last_error = Some(ProviderError::Api {
                    status: status.as_u16(),
                    message,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<GeminiError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(ProviderError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let parsed: GeminiResponse = response.json().await?;
            debug!("Gemini call succeeded (model: {model})");
            return Ok(parsed);
        }

        if last_status_was_429 {
            return Err(ProviderError::RateLimited {
                retries: MAX_RETRIES,
            });
        }
        Err(last_error.unwrap_or(ProviderError::EmptyContent))
    }

    fn text_request(prompt: &str, system: &str) -> GeminiRequest {
        GeminiRequest {
            contents: vec![json!({"parts": [{"text": prompt}]})],
            system_instruction: Some(json!({"parts": [{"text": system}]})),
            generation_config: None,
        }
    }
}

fn first_text(response: &GeminiResponse) -> Result<String, ProviderError> {
    response
        .candidates
        .iter()
        .flat_map(|c| c.content.parts.iter())
        .find_map(|p| p.text.clone())
        .ok_or(ProviderError::EmptyContent)
}

fn first_binary(response: &GeminiResponse) -> Result<Bytes, ProviderError> {
    let data = response
        .candidates
        .iter()
        .flat_map(|c| c.content.parts.iter())
        .find_map(|p| p.inline_data.as_ref())
        .ok_or(ProviderError::EmptyContent)?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(&data.data)
        .map_err(|e| ProviderError::BadPayload(e.to_string()))?;
    Ok(Bytes::from(bytes))
}

#[async_trait]
impl GenerationProvider for GeminiClient {
    async fn generate_text(&self, prompt: &str, system: &str) -> Result<String, ProviderError> {
        let response = self.call(TEXT_MODEL, &Self::text_request(prompt, system)).await?;
        first_text(&response)
    }

    async fn generate_audio(&self, text: &str, voice: &str) -> Result<Bytes, ProviderError> {
        let request = GeminiRequest {
            contents: vec![json!({"parts": [{"text": text}]})],
            system_instruction: None,
            generation_config: Some(json!({
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": {"voiceName": voice}
                    }
                }
            })),
        };
        let response = self.call(TTS_MODEL, &request).await?;
        first_binary(&response)
    }

    async fn generate_image(&self, prompt: &str) -> Result<Bytes, ProviderError> {
        let request = GeminiRequest {
            contents: vec![json!({"parts": [{"text": prompt}]})],
            system_instruction: None,
            generation_config: Some(json!({
                "responseModalities": ["IMAGE"]
            })),
        };
        let response = self.call(IMAGE_MODEL, &request).await?;
        first_binary(&response)
    }
}
