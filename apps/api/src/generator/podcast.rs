//! Podcast pipeline: script → audio → upload.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::generator::prompts::{fill_template, PODCAST_PROMPT_TEMPLATE, PODCAST_SYSTEM};
use crate::generator::DraftContent;
use crate::media::MediaStore;
use crate::models::job::GenerationJobRow;
use crate::provider::{parse_json, GenerationProvider};

/// Structured script returned by the text model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodcastScript {
    pub title: String,
    pub summary: String,
    pub script: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub starter_questions: Vec<String>,
}

/// Runs the podcast pipeline for one claimed job. Nothing is persisted
/// here; the caller writes the content row only after every stage and
/// upload succeeded.
pub async fn run(
    provider: &dyn GenerationProvider,
    media: &dyn MediaStore,
    job: &GenerationJobRow,
    voice: &str,
) -> Result<DraftContent, AppError> {
    let prompt = fill_template(PODCAST_PROMPT_TEMPLATE, job);
    let raw = provider.generate_text(&prompt, PODCAST_SYSTEM).await?;
    let script: PodcastScript = parse_json(&raw)?;
    info!("Job {}: script generated ({})", job.id, script.title);

    let audio = provider.generate_audio(&script.script, voice).await?;
    info!("Job {}: audio generated ({} bytes)", job.id, audio.len());

    let key = format!("podcasts/{}/{}.wav", job.language, job.id);
    let audio_url = media.upload(&key, audio, "audio/wav").await?;

    Ok(DraftContent {
        title: script.title,
        summary: script.summary,
        audio_url: Some(audio_url),
        image_urls: vec![],
        article_body: None,
        tags: script.tags,
        starter_questions: script.starter_questions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_podcast_script_deserializes_without_optional_lists() {
        let script: PodcastScript = serde_json::from_str(
            r#"{"title": "Rice week 3", "summary": "What to do now.", "script": "Hello farmers..."}"#,
        )
        .unwrap();
        assert_eq!(script.title, "Rice week 3");
        assert!(script.tags.is_empty());
        assert!(script.starter_questions.is_empty());
    }

    #[test]
    fn test_podcast_script_requires_script_body() {
        let result: Result<PodcastScript, _> =
            serde_json::from_str(r#"{"title": "t", "summary": "s"}"#);
        assert!(result.is_err());
    }
}
