//! Image article pipeline: sections → images → batch upload.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::generator::prompts::{fill_template, ARTICLE_PROMPT_TEMPLATE, ARTICLE_SYSTEM};
use crate::generator::DraftContent;
use crate::media::MediaStore;
use crate::models::content::ArticleSection;
use crate::models::job::GenerationJobRow;
use crate::provider::{parse_json, GenerationProvider};

/// Structured article returned by the text model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleDraft {
    pub title: String,
    pub summary: String,
    pub sections: Vec<ArticleSection>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub starter_questions: Vec<String>,
}

/// Runs the image-article pipeline for one claimed job. All images are
/// generated before any upload starts, so a provider failure aborts the
/// job with nothing persisted anywhere.
pub async fn run(
    provider: &dyn GenerationProvider,
    media: &dyn MediaStore,
    job: &GenerationJobRow,
) -> Result<DraftContent, AppError> {
    let prompt = fill_template(ARTICLE_PROMPT_TEMPLATE, job);
    let raw = provider.generate_text(&prompt, ARTICLE_SYSTEM).await?;
    let draft: ArticleDraft = parse_json(&raw)?;

    if draft.sections.is_empty() {
        return Err(AppError::ProviderUnavailable(
            "provider returned an article with no sections".to_string(),
        ));
    }
    info!(
        "Job {}: article generated ({} sections)",
        job.id,
        draft.sections.len()
    );

    // One image per section that requests one.
    let mut generated: Vec<(usize, Bytes)> = Vec::new();
    for (idx, section) in draft.sections.iter().enumerate() {
        if let Some(image_prompt) = &section.image_prompt {
            let image = provider.generate_image(image_prompt).await?;
            generated.push((idx, image));
        }
    }
    info!("Job {}: {} section images generated", job.id, generated.len());

    let mut sections = draft.sections;
    let mut image_urls = Vec::with_capacity(generated.len());
    for (idx, image) in generated {
        let key = format!("articles/{}/{}-{}.png", job.language, job.id, idx);
        let url = media.upload(&key, image, "image/png").await?;
        sections[idx].image_url = Some(url.clone());
        image_urls.push(url);
    }

    // The stored body keeps headings, text, and image URLs; the prompt
    // that produced each image is not part of the artifact.
    for section in &mut sections {
        section.image_prompt = None;
    }
    let article_body = serde_json::to_value(&sections)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to serialize sections: {e}")))?;

    Ok(DraftContent {
        title: draft.title,
        summary: draft.summary,
        audio_url: None,
        image_urls,
        article_body: Some(article_body),
        tags: draft.tags,
        starter_questions: draft.starter_questions,
    })
}
