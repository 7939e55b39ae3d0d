//! Generation Orchestrator — runs one claimed job through its
//! content-type pipeline and persists the result.
//!
//! Flow: claim (pending → in_progress) → generate artifacts → upload →
//! insert ContentFeedItem → mark completed. Any failure marks the job
//! failed with nothing persisted: the content row is only written after
//! every artifact exists.

pub mod article;
pub mod podcast;
pub mod prompts;

use chrono::Duration;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::errors::AppError;
use crate::media::MediaStore;
use crate::models::content::{ContentFeedItemRow, NewContentFeedItem};
use crate::models::job::{ContentType, GenerationJobRow, JobStatus};
use crate::provider::GenerationProvider;
use crate::scheduler::clock::Clock;
use crate::store::{ContentStore, JobStore};

/// Artifacts produced by a pipeline, ready to become a content row.
#[derive(Debug, Clone)]
pub struct DraftContent {
    pub title: String,
    pub summary: String,
    pub audio_url: Option<String>,
    pub image_urls: Vec<String>,
    pub article_body: Option<Value>,
    pub tags: Vec<String>,
    pub starter_questions: Vec<String>,
}

/// Executes one generation job end to end.
///
/// Returns the created content item, or the specific error that aborted
/// the pipeline. The job is left `completed` or `failed`, never
/// `in_progress`.
pub async fn execute_job(
    jobs: &dyn JobStore,
    content: &dyn ContentStore,
    provider: &dyn GenerationProvider,
    media: &dyn MediaStore,
    clock: &dyn Clock,
    config: &Config,
    job_id: Uuid,
) -> Result<ContentFeedItemRow, AppError> {
    let Some(job) = jobs.claim_job(job_id).await? else {
        return match jobs.fetch_job(job_id).await? {
            None => Err(AppError::NotFound(format!("job {job_id} not found"))),
            Some(existing) if existing.status == JobStatus::InProgress.as_str() => Err(
                AppError::AlreadyInProgress(format!("job {job_id} is already being generated")),
            ),
            Some(existing) => Err(AppError::InvalidArgument(format!(
                "job {job_id} is {}, not pending",
                existing.status
            ))),
        };
    };

    info!(
        "Job {}: starting {} generation for {}/{} ({})",
        job.id, job.content_type, job.region_code, job.crop_code, job.language
    );

    match run_pipeline(content, provider, media, clock, config, &job).await {
        Ok(item) => {
            jobs.mark_completed(job.id, item.id).await?;
            info!("Job {}: completed, content {}", job.id, item.id);
            Ok(item)
        }
        Err(e) => {
            jobs.mark_failed(job.id).await?;
            let attempts = job.attempt_count + 1;
            if attempts >= config.max_job_attempts {
                error!(
                    "Job {} permanently failed after {attempts} attempts: {e}",
                    job.id
                );
            } else {
                warn!(
                    "Job {} failed (attempt {attempts}/{}), eligible for re-dispatch: {e}",
                    job.id, config.max_job_attempts
                );
            }
            Err(e)
        }
    }
}

/// Runs the content-type pipeline and persists the item. Persistence is
/// the final step so no row exists unless every artifact was produced and
/// uploaded.
async fn run_pipeline(
    content: &dyn ContentStore,
    provider: &dyn GenerationProvider,
    media: &dyn MediaStore,
    clock: &dyn Clock,
    config: &Config,
    job: &GenerationJobRow,
) -> Result<ContentFeedItemRow, AppError> {
    let content_type = ContentType::parse(&job.content_type).ok_or_else(|| {
        AppError::InvalidArgument(format!("unknown content type '{}'", job.content_type))
    })?;

    let draft = match content_type {
        ContentType::Podcast => {
            podcast::run(provider, media, job, &config.podcast_voice).await?
        }
        ContentType::ImageArticle => article::run(provider, media, job).await?,
    };

    let valid_from = clock.now();
    let valid_to = config
        .content_validity_days
        .map(|days| valid_from + Duration::days(days));

    let item = content
        .insert_item(NewContentFeedItem {
            content_type: job.content_type.clone(),
            title: draft.title,
            summary: draft.summary,
            language: job.language.clone(),
            audio_url: draft.audio_url,
            video_url: None,
            image_urls: draft.image_urls,
            article_body: draft.article_body,
            tags: draft.tags,
            crop_tags: vec![job.crop_code.clone()],
            region_tags: vec![job.region_code.clone()],
            crop_stage: job.growth_stage.clone(),
            starter_questions: draft.starter_questions,
            valid_from,
            valid_to,
        })
        .await?;

    Ok(item)
}
