use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The two content formats the pipeline can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Podcast,
    ImageArticle,
}

impl ContentType {
    pub const ALL: [ContentType; 2] = [ContentType::Podcast, ContentType::ImageArticle];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Podcast => "podcast",
            ContentType::ImageArticle => "image_article",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "podcast" => Some(ContentType::Podcast),
            "image_article" => Some(ContentType::ImageArticle),
            _ => None,
        }
    }
}

/// Job lifecycle states. A job is terminal once completed, or once failed
/// with no retries left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

/// The uniqueness key for a generation job within a planning cycle.
/// The Job Factory never creates two jobs with the same key while an
/// earlier one is still pending.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub content_type: String,
    pub region_code: String,
    pub crop_code: String,
    pub growth_stage: Option<String>,
    pub language: String,
}

/// A generation job proposed by the Job Factory, not yet persisted.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub content_type: ContentType,
    pub region_code: String,
    pub crop_code: String,
    pub growth_stage: Option<String>,
    pub language: String,
}

impl NewJob {
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            content_type: self.content_type.as_str().to_string(),
            region_code: self.region_code.clone(),
            crop_code: self.crop_code.clone(),
            growth_stage: self.growth_stage.clone(),
            language: self.language.clone(),
        }
    }
}

/// A persisted generation job. Exclusively owned by the orchestrator while
/// `status` is `in_progress`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GenerationJobRow {
    pub id: Uuid,
    pub content_type: String,
    pub region_code: String,
    pub crop_code: String,
    pub growth_stage: Option<String>,
    pub language: String,
    pub status: String,
    pub attempt_count: i32,
    pub content_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GenerationJobRow {
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            content_type: self.content_type.clone(),
            region_code: self.region_code.clone(),
            crop_code: self.crop_code.clone(),
            growth_stage: self.growth_stage.clone(),
            language: self.language.clone(),
        }
    }
}
