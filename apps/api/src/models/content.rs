use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A generated content artifact. Created once by the orchestrator on a
/// successful job; only the publish scheduler mutates it afterwards
/// (toggling `is_published`). Never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContentFeedItemRow {
    pub id: Uuid,
    pub content_type: String,
    pub title: String,
    pub summary: String,
    pub language: String,
    pub audio_url: Option<String>,
    pub video_url: Option<String>,
    pub image_urls: Vec<String>,
    /// Ordered article sections for image articles; null for podcasts.
    pub article_body: Option<Value>,
    pub tags: Vec<String>,
    pub crop_tags: Vec<String>,
    pub region_tags: Vec<String>,
    pub crop_stage: Option<String>,
    pub starter_questions: Vec<String>,
    pub valid_from: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// A content item ready to be persisted. `is_published` always starts
/// false — publication is the scheduler's decision, not the generator's.
#[derive(Debug, Clone)]
pub struct NewContentFeedItem {
    pub content_type: String,
    pub title: String,
    pub summary: String,
    pub language: String,
    pub audio_url: Option<String>,
    pub video_url: Option<String>,
    pub image_urls: Vec<String>,
    pub article_body: Option<Value>,
    pub tags: Vec<String>,
    pub crop_tags: Vec<String>,
    pub region_tags: Vec<String>,
    pub crop_stage: Option<String>,
    pub starter_questions: Vec<String>,
    pub valid_from: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,
}

/// One section of an image article. `image_prompt` is the provider-facing
/// request and is dropped before the section is stored; `image_url` is
/// filled after upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleSection {
    pub heading: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}
