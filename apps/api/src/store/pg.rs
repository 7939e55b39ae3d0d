//! Postgres implementation of the store traits.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::content::{ContentFeedItemRow, NewContentFeedItem};
use crate::models::job::{DedupKey, GenerationJobRow, NewJob};
use crate::models::region::RegionCropStageRow;
use crate::store::{ContentStore, JobStore, RegionStageStore, StoreError};

/// Single store handle over the shared pool; implements all three store
/// traits. Constructed once at startup and injected into each component.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RegionStageStore for PgStore {
    async fn all_rules(&self) -> Result<Vec<RegionCropStageRow>, StoreError> {
        let rules = sqlx::query_as::<_, RegionCropStageRow>(
            "SELECT * FROM region_crop_stages ORDER BY region_code, crop_code, growth_stage",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rules)
    }
}

#[async_trait]
impl JobStore for PgStore {
    async fn insert_jobs(&self, jobs: &[NewJob]) -> Result<Vec<GenerationJobRow>, StoreError> {
        let mut inserted = Vec::with_capacity(jobs.len());
        for job in jobs {
            let row = sqlx::query_as::<_, GenerationJobRow>(
                r#"
                INSERT INTO generation_jobs
                    (id, content_type, region_code, crop_code, growth_stage, language, status)
                VALUES ($1, $2, $3, $4, $5, $6, 'pending')
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(job.content_type.as_str())
            .bind(&job.region_code)
            .bind(&job.crop_code)
            .bind(&job.growth_stage)
            .bind(&job.language)
            .fetch_one(&self.pool)
            .await?;
            inserted.push(row);
        }
        Ok(inserted)
    }

    async fn pending_dedup_keys(&self) -> Result<HashSet<DedupKey>, StoreError> {
        let rows: Vec<(String, String, String, Option<String>, String)> = sqlx::query_as(
            r#"
            SELECT content_type, region_code, crop_code, growth_stage, language
            FROM generation_jobs
            WHERE status = 'pending'
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(content_type, region_code, crop_code, growth_stage, language)| DedupKey {
                    content_type,
                    region_code,
                    crop_code,
                    growth_stage,
                    language,
                },
            )
            .collect())
    }

    async fn pending_jobs(&self) -> Result<Vec<GenerationJobRow>, StoreError> {
        let rows = sqlx::query_as::<_, GenerationJobRow>(
            "SELECT * FROM generation_jobs WHERE status = 'pending' ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn fetch_job(&self, id: Uuid) -> Result<Option<GenerationJobRow>, StoreError> {
        let row = sqlx::query_as::<_, GenerationJobRow>(
            "SELECT * FROM generation_jobs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn claim_job(&self, id: Uuid) -> Result<Option<GenerationJobRow>, StoreError> {
        // Atomic conditional update — losing the race returns no row.
        let row = sqlx::query_as::<_, GenerationJobRow>(
            r#"
            UPDATE generation_jobs
            SET status = 'in_progress', updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn mark_completed(&self, id: Uuid, content_id: Uuid) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE generation_jobs
            SET status = 'completed', content_id = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(content_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE generation_jobs
            SET status = 'failed', attempt_count = attempt_count + 1, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn requeue_retryable(&self, max_attempts: i32) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE generation_jobs
            SET status = 'pending', updated_at = NOW()
            WHERE status = 'failed' AND attempt_count < $1
            "#,
        )
        .bind(max_attempts)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn reset_in_progress(&self) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE generation_jobs
            SET status = 'pending', updated_at = NOW()
            WHERE status = 'in_progress'
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ContentStore for PgStore {
    async fn insert_item(
        &self,
        item: NewContentFeedItem,
    ) -> Result<ContentFeedItemRow, StoreError> {
        let row = sqlx::query_as::<_, ContentFeedItemRow>(
            r#"
            INSERT INTO content_feed_items
                (id, content_type, title, summary, language, audio_url, video_url,
                 image_urls, article_body, tags, crop_tags, region_tags, crop_stage,
                 starter_questions, valid_from, valid_to, is_published)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, false)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&item.content_type)
        .bind(&item.title)
        .bind(&item.summary)
        .bind(&item.language)
        .bind(&item.audio_url)
        .bind(&item.video_url)
        .bind(&item.image_urls)
        .bind(&item.article_body)
        .bind(&item.tags)
        .bind(&item.crop_tags)
        .bind(&item.region_tags)
        .bind(&item.crop_stage)
        .bind(&item.starter_questions)
        .bind(item.valid_from)
        .bind(item.valid_to)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn fetch_item(&self, id: Uuid) -> Result<Option<ContentFeedItemRow>, StoreError> {
        let row = sqlx::query_as::<_, ContentFeedItemRow>(
            "SELECT * FROM content_feed_items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn publish_due(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE content_feed_items
            SET is_published = true
            WHERE is_published = false AND valid_from <= $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE content_feed_items
            SET is_published = false
            WHERE is_published = true AND valid_to IS NOT NULL AND valid_to < $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn published_feed(
        &self,
        language: &str,
        limit: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<ContentFeedItemRow>, StoreError> {
        let rows = sqlx::query_as::<_, ContentFeedItemRow>(
            r#"
            SELECT * FROM content_feed_items
            WHERE is_published = true
              AND language = $1
              AND valid_from <= $3
              AND (valid_to IS NULL OR valid_to >= $3)
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(language)
        .bind(limit)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
