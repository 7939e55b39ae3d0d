//! In-memory store fakes for exercising the pipeline without Postgres.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::content::{ContentFeedItemRow, NewContentFeedItem};
use crate::models::job::{DedupKey, GenerationJobRow, JobStatus, NewJob};
use crate::models::region::RegionCropStageRow;
use crate::store::{ContentStore, JobStore, RegionStageStore, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    pub rules: Mutex<Vec<RegionCropStageRow>>,
    jobs: Mutex<Vec<GenerationJobRow>>,
    items: Mutex<Vec<ContentFeedItemRow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job(&self, id: Uuid) -> Option<GenerationJobRow> {
        self.jobs.lock().unwrap().iter().find(|j| j.id == id).cloned()
    }

    pub fn items(&self) -> Vec<ContentFeedItemRow> {
        self.items.lock().unwrap().clone()
    }

    /// Seeds a job in an arbitrary state, bypassing the factory.
    pub fn seed_job(&self, job: GenerationJobRow) {
        self.jobs.lock().unwrap().push(job);
    }

    pub fn seed_item(&self, item: ContentFeedItemRow) {
        self.items.lock().unwrap().push(item);
    }
}

#[async_trait]
impl RegionStageStore for MemoryStore {
    async fn all_rules(&self) -> Result<Vec<RegionCropStageRow>, StoreError> {
        Ok(self.rules.lock().unwrap().clone())
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn insert_jobs(&self, jobs: &[NewJob]) -> Result<Vec<GenerationJobRow>, StoreError> {
        let now = Utc::now();
        let mut store = self.jobs.lock().unwrap();
        let mut inserted = Vec::with_capacity(jobs.len());
        for job in jobs {
            let row = GenerationJobRow {
                id: Uuid::new_v4(),
                content_type: job.content_type.as_str().to_string(),
                region_code: job.region_code.clone(),
                crop_code: job.crop_code.clone(),
                growth_stage: job.growth_stage.clone(),
                language: job.language.clone(),
                status: JobStatus::Pending.as_str().to_string(),
                attempt_count: 0,
                content_id: None,
                created_at: now,
                updated_at: now,
            };
            store.push(row.clone());
            inserted.push(row);
        }
        Ok(inserted)
    }

    async fn pending_dedup_keys(&self) -> Result<HashSet<DedupKey>, StoreError> {
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|j| j.status == JobStatus::Pending.as_str())
            .map(|j| j.dedup_key())
            .collect())
    }

    async fn pending_jobs(&self) -> Result<Vec<GenerationJobRow>, StoreError> {
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|j| j.status == JobStatus::Pending.as_str())
            .cloned()
            .collect())
    }

    async fn fetch_job(&self, id: Uuid) -> Result<Option<GenerationJobRow>, StoreError> {
        Ok(self.job(id))
    }

    async fn claim_job(&self, id: Uuid) -> Result<Option<GenerationJobRow>, StoreError> {
        let mut store = self.jobs.lock().unwrap();
        match store.iter_mut().find(|j| j.id == id) {
            Some(job) if job.status == JobStatus::Pending.as_str() => {
                job.status = JobStatus::InProgress.as_str().to_string();
                job.updated_at = Utc::now();
                Ok(Some(job.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn mark_completed(&self, id: Uuid, content_id: Uuid) -> Result<(), StoreError> {
        let mut store = self.jobs.lock().unwrap();
        if let Some(job) = store.iter_mut().find(|j| j.id == id) {
            job.status = JobStatus::Completed.as_str().to_string();
            job.content_id = Some(content_id);
            job.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid) -> Result<(), StoreError> {
        let mut store = self.jobs.lock().unwrap();
        if let Some(job) = store.iter_mut().find(|j| j.id == id) {
            job.status = JobStatus::Failed.as_str().to_string();
            job.attempt_count += 1;
            job.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn requeue_retryable(&self, max_attempts: i32) -> Result<u64, StoreError> {
        let mut store = self.jobs.lock().unwrap();
        let mut moved = 0;
        for job in store.iter_mut() {
            if job.status == JobStatus::Failed.as_str() && job.attempt_count < max_attempts {
                job.status = JobStatus::Pending.as_str().to_string();
                moved += 1;
            }
        }
        Ok(moved)
    }

    async fn reset_in_progress(&self) -> Result<u64, StoreError> {
        let mut store = self.jobs.lock().unwrap();
        let mut moved = 0;
        for job in store.iter_mut() {
            if job.status == JobStatus::InProgress.as_str() {
                job.status = JobStatus::Pending.as_str().to_string();
                moved += 1;
            }
        }
        Ok(moved)
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn insert_item(
        &self,
        item: NewContentFeedItem,
    ) -> Result<ContentFeedItemRow, StoreError> {
        let row = ContentFeedItemRow {
            id: Uuid::new_v4(),
            content_type: item.content_type,
            title: item.title,
            summary: item.summary,
            language: item.language,
            audio_url: item.audio_url,
            video_url: item.video_url,
            image_urls: item.image_urls,
            article_body: item.article_body,
            tags: item.tags,
            crop_tags: item.crop_tags,
            region_tags: item.region_tags,
            crop_stage: item.crop_stage,
            starter_questions: item.starter_questions,
            valid_from: item.valid_from,
            valid_to: item.valid_to,
            is_published: false,
            created_at: Utc::now(),
        };
        self.items.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn fetch_item(&self, id: Uuid) -> Result<Option<ContentFeedItemRow>, StoreError> {
        Ok(self.items.lock().unwrap().iter().find(|i| i.id == id).cloned())
    }

    async fn publish_due(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut items = self.items.lock().unwrap();
        let mut flipped = 0;
        for item in items.iter_mut() {
            if !item.is_published && item.valid_from <= now {
                item.is_published = true;
                flipped += 1;
            }
        }
        Ok(flipped)
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut items = self.items.lock().unwrap();
        let mut flipped = 0;
        for item in items.iter_mut() {
            if item.is_published && item.valid_to.is_some_and(|t| t < now) {
                item.is_published = false;
                flipped += 1;
            }
        }
        Ok(flipped)
    }

    async fn published_feed(
        &self,
        language: &str,
        limit: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<ContentFeedItemRow>, StoreError> {
        let mut rows: Vec<ContentFeedItemRow> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| {
                i.is_published
                    && i.language == language
                    && i.valid_from <= now
                    && i.valid_to.map_or(true, |t| t >= now)
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stuck_job() -> GenerationJobRow {
        let now = Utc::now();
        GenerationJobRow {
            id: Uuid::new_v4(),
            content_type: "podcast".to_string(),
            region_code: "mekong-delta".to_string(),
            crop_code: "rice".to_string(),
            growth_stage: Some("growing".to_string()),
            language: "vi".to_string(),
            status: JobStatus::InProgress.as_str().to_string(),
            attempt_count: 0,
            content_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_claim_is_exclusive() {
        let store = MemoryStore::new();
        let mut job = stuck_job();
        job.status = JobStatus::Pending.as_str().to_string();
        let id = job.id;
        store.seed_job(job);

        assert!(store.claim_job(id).await.unwrap().is_some());
        assert!(
            store.claim_job(id).await.unwrap().is_none(),
            "second claim must lose the race"
        );
    }

    #[tokio::test]
    async fn test_stuck_in_progress_job_claimable_after_reset() {
        // A job left in_progress by a crashed run.
        let store = MemoryStore::new();
        let job = stuck_job();
        let id = job.id;
        store.seed_job(job);

        assert!(store.claim_job(id).await.unwrap().is_none());

        assert_eq!(store.reset_in_progress().await.unwrap(), 1);
        assert_eq!(store.job(id).unwrap().status, "pending");
        assert!(
            store.claim_job(id).await.unwrap().is_some(),
            "reset job must be claimable again"
        );
    }
}
