//! Persistent store contracts for jobs, content, and reference data.
//!
//! The Postgres implementation lives in `pg`; components receive these as
//! injected `Arc<dyn …>` handles so the pipeline can be exercised against
//! in-memory fakes in tests.

pub mod pg;

#[cfg(test)]
pub mod memory;

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::content::{ContentFeedItemRow, NewContentFeedItem};
use crate::models::job::{DedupKey, GenerationJobRow, NewJob};
use crate::models::region::RegionCropStageRow;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Read-only access to the seeded region/crop/stage rules.
#[async_trait]
pub trait RegionStageStore: Send + Sync {
    async fn all_rules(&self) -> Result<Vec<RegionCropStageRow>, StoreError>;
}

/// CRUD plus the lifecycle transitions over generation jobs.
///
/// Status writes are single-row conditional updates: a job claimed by one
/// worker is never picked up by another.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Inserts jobs as `pending`, preserving the given order in the result.
    async fn insert_jobs(&self, jobs: &[NewJob]) -> Result<Vec<GenerationJobRow>, StoreError>;

    /// Dedup keys of all still-pending jobs, queried before a planning cycle.
    async fn pending_dedup_keys(&self) -> Result<HashSet<DedupKey>, StoreError>;

    /// All pending jobs in creation order.
    async fn pending_jobs(&self) -> Result<Vec<GenerationJobRow>, StoreError>;

    async fn fetch_job(&self, id: Uuid) -> Result<Option<GenerationJobRow>, StoreError>;

    /// Conditional claim: `pending → in_progress`. Returns `None` when the
    /// job does not exist or is not pending (claim race lost).
    async fn claim_job(&self, id: Uuid) -> Result<Option<GenerationJobRow>, StoreError>;

    async fn mark_completed(&self, id: Uuid, content_id: Uuid) -> Result<(), StoreError>;

    /// `→ failed`, incrementing `attempt_count`.
    async fn mark_failed(&self, id: Uuid) -> Result<(), StoreError>;

    /// `failed → pending` for jobs with attempts left. Returns rows moved.
    async fn requeue_retryable(&self, max_attempts: i32) -> Result<u64, StoreError>;

    /// `in_progress → pending`, for crashed or cancelled runs. Returns rows moved.
    async fn reset_in_progress(&self) -> Result<u64, StoreError>;
}

/// CRUD plus the publish-window scans over content feed items.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn insert_item(&self, item: NewContentFeedItem)
        -> Result<ContentFeedItemRow, StoreError>;

    async fn fetch_item(&self, id: Uuid) -> Result<Option<ContentFeedItemRow>, StoreError>;

    /// Publishes rows whose validity window has opened. Returns rows flipped.
    async fn publish_due(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;

    /// Unpublishes rows whose `valid_to` has passed, leaving `valid_to`
    /// itself untouched. Returns rows flipped.
    async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;

    /// Published, currently-valid items for a language, newest first.
    async fn published_feed(
        &self,
        language: &str,
        limit: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<ContentFeedItemRow>, StoreError>;
}
