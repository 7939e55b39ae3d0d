//! Axum route handlers — thin wrappers over the core operations.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generator::execute_job;
use crate::models::content::ContentFeedItemRow;
use crate::planner::plan_weekly_content;
use crate::scheduler::clock::Clock;
use crate::state::AppState;
use crate::store::ContentStore;

const DEFAULT_FEED_LIMIT: i64 = 10;
const MAX_FEED_LIMIT: i64 = 50;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub jobs_created: usize,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentRequest {
    pub job_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct GenerateContentResponse {
    pub job_id: Uuid,
    pub content_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct FeedParams {
    pub language: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub data: Vec<ContentFeedItemRow>,
    pub count: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /mcp/plan_weekly_content
///
/// Runs one planning cycle now. Per-job generation failures are never
/// visible here — the response is only the number of jobs created.
pub async fn handle_plan_weekly_content(
    State(state): State<AppState>,
) -> Result<Json<PlanResponse>, AppError> {
    let outcome = plan_weekly_content(
        state.clock.as_ref(),
        state.stages.as_ref(),
        state.trends.as_ref(),
        state.jobs.as_ref(),
        &state.config,
    )
    .await?;

    Ok(Json(PlanResponse {
        jobs_created: outcome.jobs_created,
    }))
}

/// POST /mcp/generate_content
///
/// Synchronously executes a single job — the manual retry/testing path.
/// Returns the specific error kind on failure and never retries.
pub async fn handle_generate_content(
    State(state): State<AppState>,
    Json(request): Json<GenerateContentRequest>,
) -> Result<Json<GenerateContentResponse>, AppError> {
    let item = execute_job(
        state.jobs.as_ref(),
        state.content.as_ref(),
        state.provider.as_ref(),
        state.media.as_ref(),
        state.clock.as_ref(),
        &state.config,
        request.job_id,
    )
    .await?;

    Ok(Json(GenerateContentResponse {
        job_id: request.job_id,
        content_id: item.id,
    }))
}

/// GET /api/feed?language=&limit=
///
/// Published, currently-valid items for a language, newest first.
pub async fn handle_feed(
    State(state): State<AppState>,
    Query(params): Query<FeedParams>,
) -> Result<Json<FeedResponse>, AppError> {
    let language = params
        .language
        .or_else(|| state.config.languages.first().cloned())
        .unwrap_or_else(|| "vi".to_string());
    let limit = params
        .limit
        .unwrap_or(DEFAULT_FEED_LIMIT)
        .clamp(1, MAX_FEED_LIMIT);

    let items = state
        .content
        .published_feed(&language, limit, state.clock.now())
        .await?;

    Ok(Json(FeedResponse {
        count: items.len(),
        data: items,
    }))
}

/// GET /api/content/:id
pub async fn handle_get_content(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ContentFeedItemRow>, AppError> {
    let item = state
        .content
        .fetch_item(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Content {id} not found")))?;

    Ok(Json(item))
}
