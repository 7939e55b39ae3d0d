use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A temporal rule mapping a region and crop to a growth stage window.
///
/// Immutable reference data, seeded administratively. Month bounds are
/// inclusive and may wrap year-end (start=11, end=2 covers Nov–Feb).
/// Week bounds, when present, refine matching within the matched months.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RegionCropStageRow {
    pub id: Uuid,
    pub region_code: String,
    pub crop_code: String,
    pub growth_stage: String,
    pub stage_start_month: i16,
    pub stage_end_month: i16,
    pub stage_start_week: Option<i16>,
    pub stage_end_week: Option<i16>,
    pub created_at: DateTime<Utc>,
}
