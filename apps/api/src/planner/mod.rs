//! Weekly content planning — maps the calendar onto region/crop stages,
//! folds in trend signal, and creates the week's generation jobs.
//!
//! Flow: calendar position → active_stages → analyze trends (degrading to
//! no signal on failure) → build_jobs → persist pending jobs.

pub mod job_factory;
pub mod mapper;
pub mod trends;

use chrono::Datelike;
use tracing::{info, warn};

use crate::config::Config;
use crate::errors::AppError;
use crate::models::job::GenerationJobRow;
use crate::planner::job_factory::{build_jobs, TrendBoost};
use crate::planner::mapper::{active_stages, week_of_month};
use crate::planner::trends::{TrendAnalyzer, TrendSummary};
use crate::scheduler::clock::Clock;
use crate::store::{JobStore, RegionStageStore};

/// Lookback window for the weekly trend query.
const TREND_LOOKBACK_DAYS: u32 = 7;

/// Result of one planning cycle. `jobs` carries the created jobs in
/// dispatch priority order; an empty plan is a valid outcome.
#[derive(Debug)]
pub struct PlanOutcome {
    pub jobs_created: usize,
    pub jobs: Vec<GenerationJobRow>,
}

/// Runs one weekly planning cycle and persists the resulting jobs.
///
/// Trend-analysis failure is not a planning failure: the cycle proceeds on
/// region-stage mapping alone.
pub async fn plan_weekly_content(
    clock: &dyn Clock,
    stages: &dyn RegionStageStore,
    analyzer: &dyn TrendAnalyzer,
    jobs: &dyn JobStore,
    config: &Config,
) -> Result<PlanOutcome, AppError> {
    let local = clock.now().with_timezone(&config.schedule_offset);
    let month = local.month();
    let week = week_of_month(local.day());

    let rules = stages.all_rules().await?;
    let matched = active_stages(month, week, &rules)?;
    info!(
        "Planning cycle for month={month} week={week}: {} active stage rules",
        matched.len()
    );

    let trends = match analyzer.analyze(TREND_LOOKBACK_DAYS).await {
        Ok(summary) => summary,
        Err(e) => {
            warn!("Trend analysis unavailable, planning without trend signal: {e}");
            TrendSummary::default()
        }
    };

    if matched.is_empty() {
        info!("No active stage rules this week; planning produced no jobs");
        return Ok(PlanOutcome {
            jobs_created: 0,
            jobs: vec![],
        });
    }

    let existing = jobs.pending_dedup_keys().await?;
    let proposed = build_jobs(
        &matched,
        &trends,
        &config.languages,
        &existing,
        TrendBoost {
            crop_weight: config.trend_crop_weight,
            region_weight: config.trend_region_weight,
        },
    );

    let created = jobs.insert_jobs(&proposed).await?;
    info!("Planning created {} generation jobs", created.len());

    Ok(PlanOutcome {
        jobs_created: created.len(),
        jobs: created,
    })
}
