//! Job Factory — turns matched stages and a trend summary into an ordered,
//! deduplicated batch of pending generation jobs.

use std::collections::HashSet;

use crate::models::job::{ContentType, DedupKey, NewJob};
use crate::models::region::RegionCropStageRow;
use crate::planner::trends::{TrendEntry, TrendSummary};

/// Weights for the trend priority boost. Ordering policy only — a boost
/// never decides whether a job runs, just how early it is dispatched.
#[derive(Debug, Clone, Copy)]
pub struct TrendBoost {
    pub crop_weight: f64,
    pub region_weight: f64,
}

impl Default for TrendBoost {
    fn default() -> Self {
        Self {
            crop_weight: 1.0,
            region_weight: 0.5,
        }
    }
}

/// Proposes one job per stage × content type × language, skipping any
/// dedup key already present in `existing` (still-pending jobs from prior
/// cycles). An empty stage set yields an empty batch, not an error.
pub fn build_jobs(
    stages: &[RegionCropStageRow],
    trends: &TrendSummary,
    languages: &[String],
    existing: &HashSet<DedupKey>,
    boost: TrendBoost,
) -> Vec<NewJob> {
    let mut seen = existing.clone();
    let mut jobs = Vec::new();

    for stage in stages {
        for content_type in ContentType::ALL {
            for language in languages {
                let job = NewJob {
                    content_type,
                    region_code: stage.region_code.clone(),
                    crop_code: stage.crop_code.clone(),
                    growth_stage: Some(stage.growth_stage.clone()),
                    language: language.clone(),
                };
                if seen.insert(job.dedup_key()) {
                    jobs.push(job);
                }
            }
        }
    }

    if !trends.is_empty() {
        // Stable sort: equal-boost jobs keep their stage order.
        jobs.sort_by(|a, b| {
            trend_boost(b, trends, boost)
                .partial_cmp(&trend_boost(a, trends, boost))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    jobs
}

fn trend_boost(job: &NewJob, trends: &TrendSummary, boost: TrendBoost) -> f64 {
    boost.crop_weight * score_for(&trends.top_crops, &job.crop_code)
        + boost.region_weight * score_for(&trends.top_regions, &job.region_code)
}

fn score_for(entries: &[TrendEntry], code: &str) -> f64 {
    entries
        .iter()
        .find(|e| e.code == code)
        .map(|e| e.score)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn make_stage(region: &str, crop: &str, stage: &str) -> RegionCropStageRow {
        RegionCropStageRow {
            id: Uuid::new_v4(),
            region_code: region.to_string(),
            crop_code: crop.to_string(),
            growth_stage: stage.to_string(),
            stage_start_month: 6,
            stage_end_month: 9,
            stage_start_week: None,
            stage_end_week: None,
            created_at: Utc::now(),
        }
    }

    fn languages(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_one_stage_two_languages_yields_four_jobs() {
        let stages = vec![make_stage("mekong-delta", "rice", "growing")];
        let jobs = build_jobs(
            &stages,
            &TrendSummary::default(),
            &languages(&["vi", "en"]),
            &HashSet::new(),
            TrendBoost::default(),
        );
        // 2 content types × 1 stage × 2 languages
        assert_eq!(jobs.len(), 4);
    }

    #[test]
    fn test_empty_stage_set_yields_empty_batch() {
        let jobs = build_jobs(
            &[],
            &TrendSummary::default(),
            &languages(&["vi"]),
            &HashSet::new(),
            TrendBoost::default(),
        );
        assert!(jobs.is_empty());
    }

    #[test]
    fn test_existing_pending_keys_suppress_duplicates() {
        let stages = vec![make_stage("mekong-delta", "rice", "growing")];
        let langs = languages(&["vi"]);

        let first = build_jobs(
            &stages,
            &TrendSummary::default(),
            &langs,
            &HashSet::new(),
            TrendBoost::default(),
        );
        assert_eq!(first.len(), 2);

        let existing: HashSet<_> = first.iter().map(|j| j.dedup_key()).collect();
        let second = build_jobs(
            &stages,
            &TrendSummary::default(),
            &langs,
            &existing,
            TrendBoost::default(),
        );
        assert!(second.is_empty(), "unchanged stage set must dedup to empty");
    }

    #[test]
    fn test_within_batch_duplicate_stages_deduped() {
        let stages = vec![
            make_stage("mekong-delta", "rice", "growing"),
            make_stage("mekong-delta", "rice", "growing"),
        ];
        let jobs = build_jobs(
            &stages,
            &TrendSummary::default(),
            &languages(&["vi"]),
            &HashSet::new(),
            TrendBoost::default(),
        );
        assert_eq!(jobs.len(), 2);
    }

    #[test]
    fn test_trending_crop_sorts_first() {
        let stages = vec![
            make_stage("red-river-delta", "maize", "sowing"),
            make_stage("mekong-delta", "rice", "growing"),
        ];
        let trends = TrendSummary {
            top_crops: vec![TrendEntry {
                code: "rice".to_string(),
                score: 0.9,
            }],
            top_practices: vec![],
            top_regions: vec![],
        };
        let jobs = build_jobs(
            &stages,
            &trends,
            &languages(&["vi"]),
            &HashSet::new(),
            TrendBoost::default(),
        );
        assert_eq!(jobs[0].crop_code, "rice");
        assert_eq!(jobs[1].crop_code, "rice");
        assert_eq!(jobs[2].crop_code, "maize");
    }

    #[test]
    fn test_no_trends_preserves_stage_order() {
        let stages = vec![
            make_stage("red-river-delta", "maize", "sowing"),
            make_stage("mekong-delta", "rice", "growing"),
        ];
        let jobs = build_jobs(
            &stages,
            &TrendSummary::default(),
            &languages(&["vi"]),
            &HashSet::new(),
            TrendBoost::default(),
        );
        assert_eq!(jobs[0].crop_code, "maize");
    }

    #[test]
    fn test_region_weight_contributes_to_boost() {
        let stages = vec![
            make_stage("red-river-delta", "maize", "sowing"),
            make_stage("mekong-delta", "rice", "growing"),
        ];
        let trends = TrendSummary {
            top_crops: vec![],
            top_practices: vec![],
            top_regions: vec![TrendEntry {
                code: "mekong-delta".to_string(),
                score: 1.0,
            }],
        };
        let jobs = build_jobs(
            &stages,
            &trends,
            &languages(&["vi"]),
            &HashSet::new(),
            TrendBoost::default(),
        );
        assert_eq!(jobs[0].region_code, "mekong-delta");
    }
}
