//! Region-Stage Mapper — resolves which region/crop/growth-stage rules are
//! active for a calendar position. Pure function over reference data.

use crate::errors::AppError;
use crate::models::region::RegionCropStageRow;

/// Week-of-month for a day 1–31: `ceil(day / 7)`, capped at 4 so days
/// 29–31 fold into week 4.
pub fn week_of_month(day: u32) -> u32 {
    day.div_ceil(7).min(4)
}

/// Returns the rules active at (`month`, `week_of_month`).
///
/// A rule matches when the month falls inside its inclusive month range
/// (which may wrap year-end) and the week satisfies whichever week bounds
/// the rule carries. Rules without week bounds match every week of their
/// months.
pub fn active_stages(
    month: u32,
    week_of_month: u32,
    rules: &[RegionCropStageRow],
) -> Result<Vec<RegionCropStageRow>, AppError> {
    if !(1..=12).contains(&month) {
        return Err(AppError::InvalidArgument(format!(
            "month must be 1..=12, got {month}"
        )));
    }
    if !(1..=4).contains(&week_of_month) {
        return Err(AppError::InvalidArgument(format!(
            "week_of_month must be 1..=4, got {week_of_month}"
        )));
    }

    Ok(rules
        .iter()
        .filter(|rule| {
            month_in_range(month, rule.stage_start_month, rule.stage_end_month)
                && week_in_bounds(week_of_month, rule.stage_start_week, rule.stage_end_week)
        })
        .cloned()
        .collect())
}

fn month_in_range(month: u32, start: i16, end: i16) -> bool {
    let m = month as i16;
    if start <= end {
        (start..=end).contains(&m)
    } else {
        // Wrap-around range, e.g. start=11 end=2 covers Nov–Feb.
        m >= start || m <= end
    }
}

fn week_in_bounds(week: u32, start: Option<i16>, end: Option<i16>) -> bool {
    let w = week as i16;
    start.map_or(true, |s| w >= s) && end.map_or(true, |e| w <= e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn make_rule(
        start_month: i16,
        end_month: i16,
        start_week: Option<i16>,
        end_week: Option<i16>,
    ) -> RegionCropStageRow {
        RegionCropStageRow {
            id: Uuid::new_v4(),
            region_code: "mekong-delta".to_string(),
            crop_code: "rice".to_string(),
            growth_stage: "growing".to_string(),
            stage_start_month: start_month,
            stage_end_month: end_month,
            stage_start_week: start_week,
            stage_end_week: end_week,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_week_of_month_ceil_and_cap() {
        assert_eq!(week_of_month(1), 1);
        assert_eq!(week_of_month(7), 1);
        assert_eq!(week_of_month(8), 2);
        assert_eq!(week_of_month(15), 3);
        assert_eq!(week_of_month(28), 4);
        // Days 29–31 fold into week 4.
        assert_eq!(week_of_month(29), 4);
        assert_eq!(week_of_month(31), 4);
    }

    #[test]
    fn test_wrap_around_range_matches_exactly_nov_through_feb() {
        let rules = vec![make_rule(11, 2, None, None)];
        for month in 1..=12 {
            let matched = active_stages(month, 1, &rules).unwrap();
            let expected = matches!(month, 11 | 12 | 1 | 2);
            assert_eq!(
                !matched.is_empty(),
                expected,
                "month {month} match mismatch"
            );
        }
    }

    #[test]
    fn test_no_week_bounds_matches_every_week() {
        let rules = vec![make_rule(6, 9, None, None)];
        for week in 1..=4 {
            assert_eq!(active_stages(7, week, &rules).unwrap().len(), 1);
        }
    }

    #[test]
    fn test_week_bounds_restrict_within_month() {
        let rules = vec![make_rule(6, 9, Some(2), Some(3))];
        assert!(active_stages(7, 1, &rules).unwrap().is_empty());
        assert_eq!(active_stages(7, 2, &rules).unwrap().len(), 1);
        assert_eq!(active_stages(7, 3, &rules).unwrap().len(), 1);
        assert!(active_stages(7, 4, &rules).unwrap().is_empty());
    }

    #[test]
    fn test_half_open_week_bounds() {
        let only_start = vec![make_rule(6, 9, Some(3), None)];
        assert!(active_stages(6, 2, &only_start).unwrap().is_empty());
        assert_eq!(active_stages(6, 4, &only_start).unwrap().len(), 1);

        let only_end = vec![make_rule(6, 9, None, Some(2))];
        assert_eq!(active_stages(6, 1, &only_end).unwrap().len(), 1);
        assert!(active_stages(6, 3, &only_end).unwrap().is_empty());
    }

    #[test]
    fn test_mekong_delta_rice_mid_july_scenario() {
        // July 15: month=7, week=ceil(15/7)=3, rule 6..=9 without week bounds.
        let rules = vec![make_rule(6, 9, None, None)];
        let week = week_of_month(15);
        assert_eq!(week, 3);
        let matched = active_stages(7, week, &rules).unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].region_code, "mekong-delta");
        assert_eq!(matched[0].crop_code, "rice");
    }

    #[test]
    fn test_invalid_calendar_input_rejected() {
        assert!(matches!(
            active_stages(0, 1, &[]),
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            active_stages(13, 1, &[]),
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            active_stages(6, 0, &[]),
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            active_stages(6, 5, &[]),
            Err(AppError::InvalidArgument(_))
        ));
    }
}
