use chrono::Duration;

use crate::model::{AttendanceIssue, DailyAttendance, FlexibleHoursRule, LatePenaltyRule};

/// Applies the flexible-start grace window and the tiered late-penalty
/// schedule to one day, filling in `penalty_minutes` and
/// `adjusted_hours`.
///
/// Days without a sign-in, days with an issue, and days evaluated while
/// either rule is unconfigured pass through unpenalized. Tiers are
/// scanned in configured order; the first whose inclusive range contains
/// the lateness wins, and no tier matching means no penalty.
pub fn apply_rules(
    mut day: DailyAttendance,
    flexible: Option<&FlexibleHoursRule>,
    late_penalty: Option<&LatePenaltyRule>,
) -> DailyAttendance {
    day.penalty_minutes = 0;
    day.adjusted_hours = day.raw_hours;

    let (Some(flexible), Some(late_penalty)) = (flexible, late_penalty) else {
        return day;
    };
    let Some(sign_in) = day.sign_in else {
        return day;
    };
    if day.issue != AttendanceIssue::None {
        return day;
    }

    // Deadline is anchored to the sign-in's own calendar date, which for
    // an overnight sign-in is the date the punch happened, not the work
    // day it resolved to.
    let deadline = sign_in.date().and_time(flexible.official_start_time)
        + Duration::minutes(flexible.flexible_window_minutes);
    if sign_in <= deadline {
        return day;
    }

    let minutes_late = (sign_in - deadline).num_minutes();
    for tier in &late_penalty.tiers {
        if minutes_late >= tier.min_minutes_late && minutes_late <= tier.max_minutes_late {
            day.penalty_minutes = tier.penalty_minutes;
            break;
        }
    }

    day.adjusted_hours = (day.raw_hours - day.penalty_minutes as f64 / 60.0).max(0.0);
    day
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PenaltyTier;
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn flexible() -> FlexibleHoursRule {
        FlexibleHoursRule {
            official_start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            flexible_window_minutes: 30,
        }
    }

    fn tiers() -> LatePenaltyRule {
        LatePenaltyRule {
            tiers: vec![
                PenaltyTier {
                    min_minutes_late: 1,
                    max_minutes_late: 15,
                    penalty_minutes: 10,
                },
                PenaltyTier {
                    min_minutes_late: 16,
                    max_minutes_late: 30,
                    penalty_minutes: 30,
                },
            ],
        }
    }

    fn day_with_sign_in(s: &str, raw_hours: f64) -> DailyAttendance {
        let sign_in = ts(s);
        let mut day = DailyAttendance::empty(sign_in.date());
        day.sign_in = Some(sign_in);
        day.sign_out = Some(sign_in + Duration::hours(raw_hours as i64));
        day.raw_hours = raw_hours;
        day
    }

    #[test]
    fn within_flexible_window_is_not_late() {
        // Deadline is 09:30.
        let day = apply_rules(
            day_with_sign_in("2026-03-02 09:30:00", 8.0),
            Some(&flexible()),
            Some(&tiers()),
        );
        assert_eq!(day.penalty_minutes, 0);
        assert_eq!(day.adjusted_hours, 8.0);
    }

    #[test]
    fn twenty_minutes_late_hits_second_tier() {
        let day = apply_rules(
            day_with_sign_in("2026-03-02 09:50:00", 8.0),
            Some(&flexible()),
            Some(&tiers()),
        );
        assert_eq!(day.penalty_minutes, 30);
        assert!((day.adjusted_hours - 7.5).abs() < 1e-9);
    }

    #[test]
    fn lateness_beyond_all_tiers_is_unpenalized() {
        let day = apply_rules(
            day_with_sign_in("2026-03-02 11:00:00", 6.0),
            Some(&flexible()),
            Some(&tiers()),
        );
        assert_eq!(day.penalty_minutes, 0);
        assert_eq!(day.adjusted_hours, 6.0);
    }

    #[test]
    fn first_matching_tier_wins_in_configured_order() {
        let overlapping = LatePenaltyRule {
            tiers: vec![
                PenaltyTier {
                    min_minutes_late: 1,
                    max_minutes_late: 60,
                    penalty_minutes: 5,
                },
                PenaltyTier {
                    min_minutes_late: 1,
                    max_minutes_late: 60,
                    penalty_minutes: 45,
                },
            ],
        };
        let day = apply_rules(
            day_with_sign_in("2026-03-02 09:50:00", 8.0),
            Some(&flexible()),
            Some(&overlapping),
        );
        assert_eq!(day.penalty_minutes, 5);
    }

    #[test]
    fn missing_rules_skip_the_stage() {
        let day = apply_rules(day_with_sign_in("2026-03-02 11:00:00", 8.0), None, None);
        assert_eq!(day.penalty_minutes, 0);
        assert_eq!(day.adjusted_hours, 8.0);
    }

    #[test]
    fn day_with_issue_is_skipped() {
        let mut day = day_with_sign_in("2026-03-02 10:00:00", 0.0);
        day.sign_out = None;
        day.issue = AttendanceIssue::MissingSignOut;
        let day = apply_rules(day, Some(&flexible()), Some(&tiers()));
        assert_eq!(day.penalty_minutes, 0);
        assert_eq!(day.adjusted_hours, 0.0);
    }

    #[test]
    fn penalty_never_drives_hours_negative() {
        let mut day = day_with_sign_in("2026-03-02 09:50:00", 0.25);
        day.raw_hours = 0.25;
        let day = apply_rules(day, Some(&flexible()), Some(&tiers()));
        assert_eq!(day.penalty_minutes, 30);
        assert_eq!(day.adjusted_hours, 0.0);
    }

    #[test]
    fn leave_day_without_sign_in_passes_through() {
        let mut day = DailyAttendance::empty(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        day.raw_hours = 8.0;
        day.is_leave_day = true;
        let day = apply_rules(day, Some(&flexible()), Some(&tiers()));
        assert_eq!(day.penalty_minutes, 0);
        assert_eq!(day.adjusted_hours, 8.0);
    }
}
