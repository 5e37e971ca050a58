use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::model::{DailyAttendance, PermissionOverride, PermissionRule};

/// Minutes available to cancel late penalties for a period: the monthly
/// allowance plus every ad-hoc override granted for this period start.
pub fn permission_pool(rule: Option<&PermissionRule>, overrides: &[PermissionOverride]) -> i64 {
    let standard = rule.map(|r| r.monthly_allowance_minutes).unwrap_or(0);
    standard + overrides.iter().map(|o| o.extra_minutes).sum::<i64>()
}

/// Spends the permission pool against accumulated penalties and returns
/// the period's net attended hours.
///
/// Permissions only ever buy back penalty minutes already subtracted
/// from `adjusted_hours`; unused pool capacity is lost at period end.
pub fn offset_penalties(days: &BTreeMap<NaiveDate, DailyAttendance>, pool_minutes: i64) -> f64 {
    let total_adjusted: f64 = days.values().map(|d| d.adjusted_hours).sum();
    let total_penalty: i64 = days.values().map(|d| d.penalty_minutes).sum();

    let offset = total_penalty.min(pool_minutes).max(0);
    (total_adjusted + offset as f64 / 60.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(date: NaiveDate, adjusted_hours: f64, penalty_minutes: i64) -> DailyAttendance {
        let mut day = DailyAttendance::empty(date);
        day.adjusted_hours = adjusted_hours;
        day.penalty_minutes = penalty_minutes;
        day
    }

    fn days(specs: &[(f64, i64)]) -> BTreeMap<NaiveDate, DailyAttendance> {
        specs
            .iter()
            .enumerate()
            .map(|(i, &(adjusted, penalty))| {
                let date = NaiveDate::from_ymd_opt(2026, 3, i as u32 + 2).unwrap();
                (date, day(date, adjusted, penalty))
            })
            .collect()
    }

    #[test]
    fn offset_caps_at_pool_size() {
        // 90 penalty minutes against a 60-minute pool buys back exactly
        // one hour.
        let days = days(&[(7.0, 60), (7.5, 30)]);
        let net = offset_penalties(&days, 60);
        assert!((net - 15.5).abs() < 1e-9);
    }

    #[test]
    fn offset_caps_at_total_penalty() {
        let days = days(&[(7.5, 30)]);
        let net = offset_penalties(&days, 240);
        assert!((net - 8.0).abs() < 1e-9);
    }

    #[test]
    fn zero_pool_changes_nothing() {
        let days = days(&[(7.0, 60)]);
        assert!((offset_penalties(&days, 0) - 7.0).abs() < 1e-9);
    }

    #[test]
    fn pool_sums_allowance_and_overrides() {
        let rule = PermissionRule {
            monthly_allowance_minutes: 120,
        };
        let overrides = vec![
            PermissionOverride {
                id: 1,
                employee_id: 1,
                period_start: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                extra_minutes: 30,
            },
            PermissionOverride {
                id: 2,
                employee_id: 1,
                period_start: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                extra_minutes: 15,
            },
        ];
        assert_eq!(permission_pool(Some(&rule), &overrides), 165);
    }

    #[test]
    fn missing_rule_means_overrides_only() {
        let overrides = vec![PermissionOverride {
            id: 1,
            employee_id: 1,
            period_start: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            extra_minutes: 45,
        }];
        assert_eq!(permission_pool(None, &overrides), 45);
    }
}
