use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use super::work_day::work_day;
use crate::config::PayrollPolicyConfig;
use crate::model::{
    AttendanceIssue, AttendanceLogEntry, DailyAttendance, LeaveRecord, PunchKind, WfhPolicyRule,
    WfhRecord,
};

fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Turns one employee's canonical log entries for a period into per-day
/// raw hours, folding in approved leave and WFH grants.
///
/// Leave wins over everything: an approved weekday leave day is credited
/// the full standard day regardless of punches. WFH days contribute the
/// configured percentage (100% without a policy), scaling punch-derived
/// hours when they exist and synthesizing a standard day otherwise.
/// Weekends are never auto-credited by either.
pub fn compute_daily_hours(
    entries: &[AttendanceLogEntry],
    leaves: &[LeaveRecord],
    wfh_days: &[WfhRecord],
    wfh_policy: Option<&WfhPolicyRule>,
    period_start: NaiveDate,
    period_end: NaiveDate,
    policy: &PayrollPolicyConfig,
) -> BTreeMap<NaiveDate, DailyAttendance> {
    let mut days: BTreeMap<NaiveDate, DailyAttendance> = BTreeMap::new();

    // Punch-derived hours first.
    for entry in entries {
        let date = work_day(entry.timestamp, policy.workday_cutoff_hour);
        if date < period_start || date > period_end {
            continue;
        }
        let day = days.entry(date).or_insert_with(|| DailyAttendance::empty(date));
        match entry.kind {
            PunchKind::SignIn => {
                day.sign_in = Some(match day.sign_in {
                    Some(existing) => existing.min(entry.timestamp),
                    None => entry.timestamp,
                });
            }
            PunchKind::SignOut => {
                day.sign_out = Some(match day.sign_out {
                    Some(existing) => existing.max(entry.timestamp),
                    None => entry.timestamp,
                });
            }
        }
    }

    for day in days.values_mut() {
        match (day.sign_in, day.sign_out) {
            (Some(sign_in), Some(sign_out)) => {
                let hours = (sign_out - sign_in).num_seconds() as f64 / 3600.0;
                day.raw_hours = hours.max(0.0);
            }
            (None, Some(_)) => day.issue = AttendanceIssue::MissingSignIn,
            (Some(_), None) => day.issue = AttendanceIssue::MissingSignOut,
            (None, None) => {}
        }
    }

    // Approved leave forces a full standard day on every weekday of the
    // (clamped) range, overriding punch-derived hours.
    for leave in leaves.iter().filter(|l| l.is_approved()) {
        let mut date = leave.start_date.max(period_start);
        let last = leave.end_date.min(period_end);
        while date <= last {
            if is_weekday(date) {
                let day = days.entry(date).or_insert_with(|| DailyAttendance::empty(date));
                day.raw_hours = policy.standard_work_hours_per_day;
                day.is_leave_day = true;
            }
            date += Duration::days(1);
        }
    }

    // WFH days; leave takes precedence.
    let contribution = wfh_policy
        .map(|p| p.attendance_contribution_percentage / 100.0)
        .unwrap_or(1.0);
    for wfh in wfh_days {
        let date = wfh.date;
        if date < period_start || date > period_end || !is_weekday(date) {
            continue;
        }
        match days.get_mut(&date) {
            Some(day) if day.is_leave_day => {}
            Some(day) => {
                day.raw_hours *= contribution;
                day.is_wfh_day = true;
            }
            None => {
                let mut day = DailyAttendance::empty(date);
                day.raw_hours = policy.standard_work_hours_per_day * contribution;
                day.is_wfh_day = true;
                days.insert(date, day);
            }
        }
    }

    days
}
