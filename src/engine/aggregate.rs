use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use sqlx::MySqlPool;
use tracing::{info, warn};

use super::daily_hours::compute_daily_hours;
use super::permission::{offset_penalties, permission_pool};
use super::rules::apply_rules;
use super::work_day::work_day_window;
use crate::config::PayrollPolicyConfig;
use crate::error::EngineError;
use crate::model::{
    AggregationWeights, AttendanceIssue, BillableHour, CalculationSnapshot, DailyAttendance,
    Employee, EmployeeSummary, JiraWorklog, RuleSet, RunStatus,
};
use crate::store;

/// Snapshot upsert. Relies on the `payroll_runs` unique key over
/// (employee_id, period_start, period_end): re-finalizing a period
/// rewrites the row in place instead of appending, so correction
/// workflows converge on exactly one snapshot per employee and period.
/// The key columns themselves are never touched on conflict.
const PAYROLL_RUN_UPSERT_SQL: &str = r#"
    INSERT INTO payroll_runs
        (employee_id, period_start, period_end, base_salary,
         final_salary, performance_percentage, calculation_snapshot, status)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
    ON DUPLICATE KEY UPDATE
        base_salary = VALUES(base_salary),
        final_salary = VALUES(final_salary),
        performance_percentage = VALUES(performance_percentage),
        calculation_snapshot = VALUES(calculation_snapshot),
        status = VALUES(status)
"#;

/// Period-level attendance numbers after rules and permission offset,
/// carried into the calculation snapshot.
#[derive(Debug, Clone)]
pub struct AttendanceTotals {
    pub total_adjusted_hours: f64,
    pub total_penalty_minutes: i64,
    pub permission_pool_minutes: i64,
    pub offset_minutes: i64,
    pub net_hours: f64,
    pub leave_days: u32,
    pub wfh_days: u32,
    pub days_with_issues: u32,
}

/// Billable hours for the period: manual entries plus imported worklogs.
pub fn billable_hours_total(manual: &[BillableHour], worklogs: &[JiraWorklog]) -> f64 {
    manual.iter().map(|b| b.hours).sum::<f64>()
        + worklogs.iter().map(|w| w.hours).sum::<f64>()
}

pub fn count_weekdays(start: NaiveDate, end: NaiveDate) -> u32 {
    let mut date = start;
    let mut count = 0;
    while date <= end {
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            count += 1;
        }
        date += Duration::days(1);
    }
    count
}

pub fn attendance_totals(
    days: &BTreeMap<NaiveDate, DailyAttendance>,
    pool_minutes: i64,
) -> AttendanceTotals {
    let total_adjusted_hours: f64 = days.values().map(|d| d.adjusted_hours).sum();
    let total_penalty_minutes: i64 = days.values().map(|d| d.penalty_minutes).sum();
    let offset_minutes = total_penalty_minutes.min(pool_minutes).max(0);

    AttendanceTotals {
        total_adjusted_hours,
        total_penalty_minutes,
        permission_pool_minutes: pool_minutes,
        offset_minutes,
        net_hours: offset_penalties(days, pool_minutes),
        leave_days: days.values().filter(|d| d.is_leave_day).count() as u32,
        wfh_days: days.values().filter(|d| d.is_wfh_day).count() as u32,
        days_with_issues: days
            .values()
            .filter(|d| d.issue != AttendanceIssue::None)
            .count() as u32,
    }
}

/// Blends net attendance and billable hours into the weighted
/// performance percentage and final salary for one employee.
///
/// Employees outside billable-hours tracking score on attendance alone:
/// the billable weight is forced to zero no matter what is configured.
pub fn build_summary(
    employee: &Employee,
    period_start: NaiveDate,
    period_end: NaiveDate,
    totals: &AttendanceTotals,
    billable_hours: f64,
    weights: &AggregationWeights,
    policy: &PayrollPolicyConfig,
) -> EmployeeSummary {
    let weekday_count = count_weekdays(period_start, period_end);
    let required_hours = weekday_count as f64 * policy.standard_work_hours_per_day;

    let attendance_percentage = if required_hours > 0.0 {
        (totals.net_hours / required_hours * 100.0).min(100.0)
    } else {
        0.0
    };

    let (target_billable_hours, billable_percentage, attendance_weight, billable_weight) =
        if employee.billable_hours_applicable {
            let target = employee.billable_target_override.unwrap_or_else(|| {
                (weekday_count as f64 * policy.billable_target_hours_per_weekday)
                    .min(policy.billable_target_cap_hours)
            });
            let pct = if target > 0.0 {
                (billable_hours / target * 100.0).min(100.0)
            } else {
                0.0
            };
            (target, pct, weights.attendance_weight, weights.billable_weight)
        } else {
            (0.0, 0.0, 100.0, 0.0)
        };

    let performance_percentage = attendance_percentage * attendance_weight / 100.0
        + billable_percentage * billable_weight / 100.0;

    let base_salary = employee.base_salary.unwrap_or(0.0);
    let final_salary = base_salary * performance_percentage / 100.0;

    let snapshot = CalculationSnapshot {
        period_start,
        period_end,
        weekday_count,
        required_hours,
        total_adjusted_hours: totals.total_adjusted_hours,
        total_penalty_minutes: totals.total_penalty_minutes,
        permission_pool_minutes: totals.permission_pool_minutes,
        offset_minutes: totals.offset_minutes,
        net_hours: totals.net_hours,
        leave_days: totals.leave_days,
        wfh_days: totals.wfh_days,
        days_with_issues: totals.days_with_issues,
        attendance_percentage,
        billable_hours,
        target_billable_hours,
        billable_percentage,
        attendance_weight,
        billable_weight,
        performance_percentage,
        base_salary,
        final_salary,
        reason: if employee.base_salary.is_none() {
            Some("no base salary on record".to_string())
        } else {
            None
        },
    };

    EmployeeSummary {
        employee_id: employee.id,
        employee_code: employee.employee_code.clone(),
        employee_name: employee.full_name(),
        period_start,
        period_end,
        attendance_percentage,
        billable_percentage,
        performance_percentage,
        base_salary,
        final_salary,
        snapshot,
    }
}

/// Full attendance → rules → offset → blend pipeline for one employee,
/// reading everything it needs up front.
async fn summarize(
    pool: &MySqlPool,
    employee: &Employee,
    rules: &RuleSet,
    period_start: NaiveDate,
    period_end: NaiveDate,
    policy: &PayrollPolicyConfig,
) -> Result<EmployeeSummary, EngineError> {
    let cutoff = policy.workday_cutoff_hour;
    let (window_start, _) = work_day_window(period_start, cutoff);
    let (_, window_end) = work_day_window(period_end, cutoff);

    let entries =
        store::log_entries_for_employee(pool, employee.id, window_start, window_end).await?;
    let leaves = store::approved_leaves(pool, employee.id, period_start, period_end).await?;
    let wfh_days = store::wfh_records(pool, employee.id, period_start, period_end).await?;
    let overrides = store::permission_overrides(pool, employee.id, period_start).await?;
    let manual = store::billable_entries(pool, employee.id, period_start).await?;
    let worklogs = store::worklogs(pool, employee.id, period_start, period_end).await?;

    let days = compute_daily_hours(
        &entries,
        &leaves,
        &wfh_days,
        rules.wfh_policy.as_ref(),
        period_start,
        period_end,
        policy,
    );
    let days: BTreeMap<NaiveDate, DailyAttendance> = days
        .into_iter()
        .map(|(date, day)| {
            (
                date,
                apply_rules(day, rules.flexible_hours.as_ref(), rules.late_penalty.as_ref()),
            )
        })
        .collect();

    let pool_minutes = permission_pool(rules.permission.as_ref(), &overrides);
    let totals = attendance_totals(&days, pool_minutes);
    let weights = rules.aggregation_weights.clone().unwrap_or_default();

    Ok(build_summary(
        employee,
        period_start,
        period_end,
        &totals,
        billable_hours_total(&manual, &worklogs),
        &weights,
        policy,
    ))
}

/// Computes the period summary for one employee without writing anything.
/// Used for preview and reporting ahead of finalization.
pub async fn calculate_employee_summary(
    pool: &MySqlPool,
    employee_id: u64,
    period_start: NaiveDate,
    period_end: NaiveDate,
    policy: &PayrollPolicyConfig,
) -> Result<EmployeeSummary, EngineError> {
    let employee = store::employee_by_id(pool, employee_id)
        .await?
        .ok_or(EngineError::UnknownEmployee(employee_id))?;
    let rules = store::rule_set(pool).await?;

    summarize(pool, &employee, &rules, period_start, period_end, policy).await
}

#[derive(Debug)]
pub struct FinalizeOutcome {
    pub finalized: Vec<EmployeeSummary>,
    /// (employee id, reason) pairs left out of the run.
    pub skipped: Vec<(u64, String)>,
}

/// Finalizes the payroll run for a period across all active employees.
///
/// Every snapshot is written inside one transaction; a storage failure
/// rolls the whole run back. Snapshots are upsert-keyed by
/// (employee, period), so re-finalizing after a data correction converges
/// on one row instead of appending. Employees missing a base salary are
/// skipped with a warning rather than blocking everyone else.
pub async fn finalize_payroll_run(
    pool: &MySqlPool,
    period_start: NaiveDate,
    period_end: NaiveDate,
    policy: &PayrollPolicyConfig,
) -> Result<FinalizeOutcome, EngineError> {
    let employees = store::active_employees(pool).await?;
    let rules = store::rule_set(pool).await?;

    let mut finalized = Vec::new();
    let mut skipped = Vec::new();
    for employee in &employees {
        if employee.base_salary.is_none() {
            warn!(
                employee_id = employee.id,
                code = %employee.employee_code,
                "skipping finalization: no base salary on record"
            );
            skipped.push((employee.id, "no base salary on record".to_string()));
            continue;
        }
        let summary =
            summarize(pool, employee, &rules, period_start, period_end, policy).await?;
        finalized.push(summary);
    }

    let mut tx = pool.begin().await?;
    for summary in &finalized {
        let snapshot_json =
            serde_json::to_string(&summary.snapshot).map_err(|e| EngineError::Config {
                kind: "calculation_snapshot".to_string(),
                source: e,
            })?;
        sqlx::query(PAYROLL_RUN_UPSERT_SQL)
            .bind(summary.employee_id)
            .bind(summary.period_start)
            .bind(summary.period_end)
            .bind(summary.base_salary)
            .bind(summary.final_salary)
            .bind(summary.performance_percentage)
            .bind(&snapshot_json)
            .bind(RunStatus::Finalized)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    info!(
        period_start = %period_start,
        period_end = %period_end,
        finalized = finalized.len(),
        skipped = skipped.len(),
        "payroll run finalized"
    );
    Ok(FinalizeOutcome { finalized, skipped })
}
