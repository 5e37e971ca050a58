use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::MySqlPool;
use tracing::warn;

use crate::error::EngineError;
use crate::model::{
    AggregationWeights, AttendanceLogEntry, BillableHour, Employee, JiraWorklog, LeaveRecord,
    PayrollRunSnapshot, PermissionOverride, RuleSet, RunStatus, WfhRecord,
};

/// Global high-water mark of the canonical log. Read once per import,
/// inside the import's own transaction, and passed into planning as an
/// explicit parameter.
pub async fn latest_log_timestamp(
    db: impl sqlx::Executor<'_, Database = sqlx::MySql>,
) -> Result<Option<NaiveDateTime>, EngineError> {
    let ts = sqlx::query_scalar::<_, Option<NaiveDateTime>>(
        r#"SELECT MAX(timestamp) FROM attendance_log"#,
    )
    .fetch_one(db)
    .await?;
    Ok(ts)
}

/// Terminal subject id -> employee id mapping.
pub async fn subject_map(
    db: impl sqlx::Executor<'_, Database = sqlx::MySql>,
) -> Result<HashMap<String, u64>, EngineError> {
    let rows = sqlx::query_as::<_, (String, u64)>(
        r#"SELECT employee_code, id FROM employees"#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().collect())
}

const LOG_WINDOW_SELECT: &str = r#"
    SELECT id, employee_id, timestamp, kind
    FROM attendance_log
    WHERE timestamp >= ? AND timestamp < ?
    ORDER BY timestamp
"#;

fn locked_window_sql() -> String {
    format!("{} FOR UPDATE", LOG_WINDOW_SELECT.trim_end())
}

pub async fn log_entries_between(
    pool: &MySqlPool,
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> Result<Vec<AttendanceLogEntry>, EngineError> {
    let rows = sqlx::query_as::<_, AttendanceLogEntry>(LOG_WINDOW_SELECT)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Locking variant of the window fetch, for use inside an import
/// transaction. InnoDB next-key locks on the scanned range make two
/// overlapping imports queue up instead of both planning inserts for the
/// same (employee, work day, kind).
pub async fn log_entries_between_locked(
    db: impl sqlx::Executor<'_, Database = sqlx::MySql>,
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> Result<Vec<AttendanceLogEntry>, EngineError> {
    let rows = sqlx::query_as::<_, AttendanceLogEntry>(&locked_window_sql())
        .bind(from)
        .bind(to)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn log_entries_for_employee(
    pool: &MySqlPool,
    employee_id: u64,
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> Result<Vec<AttendanceLogEntry>, EngineError> {
    let rows = sqlx::query_as::<_, AttendanceLogEntry>(
        r#"
        SELECT id, employee_id, timestamp, kind
        FROM attendance_log
        WHERE employee_id = ? AND timestamp >= ? AND timestamp < ?
        ORDER BY timestamp
        "#,
    )
    .bind(employee_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

const EMPLOYEE_COLUMNS: &str = r#"
    id, employee_code, first_name, last_name, hire_date, status,
    base_salary, billable_hours_applicable, billable_target_override
"#;

pub async fn employee_by_id(
    pool: &MySqlPool,
    employee_id: u64,
) -> Result<Option<Employee>, EngineError> {
    let employee = sqlx::query_as::<_, Employee>(&format!(
        r#"SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?"#
    ))
    .bind(employee_id)
    .fetch_optional(pool)
    .await?;
    Ok(employee)
}

pub async fn active_employees(pool: &MySqlPool) -> Result<Vec<Employee>, EngineError> {
    let employees = sqlx::query_as::<_, Employee>(&format!(
        r#"SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE status = 'active' ORDER BY id"#
    ))
    .fetch_all(pool)
    .await?;
    Ok(employees)
}

/// Loads every configured rule. Payloads are JSON blobs authored by the
/// settings screens; a missing row leaves its slot `None`, a malformed
/// payload is a hard config error, and unknown kinds are logged and
/// skipped so old rows never break newer engines.
pub async fn rule_set(pool: &MySqlPool) -> Result<RuleSet, EngineError> {
    let rows = sqlx::query_as::<_, (String, String)>(
        r#"SELECT rule_kind, payload FROM rule_configs"#,
    )
    .fetch_all(pool)
    .await?;

    let mut rules = RuleSet::default();
    for (kind, payload) in rows {
        let parse = |e: serde_json::Error| EngineError::Config {
            kind: kind.clone(),
            source: e,
        };
        match kind.as_str() {
            "flexible_hours" => {
                rules.flexible_hours = Some(serde_json::from_str(&payload).map_err(parse)?)
            }
            "late_penalty" => {
                rules.late_penalty = Some(serde_json::from_str(&payload).map_err(parse)?)
            }
            "permission" => {
                rules.permission = Some(serde_json::from_str(&payload).map_err(parse)?)
            }
            "wfh_policy" => {
                rules.wfh_policy = Some(serde_json::from_str(&payload).map_err(parse)?)
            }
            "aggregation_weights" => {
                rules.aggregation_weights =
                    Some(serde_json::from_str::<AggregationWeights>(&payload).map_err(parse)?)
            }
            other => warn!(rule_kind = other, "ignoring unknown rule config"),
        }
    }
    Ok(rules)
}

pub async fn approved_leaves(
    pool: &MySqlPool,
    employee_id: u64,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> Result<Vec<LeaveRecord>, EngineError> {
    let rows = sqlx::query_as::<_, LeaveRecord>(
        r#"
        SELECT id, employee_id, start_date, end_date, leave_type, status
        FROM leave_requests
        WHERE employee_id = ?
          AND status = 'approved'
          AND start_date <= ?
          AND end_date >= ?
        "#,
    )
    .bind(employee_id)
    .bind(period_end)
    .bind(period_start)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn wfh_records(
    pool: &MySqlPool,
    employee_id: u64,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> Result<Vec<WfhRecord>, EngineError> {
    let rows = sqlx::query_as::<_, WfhRecord>(
        r#"
        SELECT id, employee_id, date
        FROM wfh_records
        WHERE employee_id = ? AND date BETWEEN ? AND ?
        "#,
    )
    .bind(employee_id)
    .bind(period_start)
    .bind(period_end)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn permission_overrides(
    pool: &MySqlPool,
    employee_id: u64,
    period_start: NaiveDate,
) -> Result<Vec<PermissionOverride>, EngineError> {
    let rows = sqlx::query_as::<_, PermissionOverride>(
        r#"
        SELECT id, employee_id, period_start, extra_minutes
        FROM permission_overrides
        WHERE employee_id = ? AND period_start = ?
        "#,
    )
    .bind(employee_id)
    .bind(period_start)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Manually entered billable rows for the period.
pub async fn billable_entries(
    pool: &MySqlPool,
    employee_id: u64,
    period_start: NaiveDate,
) -> Result<Vec<BillableHour>, EngineError> {
    let rows = sqlx::query_as::<_, BillableHour>(
        r#"
        SELECT id, employee_id, period_start, hours
        FROM billable_hours
        WHERE employee_id = ? AND period_start = ?
        "#,
    )
    .bind(employee_id)
    .bind(period_start)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Imported Jira worklog lines logged inside the calendar period.
pub async fn worklogs(
    pool: &MySqlPool,
    employee_id: u64,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> Result<Vec<JiraWorklog>, EngineError> {
    let from = period_start.and_hms_opt(0, 0, 0).expect("midnight exists");
    let to = (period_end + chrono::Duration::days(1))
        .and_hms_opt(0, 0, 0)
        .expect("midnight exists");
    let rows = sqlx::query_as::<_, JiraWorklog>(
        r#"
        SELECT id, employee_id, logged_at, hours
        FROM jira_worklogs
        WHERE employee_id = ? AND logged_at >= ? AND logged_at < ?
        "#,
    )
    .bind(employee_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Finalized snapshots for a period, for reporting screens and for
/// auditing a run after the fact.
pub async fn finalized_runs(
    pool: &MySqlPool,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> Result<Vec<PayrollRunSnapshot>, EngineError> {
    let rows = sqlx::query_as::<_, PayrollRunSnapshot>(
        r#"
        SELECT id, employee_id, period_start, period_end, base_salary,
               final_salary, performance_percentage, calculation_snapshot, status
        FROM payroll_runs
        WHERE period_start = ? AND period_end = ? AND status = ?
        ORDER BY employee_id
        "#,
    )
    .bind(period_start)
    .bind(period_end)
    .bind(RunStatus::Finalized)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// End date of the employee's most recent finalized run, if any. Final
/// settlement jobs should derive their period start from this instead of
/// assuming the first of the current month.
pub async fn last_finalized_period_end(
    pool: &MySqlPool,
    employee_id: u64,
) -> Result<Option<NaiveDate>, EngineError> {
    let date = sqlx::query_scalar::<_, Option<NaiveDate>>(
        r#"
        SELECT MAX(period_end)
        FROM payroll_runs
        WHERE employee_id = ? AND status = ?
        "#,
    )
    .bind(employee_id)
    .bind(RunStatus::Finalized)
    .fetch_one(pool)
    .await?;
    Ok(date)
}
