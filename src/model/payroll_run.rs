use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    sqlx::Type,
    Display,
    EnumString,
)]
#[sqlx(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Draft,
    Finalized,
}

/// Immutable payroll outcome, upsert-keyed by (employee, period). The
/// snapshot column holds the serialized [`CalculationSnapshot`] so a
/// finalized run stays explainable without recomputation.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PayrollRunSnapshot {
    pub id: u64,
    pub employee_id: u64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub base_salary: f64,
    pub final_salary: f64,
    pub performance_percentage: f64,
    pub calculation_snapshot: String,
    pub status: RunStatus,
}

/// Every intermediate number behind one employee's payroll outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationSnapshot {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub weekday_count: u32,
    pub required_hours: f64,

    pub total_adjusted_hours: f64,
    pub total_penalty_minutes: i64,
    pub permission_pool_minutes: i64,
    pub offset_minutes: i64,
    pub net_hours: f64,

    pub leave_days: u32,
    pub wfh_days: u32,
    pub days_with_issues: u32,

    pub attendance_percentage: f64,
    pub billable_hours: f64,
    pub target_billable_hours: f64,
    pub billable_percentage: f64,
    pub attendance_weight: f64,
    pub billable_weight: f64,
    pub performance_percentage: f64,

    pub base_salary: f64,
    pub final_salary: f64,

    /// Set when the employee could not be fully calculated (e.g. no base
    /// salary on record) and the numbers above are zeroed.
    pub reason: Option<String>,
}

/// In-memory preview of one employee's period outcome, used for
/// reporting before anything is finalized.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeSummary {
    pub employee_id: u64,
    pub employee_code: String,
    pub employee_name: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub attendance_percentage: f64,
    pub billable_percentage: f64,
    pub performance_percentage: f64,
    pub base_salary: f64,
    pub final_salary: f64,
    pub snapshot: CalculationSnapshot,
}
