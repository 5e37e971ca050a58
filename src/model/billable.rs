use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Manually entered billable hours for a payroll period.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BillableHour {
    pub id: u64,
    pub employee_id: u64,
    pub period_start: NaiveDate,
    pub hours: f64,
}

/// Imported Jira worklog line. The importer is an external adapter; the
/// engine only sums hours whose timestamp falls inside the period.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JiraWorklog {
    pub id: u64,
    pub employee_id: u64,
    pub logged_at: NaiveDateTime,
    pub hours: f64,
}

/// Ad-hoc permission minutes granted on top of the monthly allowance,
/// scoped to one employee and one period start.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PermissionOverride {
    pub id: u64,
    pub employee_id: u64,
    pub period_start: NaiveDate,
    pub extra_minutes: i64,
}
