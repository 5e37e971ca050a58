use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::punch::PunchKind;

/// Canonical attendance log row. At most one sign-in and one sign-out
/// exist per (employee, work day); only the merge stage writes here.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceLogEntry {
    pub id: u64,
    pub employee_id: u64,
    pub timestamp: NaiveDateTime,
    pub kind: PunchKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceIssue {
    None,
    MissingSignIn,
    MissingSignOut,
}

/// Per-day working state, built fresh for every calculation request and
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyAttendance {
    pub date: NaiveDate,
    pub raw_hours: f64,
    pub sign_in: Option<NaiveDateTime>,
    pub sign_out: Option<NaiveDateTime>,
    pub issue: AttendanceIssue,
    pub is_leave_day: bool,
    pub is_wfh_day: bool,
    pub penalty_minutes: i64,
    pub adjusted_hours: f64,
}

impl DailyAttendance {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            raw_hours: 0.0,
            sign_in: None,
            sign_out: None,
            issue: AttendanceIssue::None,
            is_leave_day: false,
            is_wfh_day: false,
            penalty_minutes: 0,
            adjusted_hours: 0.0,
        }
    }
}
