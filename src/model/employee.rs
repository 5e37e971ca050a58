use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Employee {
    pub id: u64,

    /// Identifier the biometric terminal reports punches under.
    pub employee_code: String,

    pub first_name: String,
    pub last_name: String,
    pub hire_date: NaiveDate,

    /// "active" employees are included in finalization runs.
    pub status: String,

    /// Absent for freshly onboarded records; such employees are skipped
    /// with a warning during finalization instead of blocking the batch.
    pub base_salary: Option<f64>,

    pub billable_hours_applicable: bool,

    /// Admin-set monthly billable target. When absent the target is
    /// derived from the weekday count.
    pub billable_target_override: Option<f64>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
