use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date-ranged leave request. Only rows with status "approved" count
/// toward attendance; the engine reads, never writes, these.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaveRecord {
    pub id: u64,
    pub employee_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub leave_type: String,
    pub status: String,
}

impl LeaveRecord {
    pub fn is_approved(&self) -> bool {
        self.status == "approved"
    }
}

/// Single work-from-home day grant.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WfhRecord {
    pub id: u64,
    pub employee_id: u64,
    pub date: NaiveDate,
}
