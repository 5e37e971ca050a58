pub mod attendance;
pub mod billable;
pub mod employee;
pub mod leave;
pub mod payroll_run;
pub mod punch;
pub mod rules;

pub use attendance::{AttendanceIssue, AttendanceLogEntry, DailyAttendance};
pub use billable::{BillableHour, JiraWorklog, PermissionOverride};
pub use employee::Employee;
pub use leave::{LeaveRecord, WfhRecord};
pub use payroll_run::{CalculationSnapshot, EmployeeSummary, PayrollRunSnapshot, RunStatus};
pub use punch::{PunchBatch, PunchKind, RawPunch};
pub use rules::{
    AggregationWeights, FlexibleHoursRule, LatePenaltyRule, PenaltyTier, PermissionRule, RuleSet,
    WfhPolicyRule,
};
