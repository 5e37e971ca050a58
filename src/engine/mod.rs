pub mod aggregate;
pub mod daily_hours;
pub mod merge;
pub mod permission;
pub mod rules;
pub mod work_day;

pub use aggregate::{calculate_employee_summary, finalize_payroll_run, FinalizeOutcome};
pub use daily_hours::compute_daily_hours;
pub use merge::{import_punches, plan_merge, preview_import, ImportPreview, ImportSummary};
pub use permission::{offset_penalties, permission_pool};
pub use rules::apply_rules;
pub use work_day::{work_day, work_day_window};
