use std::env;
use dotenvy::dotenv;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
        }
    }
}

/// Central policy constants shared by every calculation stage.
///
/// Each stage used to be free to hard-code its own 8-hour day or 4 AM
/// cutoff; keeping them in one value object avoids silent divergence.
#[derive(Debug, Clone)]
pub struct PayrollPolicyConfig {
    /// Punches before this hour roll into the previous work day.
    pub workday_cutoff_hour: u32,
    /// Hours credited for a full standard day (leave days, WFH baseline).
    pub standard_work_hours_per_day: f64,
    /// Per-weekday billable target used when no admin override exists.
    pub billable_target_hours_per_weekday: f64,
    /// Hard cap on the derived monthly billable target.
    pub billable_target_cap_hours: f64,
    /// Maximum sign-in/sign-out pairs shown in an import dry run.
    pub preview_sample_size: usize,
}

impl Default for PayrollPolicyConfig {
    fn default() -> Self {
        Self {
            workday_cutoff_hour: 4,
            standard_work_hours_per_day: 8.0,
            billable_target_hours_per_weekday: 6.0,
            billable_target_cap_hours: 120.0,
            preview_sample_size: 10,
        }
    }
}

impl PayrollPolicyConfig {
    pub fn from_env() -> Self {
        dotenv().ok();
        let defaults = Self::default();

        Self {
            workday_cutoff_hour: env::var("WORKDAY_CUTOFF_HOUR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.workday_cutoff_hour)
                .min(23),
            standard_work_hours_per_day: env::var("STANDARD_WORK_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.standard_work_hours_per_day),
            billable_target_hours_per_weekday: defaults.billable_target_hours_per_weekday,
            billable_target_cap_hours: defaults.billable_target_cap_hours,
            preview_sample_size: env::var("IMPORT_PREVIEW_SAMPLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.preview_sample_size),
        }
    }
}
