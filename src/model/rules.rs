use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Grace window after the official start time during which a sign-in is
/// not considered late.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlexibleHoursRule {
    pub official_start_time: NaiveTime,
    pub flexible_window_minutes: i64,
}

/// One late-penalty band. Bounds are inclusive minutes past the flexible
/// deadline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenaltyTier {
    pub min_minutes_late: i64,
    pub max_minutes_late: i64,
    pub penalty_minutes: i64,
}

/// Ordered penalty schedule. Tiers are operator-configured, assumed
/// mutually exclusive, and evaluated first-match-wins in the order given;
/// the engine never sorts or validates overlap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatePenaltyRule {
    pub tiers: Vec<PenaltyTier>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionRule {
    pub monthly_allowance_minutes: i64,
}

/// How much of a standard day a WFH day is worth, 0..=100.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WfhPolicyRule {
    pub attendance_contribution_percentage: f64,
}

/// Split between attendance and billable performance when blending the
/// final percentage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationWeights {
    pub attendance_weight: f64,
    pub billable_weight: f64,
}

impl Default for AggregationWeights {
    fn default() -> Self {
        Self {
            attendance_weight: 70.0,
            billable_weight: 30.0,
        }
    }
}

/// Everything rule-shaped the engine reads. All members are optional: a
/// missing rule skips its stage rather than erroring.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub flexible_hours: Option<FlexibleHoursRule>,
    pub late_penalty: Option<LatePenaltyRule>,
    pub permission: Option<PermissionRule>,
    pub wfh_policy: Option<WfhPolicyRule>,
    pub aggregation_weights: Option<AggregationWeights>,
}
