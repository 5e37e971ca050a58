use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// One raw terminal punch, as handed over by a file/CSV adapter.
/// Never persisted directly; the merge stage turns punches into
/// canonical log entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPunch {
    pub subject_id: String,
    pub timestamp: NaiveDateTime,
}

/// A parsed batch plus whatever the adapter had to skip while parsing.
/// Row-level errors never abort an import; they are carried through to
/// the import summary.
#[derive(Debug, Clone, Default)]
pub struct PunchBatch {
    pub punches: Vec<RawPunch>,
    pub errors: Vec<String>,
}

impl PunchBatch {
    pub fn from_punches(punches: Vec<RawPunch>) -> Self {
        Self {
            punches,
            errors: Vec::new(),
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
    Display,
    EnumString,
)]
#[sqlx(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PunchKind {
    SignIn,
    SignOut,
}
