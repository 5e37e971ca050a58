use thiserror::Error;

/// Failure taxonomy of the calculation engine.
///
/// Malformed punch rows are *not* represented here: adapters skip and count
/// them into `ImportSummary::errors`, they never abort a batch.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input source missing or unreadable. Fatal for the whole import,
    /// nothing is committed.
    #[error("import source error: {0}")]
    Source(String),

    /// Storage-level failure during a merge or finalization transaction.
    /// The entire batch rolls back.
    #[error("storage transaction failed: {0}")]
    Transaction(#[from] sqlx::Error),

    /// A rule-config payload exists but cannot be parsed. A *missing* rule
    /// is not an error; the rule stage is simply skipped.
    #[error("malformed rule config '{kind}': {source}")]
    Config {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    /// Summary requested for an employee id with no record.
    #[error("unknown employee id {0}")]
    UnknownEmployee(u64),
}
