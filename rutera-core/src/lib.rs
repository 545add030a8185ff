pub mod models;
pub mod repository;

/// Error taxonomy shared by every reservation-core operation.
///
/// Conflict and HoldLimitExceeded are recoverable by the caller (refresh the
/// seat map, deselect a seat); Upstream is transient and retry policy belongs
/// to the caller, never to the core.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Segment no longer available: {0}")]
    Conflict(String),

    #[error("Hold limit exceeded: session already holds {active} of {max} allowed seats")]
    HoldLimitExceeded { active: i64, max: i64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Upstream unavailable: {0}")]
    Upstream(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
