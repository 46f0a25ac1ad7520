use thiserror::Error;

#[derive(Debug, Error)]
pub enum PressError {
    #[error("data directory not initialized (run `pressroom init`)")]
    NotInitialized,

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("invalid engine name: {0}")]
    InvalidSlug(String),

    #[error("invalid content status: {0}")]
    InvalidContentStatus(String),

    #[error("invalid job status: {0}")]
    InvalidJobStatus(String),

    #[error("invalid keyword status: {0}")]
    InvalidKeywordStatus(String),

    #[error("invalid approval status: {0}")]
    InvalidApprovalStatus(String),

    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("invalid action: {0}")]
    InvalidActionKind(String),

    #[error("invalid content kind: {0}")]
    InvalidContentKind(String),

    #[error("invalid schedule mode: {0}")]
    InvalidScheduleMode(String),

    #[error("invalid publish mode: {0}")]
    InvalidPublishMode(String),

    #[error("invalid time window: {0}")]
    InvalidTimeWindow(String),

    // -----------------------------------------------------------------------
    // Identity and access
    // -----------------------------------------------------------------------
    #[error("authentication required: {0}")]
    Unauthorized(String),

    #[error("permission denied: role '{role}' lacks capability '{capability}'")]
    Forbidden { role: String, capability: String },

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------
    #[error("content '{0}' not found")]
    ContentNotFound(String),

    #[error("schedule '{0}' not found")]
    ScheduleNotFound(String),

    #[error("keyword '{0}' not found")]
    KeywordNotFound(String),

    #[error("job '{0}' not found")]
    JobNotFound(String),

    #[error("approval '{0}' not found")]
    ApprovalNotFound(String),

    // -----------------------------------------------------------------------
    // State machine
    // -----------------------------------------------------------------------
    #[error("invalid transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("conflict: {0}")]
    Conflict(String),

    // -----------------------------------------------------------------------
    // Infrastructure
    // -----------------------------------------------------------------------
    #[error("store error: {0}")]
    Store(String),

    #[error("audit log error: {0}")]
    Audit(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, PressError>;
