use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ContentStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a content entity. The wire vocabulary is fixed and
/// shared with every collaborator; legacy rows may carry no status at all,
/// which readers treat as `Draft`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentStatus {
    Draft,
    Scheduled,
    ReadyToPublish,
    Published,
    Archived,
}

impl ContentStatus {
    pub fn all() -> &'static [ContentStatus] {
        &[
            ContentStatus::Draft,
            ContentStatus::Scheduled,
            ContentStatus::ReadyToPublish,
            ContentStatus::Published,
            ContentStatus::Archived,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContentStatus::Draft => "DRAFT",
            ContentStatus::Scheduled => "SCHEDULED",
            ContentStatus::ReadyToPublish => "READY_TO_PUBLISH",
            ContentStatus::Published => "PUBLISHED",
            ContentStatus::Archived => "ARCHIVED",
        }
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentStatus {
    type Err = crate::error::PressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" | "draft" => Ok(ContentStatus::Draft),
            "SCHEDULED" | "scheduled" => Ok(ContentStatus::Scheduled),
            "READY_TO_PUBLISH" | "ready_to_publish" => Ok(ContentStatus::ReadyToPublish),
            "PUBLISHED" | "published" => Ok(ContentStatus::Published),
            "ARCHIVED" | "archived" => Ok(ContentStatus::Archived),
            _ => Err(crate::error::PressError::InvalidContentStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// JobStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a scheduler job. A deliberately different vocabulary
/// from `KeywordStatus` — jobs and keywords move through separate machines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Scheduled,
    Running,
    Paused,
    Cancelled,
    Completed,
}

impl JobStatus {
    pub fn all() -> &'static [JobStatus] {
        &[
            JobStatus::Scheduled,
            JobStatus::Running,
            JobStatus::Paused,
            JobStatus::Cancelled,
            JobStatus::Completed,
        ]
    }

    /// Terminal states have no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Cancelled | JobStatus::Completed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Scheduled => "SCHEDULED",
            JobStatus::Running => "RUNNING",
            JobStatus::Paused => "PAUSED",
            JobStatus::Cancelled => "CANCELLED",
            JobStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = crate::error::PressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SCHEDULED" | "scheduled" => Ok(JobStatus::Scheduled),
            "RUNNING" | "running" => Ok(JobStatus::Running),
            "PAUSED" | "paused" => Ok(JobStatus::Paused),
            "CANCELLED" | "cancelled" => Ok(JobStatus::Cancelled),
            "COMPLETED" | "completed" => Ok(JobStatus::Completed),
            _ => Err(crate::error::PressError::InvalidJobStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// KeywordStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeywordStatus {
    Pending,
    Processing,
    Done,
    Failed,
}

impl KeywordStatus {
    pub fn all() -> &'static [KeywordStatus] {
        &[
            KeywordStatus::Pending,
            KeywordStatus::Processing,
            KeywordStatus::Done,
            KeywordStatus::Failed,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KeywordStatus::Pending => "PENDING",
            KeywordStatus::Processing => "PROCESSING",
            KeywordStatus::Done => "DONE",
            KeywordStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for KeywordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for KeywordStatus {
    type Err = crate::error::PressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" | "pending" => Ok(KeywordStatus::Pending),
            "PROCESSING" | "processing" => Ok(KeywordStatus::Processing),
            "DONE" | "done" => Ok(KeywordStatus::Done),
            "FAILED" | "failed" => Ok(KeywordStatus::Failed),
            _ => Err(crate::error::PressError::InvalidKeywordStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ApprovalStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
    Executed,
}

impl ApprovalStatus {
    pub fn all() -> &'static [ApprovalStatus] {
        &[
            ApprovalStatus::Pending,
            ApprovalStatus::Approved,
            ApprovalStatus::Rejected,
            ApprovalStatus::Executed,
        ]
    }

    /// Rejected and executed approvals never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, ApprovalStatus::Rejected | ApprovalStatus::Executed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "PENDING",
            ApprovalStatus::Approved => "APPROVED",
            ApprovalStatus::Rejected => "REJECTED",
            ApprovalStatus::Executed => "EXECUTED",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ApprovalStatus {
    type Err = crate::error::PressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" | "pending" => Ok(ApprovalStatus::Pending),
            "APPROVED" | "approved" => Ok(ApprovalStatus::Approved),
            "REJECTED" | "rejected" => Ok(ApprovalStatus::Rejected),
            "EXECUTED" | "executed" => Ok(ApprovalStatus::Executed),
            _ => Err(crate::error::PressError::InvalidApprovalStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ContentKind
// ---------------------------------------------------------------------------

/// What a content entity (or an approval's target category) is. Products and
/// posts share one lifecycle shape; products additionally carry price,
/// stock, and merchandising counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentKind {
    Product,
    Post,
}

impl ContentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Product => "PRODUCT",
            ContentKind::Post => "POST",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentKind {
    type Err = crate::error::PressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PRODUCT" | "product" => Ok(ContentKind::Product),
            "POST" | "post" => Ok(ContentKind::Post),
            _ => Err(crate::error::PressError::InvalidContentKind(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ScheduleMode / ScheduleStatus / PublishMode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleMode {
    Blog,
    Product,
}

impl ScheduleMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ScheduleMode::Blog => "BLOG",
            ScheduleMode::Product => "PRODUCT",
        }
    }
}

impl fmt::Display for ScheduleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScheduleMode {
    type Err = crate::error::PressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BLOG" | "blog" => Ok(ScheduleMode::Blog),
            "PRODUCT" | "product" => Ok(ScheduleMode::Product),
            _ => Err(crate::error::PressError::InvalidScheduleMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    Active,
    Paused,
}

impl ScheduleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ScheduleStatus::Active => "ACTIVE",
            ScheduleStatus::Paused => "PAUSED",
        }
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublishMode {
    AutoPublish,
    DraftOnly,
    QcRequired,
}

impl PublishMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PublishMode::AutoPublish => "AUTO_PUBLISH",
            PublishMode::DraftOnly => "DRAFT_ONLY",
            PublishMode::QcRequired => "QC_REQUIRED",
        }
    }
}

impl fmt::Display for PublishMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PublishMode {
    type Err = crate::error::PressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AUTO_PUBLISH" | "auto_publish" => Ok(PublishMode::AutoPublish),
            "DRAFT_ONLY" | "draft_only" => Ok(PublishMode::DraftOnly),
            "QC_REQUIRED" | "qc_required" => Ok(PublishMode::QcRequired),
            _ => Err(crate::error::PressError::InvalidPublishMode(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ActionKind
// ---------------------------------------------------------------------------

/// What an action approval proposes to do to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Promote,
    Optimize,
    Review,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Promote => "PROMOTE",
            ActionKind::Optimize => "OPTIMIZE",
            ActionKind::Review => "REVIEW",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionKind {
    type Err = crate::error::PressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROMOTE" | "promote" => Ok(ActionKind::Promote),
            "OPTIMIZE" | "optimize" => Ok(ActionKind::Optimize),
            "REVIEW" | "review" => Ok(ActionKind::Review),
            _ => Err(crate::error::PressError::InvalidActionKind(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// EngineLiveness / WorkerActivity / RunState
// ---------------------------------------------------------------------------

/// Heartbeat-derived liveness of the production engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineLiveness {
    Running,
    Stopped,
}

impl fmt::Display for EngineLiveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EngineLiveness::Running => "RUNNING",
            EngineLiveness::Stopped => "STOPPED",
        };
        f.write_str(s)
    }
}

/// Whether any scheduler job is currently running. Independent of the
/// heartbeat signal: a stale-heartbeat engine can still hold a RUNNING job
/// record from a stuck run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerActivity {
    Active,
    Idle,
}

impl fmt::Display for WorkerActivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkerActivity::Active => "ACTIVE",
            WorkerActivity::Idle => "IDLE",
        };
        f.write_str(s)
    }
}

/// Persisted single-flight marker for the manual run trigger. RUNNING is the
/// held guard; ERROR is observable and recoverable, and does not block the
/// next acquire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Idle,
    Running,
    Error,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Idle => "IDLE",
            RunState::Running => "RUNNING",
            RunState::Error => "ERROR",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Closed set of actor roles consumed from the authentication collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Super,
    Admin,
    Editor,
    Viewer,
}

impl Role {
    pub fn all() -> &'static [Role] {
        &[Role::Super, Role::Admin, Role::Editor, Role::Viewer]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Super => "super",
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = crate::error::PressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super" => Ok(Role::Super),
            "admin" => Ok(Role::Admin),
            "editor" => Ok(Role::Editor),
            "viewer" => Ok(Role::Viewer),
            _ => Err(crate::error::PressError::InvalidRole(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn content_status_roundtrip() {
        for status in ContentStatus::all() {
            let s = status.as_str();
            let parsed = ContentStatus::from_str(s).unwrap();
            assert_eq!(*status, parsed);
        }
    }

    #[test]
    fn content_status_wire_form() {
        let json = serde_json::to_string(&ContentStatus::ReadyToPublish).unwrap();
        assert_eq!(json, "\"READY_TO_PUBLISH\"");
    }

    #[test]
    fn job_status_roundtrip() {
        for status in JobStatus::all() {
            let parsed = JobStatus::from_str(status.as_str()).unwrap();
            assert_eq!(*status, parsed);
        }
    }

    #[test]
    fn job_terminal_states() {
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(!JobStatus::Scheduled.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(!JobStatus::Paused.is_terminal());
    }

    #[test]
    fn keyword_status_roundtrip() {
        for status in KeywordStatus::all() {
            let parsed = KeywordStatus::from_str(status.as_str()).unwrap();
            assert_eq!(*status, parsed);
        }
    }

    #[test]
    fn approval_terminal_states() {
        assert!(ApprovalStatus::Rejected.is_terminal());
        assert!(ApprovalStatus::Executed.is_terminal());
        assert!(!ApprovalStatus::Pending.is_terminal());
        assert!(!ApprovalStatus::Approved.is_terminal());
    }

    #[test]
    fn unknown_status_rejected() {
        assert!(ContentStatus::from_str("LIVE").is_err());
        assert!(JobStatus::from_str("FAILED").is_err());
        assert!(KeywordStatus::from_str("RUNNING").is_err());
    }

    #[test]
    fn role_roundtrip() {
        for role in Role::all() {
            let parsed = Role::from_str(role.as_str()).unwrap();
            assert_eq!(*role, parsed);
        }
        assert!(Role::from_str("owner").is_err());
    }

    #[test]
    fn publish_mode_wire_form() {
        let json = serde_json::to_string(&PublishMode::QcRequired).unwrap();
        assert_eq!(json, "\"QC_REQUIRED\"");
        assert_eq!(
            PublishMode::from_str("AUTO_PUBLISH").unwrap(),
            PublishMode::AutoPublish
        );
    }
}
