use crate::error::{PressError, Result};
use crate::types::{ActionKind, ApprovalStatus, ContentKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// ActionApproval
// ---------------------------------------------------------------------------

/// One requested action moving through request → review → execution.
/// REJECTED and EXECUTED are terminal; execution happens at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionApproval {
    pub id: Uuid,
    pub category: ContentKind,
    pub action: ActionKind,
    pub target_id: Uuid,
    pub priority: u32,
    pub status: ApprovalStatus,
    pub requested_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reject_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
}

impl ActionApproval {
    pub fn new(
        category: ContentKind,
        action: ActionKind,
        target_id: Uuid,
        priority: u32,
        requested_by: impl Into<String>,
        note: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            category,
            action,
            target_id,
            priority,
            status: ApprovalStatus::Pending,
            requested_by: requested_by.into(),
            note,
            reviewed_by: None,
            reject_reason: None,
            executed_by: None,
            executed_at: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    fn require_pending(&self, to: ApprovalStatus) -> Result<()> {
        if self.status == ApprovalStatus::Pending {
            return Ok(());
        }
        Err(PressError::InvalidTransition {
            from: self.status.to_string(),
            to: to.to_string(),
            reason: "only PENDING approvals can be reviewed".to_string(),
        })
    }

    /// PENDING → APPROVED, recording the reviewer.
    pub fn approve(&mut self, by: &str) -> Result<String> {
        self.require_pending(ApprovalStatus::Approved)?;
        self.status = ApprovalStatus::Approved;
        self.reviewed_by = Some(by.to_string());
        self.updated_at = Utc::now();
        Ok("approved; execution remains a separate privileged step".to_string())
    }

    /// PENDING → REJECTED, recording reviewer and reason.
    pub fn reject(&mut self, by: &str, reason: Option<String>) -> Result<String> {
        self.require_pending(ApprovalStatus::Rejected)?;
        self.status = ApprovalStatus::Rejected;
        self.reviewed_by = Some(by.to_string());
        self.reject_reason = reason;
        self.updated_at = Utc::now();
        Ok("rejected".to_string())
    }

    /// APPROVED → EXECUTED. A second execute is a conflict, never a silent
    /// success; the caller's role check happens before this is reached.
    pub fn execute(&mut self, by: &str) -> Result<String> {
        match self.status {
            ApprovalStatus::Approved => {
                let now = Utc::now();
                self.status = ApprovalStatus::Executed;
                self.executed_by = Some(by.to_string());
                self.executed_at = Some(now);
                self.updated_at = now;
                Ok("executed".to_string())
            }
            ApprovalStatus::Executed => Err(PressError::Conflict(
                "approval has already been executed".to_string(),
            )),
            other => Err(PressError::InvalidTransition {
                from: other.to_string(),
                to: ApprovalStatus::Executed.to_string(),
                reason: "only APPROVED approvals can be executed".to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> ActionApproval {
        ActionApproval::new(
            ContentKind::Product,
            ActionKind::Promote,
            Uuid::new_v4(),
            3,
            "edna",
            None,
        )
    }

    #[test]
    fn approve_then_execute() {
        let mut a = pending();
        a.approve("quinn").unwrap();
        assert_eq!(a.status, ApprovalStatus::Approved);
        assert_eq!(a.reviewed_by.as_deref(), Some("quinn"));

        a.execute("root").unwrap();
        assert_eq!(a.status, ApprovalStatus::Executed);
        assert!(a.executed_at.is_some());
        assert_eq!(a.executed_by.as_deref(), Some("root"));
    }

    #[test]
    fn reject_records_reason() {
        let mut a = pending();
        a.reject("quinn", Some("not this quarter".into())).unwrap();
        assert_eq!(a.status, ApprovalStatus::Rejected);
        assert_eq!(a.reject_reason.as_deref(), Some("not this quarter"));
    }

    #[test]
    fn review_only_from_pending() {
        let mut a = pending();
        a.approve("quinn").unwrap();
        assert!(a.approve("quinn").is_err());
        assert!(a.reject("quinn", None).is_err());
    }

    #[test]
    fn execute_rejected_from_pending_and_rejected() {
        let mut p = pending();
        assert!(p.execute("root").is_err());

        let mut r = pending();
        r.reject("quinn", None).unwrap();
        let err = r.execute("root").unwrap_err();
        assert!(matches!(err, PressError::InvalidTransition { .. }));
    }

    #[test]
    fn double_execute_is_a_conflict() {
        let mut a = pending();
        a.approve("quinn").unwrap();
        a.execute("root").unwrap();
        let first_executed_at = a.executed_at;

        let err = a.execute("root").unwrap_err();
        assert!(matches!(err, PressError::Conflict(_)), "got: {err}");
        assert_eq!(a.executed_at, first_executed_at);
    }
}
