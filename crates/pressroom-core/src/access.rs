use crate::error::{PressError, Result};
use crate::types::Role;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// Authenticated identity consumed from the session collaborator. Session
/// mechanics stay external; this core only ever sees name, role, and the
/// brand the actor belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
}

impl Actor {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role,
            brand: None,
        }
    }

    pub fn with_brand(name: impl Into<String>, role: Role, brand: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role,
            brand: Some(brand.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

/// One capability per mutating operation. The grants table below is the only
/// place role names are compared; handlers ask for a capability, never a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    CreateContent,
    ScheduleContent,
    ApproveContent,
    PublishContent,
    ArchiveContent,
    UnpublishContent,
    ManageSchedules,
    ManageKeywords,
    ManageJobs,
    TriggerRun,
    ControlEngine,
    RequestAction,
    ReviewAction,
    ExecuteAction,
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::CreateContent => "create_content",
            Capability::ScheduleContent => "schedule_content",
            Capability::ApproveContent => "approve_content",
            Capability::PublishContent => "publish_content",
            Capability::ArchiveContent => "archive_content",
            Capability::UnpublishContent => "unpublish_content",
            Capability::ManageSchedules => "manage_schedules",
            Capability::ManageKeywords => "manage_keywords",
            Capability::ManageJobs => "manage_jobs",
            Capability::TriggerRun => "trigger_run",
            Capability::ControlEngine => "control_engine",
            Capability::RequestAction => "request_action",
            Capability::ReviewAction => "review_action",
            Capability::ExecuteAction => "execute_action",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Grants table
// ---------------------------------------------------------------------------

/// Pure (role, capability) → allowed lookup. Unpublish and execute are the
/// two most elevated operations and stay super-only; viewers mutate nothing.
pub fn allows(role: Role, capability: Capability) -> bool {
    use Capability::*;
    match role {
        Role::Super => true,
        Role::Admin => !matches!(capability, UnpublishContent | ExecuteAction),
        Role::Editor => matches!(
            capability,
            CreateContent | ScheduleContent | ManageKeywords | RequestAction
        ),
        Role::Viewer => false,
    }
}

/// Fail with a permission error unless the actor's role grants `capability`.
pub fn require(actor: &Actor, capability: Capability) -> Result<()> {
    if allows(actor.role, capability) {
        return Ok(());
    }
    Err(PressError::Forbidden {
        role: actor.role.to_string(),
        capability: capability.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn super_holds_every_capability() {
        for cap in [
            Capability::CreateContent,
            Capability::UnpublishContent,
            Capability::ExecuteAction,
            Capability::TriggerRun,
        ] {
            assert!(allows(Role::Super, cap), "super should hold {cap}");
        }
    }

    #[test]
    fn admin_lacks_only_the_elevated_pair() {
        assert!(!allows(Role::Admin, Capability::UnpublishContent));
        assert!(!allows(Role::Admin, Capability::ExecuteAction));
        assert!(allows(Role::Admin, Capability::PublishContent));
        assert!(allows(Role::Admin, Capability::ReviewAction));
        assert!(allows(Role::Admin, Capability::TriggerRun));
    }

    #[test]
    fn editor_is_content_scoped() {
        assert!(allows(Role::Editor, Capability::CreateContent));
        assert!(allows(Role::Editor, Capability::ScheduleContent));
        assert!(allows(Role::Editor, Capability::ManageKeywords));
        assert!(!allows(Role::Editor, Capability::PublishContent));
        assert!(!allows(Role::Editor, Capability::ManageJobs));
        assert!(!allows(Role::Editor, Capability::ReviewAction));
    }

    #[test]
    fn viewer_mutates_nothing() {
        for cap in [
            Capability::CreateContent,
            Capability::ManageKeywords,
            Capability::RequestAction,
        ] {
            assert!(!allows(Role::Viewer, cap));
        }
    }

    #[test]
    fn require_names_role_and_capability() {
        let viewer = Actor::new("vera", Role::Viewer);
        let err = require(&viewer, Capability::PublishContent).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("viewer"), "message: {msg}");
        assert!(msg.contains("publish_content"), "message: {msg}");
    }
}
