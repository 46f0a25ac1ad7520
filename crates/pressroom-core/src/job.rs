use crate::error::{PressError, Result};
use crate::types::JobStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Transition table
// ---------------------------------------------------------------------------

/// Allowed next states per job status. CANCELLED and COMPLETED are terminal.
pub fn allowed_next(from: JobStatus) -> &'static [JobStatus] {
    match from {
        JobStatus::Scheduled => &[JobStatus::Running, JobStatus::Paused, JobStatus::Cancelled],
        JobStatus::Running => &[JobStatus::Paused, JobStatus::Completed, JobStatus::Cancelled],
        JobStatus::Paused => &[JobStatus::Running, JobStatus::Cancelled],
        JobStatus::Cancelled | JobStatus::Completed => &[],
    }
}

/// Same-state transitions are idempotent no-ops and always valid.
pub fn is_valid_transition(from: JobStatus, to: JobStatus) -> bool {
    from == to || allowed_next(from).contains(&to)
}

/// `Ok(())` when valid; otherwise a rejection naming the allowed next states
/// so both tests and humans can read it.
pub fn validate_transition(from: JobStatus, to: JobStatus) -> Result<()> {
    if is_valid_transition(from, to) {
        return Ok(());
    }
    let allowed: Vec<String> = allowed_next(from).iter().map(|s| s.to_string()).collect();
    let reason = if allowed.is_empty() {
        format!("{from} is terminal")
    } else {
        format!("allowed next states: [{}]", allowed.join(", "))
    };
    Err(PressError::InvalidTransition {
        from: from.to_string(),
        to: to.to_string(),
        reason,
    })
}

// ---------------------------------------------------------------------------
// Derived predicates
// ---------------------------------------------------------------------------

/// Live work is never deleted out from under its worker.
pub fn can_hard_delete(status: JobStatus) -> bool {
    status != JobStatus::Running
}

pub fn can_pause(status: JobStatus) -> bool {
    matches!(status, JobStatus::Scheduled | JobStatus::Running)
}

pub fn can_resume(status: JobStatus) -> bool {
    status == JobStatus::Paused
}

pub fn can_cancel(status: JobStatus) -> bool {
    !status.is_terminal()
}

/// RUNNING is immutable; editing schedule time or batch size mid-flight
/// would race the in-progress execution.
pub fn can_update(status: JobStatus) -> bool {
    matches!(status, JobStatus::Scheduled | JobStatus::Paused)
}

// ---------------------------------------------------------------------------
// SchedulerJob
// ---------------------------------------------------------------------------

/// One admitted unit of scheduled work. A separate machine from the keyword
/// queue; the vocabularies never mix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerJob {
    pub id: Uuid,
    pub engine: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_id: Option<Uuid>,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    pub batch_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
}

/// Fields an operator may change while the job is SCHEDULED or PAUSED.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobPatch {
    #[serde(default)]
    pub scheduled_for: Option<DateTime<Utc>>,
    #[serde(default)]
    pub batch_size: Option<u32>,
}

impl SchedulerJob {
    pub fn new(engine: impl Into<String>, status: JobStatus, batch_size: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            engine: engine.into(),
            schedule_id: None,
            status,
            scheduled_for: None,
            batch_size,
            last_error: None,
            started_at: if status == JobStatus::Running {
                Some(now)
            } else {
                None
            },
            finished_at: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Move to `to` after table validation, stamping started/finished times.
    pub fn transition(&mut self, to: JobStatus) -> Result<()> {
        validate_transition(self.status, to)?;
        if self.status == to {
            return Ok(());
        }
        let now = Utc::now();
        if to == JobStatus::Running && self.started_at.is_none() {
            self.started_at = Some(now);
        }
        if to.is_terminal() {
            self.finished_at = Some(now);
        }
        self.status = to;
        self.updated_at = now;
        Ok(())
    }

    pub fn apply_patch(&mut self, patch: JobPatch) -> Result<()> {
        if !can_update(self.status) {
            return Err(PressError::Conflict(format!(
                "job is {}; only SCHEDULED or PAUSED jobs accept edits",
                self.status
            )));
        }
        if let Some(at) = patch.scheduled_for {
            self.scheduled_for = Some(at);
        }
        if let Some(size) = patch.batch_size {
            if size == 0 {
                return Err(PressError::Validation(
                    "batch_size must be at least 1".to_string(),
                ));
            }
            self.batch_size = size;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_outside_the_table_are_rejected() {
        use JobStatus::*;
        let table = [
            (Scheduled, Running),
            (Scheduled, Paused),
            (Scheduled, Cancelled),
            (Running, Paused),
            (Running, Completed),
            (Running, Cancelled),
            (Paused, Running),
            (Paused, Cancelled),
        ];
        for &from in JobStatus::all() {
            for &to in JobStatus::all() {
                let expected = from == to || table.contains(&(from, to));
                assert_eq!(
                    is_valid_transition(from, to),
                    expected,
                    "({from}, {to}) should be {expected}"
                );
            }
        }
    }

    #[test]
    fn terminal_states_reject_everything_else() {
        for from in [JobStatus::Cancelled, JobStatus::Completed] {
            for &to in JobStatus::all() {
                if to == from {
                    continue;
                }
                let err = validate_transition(from, to).unwrap_err();
                assert!(err.to_string().contains("terminal"), "err: {err}");
            }
        }
    }

    #[test]
    fn rejection_names_allowed_next_states() {
        let err = validate_transition(JobStatus::Paused, JobStatus::Completed).unwrap_err();
        match err {
            PressError::InvalidTransition { reason, .. } => {
                assert!(reason.contains("RUNNING"), "reason: {reason}");
                assert!(reason.contains("CANCELLED"), "reason: {reason}");
            }
            other => panic!("expected InvalidTransition, got {other}"),
        }
    }

    #[test]
    fn hard_delete_blocked_only_while_running() {
        assert!(!can_hard_delete(JobStatus::Running));
        for status in [
            JobStatus::Scheduled,
            JobStatus::Paused,
            JobStatus::Cancelled,
            JobStatus::Completed,
        ] {
            assert!(can_hard_delete(status), "{status} should allow delete");
        }
    }

    #[test]
    fn pause_resume_cancel_predicates() {
        assert!(can_pause(JobStatus::Scheduled));
        assert!(can_pause(JobStatus::Running));
        assert!(!can_pause(JobStatus::Paused));

        assert!(can_resume(JobStatus::Paused));
        assert!(!can_resume(JobStatus::Running));

        assert!(can_cancel(JobStatus::Scheduled));
        assert!(can_cancel(JobStatus::Running));
        assert!(can_cancel(JobStatus::Paused));
        assert!(!can_cancel(JobStatus::Cancelled));
        assert!(!can_cancel(JobStatus::Completed));
    }

    #[test]
    fn update_only_while_scheduled_or_paused() {
        assert!(can_update(JobStatus::Scheduled));
        assert!(can_update(JobStatus::Paused));
        assert!(!can_update(JobStatus::Running));
        assert!(!can_update(JobStatus::Cancelled));
        assert!(!can_update(JobStatus::Completed));
    }

    #[test]
    fn transition_stamps_timestamps() {
        let mut job = SchedulerJob::new("production", JobStatus::Scheduled, 5);
        assert!(job.started_at.is_none());
        job.transition(JobStatus::Running).unwrap();
        assert!(job.started_at.is_some());
        assert!(job.finished_at.is_none());
        job.transition(JobStatus::Completed).unwrap();
        assert!(job.finished_at.is_some());
    }

    #[test]
    fn same_state_transition_is_a_noop() {
        let mut job = SchedulerJob::new("production", JobStatus::Scheduled, 5);
        let before = job.updated_at;
        job.transition(JobStatus::Scheduled).unwrap();
        assert_eq!(job.updated_at, before);
    }

    #[test]
    fn patch_rejected_while_running() {
        let mut job = SchedulerJob::new("production", JobStatus::Running, 5);
        let err = job
            .apply_patch(JobPatch {
                batch_size: Some(10),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, PressError::Conflict(_)));
        assert_eq!(job.batch_size, 5);
    }

    #[test]
    fn patch_rejects_zero_batch() {
        let mut job = SchedulerJob::new("production", JobStatus::Scheduled, 5);
        assert!(job
            .apply_patch(JobPatch {
                batch_size: Some(0),
                ..Default::default()
            })
            .is_err());
    }
}
