use crate::job::SchedulerJob;
use crate::keyword::ScheduleKeyword;
use crate::types::{EngineLiveness, JobStatus, KeywordStatus, RunState, WorkerActivity};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Written only by the external worker via the heartbeat ingest; the
/// orchestrator's own operations never touch it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineHeartbeat {
    pub engine: String,
    pub last_beat_at: DateTime<Utc>,
    pub uptime_start: DateTime<Utc>,
}

/// Singleton pause/resume flag, created on first read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineControlFlag {
    pub engine: String,
    pub paused: bool,
    pub updated_at: DateTime<Utc>,
}

impl EngineControlFlag {
    pub fn new(engine: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            paused: false,
            updated_at: Utc::now(),
        }
    }
}

/// Persisted single-flight marker for the manual run trigger. RUNNING is the
/// held guard; ERROR is observable and does not block the next acquire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineRunState {
    pub engine: String,
    pub state: RunState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl EngineRunState {
    pub fn idle(engine: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            state: RunState::Idle,
            job_id: None,
            note: None,
            updated_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Liveness derivation
// ---------------------------------------------------------------------------

/// STOPPED without a heartbeat row; otherwise RUNNING iff the last beat is
/// within `timeout_ms` of `now`.
pub fn liveness(
    heartbeat: Option<&EngineHeartbeat>,
    now: DateTime<Utc>,
    timeout_ms: u64,
) -> EngineLiveness {
    match heartbeat {
        None => EngineLiveness::Stopped,
        Some(hb) => {
            let age_ms = (now - hb.last_beat_at).num_milliseconds();
            if age_ms >= 0 && (age_ms as u64) < timeout_ms {
                EngineLiveness::Running
            } else {
                EngineLiveness::Stopped
            }
        }
    }
}

/// "00:00" unless the engine is RUNNING; otherwise elapsed time since
/// `uptime_start` as zero-padded HH:mm, truncated to whole minutes.
pub fn uptime(
    heartbeat: Option<&EngineHeartbeat>,
    now: DateTime<Utc>,
    status: EngineLiveness,
) -> String {
    let Some(hb) = heartbeat else {
        return "00:00".to_string();
    };
    if status != EngineLiveness::Running {
        return "00:00".to_string();
    }
    let total_minutes = (now - hb.uptime_start).num_minutes().max(0);
    format!("{:02}:{:02}", total_minutes / 60, total_minutes % 60)
}

/// ACTIVE iff any scheduler job is RUNNING, independent of the heartbeat: a
/// stale-heartbeat engine can still hold a RUNNING job from a stuck run.
pub fn worker_activity(jobs: &[SchedulerJob]) -> WorkerActivity {
    if jobs.iter().any(|j| j.status == JobStatus::Running) {
        WorkerActivity::Active
    } else {
        WorkerActivity::Idle
    }
}

/// Apply a fresh beat. `uptime_start` is preserved across consecutive beats
/// and re-established after a gap longer than the liveness threshold, so a
/// restarted worker's uptime starts over.
pub fn apply_beat(
    previous: Option<EngineHeartbeat>,
    engine: &str,
    now: DateTime<Utc>,
    timeout_ms: u64,
) -> EngineHeartbeat {
    let uptime_start = match &previous {
        Some(prev) if liveness(Some(prev), now, timeout_ms) == EngineLiveness::Running => {
            prev.uptime_start
        }
        _ => now,
    };
    EngineHeartbeat {
        engine: engine.to_string(),
        last_beat_at: now,
        uptime_start,
    }
}

// ---------------------------------------------------------------------------
// Queue summary
// ---------------------------------------------------------------------------

/// Keyword counts for the dashboard. PENDING, PROCESSING, and FAILED are
/// all-time; DONE counts only the local calendar day, answering "how much
/// got done today."
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueSummary {
    pub pending: usize,
    pub processing: usize,
    pub failed: usize,
    pub done_today: usize,
}

pub fn queue_summary(keywords: &[ScheduleKeyword], today: NaiveDate) -> QueueSummary {
    let mut summary = QueueSummary::default();
    for kw in keywords {
        match kw.status {
            KeywordStatus::Pending => summary.pending += 1,
            KeywordStatus::Processing => summary.processing += 1,
            KeywordStatus::Failed => summary.failed += 1,
            KeywordStatus::Done => {
                if kw.updated_at.with_timezone(&Local).date_naive() == today {
                    summary.done_today += 1;
                }
            }
        }
    }
    summary
}

/// Today in the local calendar, for the queue summary's DONE scope.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

// ---------------------------------------------------------------------------
// Status report
// ---------------------------------------------------------------------------

/// Full dashboard read for one engine.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatusReport {
    pub engine: String,
    pub liveness: EngineLiveness,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_beat_at: Option<DateTime<Utc>>,
    pub uptime: String,
    pub worker: WorkerActivity,
    pub queue: QueueSummary,
    pub paused: bool,
    pub run_state: RunState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_job_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_note: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const TIMEOUT_MS: u64 = 60_000;

    fn beat(last: DateTime<Utc>, start: DateTime<Utc>) -> EngineHeartbeat {
        EngineHeartbeat {
            engine: "production".to_string(),
            last_beat_at: last,
            uptime_start: start,
        }
    }

    #[test]
    fn fresh_beat_is_running() {
        let now = Utc::now();
        let hb = beat(now - Duration::seconds(30), now - Duration::hours(1));
        assert_eq!(liveness(Some(&hb), now, TIMEOUT_MS), EngineLiveness::Running);
    }

    #[test]
    fn stale_beat_is_stopped() {
        let now = Utc::now();
        let hb = beat(now - Duration::seconds(90), now - Duration::hours(1));
        assert_eq!(liveness(Some(&hb), now, TIMEOUT_MS), EngineLiveness::Stopped);
    }

    #[test]
    fn missing_row_is_stopped_with_zero_uptime() {
        let now = Utc::now();
        assert_eq!(liveness(None, now, TIMEOUT_MS), EngineLiveness::Stopped);
        assert_eq!(uptime(None, now, EngineLiveness::Stopped), "00:00");
    }

    #[test]
    fn uptime_truncates_to_whole_minutes() {
        let now = Utc::now();
        let hb = beat(
            now - Duration::seconds(10),
            now - Duration::minutes(95) - Duration::seconds(59),
        );
        // 95m59s truncates to 95 minutes, never rounds up.
        assert_eq!(uptime(Some(&hb), now, EngineLiveness::Running), "01:35");
    }

    #[test]
    fn uptime_zero_when_stopped() {
        let now = Utc::now();
        let hb = beat(now - Duration::minutes(5), now - Duration::hours(3));
        assert_eq!(uptime(Some(&hb), now, EngineLiveness::Stopped), "00:00");
    }

    #[test]
    fn worker_activity_tracks_running_jobs_only() {
        let mut jobs = vec![
            SchedulerJob::new("production", JobStatus::Scheduled, 5),
            SchedulerJob::new("production", JobStatus::Completed, 5),
        ];
        assert_eq!(worker_activity(&jobs), WorkerActivity::Idle);
        jobs.push(SchedulerJob::new("production", JobStatus::Running, 5));
        assert_eq!(worker_activity(&jobs), WorkerActivity::Active);
    }

    #[test]
    fn apply_beat_preserves_uptime_start_within_threshold() {
        let now = Utc::now();
        let prev = beat(now - Duration::seconds(30), now - Duration::hours(2));
        let next = apply_beat(Some(prev.clone()), "production", now, TIMEOUT_MS);
        assert_eq!(next.uptime_start, prev.uptime_start);
        assert_eq!(next.last_beat_at, now);
    }

    #[test]
    fn apply_beat_restarts_uptime_after_gap() {
        let now = Utc::now();
        let prev = beat(now - Duration::minutes(10), now - Duration::hours(2));
        let next = apply_beat(Some(prev), "production", now, TIMEOUT_MS);
        assert_eq!(next.uptime_start, now);
    }

    #[test]
    fn first_beat_establishes_uptime_start() {
        let now = Utc::now();
        let hb = apply_beat(None, "production", now, TIMEOUT_MS);
        assert_eq!(hb.uptime_start, now);
    }

    #[test]
    fn queue_summary_scopes_done_to_today() {
        let sid = Uuid::new_v4();
        let mut rows = crate::keyword::build_batch(
            sid,
            vec![
                crate::keyword::KeywordInput {
                    primary_keyword: "a".into(),
                    secondary_keywords: vec![],
                },
                crate::keyword::KeywordInput {
                    primary_keyword: "b".into(),
                    secondary_keywords: vec![],
                },
                crate::keyword::KeywordInput {
                    primary_keyword: "c".into(),
                    secondary_keywords: vec![],
                },
            ],
        )
        .unwrap();
        rows[0].mark_done();
        rows[1].mark_done();
        rows[1].updated_at = Utc::now() - Duration::days(2);
        rows[2].mark_failed("boom");

        let summary = queue_summary(&rows, local_today());
        assert_eq!(summary.done_today, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.pending, 0);
    }
}
