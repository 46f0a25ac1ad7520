use std::path::Path;

use chrono::Utc;
use redb::{Database, ReadableTable, TableDefinition};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::{self, Actor, Capability};
use crate::approval::ActionApproval;
use crate::audit::{AuditEntry, AuditLog};
use crate::content::{BulkItemOutcome, BulkOutcome, ContentEntity};
use crate::engine::{
    self, EngineControlFlag, EngineHeartbeat, EngineRunState, EngineStatusReport,
};
use crate::error::{PressError, Result};
use crate::guardrail;
use crate::job::{self, JobPatch, SchedulerJob};
use crate::keyword::{self, KeywordInput, KeywordPatch, ScheduleKeyword};
use crate::paths;
use crate::schedule::{NewSchedule, ScheduleDefinition};
use crate::simulate::{self, SimulationReport};
use crate::types::{
    ActionKind, ContentKind, ContentStatus, JobStatus, KeywordStatus, RunState, Role,
    ScheduleStatus,
};

// ---------------------------------------------------------------------------
// Table definitions
// ---------------------------------------------------------------------------

// Entity families keyed by uuid bytes; values are JSON-encoded records.
const CONTENT: TableDefinition<&[u8], &[u8]> = TableDefinition::new("content");
const SCHEDULES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("schedules");
const KEYWORDS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("keywords");
const JOBS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("jobs");
const APPROVALS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("approvals");

// Engine singletons keyed by engine name.
const HEARTBEATS: TableDefinition<&str, &[u8]> = TableDefinition::new("heartbeats");
const RUN_STATES: TableDefinition<&str, &[u8]> = TableDefinition::new("run_states");
const CONTROL_FLAGS: TableDefinition<&str, &[u8]> = TableDefinition::new("control_flags");

fn db_err(e: impl std::fmt::Display) -> PressError {
    PressError::Store(e.to_string())
}

// ---------------------------------------------------------------------------
// Creation inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct NewContent {
    pub kind: ContentKind,
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub stock: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewJob {
    pub engine: String,
    #[serde(default)]
    pub schedule_id: Option<Uuid>,
    #[serde(default)]
    pub scheduled_for: Option<chrono::DateTime<Utc>>,
    pub batch_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewApproval {
    pub category: ContentKind,
    pub action: ActionKind,
    pub target_id: Uuid,
    #[serde(default)]
    pub priority: u32,
    #[serde(default)]
    pub note: Option<String>,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// The orchestrator's durable state: every entity family in one redb file,
/// with the audit trail alongside in sqlite.
pub struct Store {
    db: Database,
    audit: AuditLog,
}

impl Store {
    /// Open or create the store under `root/.pressroom/`, ensuring every
    /// table exists before any reads.
    pub fn open(root: &Path) -> Result<Self> {
        let db_path = paths::state_db_path(root);
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(&db_path).map_err(db_err)?;
        let wt = db.begin_write().map_err(db_err)?;
        wt.open_table(CONTENT).map_err(db_err)?;
        wt.open_table(SCHEDULES).map_err(db_err)?;
        wt.open_table(KEYWORDS).map_err(db_err)?;
        wt.open_table(JOBS).map_err(db_err)?;
        wt.open_table(APPROVALS).map_err(db_err)?;
        wt.open_table(HEARTBEATS).map_err(db_err)?;
        wt.open_table(RUN_STATES).map_err(db_err)?;
        wt.open_table(CONTROL_FLAGS).map_err(db_err)?;
        wt.commit().map_err(db_err)?;

        let audit = AuditLog::open(&paths::audit_db_path(root))?;
        Ok(Self { db, audit })
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    fn audit(
        &self,
        actor: &str,
        kind: &str,
        id: impl std::fmt::Display,
        before: Option<String>,
        after: Option<String>,
    ) {
        self.audit
            .record_best_effort(AuditEntry::new(actor, kind, id.to_string(), before, after));
    }

    // -----------------------------------------------------------------------
    // Generic JSON row helpers
    // -----------------------------------------------------------------------

    fn get_row<T: DeserializeOwned>(
        &self,
        table: TableDefinition<&[u8], &[u8]>,
        id: Uuid,
    ) -> Result<Option<T>> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(table).map_err(db_err)?;
        match table.get(id.as_bytes().as_slice()).map_err(db_err)? {
            Some(raw) => Ok(Some(serde_json::from_slice(raw.value())?)),
            None => Ok(None),
        }
    }

    fn list_rows<T: DeserializeOwned>(
        &self,
        table: TableDefinition<&[u8], &[u8]>,
    ) -> Result<Vec<T>> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(table).map_err(db_err)?;
        let mut rows = Vec::new();
        for entry in table.iter().map_err(db_err)? {
            let (_, v) = entry.map_err(db_err)?;
            rows.push(serde_json::from_slice(v.value())?);
        }
        Ok(rows)
    }

    fn put_row<T: Serialize>(
        &self,
        table: TableDefinition<&[u8], &[u8]>,
        id: Uuid,
        value: &T,
    ) -> Result<()> {
        let encoded = serde_json::to_vec(value)?;
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = wt.open_table(table).map_err(db_err)?;
            table
                .insert(id.as_bytes().as_slice(), encoded.as_slice())
                .map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Content
    // -----------------------------------------------------------------------

    fn resolve_brand(actor: &Actor, explicit: Option<String>) -> Result<String> {
        let brand = explicit
            .or_else(|| actor.brand.clone())
            .ok_or_else(|| PressError::Validation("no brand supplied or on actor".to_string()))?;
        guardrail::check_brand_scope(actor, &brand)?;
        Ok(brand)
    }

    pub fn create_content(&self, actor: &Actor, input: NewContent) -> Result<ContentEntity> {
        access::require(actor, Capability::CreateContent)?;
        if input.name.trim().is_empty() {
            return Err(PressError::Validation("content name is empty".to_string()));
        }
        let brand = Self::resolve_brand(actor, input.brand)?;
        let mut entity = ContentEntity::new(input.kind, brand, input.name.trim());
        entity.description = input.description;
        entity.category = input.category;
        entity.price = input.price;
        entity.image = input.image;
        entity.stock = input.stock.unwrap_or(0);

        self.put_row(CONTENT, entity.id, &entity)?;
        self.audit(&actor.name, "content", entity.id, None, Some("DRAFT".into()));
        Ok(entity)
    }

    pub fn get_content(&self, actor: &Actor, id: Uuid) -> Result<ContentEntity> {
        let entity: ContentEntity = self
            .get_row(CONTENT, id)?
            .ok_or_else(|| PressError::ContentNotFound(id.to_string()))?;
        guardrail::check_brand_scope(actor, &entity.brand)?;
        Ok(entity)
    }

    /// Newest first, scoped to the actor's brand unless elevated.
    pub fn list_content(&self, actor: &Actor) -> Result<Vec<ContentEntity>> {
        let mut rows: Vec<ContentEntity> = self.list_rows(CONTENT)?;
        if actor.role != Role::Super {
            rows.retain(|c| actor.brand.as_deref() == Some(c.brand.as_str()));
        }
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    /// Run `f` against the stored entity inside one write transaction: read,
    /// validate, bump the version, write. A rule rejection aborts the
    /// transaction with nothing persisted.
    fn mutate_content<F>(&self, actor: &Actor, id: Uuid, f: F) -> Result<(ContentEntity, String)>
    where
        F: FnOnce(&mut ContentEntity) -> Result<String>,
    {
        let wt = self.db.begin_write().map_err(db_err)?;
        let (entity, message, before) = {
            let mut table = wt.open_table(CONTENT).map_err(db_err)?;
            let mut entity: ContentEntity = {
                let raw = table
                    .get(id.as_bytes().as_slice())
                    .map_err(db_err)?
                    .ok_or_else(|| PressError::ContentNotFound(id.to_string()))?;
                serde_json::from_slice(raw.value())?
            };
            guardrail::check_brand_scope(actor, &entity.brand)?;
            let before = entity.status.map(|s| s.to_string());
            let message = f(&mut entity)?;
            entity.version += 1;
            table
                .insert(id.as_bytes().as_slice(), serde_json::to_vec(&entity)?.as_slice())
                .map_err(db_err)?;
            (entity, message, before)
        };
        wt.commit().map_err(db_err)?;

        let after = entity.status.map(|s| s.to_string());
        self.audit(&actor.name, "content", id, before, after);
        Ok((entity, message))
    }

    pub fn schedule_content(
        &self,
        actor: &Actor,
        id: Uuid,
        at: chrono::DateTime<Utc>,
    ) -> Result<(ContentEntity, String)> {
        access::require(actor, Capability::ScheduleContent)?;
        self.mutate_content(actor, id, |entity| entity.schedule(at, Utc::now()))
    }

    pub fn approve_content(&self, actor: &Actor, id: Uuid) -> Result<(ContentEntity, String)> {
        access::require(actor, Capability::ApproveContent)?;
        let name = actor.name.clone();
        self.mutate_content(actor, id, move |entity| entity.approve(&name, Utc::now()))
    }

    pub fn change_content_status(
        &self,
        actor: &Actor,
        id: Uuid,
        next: ContentStatus,
    ) -> Result<(ContentEntity, String)> {
        let capability = match next {
            ContentStatus::Published => Capability::PublishContent,
            ContentStatus::Archived => Capability::ArchiveContent,
            other => {
                return Err(PressError::Validation(format!(
                    "direct status change supports PUBLISHED and ARCHIVED only, not {other}"
                )))
            }
        };
        access::require(actor, capability)?;
        self.mutate_content(actor, id, move |entity| {
            entity.change_status(next, Utc::now())
        })
    }

    pub fn unpublish_content(&self, actor: &Actor, id: Uuid) -> Result<(ContentEntity, String)> {
        access::require(actor, Capability::UnpublishContent)?;
        self.mutate_content(actor, id, |entity| entity.unpublish(Utc::now()))
    }

    /// Apply the status change independently per entity. One rejection never
    /// blocks or rolls back the rest; the batch is deliberately not a single
    /// transaction.
    pub fn bulk_change_status(
        &self,
        actor: &Actor,
        ids: &[Uuid],
        next: ContentStatus,
    ) -> Result<BulkOutcome> {
        let capability = match next {
            ContentStatus::Published => Capability::PublishContent,
            ContentStatus::Archived => Capability::ArchiveContent,
            other => {
                return Err(PressError::Validation(format!(
                    "direct status change supports PUBLISHED and ARCHIVED only, not {other}"
                )))
            }
        };
        access::require(actor, capability)?;

        let mut results = Vec::with_capacity(ids.len());
        for &id in ids {
            let outcome = self.mutate_content(actor, id, |entity| {
                entity.change_status(next, Utc::now())
            });
            results.push(match outcome {
                Ok((_, message)) => BulkItemOutcome {
                    id,
                    ok: true,
                    message,
                },
                Err(e) => BulkItemOutcome {
                    id,
                    ok: false,
                    message: e.to_string(),
                },
            });
        }
        Ok(BulkOutcome::collect(results))
    }

    // -----------------------------------------------------------------------
    // Schedules
    // -----------------------------------------------------------------------

    pub fn create_schedule(
        &self,
        actor: &Actor,
        brand: Option<String>,
        input: NewSchedule,
    ) -> Result<ScheduleDefinition> {
        access::require(actor, Capability::ManageSchedules)?;
        let brand = Self::resolve_brand(actor, brand)?;
        let schedule = ScheduleDefinition::create(brand, input)?;
        self.put_row(SCHEDULES, schedule.id, &schedule)?;
        self.audit(
            &actor.name,
            "schedule",
            schedule.id,
            None,
            Some(schedule.status.to_string()),
        );
        Ok(schedule)
    }

    pub fn get_schedule(&self, id: Uuid) -> Result<ScheduleDefinition> {
        self.get_row(SCHEDULES, id)?
            .ok_or_else(|| PressError::ScheduleNotFound(id.to_string()))
    }

    pub fn list_schedules(&self) -> Result<Vec<ScheduleDefinition>> {
        let mut rows: Vec<ScheduleDefinition> = self.list_rows(SCHEDULES)?;
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    pub fn set_schedule_status(
        &self,
        actor: &Actor,
        id: Uuid,
        status: ScheduleStatus,
    ) -> Result<ScheduleDefinition> {
        access::require(actor, Capability::ManageSchedules)?;
        let wt = self.db.begin_write().map_err(db_err)?;
        let (schedule, before) = {
            let mut table = wt.open_table(SCHEDULES).map_err(db_err)?;
            let mut schedule: ScheduleDefinition = {
                let raw = table
                    .get(id.as_bytes().as_slice())
                    .map_err(db_err)?
                    .ok_or_else(|| PressError::ScheduleNotFound(id.to_string()))?;
                serde_json::from_slice(raw.value())?
            };
            let before = schedule.status.to_string();
            match status {
                ScheduleStatus::Paused => schedule.pause(),
                ScheduleStatus::Active => schedule.resume(),
            }
            table
                .insert(
                    id.as_bytes().as_slice(),
                    serde_json::to_vec(&schedule)?.as_slice(),
                )
                .map_err(db_err)?;
            (schedule, before)
        };
        wt.commit().map_err(db_err)?;
        self.audit(
            &actor.name,
            "schedule",
            id,
            Some(before),
            Some(schedule.status.to_string()),
        );
        Ok(schedule)
    }

    // -----------------------------------------------------------------------
    // Keywords
    // -----------------------------------------------------------------------

    /// Bulk insert: the schedule must exist, the whole batch validates
    /// before any row is written, and all rows land in one transaction.
    pub fn add_keywords(
        &self,
        actor: &Actor,
        schedule_id: Uuid,
        inputs: Vec<KeywordInput>,
    ) -> Result<Vec<ScheduleKeyword>> {
        access::require(actor, Capability::ManageKeywords)?;
        self.get_schedule(schedule_id)?;
        let rows = keyword::build_batch(schedule_id, inputs)?;

        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = wt.open_table(KEYWORDS).map_err(db_err)?;
            for kw in &rows {
                table
                    .insert(kw.id.as_bytes().as_slice(), serde_json::to_vec(kw)?.as_slice())
                    .map_err(db_err)?;
            }
        }
        wt.commit().map_err(db_err)?;
        self.audit(
            &actor.name,
            "keyword",
            format!("batch:{}", schedule_id),
            None,
            Some(format!("PENDING x{}", rows.len())),
        );
        Ok(rows)
    }

    /// Keywords of one schedule, newest first.
    pub fn list_keywords(&self, schedule_id: Uuid) -> Result<Vec<ScheduleKeyword>> {
        self.get_schedule(schedule_id)?;
        let mut rows: Vec<ScheduleKeyword> = self.list_rows(KEYWORDS)?;
        rows.retain(|k| k.schedule_id == schedule_id);
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    /// Load a keyword through its owning schedule. A wrong-schedule probe is
    /// indistinguishable from a nonexistent keyword.
    fn mutate_keyword<F>(
        &self,
        schedule_id: Uuid,
        keyword_id: Uuid,
        f: F,
    ) -> Result<ScheduleKeyword>
    where
        F: FnOnce(&mut ScheduleKeyword) -> Result<()>,
    {
        let wt = self.db.begin_write().map_err(db_err)?;
        let kw = {
            let mut table = wt.open_table(KEYWORDS).map_err(db_err)?;
            let mut kw: ScheduleKeyword = {
                let raw = table
                    .get(keyword_id.as_bytes().as_slice())
                    .map_err(db_err)?
                    .ok_or_else(|| PressError::KeywordNotFound(keyword_id.to_string()))?;
                serde_json::from_slice(raw.value())?
            };
            if kw.schedule_id != schedule_id {
                return Err(PressError::KeywordNotFound(keyword_id.to_string()));
            }
            f(&mut kw)?;
            table
                .insert(
                    keyword_id.as_bytes().as_slice(),
                    serde_json::to_vec(&kw)?.as_slice(),
                )
                .map_err(db_err)?;
            kw
        };
        wt.commit().map_err(db_err)?;
        Ok(kw)
    }

    pub fn update_keyword(
        &self,
        actor: &Actor,
        schedule_id: Uuid,
        keyword_id: Uuid,
        patch: KeywordPatch,
    ) -> Result<ScheduleKeyword> {
        access::require(actor, Capability::ManageKeywords)?;
        let status_patch = patch.status;
        let kw = self.mutate_keyword(schedule_id, keyword_id, |kw| kw.apply_patch(patch))?;
        if let Some(status) = status_patch {
            self.audit(
                &actor.name,
                "keyword",
                keyword_id,
                None,
                Some(status.to_string()),
            );
        }
        Ok(kw)
    }

    pub fn delete_keyword(&self, actor: &Actor, schedule_id: Uuid, keyword_id: Uuid) -> Result<()> {
        access::require(actor, Capability::ManageKeywords)?;
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = wt.open_table(KEYWORDS).map_err(db_err)?;
            let owned = {
                let raw = table
                    .get(keyword_id.as_bytes().as_slice())
                    .map_err(db_err)?
                    .ok_or_else(|| PressError::KeywordNotFound(keyword_id.to_string()))?;
                let kw: ScheduleKeyword = serde_json::from_slice(raw.value())?;
                kw.schedule_id == schedule_id
            };
            if !owned {
                return Err(PressError::KeywordNotFound(keyword_id.to_string()));
            }
            table
                .remove(keyword_id.as_bytes().as_slice())
                .map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;
        self.audit(&actor.name, "keyword", keyword_id, None, Some("deleted".into()));
        Ok(())
    }

    /// Worker surface: atomically select the oldest PENDING keyword of an
    /// ACTIVE schedule and flip it to PROCESSING in the same transaction.
    /// Returns `None` when the backlog is empty or the engine is paused.
    pub fn claim_next_keyword(&self, engine: &str) -> Result<Option<ScheduleKeyword>> {
        if self.control_flag(engine)?.paused {
            return Ok(None);
        }

        let wt = self.db.begin_write().map_err(db_err)?;
        let claimed = {
            let schedules = wt.open_table(SCHEDULES).map_err(db_err)?;
            let mut active: Vec<Uuid> = Vec::new();
            for entry in schedules.iter().map_err(db_err)? {
                let (_, v) = entry.map_err(db_err)?;
                let s: ScheduleDefinition = serde_json::from_slice(v.value())?;
                if s.status == ScheduleStatus::Active {
                    active.push(s.id);
                }
            }
            drop(schedules);

            let mut keywords = wt.open_table(KEYWORDS).map_err(db_err)?;
            let mut oldest: Option<ScheduleKeyword> = None;
            for entry in keywords.iter().map_err(db_err)? {
                let (_, v) = entry.map_err(db_err)?;
                let kw: ScheduleKeyword = serde_json::from_slice(v.value())?;
                if kw.status != KeywordStatus::Pending || !active.contains(&kw.schedule_id) {
                    continue;
                }
                if oldest.as_ref().map_or(true, |o| kw.created_at < o.created_at) {
                    oldest = Some(kw);
                }
            }
            if let Some(ref mut kw) = oldest {
                kw.mark_processing();
                keywords
                    .insert(kw.id.as_bytes().as_slice(), serde_json::to_vec(kw)?.as_slice())
                    .map_err(db_err)?;
            }
            oldest
        };
        wt.commit().map_err(db_err)?;
        Ok(claimed)
    }

    fn worker_keyword_outcome<F>(&self, keyword_id: Uuid, f: F) -> Result<ScheduleKeyword>
    where
        F: FnOnce(&mut ScheduleKeyword),
    {
        let wt = self.db.begin_write().map_err(db_err)?;
        let kw = {
            let mut table = wt.open_table(KEYWORDS).map_err(db_err)?;
            let mut kw: ScheduleKeyword = {
                let raw = table
                    .get(keyword_id.as_bytes().as_slice())
                    .map_err(db_err)?
                    .ok_or_else(|| PressError::KeywordNotFound(keyword_id.to_string()))?;
                serde_json::from_slice(raw.value())?
            };
            f(&mut kw);
            table
                .insert(
                    keyword_id.as_bytes().as_slice(),
                    serde_json::to_vec(&kw)?.as_slice(),
                )
                .map_err(db_err)?;
            kw
        };
        wt.commit().map_err(db_err)?;
        Ok(kw)
    }

    pub fn mark_keyword_done(&self, keyword_id: Uuid) -> Result<ScheduleKeyword> {
        self.worker_keyword_outcome(keyword_id, |kw| kw.mark_done())
    }

    pub fn mark_keyword_failed(
        &self,
        keyword_id: Uuid,
        error: impl Into<String>,
    ) -> Result<ScheduleKeyword> {
        let error = error.into();
        self.worker_keyword_outcome(keyword_id, move |kw| kw.mark_failed(error))
    }

    /// All keywords, newest first. Feeds the engine queue summary.
    pub fn all_keywords(&self) -> Result<Vec<ScheduleKeyword>> {
        let mut rows: Vec<ScheduleKeyword> = self.list_rows(KEYWORDS)?;
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    // -----------------------------------------------------------------------
    // Jobs
    // -----------------------------------------------------------------------

    pub fn create_job(&self, actor: &Actor, input: NewJob) -> Result<SchedulerJob> {
        access::require(actor, Capability::ManageJobs)?;
        paths::validate_engine_name(&input.engine)?;
        if input.batch_size == 0 {
            return Err(PressError::Validation(
                "batch_size must be at least 1".to_string(),
            ));
        }
        let mut job = SchedulerJob::new(&input.engine, JobStatus::Scheduled, input.batch_size);
        job.schedule_id = input.schedule_id;
        job.scheduled_for = input.scheduled_for;
        self.put_row(JOBS, job.id, &job)?;
        self.audit(&actor.name, "job", job.id, None, Some("SCHEDULED".into()));
        Ok(job)
    }

    pub fn get_job(&self, id: Uuid) -> Result<SchedulerJob> {
        self.get_row(JOBS, id)?
            .ok_or_else(|| PressError::JobNotFound(id.to_string()))
    }

    pub fn list_jobs(&self) -> Result<Vec<SchedulerJob>> {
        let mut rows: Vec<SchedulerJob> = self.list_rows(JOBS)?;
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    /// Table-validated transition. A terminal transition on the job the run
    /// guard is holding also releases the guard, in the same transaction.
    pub fn transition_job(
        &self,
        actor: &Actor,
        id: Uuid,
        to: JobStatus,
    ) -> Result<SchedulerJob> {
        access::require(actor, Capability::ManageJobs)?;
        let wt = self.db.begin_write().map_err(db_err)?;
        let (job, before) = {
            let mut jobs = wt.open_table(JOBS).map_err(db_err)?;
            let mut job: SchedulerJob = {
                let raw = jobs
                    .get(id.as_bytes().as_slice())
                    .map_err(db_err)?
                    .ok_or_else(|| PressError::JobNotFound(id.to_string()))?;
                serde_json::from_slice(raw.value())?
            };
            let before = job.status;
            job.transition(to)?;
            job.version += 1;
            jobs.insert(id.as_bytes().as_slice(), serde_json::to_vec(&job)?.as_slice())
                .map_err(db_err)?;
            drop(jobs);

            if job.status.is_terminal() {
                release_guard_if_held(&wt, &job, "job reached a terminal state")?;
            }
            (job, before)
        };
        wt.commit().map_err(db_err)?;
        self.audit(
            &actor.name,
            "job",
            id,
            Some(before.to_string()),
            Some(job.status.to_string()),
        );
        Ok(job)
    }

    pub fn update_job(&self, actor: &Actor, id: Uuid, patch: JobPatch) -> Result<SchedulerJob> {
        access::require(actor, Capability::ManageJobs)?;
        let wt = self.db.begin_write().map_err(db_err)?;
        let job = {
            let mut jobs = wt.open_table(JOBS).map_err(db_err)?;
            let mut job: SchedulerJob = {
                let raw = jobs
                    .get(id.as_bytes().as_slice())
                    .map_err(db_err)?
                    .ok_or_else(|| PressError::JobNotFound(id.to_string()))?;
                serde_json::from_slice(raw.value())?
            };
            job.apply_patch(patch)?;
            job.version += 1;
            jobs.insert(id.as_bytes().as_slice(), serde_json::to_vec(&job)?.as_slice())
                .map_err(db_err)?;
            job
        };
        wt.commit().map_err(db_err)?;
        Ok(job)
    }

    /// Hard delete, refused while the job is RUNNING.
    pub fn delete_job(&self, actor: &Actor, id: Uuid) -> Result<()> {
        access::require(actor, Capability::ManageJobs)?;
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut jobs = wt.open_table(JOBS).map_err(db_err)?;
            let status = {
                let raw = jobs
                    .get(id.as_bytes().as_slice())
                    .map_err(db_err)?
                    .ok_or_else(|| PressError::JobNotFound(id.to_string()))?;
                let job: SchedulerJob = serde_json::from_slice(raw.value())?;
                job.status
            };
            if !job::can_hard_delete(status) {
                return Err(PressError::Conflict(
                    "cannot delete a RUNNING job".to_string(),
                ));
            }
            jobs.remove(id.as_bytes().as_slice()).map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;
        self.audit(&actor.name, "job", id, None, Some("deleted".into()));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Engine: heartbeat, control flag, status
    // -----------------------------------------------------------------------

    /// Worker ingest. Preserves `uptime_start` across consecutive beats and
    /// re-establishes it after a gap.
    pub fn ingest_heartbeat(&self, engine: &str, timeout_ms: u64) -> Result<EngineHeartbeat> {
        paths::validate_engine_name(engine)?;
        let now = Utc::now();
        let wt = self.db.begin_write().map_err(db_err)?;
        let hb = {
            let mut table = wt.open_table(HEARTBEATS).map_err(db_err)?;
            let previous: Option<EngineHeartbeat> = {
                match table.get(engine).map_err(db_err)? {
                    Some(raw) => Some(serde_json::from_slice(raw.value())?),
                    None => None,
                }
            };
            let hb = engine::apply_beat(previous, engine, now, timeout_ms);
            table
                .insert(engine, serde_json::to_vec(&hb)?.as_slice())
                .map_err(db_err)?;
            hb
        };
        wt.commit().map_err(db_err)?;
        Ok(hb)
    }

    pub fn heartbeat(&self, engine: &str) -> Result<Option<EngineHeartbeat>> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(HEARTBEATS).map_err(db_err)?;
        match table.get(engine).map_err(db_err)? {
            Some(raw) => Ok(Some(serde_json::from_slice(raw.value())?)),
            None => Ok(None),
        }
    }

    /// Get-or-create inside one serialized write transaction, so concurrent
    /// first reads observe exactly one row.
    pub fn control_flag(&self, engine: &str) -> Result<EngineControlFlag> {
        paths::validate_engine_name(engine)?;
        let wt = self.db.begin_write().map_err(db_err)?;
        let flag = {
            let mut table = wt.open_table(CONTROL_FLAGS).map_err(db_err)?;
            let existing: Option<EngineControlFlag> = {
                match table.get(engine).map_err(db_err)? {
                    Some(raw) => Some(serde_json::from_slice(raw.value())?),
                    None => None,
                }
            };
            match existing {
                Some(flag) => flag,
                None => {
                    let flag = EngineControlFlag::new(engine);
                    table
                        .insert(engine, serde_json::to_vec(&flag)?.as_slice())
                        .map_err(db_err)?;
                    flag
                }
            }
        };
        wt.commit().map_err(db_err)?;
        Ok(flag)
    }

    pub fn set_engine_paused(
        &self,
        actor: &Actor,
        engine: &str,
        paused: bool,
    ) -> Result<EngineControlFlag> {
        access::require(actor, Capability::ControlEngine)?;
        let mut flag = self.control_flag(engine)?;
        flag.paused = paused;
        flag.updated_at = Utc::now();

        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = wt.open_table(CONTROL_FLAGS).map_err(db_err)?;
            table
                .insert(engine, serde_json::to_vec(&flag)?.as_slice())
                .map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;
        self.audit(
            &actor.name,
            "engine",
            engine,
            None,
            Some(if paused { "paused" } else { "resumed" }.to_string()),
        );
        Ok(flag)
    }

    pub fn run_state(&self, engine: &str) -> Result<EngineRunState> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(RUN_STATES).map_err(db_err)?;
        match table.get(engine).map_err(db_err)? {
            Some(raw) => Ok(serde_json::from_slice(raw.value())?),
            None => Ok(EngineRunState::idle(engine)),
        }
    }

    /// Full dashboard read for one engine.
    pub fn engine_status(&self, engine: &str, timeout_ms: u64) -> Result<EngineStatusReport> {
        paths::validate_engine_name(engine)?;
        let flag = self.control_flag(engine)?;
        let now = Utc::now();
        let hb = self.heartbeat(engine)?;
        let liveness = engine::liveness(hb.as_ref(), now, timeout_ms);
        let uptime = engine::uptime(hb.as_ref(), now, liveness);
        let jobs = self.list_jobs()?;
        let keywords = self.all_keywords()?;
        let run = self.run_state(engine)?;
        Ok(EngineStatusReport {
            engine: engine.to_string(),
            liveness,
            last_beat_at: hb.map(|h| h.last_beat_at),
            uptime,
            worker: engine::worker_activity(&jobs),
            queue: engine::queue_summary(&keywords, engine::local_today()),
            paused: flag.paused,
            run_state: run.state,
            run_job_id: run.job_id,
            run_note: run.note,
        })
    }

    // -----------------------------------------------------------------------
    // Engine: single-flight run guard
    // -----------------------------------------------------------------------

    /// Atomic single-flight acquire keyed by engine name: one serialized
    /// write transaction reads the run state, rejects with a conflict if a
    /// run is already held, and otherwise writes RUNNING plus the new job.
    /// "Already running" leaves the state untouched.
    pub fn acquire_run(&self, actor: &Actor, engine: &str, batch_size: u32) -> Result<SchedulerJob> {
        access::require(actor, Capability::TriggerRun)?;
        paths::validate_engine_name(engine)?;

        let wt = self.db.begin_write().map_err(db_err)?;
        let job = {
            let mut states = wt.open_table(RUN_STATES).map_err(db_err)?;
            let current: Option<EngineRunState> = {
                match states.get(engine).map_err(db_err)? {
                    Some(raw) => Some(serde_json::from_slice(raw.value())?),
                    None => None,
                }
            };
            if current.as_ref().is_some_and(|s| s.state == RunState::Running) {
                return Err(PressError::Conflict(format!(
                    "a run is already in progress for engine '{engine}'"
                )));
            }

            let job = SchedulerJob::new(engine, JobStatus::Running, batch_size);
            let state = EngineRunState {
                engine: engine.to_string(),
                state: RunState::Running,
                job_id: Some(job.id),
                note: None,
                updated_at: Utc::now(),
            };
            states
                .insert(engine, serde_json::to_vec(&state)?.as_slice())
                .map_err(db_err)?;
            drop(states);

            let mut jobs = wt.open_table(JOBS).map_err(db_err)?;
            jobs.insert(
                job.id.as_bytes().as_slice(),
                serde_json::to_vec(&job)?.as_slice(),
            )
            .map_err(db_err)?;
            job
        };
        wt.commit().map_err(db_err)?;
        self.audit(&actor.name, "job", job.id, None, Some("RUNNING".into()));
        Ok(job)
    }

    /// Terminal half of the detached run task. Success completes the job and
    /// releases the guard; failure cancels the job with the error recorded
    /// and parks the run state at ERROR, observable and recoverable. If an
    /// operator already cancelled the job, the task stands down without
    /// touching anything.
    pub fn finish_run(&self, engine: &str, job_id: Uuid, error: Option<String>) -> Result<()> {
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut jobs = wt.open_table(JOBS).map_err(db_err)?;
            let mut job: SchedulerJob = {
                let raw = jobs
                    .get(job_id.as_bytes().as_slice())
                    .map_err(db_err)?
                    .ok_or_else(|| PressError::JobNotFound(job_id.to_string()))?;
                serde_json::from_slice(raw.value())?
            };
            if job.status.is_terminal() {
                // Cancelled cooperatively; the guard was released then.
                return Ok(());
            }

            let state = match &error {
                None => {
                    job.transition(JobStatus::Completed)?;
                    EngineRunState {
                        engine: engine.to_string(),
                        state: RunState::Idle,
                        job_id: None,
                        note: None,
                        updated_at: Utc::now(),
                    }
                }
                Some(message) => {
                    job.last_error = Some(message.clone());
                    job.transition(JobStatus::Cancelled)?;
                    EngineRunState {
                        engine: engine.to_string(),
                        state: RunState::Error,
                        job_id: Some(job.id),
                        note: Some(message.clone()),
                        updated_at: Utc::now(),
                    }
                }
            };
            job.version += 1;
            jobs.insert(
                job_id.as_bytes().as_slice(),
                serde_json::to_vec(&job)?.as_slice(),
            )
            .map_err(db_err)?;
            drop(jobs);

            let mut states = wt.open_table(RUN_STATES).map_err(db_err)?;
            states
                .insert(engine, serde_json::to_vec(&state)?.as_slice())
                .map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;
        Ok(())
    }

    /// Jobs left RUNNING by a dead process move to CANCELLED and their
    /// engine's run state to ERROR. PROCESSING keywords stay untouched; they
    /// belong to the external worker, which survives orchestrator restarts.
    pub fn startup_recovery(&self) -> Result<u32> {
        let wt = self.db.begin_write().map_err(db_err)?;
        let count = {
            let mut jobs = wt.open_table(JOBS).map_err(db_err)?;
            let mut orphaned: Vec<SchedulerJob> = Vec::new();
            for entry in jobs.iter().map_err(db_err)? {
                let (_, v) = entry.map_err(db_err)?;
                let job: SchedulerJob = serde_json::from_slice(v.value())?;
                if job.status == JobStatus::Running {
                    orphaned.push(job);
                }
            }
            let mut engines: Vec<String> = Vec::new();
            for job in &mut orphaned {
                job.last_error = Some("orchestrator restarted during run".to_string());
                job.transition(JobStatus::Cancelled)?;
                job.version += 1;
                jobs.insert(
                    job.id.as_bytes().as_slice(),
                    serde_json::to_vec(job)?.as_slice(),
                )
                .map_err(db_err)?;
                if !engines.contains(&job.engine) {
                    engines.push(job.engine.clone());
                }
            }
            drop(jobs);

            let mut states = wt.open_table(RUN_STATES).map_err(db_err)?;
            for engine in &engines {
                let state = EngineRunState {
                    engine: engine.clone(),
                    state: RunState::Error,
                    job_id: None,
                    note: Some("orchestrator restarted during run".to_string()),
                    updated_at: Utc::now(),
                };
                states
                    .insert(engine.as_str(), serde_json::to_vec(&state)?.as_slice())
                    .map_err(db_err)?;
            }
            orphaned.len() as u32
        };
        wt.commit().map_err(db_err)?;
        Ok(count)
    }

    // -----------------------------------------------------------------------
    // Approvals
    // -----------------------------------------------------------------------

    pub fn create_approval(&self, actor: &Actor, input: NewApproval) -> Result<ActionApproval> {
        access::require(actor, Capability::RequestAction)?;
        if let Some(note) = &input.note {
            guardrail::check_action_intent(note)?;
        }
        // The target must exist and be in scope before anything is queued.
        self.get_content(actor, input.target_id)?;

        let approval = ActionApproval::new(
            input.category,
            input.action,
            input.target_id,
            input.priority,
            &actor.name,
            input.note,
        );
        self.put_row(APPROVALS, approval.id, &approval)?;
        self.audit(
            &actor.name,
            "approval",
            approval.id,
            None,
            Some("PENDING".into()),
        );
        Ok(approval)
    }

    pub fn get_approval(&self, id: Uuid) -> Result<ActionApproval> {
        self.get_row(APPROVALS, id)?
            .ok_or_else(|| PressError::ApprovalNotFound(id.to_string()))
    }

    pub fn list_approvals(&self) -> Result<Vec<ActionApproval>> {
        let mut rows: Vec<ActionApproval> = self.list_rows(APPROVALS)?;
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    fn mutate_approval<F>(&self, actor: &Actor, id: Uuid, f: F) -> Result<(ActionApproval, String)>
    where
        F: FnOnce(&mut ActionApproval) -> Result<String>,
    {
        let wt = self.db.begin_write().map_err(db_err)?;
        let (approval, message, before) = {
            let mut table = wt.open_table(APPROVALS).map_err(db_err)?;
            let mut approval: ActionApproval = {
                let raw = table
                    .get(id.as_bytes().as_slice())
                    .map_err(db_err)?
                    .ok_or_else(|| PressError::ApprovalNotFound(id.to_string()))?;
                serde_json::from_slice(raw.value())?
            };
            let before = approval.status.to_string();
            let message = f(&mut approval)?;
            approval.version += 1;
            table
                .insert(id.as_bytes().as_slice(), serde_json::to_vec(&approval)?.as_slice())
                .map_err(db_err)?;
            (approval, message, before)
        };
        wt.commit().map_err(db_err)?;
        self.audit(
            &actor.name,
            "approval",
            id,
            Some(before),
            Some(approval.status.to_string()),
        );
        Ok((approval, message))
    }

    pub fn approve_approval(&self, actor: &Actor, id: Uuid) -> Result<(ActionApproval, String)> {
        access::require(actor, Capability::ReviewAction)?;
        let name = actor.name.clone();
        self.mutate_approval(actor, id, move |a| a.approve(&name))
    }

    pub fn reject_approval(
        &self,
        actor: &Actor,
        id: Uuid,
        reason: Option<String>,
    ) -> Result<(ActionApproval, String)> {
        access::require(actor, Capability::ReviewAction)?;
        let name = actor.name.clone();
        self.mutate_approval(actor, id, move |a| a.reject(&name, reason))
    }

    /// Privileged execution: flips the approval to EXECUTED and applies the
    /// action's effect to the target in the same transaction. A second
    /// execute is a conflict.
    pub fn execute_approval(&self, actor: &Actor, id: Uuid) -> Result<(ActionApproval, String)> {
        access::require(actor, Capability::ExecuteAction)?;

        let wt = self.db.begin_write().map_err(db_err)?;
        let (approval, message, before) = {
            let mut approvals = wt.open_table(APPROVALS).map_err(db_err)?;
            let mut approval: ActionApproval = {
                let raw = approvals
                    .get(id.as_bytes().as_slice())
                    .map_err(db_err)?
                    .ok_or_else(|| PressError::ApprovalNotFound(id.to_string()))?;
                serde_json::from_slice(raw.value())?
            };
            let before = approval.status.to_string();
            let message = approval.execute(&actor.name)?;
            approval.version += 1;
            approvals
                .insert(id.as_bytes().as_slice(), serde_json::to_vec(&approval)?.as_slice())
                .map_err(db_err)?;
            drop(approvals);

            // Apply the modeled effect; combinations without a model leave
            // the target untouched.
            if approval.category == ContentKind::Product && approval.action == ActionKind::Promote
            {
                let mut content = wt.open_table(CONTENT).map_err(db_err)?;
                let target: Option<ContentEntity> = {
                    match content
                        .get(approval.target_id.as_bytes().as_slice())
                        .map_err(db_err)?
                    {
                        Some(raw) => Some(serde_json::from_slice(raw.value())?),
                        None => None,
                    }
                };
                if let Some(mut target) = target {
                    target.priority =
                        (target.priority + simulate::PRIORITY_STEP).min(simulate::MAX_PRIORITY);
                    target.featured = !target.featured;
                    target.updated_at = Utc::now();
                    target.version += 1;
                    content
                        .insert(
                            approval.target_id.as_bytes().as_slice(),
                            serde_json::to_vec(&target)?.as_slice(),
                        )
                        .map_err(db_err)?;
                }
            }
            (approval, message, before)
        };
        wt.commit().map_err(db_err)?;
        self.audit(
            &actor.name,
            "approval",
            id,
            Some(before),
            Some("EXECUTED".into()),
        );
        Ok((approval, message))
    }

    /// Read-only dry run against the current target state. Performs zero
    /// writes under any input.
    pub fn simulate_action(
        &self,
        actor: &Actor,
        category: ContentKind,
        action: ActionKind,
        target_id: Uuid,
    ) -> Result<SimulationReport> {
        let target = self.get_content(actor, target_id)?;
        Ok(simulate::simulate(category, action, &target))
    }
}

/// Release the run guard if `job` is the one it is holding. Caller owns the
/// surrounding write transaction.
fn release_guard_if_held(
    wt: &redb::WriteTransaction,
    job: &SchedulerJob,
    note: &str,
) -> Result<()> {
    let mut states = wt.open_table(RUN_STATES).map_err(db_err)?;
    let held: Option<EngineRunState> = {
        match states.get(job.engine.as_str()).map_err(db_err)? {
            Some(raw) => Some(serde_json::from_slice(raw.value())?),
            None => None,
        }
    };
    if let Some(state) = held {
        if state.state == RunState::Running && state.job_id == Some(job.id) {
            let released = EngineRunState {
                engine: job.engine.clone(),
                state: RunState::Idle,
                job_id: None,
                note: Some(note.to_string()),
                updated_at: Utc::now(),
            };
            states
                .insert(job.engine.as_str(), serde_json::to_vec(&released)?.as_slice())
                .map_err(db_err)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
