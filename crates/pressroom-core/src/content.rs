use crate::error::{PressError, Result};
use crate::types::{ContentKind, ContentStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// ContentEntity
// ---------------------------------------------------------------------------

/// A product or post moving through the publishing lifecycle. Both kinds
/// share one shape; products additionally carry price, stock, and the
/// merchandising counters the promotion simulation reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentEntity {
    pub id: Uuid,
    pub kind: ContentKind,
    pub brand: String,
    /// `None` on legacy rows, which every reader treats as DRAFT.
    #[serde(default)]
    pub status: Option<ContentStatus>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Required for publish on PRODUCT entities only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    // Merchandising state, read-only to everything except the executed
    // PROMOTE action.
    #[serde(default)]
    pub priority: u32,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub stock: i64,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub click_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped on every write; two actors racing on the same row lose cleanly.
    #[serde(default)]
    pub version: u64,
}

fn default_active() -> bool {
    true
}

impl ContentEntity {
    pub fn new(kind: ContentKind, brand: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind,
            brand: brand.into(),
            status: Some(ContentStatus::Draft),
            name: name.into(),
            description: None,
            category: None,
            price: None,
            image: None,
            scheduled_at: None,
            approved_by: None,
            approved_at: None,
            published_at: None,
            priority: 0,
            featured: false,
            stock: 0,
            active: true,
            view_count: 0,
            click_count: 0,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Legacy rows without a status are drafts.
    pub fn effective_status(&self) -> ContentStatus {
        self.status.unwrap_or(ContentStatus::Draft)
    }
}

// ---------------------------------------------------------------------------
// Transition table
// ---------------------------------------------------------------------------

/// Allowed next states for each content status. PUBLISHED is reachable only
/// through the explicit publish action; approval never publishes.
pub fn allowed_next(current: ContentStatus) -> &'static [ContentStatus] {
    match current {
        ContentStatus::Draft => &[ContentStatus::Scheduled],
        ContentStatus::Scheduled => &[ContentStatus::ReadyToPublish],
        ContentStatus::ReadyToPublish => {
            // Re-approve is idempotent; publish is the separate manual step.
            &[ContentStatus::ReadyToPublish, ContentStatus::Published]
        }
        ContentStatus::Published => &[ContentStatus::Draft, ContentStatus::Archived],
        ContentStatus::Archived => &[],
    }
}

/// Table lookup for `(current, next)`. Same-state is always permitted.
pub fn can_transition_to(current: ContentStatus, next: ContentStatus) -> bool {
    current == next || allowed_next(current).contains(&next)
}

fn transition_rejection(current: ContentStatus, next: ContentStatus) -> PressError {
    let allowed: Vec<String> = allowed_next(current).iter().map(|s| s.to_string()).collect();
    PressError::InvalidTransition {
        from: current.to_string(),
        to: next.to_string(),
        reason: format!("allowed next states: [{}]", allowed.join(", ")),
    }
}

// ---------------------------------------------------------------------------
// Publishability
// ---------------------------------------------------------------------------

fn text_present(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.trim().is_empty())
}

/// True iff every required-for-publish field is present and, for text
/// fields, non-empty after trimming. Price counts only for products.
pub fn is_publishable(entity: &ContentEntity) -> bool {
    if entity.name.trim().is_empty() {
        return false;
    }
    if !text_present(&entity.description)
        || !text_present(&entity.category)
        || !text_present(&entity.image)
    {
        return false;
    }
    if entity.kind == ContentKind::Product && entity.price.is_none() {
        return false;
    }
    true
}

// ---------------------------------------------------------------------------
// Transition operations
// ---------------------------------------------------------------------------

impl ContentEntity {
    /// DRAFT (or legacy null) → SCHEDULED. `at` must be strictly in the
    /// future; approver fields stay untouched.
    pub fn schedule(&mut self, at: DateTime<Utc>, now: DateTime<Utc>) -> Result<String> {
        let current = self.effective_status();
        if current != ContentStatus::Draft {
            return Err(transition_rejection(current, ContentStatus::Scheduled));
        }
        if at <= now {
            return Err(PressError::Validation(format!(
                "scheduled time {at} is not in the future"
            )));
        }
        self.status = Some(ContentStatus::Scheduled);
        self.scheduled_at = Some(at);
        self.updated_at = now;
        Ok(format!("scheduled for {}", at.to_rfc3339()))
    }

    /// SCHEDULED or READY_TO_PUBLISH → READY_TO_PUBLISH, recording the
    /// approver. Rejects empty text so nothing content-free gets marked
    /// ready. Never publishes.
    pub fn approve(&mut self, by: &str, now: DateTime<Utc>) -> Result<String> {
        let current = self.effective_status();
        if !matches!(
            current,
            ContentStatus::Scheduled | ContentStatus::ReadyToPublish
        ) {
            return Err(transition_rejection(current, ContentStatus::ReadyToPublish));
        }
        if !text_present(&self.description) {
            return Err(PressError::Validation(
                "content is empty; approval requires a non-empty description".to_string(),
            ));
        }
        self.status = Some(ContentStatus::ReadyToPublish);
        self.approved_by = Some(by.to_string());
        self.approved_at = Some(now);
        self.updated_at = now;
        Ok("marked ready to publish; publishing remains a separate manual step".to_string())
    }

    /// Privileged direct transition to PUBLISHED or ARCHIVED. Publish
    /// additionally requires every required field, reported as one
    /// missing-fields rejection rather than field-by-field.
    pub fn change_status(&mut self, next: ContentStatus, now: DateTime<Utc>) -> Result<String> {
        if !matches!(next, ContentStatus::Published | ContentStatus::Archived) {
            return Err(PressError::Validation(format!(
                "direct status change supports PUBLISHED and ARCHIVED only, not {next}"
            )));
        }
        let current = self.effective_status();
        if current == next {
            return Ok(format!("status already {next}"));
        }
        if !can_transition_to(current, next) {
            return Err(transition_rejection(current, next));
        }
        if next == ContentStatus::Published && !is_publishable(self) {
            return Err(PressError::Validation(
                "entity fails the required-fields check for publishing".to_string(),
            ));
        }
        self.status = Some(next);
        if next == ContentStatus::Published {
            self.published_at = Some(now);
        }
        self.updated_at = now;
        Ok(format!("status changed to {next}"))
    }

    /// PUBLISHED → DRAFT. The caller must already have verified the most
    /// elevated role; this only enforces the state machine.
    pub fn unpublish(&mut self, now: DateTime<Utc>) -> Result<String> {
        let current = self.effective_status();
        if current != ContentStatus::Published {
            return Err(transition_rejection(current, ContentStatus::Draft));
        }
        self.status = Some(ContentStatus::Draft);
        self.published_at = None;
        self.updated_at = now;
        Ok("unpublished back to draft".to_string())
    }
}

// ---------------------------------------------------------------------------
// Bulk outcomes
// ---------------------------------------------------------------------------

/// Per-entity result of a bulk status change. The batch never aborts on a
/// single failure; callers always get one record per input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkItemOutcome {
    pub id: Uuid,
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkOutcome {
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<BulkItemOutcome>,
}

impl BulkOutcome {
    pub fn collect(results: Vec<BulkItemOutcome>) -> Self {
        let succeeded = results.iter().filter(|r| r.ok).count();
        let failed = results.len() - succeeded;
        Self {
            succeeded,
            failed,
            results,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn product() -> ContentEntity {
        let mut p = ContentEntity::new(ContentKind::Product, "acme", "Walnut Desk");
        p.description = Some("A desk made of walnut.".to_string());
        p.category = Some("furniture".to_string());
        p.price = Some(499.0);
        p.image = Some("desk.jpg".to_string());
        p
    }

    fn post() -> ContentEntity {
        let mut p = ContentEntity::new(ContentKind::Post, "acme", "Care guide");
        p.description = Some("How to oil walnut.".to_string());
        p.category = Some("guides".to_string());
        p.image = Some("oil.jpg".to_string());
        p
    }

    #[test]
    fn pairs_outside_the_table_are_rejected() {
        use ContentStatus::*;
        let table = [
            (Draft, Scheduled),
            (Scheduled, ReadyToPublish),
            (ReadyToPublish, ReadyToPublish),
            (ReadyToPublish, Published),
            (Published, Draft),
            (Published, Archived),
        ];
        for &from in ContentStatus::all() {
            for &to in ContentStatus::all() {
                let expected = from == to || table.contains(&(from, to));
                assert_eq!(
                    can_transition_to(from, to),
                    expected,
                    "({from}, {to}) should be {expected}"
                );
            }
        }
    }

    #[test]
    fn same_state_always_permitted() {
        for &s in ContentStatus::all() {
            assert!(can_transition_to(s, s));
        }
    }

    #[test]
    fn publishable_requires_every_field() {
        let full = product();
        assert!(is_publishable(&full));

        let mut missing_price = product();
        missing_price.price = None;
        assert!(!is_publishable(&missing_price));

        let mut blank_description = product();
        blank_description.description = Some("   ".to_string());
        assert!(!is_publishable(&blank_description));

        let mut no_category = product();
        no_category.category = None;
        assert!(!is_publishable(&no_category));

        let mut no_image = product();
        no_image.image = None;
        assert!(!is_publishable(&no_image));
    }

    #[test]
    fn posts_do_not_require_price() {
        let p = post();
        assert!(p.price.is_none());
        assert!(is_publishable(&p));
    }

    #[test]
    fn schedule_from_draft_requires_future_time() {
        let now = Utc::now();
        let mut p = product();
        assert!(p.schedule(now - Duration::minutes(1), now).is_err());
        assert_eq!(p.effective_status(), ContentStatus::Draft);

        let at = now + Duration::hours(2);
        p.schedule(at, now).unwrap();
        assert_eq!(p.effective_status(), ContentStatus::Scheduled);
        assert_eq!(p.scheduled_at, Some(at));
        assert!(p.approved_by.is_none());
    }

    #[test]
    fn legacy_null_status_schedules_as_draft() {
        let now = Utc::now();
        let mut p = product();
        p.status = None;
        let at = now + Duration::hours(1);
        p.schedule(at, now).unwrap();
        assert_eq!(p.status, Some(ContentStatus::Scheduled));
        assert_eq!(p.scheduled_at, Some(at));
    }

    #[test]
    fn schedule_rejected_outside_draft() {
        let now = Utc::now();
        let mut p = product();
        p.status = Some(ContentStatus::Published);
        assert!(p.schedule(now + Duration::hours(1), now).is_err());
    }

    #[test]
    fn approve_records_approver_and_never_publishes() {
        let now = Utc::now();
        let mut p = product();
        p.status = Some(ContentStatus::Scheduled);
        let msg = p.approve("quinn", now).unwrap();
        assert_eq!(p.effective_status(), ContentStatus::ReadyToPublish);
        assert_eq!(p.approved_by.as_deref(), Some("quinn"));
        assert!(msg.contains("separate manual step"));
        assert!(p.published_at.is_none());

        // Idempotent re-approve.
        p.approve("quinn", now).unwrap();
        assert_eq!(p.effective_status(), ContentStatus::ReadyToPublish);
    }

    #[test]
    fn approve_rejects_empty_content() {
        let now = Utc::now();
        let mut p = post();
        p.status = Some(ContentStatus::Scheduled);
        p.description = Some("".to_string());
        let err = p.approve("quinn", now).unwrap_err();
        assert!(err.to_string().contains("empty"), "err: {err}");
        assert_eq!(p.effective_status(), ContentStatus::Scheduled);
    }

    #[test]
    fn approve_rejected_from_draft() {
        let now = Utc::now();
        let mut p = product();
        let err = p.approve("quinn", now).unwrap_err();
        assert!(matches!(err, PressError::InvalidTransition { .. }));
    }

    #[test]
    fn publish_requires_ready_and_publishable() {
        let now = Utc::now();
        let mut p = product();
        p.status = Some(ContentStatus::ReadyToPublish);
        p.change_status(ContentStatus::Published, now).unwrap();
        assert_eq!(p.effective_status(), ContentStatus::Published);
        assert!(p.published_at.is_some());

        let mut bare = product();
        bare.status = Some(ContentStatus::ReadyToPublish);
        bare.description = None;
        let err = bare.change_status(ContentStatus::Published, now).unwrap_err();
        assert!(err.to_string().contains("required-fields"), "err: {err}");
        assert_eq!(bare.effective_status(), ContentStatus::ReadyToPublish);
    }

    #[test]
    fn publish_rejected_from_draft() {
        let now = Utc::now();
        let mut p = product();
        let err = p.change_status(ContentStatus::Published, now).unwrap_err();
        match err {
            PressError::InvalidTransition { reason, .. } => {
                assert!(reason.contains("SCHEDULED"), "reason: {reason}")
            }
            other => panic!("expected InvalidTransition, got {other}"),
        }
    }

    #[test]
    fn change_status_only_targets_published_or_archived() {
        let now = Utc::now();
        let mut p = product();
        assert!(p.change_status(ContentStatus::Scheduled, now).is_err());
    }

    #[test]
    fn archive_from_published() {
        let now = Utc::now();
        let mut p = product();
        p.status = Some(ContentStatus::Published);
        p.change_status(ContentStatus::Archived, now).unwrap();
        assert_eq!(p.effective_status(), ContentStatus::Archived);
    }

    #[test]
    fn unpublish_returns_to_draft() {
        let now = Utc::now();
        let mut p = product();
        p.status = Some(ContentStatus::Published);
        p.published_at = Some(now);
        p.unpublish(now).unwrap();
        assert_eq!(p.effective_status(), ContentStatus::Draft);
        assert!(p.published_at.is_none());

        let mut draft = product();
        assert!(draft.unpublish(now).is_err());
    }

    #[test]
    fn bulk_outcome_counts() {
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let outcome = BulkOutcome::collect(vec![
            BulkItemOutcome {
                id: ids[0],
                ok: true,
                message: "status changed to ARCHIVED".into(),
            },
            BulkItemOutcome {
                id: ids[1],
                ok: false,
                message: "invalid transition".into(),
            },
            BulkItemOutcome {
                id: ids[2],
                ok: true,
                message: "status changed to ARCHIVED".into(),
            },
        ]);
        assert_eq!(outcome.succeeded, 2);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.results.len(), 3);
    }
}
