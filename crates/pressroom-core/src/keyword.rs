use crate::error::{PressError, Result};
use crate::types::KeywordStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// ScheduleKeyword
// ---------------------------------------------------------------------------

/// One unit of backlog owned by a schedule. Only the owning schedule may see
/// or mutate it; cross-schedule access reports not-found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleKeyword {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub primary_keyword: String,
    #[serde(default)]
    pub secondary_keywords: Vec<String>,
    pub status: KeywordStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Operator input for the bulk insert. Validated as a whole batch before any
/// row is written.
#[derive(Debug, Clone, Deserialize)]
pub struct KeywordInput {
    pub primary_keyword: String,
    #[serde(default)]
    pub secondary_keywords: Vec<String>,
}

/// Partial update applied through the owning schedule.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeywordPatch {
    #[serde(default)]
    pub primary_keyword: Option<String>,
    #[serde(default)]
    pub secondary_keywords: Option<Vec<String>>,
    #[serde(default)]
    pub status: Option<KeywordStatus>,
}

impl ScheduleKeyword {
    fn new(schedule_id: Uuid, primary: String, secondary: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            schedule_id,
            primary_keyword: primary,
            secondary_keywords: secondary,
            status: KeywordStatus::Pending,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a patch. `lastError` clears only on the explicit FAILED→PENDING
    /// retry; editing text alone leaves it in place.
    pub fn apply_patch(&mut self, patch: KeywordPatch) -> Result<()> {
        if let Some(primary) = patch.primary_keyword {
            let trimmed = primary.trim().to_string();
            if trimmed.is_empty() {
                return Err(PressError::Validation(
                    "primary_keyword is empty after trimming".to_string(),
                ));
            }
            self.primary_keyword = trimmed;
        }
        if let Some(secondary) = patch.secondary_keywords {
            self.secondary_keywords = secondary;
        }
        if let Some(status) = patch.status {
            if status == KeywordStatus::Pending && self.status == KeywordStatus::Failed {
                self.last_error = None;
            }
            self.status = status;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    // Worker outcomes.

    pub fn mark_processing(&mut self) {
        self.status = KeywordStatus::Processing;
        self.updated_at = Utc::now();
    }

    pub fn mark_done(&mut self) {
        self.status = KeywordStatus::Done;
        self.updated_at = Utc::now();
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = KeywordStatus::Failed;
        self.last_error = Some(error.into());
        self.updated_at = Utc::now();
    }
}

// ---------------------------------------------------------------------------
// Batch construction
// ---------------------------------------------------------------------------

/// Trim and validate a batch, producing PENDING rows. Any empty primary
/// keyword rejects the whole batch before a single row exists.
pub fn build_batch(schedule_id: Uuid, inputs: Vec<KeywordInput>) -> Result<Vec<ScheduleKeyword>> {
    if inputs.is_empty() {
        return Err(PressError::Validation("no keywords supplied".to_string()));
    }
    let mut rows = Vec::with_capacity(inputs.len());
    for input in inputs {
        let primary = input.primary_keyword.trim().to_string();
        if primary.is_empty() {
            return Err(PressError::Validation(
                "primary_keyword is empty after trimming".to_string(),
            ));
        }
        rows.push(ScheduleKeyword::new(
            schedule_id,
            primary,
            input.secondary_keywords,
        ));
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Status summary
// ---------------------------------------------------------------------------

/// Derived dashboard counts; never stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeywordSummary {
    pub pending: usize,
    pub processing: usize,
    pub done: usize,
    pub failed: usize,
}

pub fn summarize(keywords: &[ScheduleKeyword]) -> KeywordSummary {
    let mut summary = KeywordSummary::default();
    for kw in keywords {
        match kw.status {
            KeywordStatus::Pending => summary.pending += 1,
            KeywordStatus::Processing => summary.processing += 1,
            KeywordStatus::Done => summary.done += 1,
            KeywordStatus::Failed => summary.failed += 1,
        }
    }
    summary
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn failed_keyword() -> ScheduleKeyword {
        let mut kw = ScheduleKeyword::new(Uuid::new_v4(), "walnut desk".into(), vec![]);
        kw.mark_failed("generation timed out");
        kw
    }

    #[test]
    fn batch_inserts_pending_trimmed() {
        let sid = Uuid::new_v4();
        let rows = build_batch(
            sid,
            vec![
                KeywordInput {
                    primary_keyword: "  walnut desk  ".into(),
                    secondary_keywords: vec!["solid wood".into()],
                },
                KeywordInput {
                    primary_keyword: "oak shelf".into(),
                    secondary_keywords: vec![],
                },
            ],
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].primary_keyword, "walnut desk");
        assert!(rows.iter().all(|k| k.status == KeywordStatus::Pending));
        assert!(rows.iter().all(|k| k.schedule_id == sid));
    }

    #[test]
    fn empty_primary_rejects_whole_batch() {
        let err = build_batch(
            Uuid::new_v4(),
            vec![
                KeywordInput {
                    primary_keyword: "fine".into(),
                    secondary_keywords: vec![],
                },
                KeywordInput {
                    primary_keyword: "   ".into(),
                    secondary_keywords: vec![],
                },
            ],
        )
        .unwrap_err();
        assert!(matches!(err, PressError::Validation(_)));
    }

    #[test]
    fn empty_batch_rejected() {
        assert!(build_batch(Uuid::new_v4(), vec![]).is_err());
    }

    #[test]
    fn retry_clears_last_error() {
        let mut kw = failed_keyword();
        assert!(kw.last_error.is_some());
        kw.apply_patch(KeywordPatch {
            status: Some(KeywordStatus::Pending),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(kw.status, KeywordStatus::Pending);
        assert!(kw.last_error.is_none());
    }

    #[test]
    fn text_edit_leaves_last_error() {
        let mut kw = failed_keyword();
        kw.apply_patch(KeywordPatch {
            primary_keyword: Some("walnut writing desk".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(kw.status, KeywordStatus::Failed);
        assert_eq!(kw.last_error.as_deref(), Some("generation timed out"));
        assert_eq!(kw.primary_keyword, "walnut writing desk");
    }

    #[test]
    fn pending_patch_from_done_does_not_touch_error() {
        let mut kw = ScheduleKeyword::new(Uuid::new_v4(), "oak shelf".into(), vec![]);
        kw.mark_done();
        kw.last_error = Some("stale note".into());
        kw.apply_patch(KeywordPatch {
            status: Some(KeywordStatus::Pending),
            ..Default::default()
        })
        .unwrap();
        // Only the FAILED→PENDING transition clears the error.
        assert_eq!(kw.last_error.as_deref(), Some("stale note"));
    }

    #[test]
    fn patch_rejects_blank_primary() {
        let mut kw = failed_keyword();
        let err = kw
            .apply_patch(KeywordPatch {
                primary_keyword: Some("  ".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, PressError::Validation(_)));
        assert_eq!(kw.primary_keyword, "walnut desk");
    }

    #[test]
    fn summary_counts_by_status() {
        let sid = Uuid::new_v4();
        let mut rows = build_batch(
            sid,
            vec![
                KeywordInput {
                    primary_keyword: "a".into(),
                    secondary_keywords: vec![],
                },
                KeywordInput {
                    primary_keyword: "b".into(),
                    secondary_keywords: vec![],
                },
                KeywordInput {
                    primary_keyword: "c".into(),
                    secondary_keywords: vec![],
                },
            ],
        )
        .unwrap();
        rows[1].mark_processing();
        rows[2].mark_failed("boom");
        let summary = summarize(&rows);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.processing, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.done, 0);
    }
}
