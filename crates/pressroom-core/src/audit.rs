use crate::error::{PressError, Result};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// AuditEntry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub actor: String,
    pub entity_kind: String,
    pub entity_id: String,
    pub status_before: Option<String>,
    pub status_after: Option<String>,
    pub at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        actor: impl Into<String>,
        entity_kind: impl Into<String>,
        entity_id: impl Into<String>,
        status_before: Option<String>,
        status_after: Option<String>,
    ) -> Self {
        Self {
            actor: actor.into(),
            entity_kind: entity_kind.into(),
            entity_id: entity_id.into(),
            status_before,
            status_after,
            at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// AuditLog
// ---------------------------------------------------------------------------

/// Append-only audit trail in a local sqlite file, separate from the state
/// store so observability never competes with the write path.
pub struct AuditLog {
    conn: Mutex<Connection>,
}

impl AuditLog {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(|e| PressError::Audit(e.to_string()))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS audit (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                actor         TEXT NOT NULL,
                entity_kind   TEXT NOT NULL,
                entity_id     TEXT NOT NULL,
                status_before TEXT,
                status_after  TEXT,
                at            TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS audit_entity ON audit (entity_id);",
        )
        .map_err(|e| PressError::Audit(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Append one entry. Callers treat this as best-effort; see
    /// [`AuditLog::record_best_effort`].
    pub fn record(&self, entry: &AuditEntry) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| PressError::Audit("audit lock poisoned".to_string()))?;
        conn.execute(
            "INSERT INTO audit (actor, entity_kind, entity_id, status_before, status_after, at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                entry.actor,
                entry.entity_kind,
                entry.entity_id,
                entry.status_before,
                entry.status_after,
                entry.at.to_rfc3339(),
            ],
        )
        .map_err(|e| PressError::Audit(e.to_string()))?;
        Ok(())
    }

    /// Fire-and-forget append: a failed audit write is logged and swallowed,
    /// never propagated into the primary operation.
    pub fn record_best_effort(&self, entry: AuditEntry) {
        if let Err(e) = self.record(&entry) {
            tracing::warn!(
                entity_kind = %entry.entity_kind,
                entity_id = %entry.entity_id,
                error = %e,
                "audit write failed; continuing"
            );
        }
    }

    /// Most recent entries, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>> {
        self.query(
            "SELECT actor, entity_kind, entity_id, status_before, status_after, at
             FROM audit ORDER BY id DESC LIMIT ?1",
            rusqlite::params![limit as i64],
        )
    }

    /// Entries for one entity, newest first.
    pub fn for_entity(&self, entity_id: &str, limit: usize) -> Result<Vec<AuditEntry>> {
        self.query(
            "SELECT actor, entity_kind, entity_id, status_before, status_after, at
             FROM audit WHERE entity_id = ?1 ORDER BY id DESC LIMIT ?2",
            rusqlite::params![entity_id, limit as i64],
        )
    }

    fn query(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<AuditEntry>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| PressError::Audit("audit lock poisoned".to_string()))?;
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| PressError::Audit(e.to_string()))?;
        let rows = stmt
            .query_map(params, |row| {
                let at: String = row.get(5)?;
                Ok(AuditEntry {
                    actor: row.get(0)?,
                    entity_kind: row.get(1)?,
                    entity_id: row.get(2)?,
                    status_before: row.get(3)?,
                    status_after: row.get(4)?,
                    at: DateTime::parse_from_rfc3339(&at)
                        .map(|t| t.with_timezone(&Utc))
                        .unwrap_or_else(|_| Utc::now()),
                })
            })
            .map_err(|e| PressError::Audit(e.to_string()))?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(|e| PressError::Audit(e.to_string()))?);
        }
        Ok(entries)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_tmp() -> (TempDir, AuditLog) {
        let dir = TempDir::new().unwrap();
        let log = AuditLog::open(&dir.path().join("audit.sqlite")).unwrap();
        (dir, log)
    }

    #[test]
    fn record_and_read_back() {
        let (_dir, log) = open_tmp();
        log.record(&AuditEntry::new(
            "quinn",
            "content",
            "c-1",
            Some("SCHEDULED".into()),
            Some("READY_TO_PUBLISH".into()),
        ))
        .unwrap();

        let entries = log.recent(10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].actor, "quinn");
        assert_eq!(entries[0].status_after.as_deref(), Some("READY_TO_PUBLISH"));
    }

    #[test]
    fn recent_is_newest_first() {
        let (_dir, log) = open_tmp();
        for i in 0..3 {
            log.record(&AuditEntry::new(
                "quinn",
                "job",
                format!("j-{i}"),
                None,
                Some("RUNNING".into()),
            ))
            .unwrap();
        }
        let entries = log.recent(10).unwrap();
        assert_eq!(entries[0].entity_id, "j-2");
        assert_eq!(entries[2].entity_id, "j-0");
    }

    #[test]
    fn for_entity_filters() {
        let (_dir, log) = open_tmp();
        log.record(&AuditEntry::new("a", "content", "c-1", None, None))
            .unwrap();
        log.record(&AuditEntry::new("b", "content", "c-2", None, None))
            .unwrap();
        let entries = log.for_entity("c-1", 10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].actor, "a");
    }

    #[test]
    fn best_effort_never_panics() {
        let (_dir, log) = open_tmp();
        log.record_best_effort(AuditEntry::new("a", "content", "c-1", None, None));
        assert_eq!(log.recent(10).unwrap().len(), 1);
    }
}
