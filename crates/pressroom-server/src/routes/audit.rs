use axum::extract::{Query, State};
use axum::Json;

use crate::error::AppError;
use crate::state::AppState;

#[derive(serde::Deserialize, Default)]
pub struct AuditQuery {
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// GET /api/audit — recent audit entries, newest first, optionally scoped to
/// one entity.
pub async fn list_audit(
    State(app): State<AppState>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let limit = query.limit.unwrap_or(100);
        let entries = match query.entity_id {
            Some(id) => store.audit_log().for_entity(&id, limit)?,
            None => store.audit_log().recent(limit)?,
        };
        Ok::<_, pressroom_core::PressError>(serde_json::json!(entries))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}
