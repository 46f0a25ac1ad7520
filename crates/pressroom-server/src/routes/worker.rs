use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// POST /api/worker/:engine/claim — oldest PENDING keyword of an ACTIVE
/// schedule, flipped to PROCESSING atomically. `null` when the backlog is
/// empty or the engine is paused.
pub async fn claim_next(
    State(app): State<AppState>,
    Path(engine): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let claimed = store.claim_next_keyword(&engine)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!(claimed))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    app.notify();
    Ok(Json(result))
}

/// POST /api/worker/keywords/:id/done
pub async fn mark_done(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let kw = store.mark_keyword_done(id)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!(kw))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    app.notify();
    Ok(Json(result))
}

#[derive(serde::Deserialize)]
pub struct FailBody {
    pub error: String,
}

/// POST /api/worker/keywords/:id/fail — records the worker's error string.
pub async fn mark_failed(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<FailBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let kw = store.mark_keyword_failed(id, body.error)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!(kw))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    app.notify();
    Ok(Json(result))
}
