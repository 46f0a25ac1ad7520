use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use pressroom_core::access::Actor;
use pressroom_core::store::NewContent;
use pressroom_core::types::ContentStatus;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/content — list entities visible to the actor, newest first.
pub async fn list_content(
    State(app): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let entities = store.list_content(&actor)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!(entities))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// POST /api/content — author a new DRAFT entity.
pub async fn create_content(
    State(app): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<NewContent>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let entity = store.create_content(&actor, body)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!(entity))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    app.notify();
    Ok(Json(result))
}

/// GET /api/content/:id — full entity detail.
pub async fn get_content(
    State(app): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let entity = store.get_content(&actor, id)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!(entity))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

#[derive(serde::Deserialize)]
pub struct ScheduleBody {
    pub at: DateTime<Utc>,
}

/// POST /api/content/:id/schedule — DRAFT → SCHEDULED at a future time.
pub async fn schedule_content(
    State(app): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(body): Json<ScheduleBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let (entity, message) = store.schedule_content(&actor, id, body.at)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!({
            "entity": entity,
            "message": message,
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    app.notify();
    Ok(Json(result))
}

/// POST /api/content/:id/approve — mark READY_TO_PUBLISH; never publishes.
pub async fn approve_content(
    State(app): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let (entity, message) = store.approve_content(&actor, id)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!({
            "entity": entity,
            "message": message,
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    app.notify();
    Ok(Json(result))
}

#[derive(serde::Deserialize)]
pub struct StatusBody {
    pub status: ContentStatus,
}

/// POST /api/content/:id/status — explicit PUBLISHED/ARCHIVED change.
pub async fn change_status(
    State(app): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let (entity, message) = store.change_content_status(&actor, id, body.status)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!({
            "entity": entity,
            "message": message,
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    app.notify();
    Ok(Json(result))
}

/// POST /api/content/:id/unpublish — PUBLISHED → DRAFT, elevated role only.
pub async fn unpublish_content(
    State(app): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let (entity, message) = store.unpublish_content(&actor, id)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!({
            "entity": entity,
            "message": message,
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    app.notify();
    Ok(Json(result))
}

#[derive(serde::Deserialize)]
pub struct BulkStatusBody {
    pub ids: Vec<Uuid>,
    pub status: ContentStatus,
}

/// POST /api/content/bulk-status — per-item outcomes, never a batch abort.
pub async fn bulk_change_status(
    State(app): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<BulkStatusBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let outcome = store.bulk_change_status(&actor, &body.ids, body.status)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!(outcome))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    app.notify();
    Ok(Json(result))
}
