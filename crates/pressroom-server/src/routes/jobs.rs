use axum::extract::{Path, State};
use axum::{Extension, Json};
use pressroom_core::access::Actor;
use pressroom_core::job::JobPatch;
use pressroom_core::store::NewJob;
use pressroom_core::types::JobStatus;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/jobs — all jobs, newest first.
pub async fn list_jobs(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let jobs = store.list_jobs()?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!(jobs))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// POST /api/jobs — admit a SCHEDULED job.
pub async fn create_job(
    State(app): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<NewJob>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let job = store.create_job(&actor, body)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!(job))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    app.notify();
    Ok(Json(result))
}

/// GET /api/jobs/:id
pub async fn get_job(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let job = store.get_job(id)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!(job))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// PATCH /api/jobs/:id — reschedule or resize; SCHEDULED/PAUSED only.
pub async fn update_job(
    State(app): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(patch): Json<JobPatch>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let job = store.update_job(&actor, id, patch)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!(job))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    app.notify();
    Ok(Json(result))
}

/// DELETE /api/jobs/:id — refused while RUNNING.
pub async fn delete_job(
    State(app): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        store.delete_job(&actor, id)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!({ "deleted": id }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    app.notify();
    Ok(Json(result))
}

/// POST /api/jobs/:id/pause
pub async fn pause_job(
    State(app): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    transition(app, actor, id, JobStatus::Paused).await
}

/// POST /api/jobs/:id/resume
pub async fn resume_job(
    State(app): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    transition(app, actor, id, JobStatus::Running).await
}

/// POST /api/jobs/:id/cancel — terminal; releases the run guard if this job
/// is the one holding it.
pub async fn cancel_job(
    State(app): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    transition(app, actor, id, JobStatus::Cancelled).await
}

async fn transition(
    app: AppState,
    actor: Actor,
    id: Uuid,
    to: JobStatus,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let job = store.transition_job(&actor, id, to)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!(job))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    app.notify();
    Ok(Json(result))
}
