use axum::extract::{Path, State};
use axum::{Extension, Json};
use pressroom_core::access::Actor;
use pressroom_core::keyword::{self, KeywordInput, KeywordPatch};
use pressroom_core::schedule::NewSchedule;
use pressroom_core::types::ScheduleStatus;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/schedules — all schedules, newest first.
pub async fn list_schedules(
    State(app): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let schedules = store.list_schedules()?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!(schedules))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

#[derive(serde::Deserialize)]
pub struct CreateScheduleBody {
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(flatten)]
    pub schedule: NewSchedule,
}

/// POST /api/schedules — create an ACTIVE schedule.
pub async fn create_schedule(
    State(app): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<CreateScheduleBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let schedule = store.create_schedule(&actor, body.brand, body.schedule)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!(schedule))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    app.notify();
    Ok(Json(result))
}

/// GET /api/schedules/:id — schedule with its keyword summary.
pub async fn get_schedule(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let schedule = store.get_schedule(id)?;
        let keywords = store.list_keywords(id)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!({
            "schedule": schedule,
            "keyword_summary": keyword::summarize(&keywords),
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// POST /api/schedules/:id/pause
pub async fn pause_schedule(
    State(app): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    set_status(app, actor, id, ScheduleStatus::Paused).await
}

/// POST /api/schedules/:id/resume
pub async fn resume_schedule(
    State(app): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    set_status(app, actor, id, ScheduleStatus::Active).await
}

async fn set_status(
    app: AppState,
    actor: Actor,
    id: Uuid,
    status: ScheduleStatus,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let schedule = store.set_schedule_status(&actor, id, status)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!(schedule))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    app.notify();
    Ok(Json(result))
}

// ---------------------------------------------------------------------------
// Nested keyword routes
// ---------------------------------------------------------------------------

/// GET /api/schedules/:id/keywords — newest first.
pub async fn list_keywords(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let keywords = store.list_keywords(id)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!(keywords))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

#[derive(serde::Deserialize)]
pub struct AddKeywordsBody {
    pub keywords: Vec<KeywordInput>,
}

/// POST /api/schedules/:id/keywords — atomic bulk insert, all PENDING.
pub async fn add_keywords(
    State(app): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(body): Json<AddKeywordsBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let keywords = store.add_keywords(&actor, id, body.keywords)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!(keywords))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    app.notify();
    Ok(Json(result))
}

/// PATCH /api/schedules/:id/keywords/:kid — partial update; status=PENDING on
/// a FAILED keyword is the retry path that clears lastError.
pub async fn update_keyword(
    State(app): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((id, kid)): Path<(Uuid, Uuid)>,
    Json(patch): Json<KeywordPatch>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let kw = store.update_keyword(&actor, id, kid, patch)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!(kw))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    app.notify();
    Ok(Json(result))
}

/// DELETE /api/schedules/:id/keywords/:kid — hard delete.
pub async fn delete_keyword(
    State(app): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((id, kid)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        store.delete_keyword(&actor, id, kid)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!({ "deleted": kid }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    app.notify();
    Ok(Json(result))
}
