use axum::extract::{Path, State};
use axum::{Extension, Json};
use pressroom_core::access::Actor;
use pressroom_core::store::NewApproval;
use pressroom_core::types::{ActionKind, ContentKind};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/approvals — all approvals, newest first.
pub async fn list_approvals(
    State(app): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let approvals = store.list_approvals()?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!(approvals))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// POST /api/approvals — queue a PENDING action request.
pub async fn create_approval(
    State(app): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<NewApproval>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let approval = store.create_approval(&actor, body)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!(approval))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    app.notify();
    Ok(Json(result))
}

/// GET /api/approvals/:id
pub async fn get_approval(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let approval = store.get_approval(id)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!(approval))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// POST /api/approvals/:id/approve — PENDING → APPROVED.
pub async fn approve(
    State(app): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let (approval, message) = store.approve_approval(&actor, id)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!({
            "approval": approval,
            "message": message,
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    app.notify();
    Ok(Json(result))
}

#[derive(serde::Deserialize, Default)]
pub struct RejectBody {
    #[serde(default)]
    pub reason: Option<String>,
}

/// POST /api/approvals/:id/reject — PENDING → REJECTED with the reviewer's
/// reason.
pub async fn reject(
    State(app): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(body): Json<RejectBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let (approval, message) = store.reject_approval(&actor, id, body.reason)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!({
            "approval": approval,
            "message": message,
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    app.notify();
    Ok(Json(result))
}

/// POST /api/approvals/:id/execute — APPROVED → EXECUTED, privileged.
pub async fn execute(
    State(app): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let (approval, message) = store.execute_approval(&actor, id)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!({
            "approval": approval,
            "message": message,
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    app.notify();
    Ok(Json(result))
}

#[derive(serde::Deserialize)]
pub struct SimulateBody {
    pub category: ContentKind,
    pub action: ActionKind,
    pub target_id: Uuid,
}

/// POST /api/simulate — strictly read-only projection of an action's effect.
pub async fn simulate(
    State(app): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<SimulateBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let report = store.simulate_action(&actor, body.category, body.action, body.target_id)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!(report))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}
