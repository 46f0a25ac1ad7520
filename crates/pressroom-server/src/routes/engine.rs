use axum::extract::{Path, State};
use axum::{Extension, Json};
use pressroom_core::access::Actor;
use rand::Rng;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/engine/:name/status — the full dashboard read.
pub async fn engine_status(
    State(app): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let timeout_ms = app.config.engine.heartbeat_timeout_ms;
    let result = tokio::task::spawn_blocking(move || {
        let report = store.engine_status(&name, timeout_ms)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!(report))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

#[derive(serde::Deserialize, Default)]
pub struct RunBody {
    #[serde(default)]
    pub batch_size: Option<u32>,
}

/// POST /api/engine/:name/run — acquire the single-flight guard, admit a
/// RUNNING job, and hand the rest to a detached task. The caller gets the
/// job back immediately and polls for completion.
pub async fn trigger_run(
    State(app): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(name): Path<String>,
    Json(body): Json<RunBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let batch_size = body
        .batch_size
        .unwrap_or(app.config.run.default_batch_size);

    let store = app.store.clone();
    let engine = name.clone();
    let job = tokio::task::spawn_blocking(move || store.acquire_run(&actor, &engine, batch_size))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    app.notify();

    // Randomized bounded duration stands in for the engine's real work.
    let (min, max) = (app.config.run.min_secs, app.config.run.max_secs);
    let secs = if min >= max {
        min
    } else {
        rand::thread_rng().gen_range(min..=max)
    };

    let task_app = app.clone();
    let job_id = job.id;
    let engine = name.clone();
    let handle = tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_secs(secs)).await;
        let store = task_app.store.clone();
        let finish_engine = engine.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            store.finish_run(&finish_engine, job_id, None)
        })
        .await;
        match outcome {
            Ok(Ok(())) => tracing::info!(engine = %engine, job = %job_id, "run completed"),
            Ok(Err(e)) => tracing::error!(engine = %engine, job = %job_id, error = %e, "run completion failed"),
            Err(e) => tracing::error!(engine = %engine, error = %e, "run task join failed"),
        }
        task_app.run_tasks.lock().unwrap().remove(&engine);
        task_app.notify();
    });
    app.run_tasks
        .lock()
        .unwrap()
        .insert(name, handle.abort_handle());

    Ok(Json(serde_json::json!(job)))
}

/// POST /api/engine/:name/pause
pub async fn pause_engine(
    State(app): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    set_paused(app, actor, name, true).await
}

/// POST /api/engine/:name/resume
pub async fn resume_engine(
    State(app): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    set_paused(app, actor, name, false).await
}

async fn set_paused(
    app: AppState,
    actor: Actor,
    name: String,
    paused: bool,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let flag = store.set_engine_paused(&actor, &name, paused)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!(flag))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    app.notify();
    Ok(Json(result))
}

/// POST /api/engine/:name/heartbeat — worker ingest; the orchestrator's own
/// operations never write heartbeat rows.
pub async fn heartbeat(
    State(app): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let timeout_ms = app.config.engine.heartbeat_timeout_ms;
    let result = tokio::task::spawn_blocking(move || {
        let hb = store.ingest_heartbeat(&name, timeout_ms)?;
        Ok::<_, pressroom_core::PressError>(serde_json::json!(hb))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    app.notify();
    Ok(Json(result))
}
