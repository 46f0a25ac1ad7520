use axum::extract::State;
use axum::Json;
use std::time::Duration;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/health.
///
/// The local store is a required dependency: an unreadable store fails the
/// check. The production engine's probe endpoint is optional: a missing URL
/// skips it, and a timeout or error degrades the field to "unknown" without
/// failing the overall read.
pub async fn health(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    tokio::task::spawn_blocking(move || store.list_jobs().map(|_| ()))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    let engine_probe = match &app.config.engine.probe_url {
        None => "skipped",
        Some(url) => {
            let timeout = Duration::from_millis(app.config.engine.probe_timeout_ms);
            match tokio::time::timeout(timeout, probe(url)).await {
                Ok(true) => "ok",
                _ => "unknown",
            }
        }
    };

    Ok(Json(serde_json::json!({
        "status": "ok",
        "store": "ok",
        "engine_probe": engine_probe,
    })))
}

async fn probe(url: &str) -> bool {
    match reqwest::get(url).await {
        Ok(resp) => resp.status().is_success(),
        Err(e) => {
            tracing::debug!(error = %e, "engine probe failed");
            false
        }
    }
}
