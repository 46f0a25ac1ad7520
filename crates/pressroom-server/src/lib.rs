pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{delete, get, patch, post};
use axum::Router;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};

/// Build the axum Router over a freshly opened store at `root`.
/// Used by `serve()` and available for integration testing.
pub fn build_router(root: PathBuf) -> anyhow::Result<Router> {
    let app_state = state::AppState::new(root)?;
    Ok(build_router_with_state(app_state))
}

/// Build the Router from existing state. Identity headers are required for
/// everything except the health check and the SSE feed.
pub fn build_router_with_state(app_state: state::AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Content
        .route("/api/content", get(routes::content::list_content))
        .route("/api/content", post(routes::content::create_content))
        .route("/api/content/bulk-status", post(routes::content::bulk_change_status))
        .route("/api/content/{id}", get(routes::content::get_content))
        .route(
            "/api/content/{id}/schedule",
            post(routes::content::schedule_content),
        )
        .route(
            "/api/content/{id}/approve",
            post(routes::content::approve_content),
        )
        .route("/api/content/{id}/status", post(routes::content::change_status))
        .route(
            "/api/content/{id}/unpublish",
            post(routes::content::unpublish_content),
        )
        // Schedules and their keywords
        .route("/api/schedules", get(routes::schedules::list_schedules))
        .route("/api/schedules", post(routes::schedules::create_schedule))
        .route("/api/schedules/{id}", get(routes::schedules::get_schedule))
        .route(
            "/api/schedules/{id}/pause",
            post(routes::schedules::pause_schedule),
        )
        .route(
            "/api/schedules/{id}/resume",
            post(routes::schedules::resume_schedule),
        )
        .route(
            "/api/schedules/{id}/keywords",
            get(routes::schedules::list_keywords),
        )
        .route(
            "/api/schedules/{id}/keywords",
            post(routes::schedules::add_keywords),
        )
        .route(
            "/api/schedules/{id}/keywords/{kid}",
            patch(routes::schedules::update_keyword),
        )
        .route(
            "/api/schedules/{id}/keywords/{kid}",
            delete(routes::schedules::delete_keyword),
        )
        // Jobs
        .route("/api/jobs", get(routes::jobs::list_jobs))
        .route("/api/jobs", post(routes::jobs::create_job))
        .route("/api/jobs/{id}", get(routes::jobs::get_job))
        .route("/api/jobs/{id}", patch(routes::jobs::update_job))
        .route("/api/jobs/{id}", delete(routes::jobs::delete_job))
        .route("/api/jobs/{id}/pause", post(routes::jobs::pause_job))
        .route("/api/jobs/{id}/resume", post(routes::jobs::resume_job))
        .route("/api/jobs/{id}/cancel", post(routes::jobs::cancel_job))
        // Engine
        .route(
            "/api/engine/{name}/status",
            get(routes::engine::engine_status),
        )
        .route("/api/engine/{name}/run", post(routes::engine::trigger_run))
        .route("/api/engine/{name}/pause", post(routes::engine::pause_engine))
        .route(
            "/api/engine/{name}/resume",
            post(routes::engine::resume_engine),
        )
        .route(
            "/api/engine/{name}/heartbeat",
            post(routes::engine::heartbeat),
        )
        // Worker surface
        .route("/api/worker/{engine}/claim", post(routes::worker::claim_next))
        .route(
            "/api/worker/keywords/{id}/done",
            post(routes::worker::mark_done),
        )
        .route(
            "/api/worker/keywords/{id}/fail",
            post(routes::worker::mark_failed),
        )
        // Approvals
        .route("/api/approvals", get(routes::approvals::list_approvals))
        .route("/api/approvals", post(routes::approvals::create_approval))
        .route("/api/approvals/{id}", get(routes::approvals::get_approval))
        .route(
            "/api/approvals/{id}/approve",
            post(routes::approvals::approve),
        )
        .route("/api/approvals/{id}/reject", post(routes::approvals::reject))
        .route(
            "/api/approvals/{id}/execute",
            post(routes::approvals::execute),
        )
        .route("/api/simulate", post(routes::approvals::simulate))
        // Audit
        .route("/api/audit", get(routes::audit::list_audit))
        .route_layer(axum::middleware::from_fn(auth::identity_middleware));

    Router::new()
        .route("/api/health", get(routes::health::health))
        .route("/api/events", get(routes::events::sse_events))
        .merge(api)
        .layer(cors)
        .with_state(app_state)
}

/// Start the pressroom API server.
pub async fn serve(root: PathBuf, port: u16) -> anyhow::Result<()> {
    let app = build_router(root)?;

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("pressroom API listening on http://localhost:{port}");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Start the server on a pre-bound listener, so the caller can read the
/// actual port first (useful when `port = 0`).
pub async fn serve_on(root: PathBuf, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(root)?;

    tracing::info!("pressroom API listening on http://localhost:{actual_port}");

    axum::serve(listener, app).await?;
    Ok(())
}
