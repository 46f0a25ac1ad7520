use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use pressroom_core::access::Actor;
use pressroom_core::types::Role;

/// Header names the API consumes identity from. Session mechanics live in
/// whatever sits in front of this server; only name, role, and brand scope
/// arrive here.
pub const ACTOR_HEADER: &str = "x-actor";
pub const ROLE_HEADER: &str = "x-actor-role";
pub const BRAND_HEADER: &str = "x-actor-brand";

fn unauthorized(message: &str) -> Response {
    let body = serde_json::json!({ "error": format!("authentication required: {message}") });
    (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
}

/// Axum middleware that turns the identity headers into an [`Actor`] request
/// extension. Requests without a valid identity never reach a handler.
pub async fn identity_middleware(mut req: Request, next: Next) -> Response {
    // Scoped so the closure's borrow of `req` ends before the await below;
    // otherwise the returned future is not Send (`Body` is !Sync).
    let actor = {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let Some(name) = header(ACTOR_HEADER) else {
            return unauthorized("missing x-actor header");
        };
        let Some(role_raw) = header(ROLE_HEADER) else {
            return unauthorized("missing x-actor-role header");
        };
        let Ok(role) = role_raw.parse::<Role>() else {
            return unauthorized("unknown role in x-actor-role header");
        };

        match header(BRAND_HEADER) {
            Some(brand) => Actor::with_brand(name, role, brand),
            None => Actor::new(name, role),
        }
    };
    req.extensions_mut().insert(actor);
    next.run(req).await
}
