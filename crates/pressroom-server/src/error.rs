use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pressroom_core::error::PressError;

// ---------------------------------------------------------------------------
// Internal sentinels for statuses the core enum does not model directly
// ---------------------------------------------------------------------------

/// Carries an explicit HTTP 409 through the `anyhow::Error` chain without
/// touching the `PressError` enum.
#[derive(Debug)]
struct ConflictError(String);

impl std::fmt::Display for ConflictError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ConflictError {}

/// Carries an explicit HTTP 404 through the `anyhow::Error` chain.
#[derive(Debug)]
struct NotFoundError(String);

impl std::fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for NotFoundError {}

// ---------------------------------------------------------------------------
// AppError — unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Construct a 400 Bad Request error with the given message.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(PressError::Validation(msg.into()).into())
    }

    /// Construct a 409 Conflict error.
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self(ConflictError(msg.into()).into())
    }

    /// Construct a 404 Not Found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self(NotFoundError(msg.into()).into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Explicit sentinel types win over the PressError mapping.
        if let Some(c) = self.0.downcast_ref::<ConflictError>() {
            let body = serde_json::json!({ "error": c.0.clone() });
            return (StatusCode::CONFLICT, axum::Json(body)).into_response();
        }
        if let Some(n) = self.0.downcast_ref::<NotFoundError>() {
            let body = serde_json::json!({ "error": n.0.clone() });
            return (StatusCode::NOT_FOUND, axum::Json(body)).into_response();
        }

        let status = if let Some(e) = self.0.downcast_ref::<PressError>() {
            match e {
                PressError::NotInitialized => StatusCode::BAD_REQUEST,
                PressError::Validation(_)
                | PressError::InvalidSlug(_)
                | PressError::InvalidContentStatus(_)
                | PressError::InvalidJobStatus(_)
                | PressError::InvalidKeywordStatus(_)
                | PressError::InvalidApprovalStatus(_)
                | PressError::InvalidRole(_)
                | PressError::InvalidActionKind(_)
                | PressError::InvalidContentKind(_)
                | PressError::InvalidScheduleMode(_)
                | PressError::InvalidPublishMode(_)
                | PressError::InvalidTimeWindow(_) => StatusCode::BAD_REQUEST,
                PressError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                PressError::Forbidden { .. } => StatusCode::FORBIDDEN,
                PressError::ContentNotFound(_)
                | PressError::ScheduleNotFound(_)
                | PressError::KeywordNotFound(_)
                | PressError::JobNotFound(_)
                | PressError::ApprovalNotFound(_) => StatusCode::NOT_FOUND,
                PressError::Conflict(_) => StatusCode::CONFLICT,
                PressError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                PressError::Store(_)
                | PressError::Audit(_)
                | PressError::Io(_)
                | PressError::Yaml(_)
                | PressError::Json(_)
                | PressError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pressroom_core::types::Role;

    #[test]
    fn validation_maps_to_400() {
        let err = AppError(PressError::Validation("empty name".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn invalid_slug_maps_to_400() {
        let err = AppError(PressError::InvalidSlug("BAD NAME".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_initialized_maps_to_400() {
        let err = AppError(PressError::NotInitialized.into());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unauthorized_maps_to_401() {
        let err = AppError(PressError::Unauthorized("no identity".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn forbidden_maps_to_403() {
        let err = AppError(
            PressError::Forbidden {
                role: Role::Viewer.to_string(),
                capability: "publish_content".into(),
            }
            .into(),
        );
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn content_not_found_maps_to_404() {
        let err = AppError(PressError::ContentNotFound("abc".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn keyword_not_found_maps_to_404() {
        let err = AppError(PressError::KeywordNotFound("abc".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn conflict_maps_to_409() {
        let err = AppError(PressError::Conflict("run already in progress".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn invalid_transition_maps_to_422() {
        let err = AppError(
            PressError::InvalidTransition {
                from: "DRAFT".into(),
                to: "PUBLISHED".into(),
                reason: "not in the transition table".into(),
            }
            .into(),
        );
        assert_eq!(
            err.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn store_error_maps_to_500() {
        let err = AppError(PressError::Store("corrupt page".into()).into());
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn non_press_error_maps_to_500() {
        let err = AppError(anyhow::anyhow!("something unexpected"));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn conflict_constructor_maps_to_409() {
        let err = AppError::conflict("run already in progress for 'production'");
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn not_found_constructor_maps_to_404() {
        let err = AppError::not_found("engine 'x' has no status yet");
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn response_body_is_json_error_object() {
        let err = AppError(PressError::ContentNotFound("abc".into()).into());
        let response = err.into_response();
        let ct = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .expect("should have content-type");
        assert!(ct.to_str().unwrap().contains("application/json"));
    }
}
