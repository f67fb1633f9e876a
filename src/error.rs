use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::ai::AiError;
use crate::assets::StoreError;

/// Application error taxonomy for HTTP handlers.
///
/// Produces consistent `{error, code}` JSON responses. A project owned by
/// another user maps to `NotFound`, never `Forbidden`, so ownership is not
/// leaked through the error shape.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    /// AI endpoints when no generation capability is configured.
    #[error("AI features are disabled or not configured")]
    AiUnavailable,

    /// The model call succeeded but produced nothing usable.
    #[error("generation returned no content")]
    GenerationEmpty,

    /// Transport or upstream failure from the generation capability; the
    /// upstream detail is embedded, never silently defaulted.
    #[error("generation failed: {0}")]
    GenerationFailed(String),

    #[error("storage failure: {0}")]
    Storage(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Storage(e.to_string())
    }
}

impl From<AiError> for ApiError {
    fn from(e: AiError) -> Self {
        match e {
            AiError::Empty => ApiError::GenerationEmpty,
            AiError::Transport(detail) | AiError::Upstream(detail) => {
                ApiError::GenerationFailed(detail)
            }
        }
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", (*msg).to_string()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            ApiError::AiUnavailable => (
                StatusCode::NOT_IMPLEMENTED,
                "AI_UNAVAILABLE",
                self.to_string(),
            ),
            ApiError::GenerationEmpty => {
                (StatusCode::BAD_GATEWAY, "GENERATION_EMPTY", self.to_string())
            }
            ApiError::GenerationFailed(_) => (
                StatusCode::BAD_GATEWAY,
                "GENERATION_FAILED",
                self.to_string(),
            ),
            ApiError::Storage(_) => {
                tracing::error!(error = %self, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_FAILURE",
                    self.to_string(),
                )
            }
            ApiError::Database(err) => classify_sqlx_error(err),
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.status_and_code();
        let body = json!({
            "error": message,
            "code": code,
        });
        (status, axum::Json(body)).into_response()
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// `RowNotFound` maps to 404; unique violations on `uq_`-named constraints
/// (the signup email race) map to 409; everything else is a sanitized 500.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            if db_err.code().as_deref() == Some("23505")
                && db_err.constraint().is_some_and(|c| c.starts_with("uq_"))
            {
                return (
                    StatusCode::CONFLICT,
                    "CONFLICT",
                    "Email already registered".to_string(),
                );
            }
            tracing::error!(error = %db_err, "database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ownership_mismatch_and_missing_project_share_a_shape() {
        let a = ApiError::NotFound("Project not found").status_and_code();
        let b = ApiError::NotFound("Project not found").status_and_code();
        assert_eq!(a.0, StatusCode::NOT_FOUND);
        assert_eq!(a, b);
    }

    #[test]
    fn generation_errors_map_to_bad_gateway() {
        let (empty, _, _) = ApiError::GenerationEmpty.status_and_code();
        assert_eq!(empty, StatusCode::BAD_GATEWAY);

        let (failed, _, msg) =
            ApiError::GenerationFailed("upstream exploded".into()).status_and_code();
        assert_eq!(failed, StatusCode::BAD_GATEWAY);
        assert!(msg.contains("upstream exploded"));
    }

    #[test]
    fn ai_unavailable_is_not_implemented() {
        let (status, code, _) = ApiError::AiUnavailable.status_and_code();
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(code, "AI_UNAVAILABLE");
    }

    #[test]
    fn tagged_ai_outcomes_convert() {
        assert!(matches!(
            ApiError::from(crate::ai::AiError::Empty),
            ApiError::GenerationEmpty
        ));
        assert!(matches!(
            ApiError::from(crate::ai::AiError::Transport("timeout".into())),
            ApiError::GenerationFailed(_)
        ));
    }
}
