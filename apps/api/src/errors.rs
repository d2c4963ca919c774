use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    /// Storage unreachable or timed out. Clients may retry.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// An LLM or embedding collaborator failed.
    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        if e.is_retryable() {
            return AppError::ServiceUnavailable(e.to_string());
        }
        match e {
            StoreError::NotFound { .. } => AppError::NotFound(e.to_string()),
            StoreError::InvalidInput(msg) => AppError::Validation(msg),
            StoreError::DimensionMismatch(inner) => {
                AppError::UnprocessableEntity(inner.to_string())
            }
            other => AppError::Internal(anyhow::anyhow!(other.to_string())),
        }
    }
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        AppError::Upstream(format!("LLM request failed: {e}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::ServiceUnavailable(msg) => {
                tracing::warn!("Storage unavailable: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "STORAGE_UNAVAILABLE",
                    "Storage is temporarily unavailable, retry the request".to_string(),
                )
            }
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {msg}");
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg.clone())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::SimilarityError;
    use crate::store::Entity;

    fn status_of(e: AppError) -> StatusCode {
        e.into_response().status()
    }

    #[test]
    fn test_store_errors_map_to_status_codes() {
        let not_found = StoreError::NotFound {
            entity: Entity::Description,
            key: "Senior SWE".to_string(),
        };
        assert_eq!(status_of(not_found.into()), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(StoreError::InvalidInput("title".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(
                StoreError::DimensionMismatch(SimilarityError::DimensionMismatch {
                    left: 2,
                    right: 3
                })
                .into()
            ),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(StoreError::StorageUnavailable("down".into()).into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(StoreError::Storage("corrupt".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_message_names_key() {
        let e: AppError = StoreError::NotFound {
            entity: Entity::Description,
            key: "Senior SWE".to_string(),
        }
        .into();
        assert!(e.to_string().contains("Job description not found: Senior SWE"));
    }

    #[test]
    fn test_upstream_is_bad_gateway() {
        assert_eq!(status_of(AppError::Upstream("llm".into())), StatusCode::BAD_GATEWAY);
    }
}
