//! Error types for sproutlink-api
//!
//! Every failure is converted to an HTTP response at the route boundary;
//! the body carries a `{"detail": message}` object for the frontend.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::extractor::ExtractionError;
use crate::services::generator::GenerationError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Image text extraction failure (400)
    #[error("Text extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    /// Report generation failure (500)
    #[error("Report generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// Database error (500); the message is redacted in the response
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// sproutlink-common error
    #[error(transparent)]
    Common(#[from] sproutlink_common::Error),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Extraction(ref err) => (StatusCode::BAD_REQUEST, err.to_string()),
            ApiError::Generation(ref err) => {
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::Database(ref err) => {
                // Store internals stay out of the response body
                tracing::error!("Database error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage operation failed".to_string(),
                )
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::Common(ref err) => match err {
                sproutlink_common::Error::NotFound(msg) => {
                    (StatusCode::NOT_FOUND, msg.clone())
                }
                sproutlink_common::Error::InvalidInput(msg) => {
                    (StatusCode::BAD_REQUEST, msg.clone())
                }
                sproutlink_common::Error::DonorPoolEmpty => {
                    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            },
            // The db and service layers propagate through anyhow, so a
            // store or generation failure arrives wrapped here. Unwrap
            // it back to its typed source so each source keeps its
            // mapping (and sqlx details stay redacted).
            ApiError::Other(err) => {
                return match err.downcast::<sqlx::Error>() {
                    Ok(db_err) => ApiError::Database(db_err).into_response(),
                    Err(err) => match err.downcast::<GenerationError>() {
                        Ok(gen_err) => ApiError::Generation(gen_err).into_response(),
                        Err(err) => match err.downcast::<sproutlink_common::Error>() {
                            Ok(common_err) => ApiError::Common(common_err).into_response(),
                            Err(err) => {
                                tracing::error!("Unexpected error: {}", err);
                                let body = Json(json!({ "detail": err.to_string() }));
                                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
                            }
                        },
                    },
                };
            }
        };

        let body = Json(json!({ "detail": detail }));
        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    async fn body_detail(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        body["detail"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let response = ApiError::NotFound("Donor not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_bad_request_maps_to_400() {
        let response = ApiError::BadRequest("missing field".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_database_error_is_redacted() {
        let response = ApiError::Database(sqlx::Error::PoolClosed).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_detail(response).await, "Storage operation failed");
    }

    #[tokio::test]
    async fn test_anyhow_wrapped_database_error_is_redacted() {
        // The db layer returns anyhow::Result, so handlers surface
        // sqlx failures through the `Other` variant
        let err = ApiError::Other(anyhow::Error::from(sqlx::Error::PoolClosed));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_detail(response).await, "Storage operation failed");
    }

    #[tokio::test]
    async fn test_anyhow_wrapped_donor_pool_error_keeps_its_message() {
        let err = ApiError::Other(anyhow::Error::from(sproutlink_common::Error::DonorPoolEmpty));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_detail(response).await,
            "No donors available for assignment"
        );
    }
}
