use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::research::IngestError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No extractable text: {0}")]
    EmptyDocument(String),

    #[error("Unreadable document: {0}")]
    UnreadableDocument(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Completion service rejected the credential: {0}")]
    CompletionAuth(String),

    #[error("Completion service rate limit exceeded: {0}")]
    CompletionRateLimited(String),

    #[error("Completion service error: {0}")]
    CompletionService(String),

    #[error("Too many generation requests")]
    TooManyRequests { retry_after_secs: u64 },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::EmptyDocument => AppError::EmptyDocument(
                "The document contains no extractable text. \
                 Scanned or image-only PDFs are not supported."
                    .to_string(),
            ),
            IngestError::UnreadablePdf(msg) => AppError::UnreadableDocument(msg),
            IngestError::InvalidUrl(msg) => AppError::Validation(msg),
            IngestError::Fetch(msg) => AppError::Fetch(msg),
            IngestError::Worker(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Authentication { message, .. } => AppError::CompletionAuth(message),
            LlmError::RateLimited { message } => AppError::CompletionRateLimited(message),
            other => AppError::CompletionService(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::EmptyDocument(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "EMPTY_DOCUMENT",
                msg.clone(),
            ),
            AppError::UnreadableDocument(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNREADABLE_DOCUMENT",
                format!("The PDF could not be read: {msg}"),
            ),
            AppError::Fetch(msg) => {
                tracing::warn!("Research fetch failed: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "FETCH_ERROR",
                    format!("The article could not be fetched: {msg}"),
                )
            }
            AppError::CompletionAuth(msg) => {
                tracing::error!("Completion service authentication failed: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "COMPLETION_AUTH_ERROR",
                    "The completion service rejected the API key. \
                     Check the configured ANTHROPIC_API_KEY."
                        .to_string(),
                )
            }
            AppError::CompletionRateLimited(msg) => {
                tracing::warn!("Completion service rate limited: {msg}");
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    "COMPLETION_RATE_LIMITED",
                    "The completion service rate limit was reached. \
                     Wait a minute and submit again."
                        .to_string(),
                )
            }
            AppError::CompletionService(msg) => {
                tracing::error!("Completion service error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "COMPLETION_SERVICE_ERROR",
                    "The completion service failed to generate outreach. Try again shortly."
                        .to_string(),
                )
            }
            AppError::TooManyRequests { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                format!("Too many generation requests. Retry in {retry_after_secs}s."),
            ),
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

    #[test]
    fn test_llm_errors_map_to_distinct_variants() {
        let auth: AppError = LlmError::Authentication {
            status: 401,
            message: "bad key".into(),
        }
        .into();
        assert!(matches!(auth, AppError::CompletionAuth(_)));

        let limited: AppError = LlmError::RateLimited {
            message: "slow".into(),
        }
        .into();
        assert!(matches!(limited, AppError::CompletionRateLimited(_)));

        let generic: AppError = LlmError::EmptyContent.into();
        assert!(matches!(generic, AppError::CompletionService(_)));
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AppError::EmptyDocument("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (AppError::Fetch("x".into()), StatusCode::BAD_GATEWAY),
            (AppError::CompletionRateLimited("x".into()), StatusCode::TOO_MANY_REQUESTS),
            (
                AppError::TooManyRequests { retry_after_secs: 3 },
                StatusCode::TOO_MANY_REQUESTS,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
