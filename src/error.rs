// src/error.rs

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::{error::Error as _, fmt};

use crate::services::{ErrorKind, ServiceError};

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request (validation and conflicting deletes)
    BadRequest(String),

    // 404 Not Found
    NotFound(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Maps service failures onto transport errors. Storage failures keep their
/// cause for the log but never reach the client.
impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err.kind() {
            ErrorKind::NotFound => AppError::NotFound(err.to_string()),
            ErrorKind::Validation | ErrorKind::Conflict => AppError::BadRequest(err.to_string()),
            ErrorKind::Storage => {
                let cause = err
                    .source()
                    .map(|source| format!("{err}: {source}"))
                    .unwrap_or_else(|| err.to_string());
                AppError::InternalServerError(cause)
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{services::Entity, storage::StorageError, validation::RuleViolation};

    #[test]
    fn service_errors_map_to_status_codes() {
        let cases = [
            (
                ServiceError::NotFound {
                    entity: Entity::Quiz,
                    id: 1,
                },
                StatusCode::NOT_FOUND,
            ),
            (ServiceError::EmptyQuiz(1), StatusCode::NOT_FOUND),
            (
                RuleViolation::new("title", "title must not be empty").into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::Conflict("cannot delete".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::Storage {
                    operation: "load quiz",
                    source: StorageError::TransactionClosed,
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), status);
        }
    }

    #[test]
    fn storage_errors_keep_their_cause_for_logging() {
        let err = AppError::from(ServiceError::Storage {
            operation: "load quiz",
            source: StorageError::TransactionClosed,
        });

        match err {
            AppError::InternalServerError(msg) => {
                assert!(msg.starts_with("storage failure while trying to load quiz: "));
            }
            other => panic!("unexpected mapping: {other:?}"),
        }
    }
}
