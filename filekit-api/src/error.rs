use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use filekit::{FilekitError, ToolExecutionError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message describing what went wrong
    pub error: String,
}

/// Application-specific error types for the API
#[derive(Debug, Error)]
pub enum AppError {
    /// The request is missing a field or carries an unusable value
    #[error("{0}")]
    BadRequest(String),

    /// The request body exceeds the configured upload limit
    #[error("{0}")]
    PayloadTooLarge(String),

    /// The requested download does not exist
    #[error("file not found")]
    NotFound,

    /// Every media tool slot is busy
    #[error("{0}")]
    Unavailable(String),

    /// A collaborator failed; the detail is logged, never returned
    #[error("Processing failed")]
    Processing(String),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(message.into())
    }

    pub fn processing(detail: impl std::fmt::Display) -> Self {
        AppError::Processing(detail.to_string())
    }

    /// Client-side failure reported by an extractor or the body reader.
    fn rejected(status: StatusCode, message: String) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(message)
        } else {
            AppError::BadRequest(message)
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Processing(detail) = &self {
            error!(%detail, "request failed");
        }

        let error_response = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(error_response)).into_response()
    }
}

impl From<FilekitError> for AppError {
    fn from(err: FilekitError) -> Self {
        match err {
            FilekitError::Tool(ToolExecutionError::Saturated { .. }) => {
                AppError::Unavailable(err.to_string())
            }
            err if err.is_client_error() => AppError::BadRequest(err.to_string()),
            err => AppError::processing(err),
        }
    }
}

impl From<filekit::PdfError> for AppError {
    fn from(err: filekit::PdfError) -> Self {
        FilekitError::from(err).into()
    }
}

impl From<ToolExecutionError> for AppError {
    fn from(err: ToolExecutionError) -> Self {
        FilekitError::from(err).into()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::processing(err)
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::rejected(
            err.status(),
            format!("Failed to read multipart field: {}", err.body_text()),
        )
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::processing(err)
    }
}
