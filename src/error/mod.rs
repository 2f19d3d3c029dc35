use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::enrolment::EventPayloadError;
use crate::handler::HandlerError;
use crate::host::DirectoryError;
use crate::instance::FieldErrors;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Fields(#[from] FieldErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),
}

impl From<EventPayloadError> for AppError {
    fn from(e: EventPayloadError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<HandlerError> for AppError {
    fn from(e: HandlerError) -> Self {
        match e {
            HandlerError::Directory(e) => AppError::Directory(e),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<FieldErrors>,
}

/// Check if running in production mode (based on RUN_MODE env var)
fn is_production() -> bool {
    std::env::var("RUN_MODE")
        .map(|m| m == "production" || m == "prod")
        .unwrap_or(false)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut fields = None;
        let (status, code, client_message, log_message) = match &self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                msg.clone(),
            ),
            AppError::Fields(errors) => {
                fields = Some(errors.clone());
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "INVALID_FIELDS",
                    errors.to_string(),
                    errors.to_string(),
                )
            }
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                msg.clone(),
                msg.clone(),
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                "CONFLICT",
                msg.clone(),
                msg.clone(),
            ),
            AppError::Directory(e) => {
                let log_msg = e.to_string();
                let client_msg = if is_production() {
                    "Host directory unavailable".to_string()
                } else {
                    log_msg.clone()
                };
                (StatusCode::SERVICE_UNAVAILABLE, "DIRECTORY_ERROR", client_msg, log_msg)
            }
        };

        // Client errors are expected traffic; only server-side failures are errors
        if status.is_server_error() {
            tracing::error!(
                code = %code,
                status = %status.as_u16(),
                message = %log_message,
                "API error"
            );
        } else {
            tracing::debug!(
                code = %code,
                status = %status.as_u16(),
                message = %log_message,
                "API request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: client_message,
                fields,
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
