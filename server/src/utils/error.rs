use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, warn};

use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A path id that is not a positive integer.
    #[error("Invalid id: {0}")]
    InvalidId(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A detail lookup with an `external-` id; those events only exist upstream.
    #[error("External event id: {0}")]
    ExternalEventId(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Service not configured: {message}")]
    NotConfigured {
        message: String,
        details: Option<Value>,
    },

    /// Discovery API failure. `status` is the upstream HTTP status when one
    /// was received.
    #[error("External service error: {message}")]
    Upstream {
        status: Option<u16>,
        message: String,
        source_name: &'static str,
    },

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidId(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) | AppError::ExternalEventId(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotConfigured { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Upstream { status, .. } => status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) | AppError::InvalidId(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::ExternalEventId(_) => "EXTERNAL_EVENT",
            AppError::Conflict(_) => "CONFLICT",
            AppError::NotConfigured { .. } => "SERVICE_NOT_CONFIGURED",
            AppError::Upstream { .. } => "EXTERNAL_SERVICE_ERROR",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    fn log(&self) {
        match self {
            AppError::ValidationError(msg)
            | AppError::InvalidId(msg)
            | AppError::AuthError(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::ExternalEventId(msg)
            | AppError::Conflict(msg) => {
                warn!(code = self.code(), message = %msg, "Request rejected");
            }
            AppError::NotConfigured { message, .. } => {
                error!(message = %message, "Service not configured");
            }
            AppError::Upstream {
                status,
                message,
                source_name,
            } => {
                error!(?status, message = %message, source = %source_name, "Upstream error");
            }
            AppError::DatabaseError(e) => {
                error!(error = ?e, "Database error");
            }
            AppError::InternalServerError(msg) => {
                error!(message = %msg, "Application error");
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        self.log();

        match self {
            AppError::ExternalEventId(id) => error_response(
                code,
                "External events cannot be fetched by ID. Please use /api/events/external endpoint.",
                Some(json!({ "isExternal": true, "providedId": id })),
                None,
                status,
            ),
            AppError::InvalidId(id) => error_response(
                code,
                "Invalid ID format",
                Some(json!({ "providedId": id })),
                None,
                status,
            ),
            AppError::NotConfigured { message, details } => error_response(
                code,
                message,
                details,
                Some(json!({ "total": 0, "events": [] })),
                status,
            ),
            AppError::Upstream {
                message,
                source_name,
                ..
            } => error_response(
                code,
                message,
                None,
                Some(json!({ "total": 0, "events": [], "source": source_name })),
                status,
            ),
            // Driver messages are passed through to the client.
            AppError::DatabaseError(e) => error_response(code, e.to_string(), None, None, status),
            AppError::ValidationError(msg)
            | AppError::AuthError(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::InternalServerError(msg) => {
                error_response(code, msg, None, None, status)
            }
        }
    }
}
