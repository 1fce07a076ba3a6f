// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use thiserror::Error;

use crate::auth::SessionError;
use crate::database::manager::DatabaseError;
use crate::integrations::ProviderError;
use crate::services::upload::UploadError;
use crate::services::usage::LimitReached;

/// HTTP API error with a status code and a client-safe message.
/// Server-side variants carry an optional `detail` that is only ever
/// shown to clients when error detail exposure is configured.
#[derive(Debug, Error)]
pub enum ApiError {
    // 400 Bad Request
    #[error("{0}")]
    Validation(String),

    // 401 Unauthorized
    #[error("{0}")]
    Unauthorized(String),

    // 403 Forbidden
    #[error("{0}")]
    Forbidden(String),

    // 403, the tenant's plan allows no more of a resource
    #[error("{message}")]
    LimitReached {
        message: String,
        current: i64,
        limit: i32,
    },

    // 404 Not Found
    #[error("{0}")]
    NotFound(String),

    // 409 Conflict
    #[error("{0}")]
    Conflict(String),

    // 413 Payload Too Large
    #[error("{0}")]
    PayloadTooLarge(String),

    // 415 Unsupported Media Type
    #[error("{0}")]
    UnsupportedMediaType(String),

    // 500, an identity/payment/calendar/upload provider failed
    #[error("{message}")]
    Upstream {
        message: String,
        detail: Option<String>,
    },

    // 500
    #[error("{message}")]
    Internal {
        message: String,
        detail: Option<String>,
    },
}

/// Attached to error responses so the detail middleware can rebuild the
/// body with internals when configured
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub message: String,
    pub detail: Option<String>,
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Validation(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::LimitReached { .. } => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::PayloadTooLarge(_) => 413,
            ApiError::UnsupportedMediaType(_) => 415,
            ApiError::Upstream { .. } => 500,
            ApiError::Internal { .. } => 500,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::Validation(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::UnsupportedMediaType(msg) => msg,
            ApiError::LimitReached { message, .. }
            | ApiError::Upstream { message, .. }
            | ApiError::Internal { message, .. } => message,
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Upstream { detail, .. } | ApiError::Internal { detail, .. } => {
                detail.as_deref()
            }
            _ => None,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::LimitReached { current, limit, .. } => json!({
                "error": self.message(),
                "code": "LIMIT_REACHED",
                "current": current,
                "limit": limit,
            }),
            _ => json!({ "error": self.message() }),
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

// Static constructor methods
impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("Unauthorized".to_string())
    }

    pub fn forbidden() -> Self {
        ApiError::Forbidden("Forbidden".to_string())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn upstream(message: impl Into<String>, detail: impl ToString) -> Self {
        ApiError::Upstream {
            message: message.into(),
            detail: Some(detail.to_string()),
        }
    }

    pub fn internal(message: impl Into<String>, detail: impl ToString) -> Self {
        ApiError::Internal {
            message: message.into(),
            detail: Some(detail.to_string()),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            DatabaseError::Conflict(msg) => ApiError::conflict(msg),
            other => ApiError::internal("Internal server error", other),
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        ApiError::upstream("External service request failed", err)
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        tracing::debug!("Session rejected: {}", err);
        ApiError::unauthorized()
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        let message = err.to_string();
        match err {
            UploadError::TooLarge { .. } => ApiError::PayloadTooLarge(message),
            UploadError::UnsupportedType(_) => ApiError::UnsupportedMediaType(message),
            UploadError::MissingFile
            | UploadError::AltTooShort
            | UploadError::SetupIncomplete
            | UploadError::Malformed(_) => ApiError::Validation(message),
        }
    }
}

impl From<LimitReached> for ApiError {
    fn from(err: LimitReached) -> Self {
        ApiError::LimitReached {
            message: err.to_string(),
            current: err.current,
            limit: err.limit,
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| "Invalid request body".to_string());
        ApiError::Validation(message)
    }
}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if self.is_server_error() {
            tracing::error!(
                status = status.as_u16(),
                detail = self.detail().unwrap_or_default(),
                "{}",
                self.message()
            );
        }

        let report = ErrorReport {
            message: self.message().to_string(),
            detail: self.detail().map(str::to_string),
        };

        let mut response = (status, Json(self.to_json())).into_response();
        response.extensions_mut().insert(report);
        response
    }
}
