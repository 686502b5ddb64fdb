// HTTP API Error Types
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{PasswordError, TokenError};
use crate::database::DatabaseError;
use crate::services::{AuthError, CatalogError};
use crate::validation::ValidationError;

/// Every failure the API reports, classified into one of six buckets.
///
/// Messages are client-safe. Internal faults carry only an incident id; the
/// underlying error is logged under that id when the value is built.
#[derive(Debug, Clone)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest { message: String, details: Vec<String> },

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    Internal { incident: Uuid },
}

/// Wire shape of every error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub timestamp: DateTime<Utc>,
    pub status: u16,
    pub error: &'static str,
    pub message: String,
    pub path: String,
    pub details: Vec<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Status name as it appears in the `error` field
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest { .. } => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Internal { .. } => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest { message, .. } => message,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::Internal { .. } => "An unexpected error occurred",
        }
    }

    pub fn details(&self) -> Vec<String> {
        match self {
            ApiError::BadRequest { details, .. } => details.clone(),
            ApiError::Internal { incident } => vec![format!("incident: {}", incident)],
            _ => Vec::new(),
        }
    }

    pub fn body(&self, path: &str, timestamp: DateTime<Utc>) -> ErrorBody {
        ErrorBody {
            timestamp,
            status: self.status().as_u16(),
            error: self.error_code(),
            message: self.message().to_string(),
            path: path.to_string(),
            details: self.details(),
        }
    }

    /// Render with the request path filled in.
    pub fn render(&self, path: &str, timestamp: DateTime<Utc>) -> Response {
        let mut response = (self.status(), Json(self.body(path, timestamp))).into_response();
        response.extensions_mut().insert(self.clone());
        response
    }
}

// Static constructor methods
impl ApiError {
    pub fn validation(details: Vec<String>) -> Self {
        ApiError::BadRequest {
            message: "Validation failed".to_string(),
            details,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    /// Log `err` under a fresh incident id and hide it from the client.
    pub fn internal(err: impl std::fmt::Display) -> Self {
        let incident = Uuid::new_v4();
        tracing::error!(%incident, "Internal error: {}", err);
        ApiError::Internal { incident }
    }
}

// Convert other error types to ApiError
impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.details)
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            DatabaseError::UserNotFound(_) => ApiError::not_found(err.to_string()),
            DatabaseError::UniqueViolation { field } => ApiError::conflict(format!("Duplicate value for {}", field)),
            other => ApiError::internal(other),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(v) => v.into(),
            AuthError::UsernameTaken(_) | AuthError::EmailTaken(_) => ApiError::conflict(err.to_string()),
            AuthError::InvalidCredentials => ApiError::unauthorized(err.to_string()),
            AuthError::Database(e) => e.into(),
            other => ApiError::internal(other),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation(v) => v.into(),
            CatalogError::ProductNotFound(_) | CatalogError::UserNotFound(_) => ApiError::not_found(err.to_string()),
            CatalogError::Database(e) => e.into(),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::internal(err)
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        ApiError::internal(err)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::internal(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest {
            message: "Malformed request body".to_string(),
            details: vec![rejection.body_text()],
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest {
            message: "Malformed path parameter".to_string(),
            details: vec![rejection.body_text()],
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest {
            message: "Malformed query string".to_string(),
            details: vec![rejection.body_text()],
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// The path is filled in by the error_body middleware, which finds this
// value in the response extensions.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.render("", Utc::now())
    }
}
