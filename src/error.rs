// HTTP API Error Types
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::database::StoreError;
use crate::mediator::guard::OwnershipError;

/// Every failure a request can end in. Each variant is produced by one
/// layer: storage (`NotFound`, `ValidationFailed`), the ownership guard
/// (`NotOwned`), the auth boundary (`Unauthenticated`); anything else is
/// `Unhandled`.
#[derive(Debug)]
pub enum ApiError {
    // 404, empty body
    NotFound,

    // 422 with details
    ValidationFailed {
        message: String,
        field_errors: HashMap<String, String>,
    },

    // 401, no body
    NotOwned,

    // 401 with an error body
    Unauthenticated(String),

    // 500 unless the failure carries a more specific status
    Unhandled { status: StatusCode, message: String },
}

/// Terminal status/body pair sent to the client
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub status: StatusCode,
    pub body: Option<Value>,
}

impl ApiError {
    pub fn not_found() -> Self {
        ApiError::NotFound
    }

    pub fn validation_failed(message: impl Into<String>, field_errors: HashMap<String, String>) -> Self {
        ApiError::ValidationFailed {
            message: message.into(),
            field_errors,
        }
    }

    /// Validation failure on a single field
    pub fn invalid_field(field: impl Into<String>, problem: impl Into<String>) -> Self {
        let mut field_errors = HashMap::new();
        field_errors.insert(field.into(), problem.into());
        Self::validation_failed("Validation failed", field_errors)
    }

    pub fn not_owned() -> Self {
        ApiError::NotOwned
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::Unauthenticated(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::unhandled(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::unhandled(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    pub fn unhandled(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError::Unhandled {
            status,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::ValidationFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotOwned => StatusCode::UNAUTHORIZED,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Unhandled { status, .. } => *status,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound => "NOT_FOUND",
            ApiError::ValidationFailed { .. } => "VALIDATION_FAILED",
            ApiError::NotOwned => "NOT_OWNED",
            ApiError::Unauthenticated(_) => "UNAUTHENTICATED",
            ApiError::Unhandled { .. } => "UNHANDLED",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::NotFound => "Not found",
            ApiError::ValidationFailed { message, .. } => message,
            ApiError::NotOwned => "Resource is owned by another user",
            ApiError::Unauthenticated(message) => message,
            ApiError::Unhandled { message, .. } => message,
        }
    }
}

/// The error mapper. Total over `ApiError`: every variant yields exactly one
/// outcome.
pub fn map_error(err: &ApiError) -> Outcome {
    let status = err.status_code();
    let body = match err {
        ApiError::NotFound | ApiError::NotOwned => None,
        ApiError::ValidationFailed { message, field_errors } => Some(json!({
            "error": true,
            "message": message,
            "code": err.error_code(),
            "field_errors": field_errors,
        })),
        ApiError::Unauthenticated(_) | ApiError::Unhandled { .. } => Some(json!({
            "error": true,
            "message": err.message(),
            "code": err.error_code(),
        })),
    };
    Outcome { status, body }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => {
                tracing::debug!("Not found: {}", what);
                ApiError::not_found()
            }
            StoreError::Validation(field_errors) => {
                ApiError::validation_failed("Validation failed", field_errors)
            }
            StoreError::Duplicate(field) => ApiError::invalid_field(field, "has already been taken"),
            StoreError::Timeout(limit) => {
                tracing::error!("Storage call timed out after {:?}", limit);
                ApiError::internal_server_error("Request processing timed out")
            }
            StoreError::Sqlx(sqlx_err) => match sqlx_err {
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                    tracing::error!("Database unavailable: {}", sqlx_err);
                    ApiError::service_unavailable("Database temporarily unavailable")
                }
                other => {
                    // Log the real error but return generic message
                    tracing::error!("SQLx error: {}", other);
                    ApiError::internal_server_error("Database error occurred")
                }
            },
            StoreError::Serialization(e) => {
                tracing::error!("Document serialization error: {}", e);
                ApiError::internal_server_error("Failed to read stored document")
            }
            other @ (StoreError::ConfigMissing(_) | StoreError::InvalidDatabaseUrl) => {
                tracing::error!("Storage misconfigured: {}", other);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
        }
    }
}

impl From<OwnershipError> for ApiError {
    fn from(err: OwnershipError) -> Self {
        tracing::warn!(
            "Ownership check failed: {} tried to modify {} owned by {}",
            err.principal,
            err.resource,
            err.owner
        );
        ApiError::not_owned()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::unhandled(rejection.status(), rejection.body_text())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let Outcome { status, body } = map_error(&self);
        match body {
            Some(body) => (status, Json(body)).into_response(),
            None => status.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn not_found_and_not_owned_have_no_body() {
        assert_eq!(
            map_error(&ApiError::not_found()),
            Outcome { status: StatusCode::NOT_FOUND, body: None }
        );
        assert_eq!(
            map_error(&ApiError::not_owned()),
            Outcome { status: StatusCode::UNAUTHORIZED, body: None }
        );
    }

    #[test]
    fn validation_failures_carry_details() {
        let outcome = map_error(&ApiError::invalid_field("title", "is required"));
        assert_eq!(outcome.status, StatusCode::UNPROCESSABLE_ENTITY);
        let body = outcome.body.unwrap();
        assert_eq!(body["field_errors"]["title"], "is required");
        assert_eq!(body["code"], "VALIDATION_FAILED");
    }

    #[test]
    fn unhandled_keeps_the_most_specific_status() {
        let outcome = map_error(&ApiError::unhandled(StatusCode::PAYLOAD_TOO_LARGE, "too big"));
        assert_eq!(outcome.status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(outcome.body.unwrap()["message"], "too big");

        let outcome = map_error(&ApiError::internal_server_error("boom"));
        assert_eq!(outcome.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn store_errors_map_onto_the_taxonomy() {
        let err: ApiError = StoreError::NotFound("book".into()).into();
        assert!(matches!(err, ApiError::NotFound));

        let err: ApiError = StoreError::Duplicate("email".into()).into();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let err: ApiError = StoreError::Timeout(std::time::Duration::from_secs(1)).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let err: ApiError = StoreError::Sqlx(sqlx::Error::PoolTimedOut).into();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let err: ApiError = StoreError::Sqlx(sqlx::Error::RowNotFound).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn ownership_errors_become_not_owned() {
        let err: ApiError = OwnershipError {
            principal: Uuid::new_v4(),
            owner: Uuid::new_v4(),
            resource: Uuid::new_v4(),
        }
        .into();
        assert_eq!(map_error(&err).status, StatusCode::UNAUTHORIZED);
        assert!(map_error(&err).body.is_none());
    }
}
