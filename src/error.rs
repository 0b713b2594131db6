/*
 * Responsibility
 * - App-wide AppError definition
 * - IntoResponse impl (HTTP status / JSON error body)
 * - Conversions from gate / binder / store / role-parse errors
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::api::v1::extractors::auth_ctx::BinderError;
use crate::repos::error::RepoError;
use crate::services::auth::role::RoleParseError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

/// Error message attached to every `AppError` response.
///
/// Lets response-side middleware (the admin audit) see that the handler failed
/// and why, without parsing the body.
#[derive(Debug, Clone)]
pub struct FailureMessage(pub String);

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("forbidden")]
    Forbidden,
    #[error("not found: {resource}")]
    NotFound { resource: &'static str },
    #[error("authenticated context missing for this request")]
    MissingContext,
    #[error("identity marker and AuthCtx type must be used together ({0})")]
    BinderMisuse(String),
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::MissingContext | AppError::BinderMisuse(_) | AppError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let failure = FailureMessage(self.to_string());

        let (code, message) = match self {
            AppError::BadRequest { code, message } => (code, message),
            AppError::Unauthenticated => ("UNAUTHENTICATED", "unauthenticated".into()),
            AppError::Forbidden => ("FORBIDDEN", "forbidden".into()),
            AppError::NotFound { resource } => ("NOT_FOUND", format!("{resource} not found.")),
            // Wiring defects: keep the detail in logs, not in the body.
            AppError::MissingContext | AppError::BinderMisuse(_) | AppError::Internal => (
                "INTERNAL_SERVER_ERROR",
                "internal server error".into(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(failure);
        response
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict(what) => AppError::bad_request("EMAIL_TAKEN", what),
        }
    }
}

impl From<RoleParseError> for AppError {
    fn from(e: RoleParseError) -> Self {
        AppError::bad_request("INVALID_ROLE", e.to_string())
    }
}

impl From<BinderError> for AppError {
    fn from(e: BinderError) -> Self {
        match e {
            BinderError::MissingContext => AppError::MissingContext,
            BinderError::Misuse { .. } => AppError::BinderMisuse(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_taxonomy_to_distinct_statuses() {
        assert_eq!(AppError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::MissingContext.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::BinderMisuse("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn response_carries_failure_message() {
        let response = AppError::not_found("user").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let failure = response.extensions().get::<FailureMessage>().unwrap();
        assert_eq!(failure.0, "not found: user");
    }
}
