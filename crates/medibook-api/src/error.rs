//! API error types

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use medibook_auth::AuthError;
use medibook_db::DbError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::validation::FieldError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl ApiError {
    /// Single-field validation failure
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        ApiError::Validation(vec![FieldError::new(field, message)])
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(e) => e.status_code(),
            ApiError::Database(e) => match e {
                DbError::NotFound(_) => StatusCode::NOT_FOUND,
                DbError::Duplicate(_) => StatusCode::CONFLICT,
                DbError::EmptyUpdate(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::Auth(e) => e.public_message(),
            ApiError::Database(DbError::NotFound(msg) | DbError::Duplicate(msg)) => msg.clone(),
            ApiError::Database(DbError::EmptyUpdate(_)) => "No fields to update".to_string(),
            _ if self.status_code().is_server_error() => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = match &self {
            ApiError::Validation(errors) => json!({
                "success": false,
                "message": self.public_message(),
                "errors": errors,
            }),
            _ => json!({
                "success": false,
                "message": self.public_message(),
            }),
        };

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medibook_auth::UnauthenticatedReason;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::invalid("email", "bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(DbError::Duplicate("taken".into())).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(DbError::EmptyUpdate("clinic")).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(AuthError::Unauthenticated(UnauthenticatedReason::Expired)).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::NotFoundOrForbidden("clinic")).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_store_failures_are_not_leaked() {
        let err = ApiError::from(DbError::Migration("near \"SELEC\": syntax error".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Internal server error");
    }
}
