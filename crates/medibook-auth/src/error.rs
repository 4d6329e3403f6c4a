//! Authentication error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::error;

/// Why a request carries no usable identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthenticatedReason {
    MissingToken,
    MalformedHeader,
    InvalidSignature,
    Expired,
}

impl UnauthenticatedReason {
    /// Metric label
    pub fn as_str(&self) -> &'static str {
        match self {
            UnauthenticatedReason::MissingToken => "missing_token",
            UnauthenticatedReason::MalformedHeader => "malformed_header",
            UnauthenticatedReason::InvalidSignature => "invalid_signature",
            UnauthenticatedReason::Expired => "expired",
        }
    }

    /// Client-facing message
    pub fn message(&self) -> &'static str {
        match self {
            UnauthenticatedReason::MissingToken => "Authentication required",
            UnauthenticatedReason::MalformedHeader => "Invalid authorization header format",
            UnauthenticatedReason::InvalidSignature => "Invalid token, please log in again",
            UnauthenticatedReason::Expired => "Session expired, please log in again",
        }
    }
}

/// Token verification failure
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,
}

impl From<TokenError> for UnauthenticatedReason {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidSignature => UnauthenticatedReason::InvalidSignature,
            TokenError::Expired => UnauthenticatedReason::Expired,
        }
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{}", .0.message())]
    Unauthenticated(UnauthenticatedReason),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("{0} not found")]
    NotFoundOrForbidden(&'static str),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Password hashing exceeded {0:?}")]
    HashTimeout(Duration),

    #[error("Token signing error: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("Auth configuration error: {0}")]
    Configuration(String),
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        AuthError::Unauthenticated(err.into())
    }
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Unauthenticated(_) | AuthError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::NotFoundOrForbidden(_) => StatusCode::NOT_FOUND,
            AuthError::PasswordHash(_)
            | AuthError::HashTimeout(_)
            | AuthError::Signing(_)
            | AuthError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the client
    pub fn public_message(&self) -> String {
        if self.status_code().is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Auth failure: {}", self);
        }

        let body = axum::Json(json!({
            "success": false,
            "message": self.public_message(),
        }));

        (status, body).into_response()
    }
}
