//! Success envelope and envelope-rejecting extractors

use axum::extract::{FromRequest, FromRequestParts};
use serde::Serialize;

use crate::error::ApiError;

/// `{success, message, data}` body returned by every successful call
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(message: impl Into<String>, data: T) -> axum::Json<Self> {
        axum::Json(Self {
            success: true,
            message: message.into(),
            data: Some(data),
        })
    }
}

impl Envelope<()> {
    /// Acknowledgement without a payload
    pub fn message(message: impl Into<String>) -> axum::Json<Self> {
        axum::Json(Self {
            success: true,
            message: message.into(),
            data: None,
        })
    }
}

/// `Json` whose rejections use the error envelope
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Path` whose rejections use the error envelope
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
