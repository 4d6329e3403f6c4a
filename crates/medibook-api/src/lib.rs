//! MediBook REST API
//!
//! This crate provides the Axum-based HTTP API for MediBook: account
//! registration and login, the public doctor directory, doctor-owned
//! clinics and services, and appointment requests.

pub mod error;
pub mod response;
pub mod routes;
pub mod state;
pub mod validation;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
