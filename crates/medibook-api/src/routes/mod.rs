//! API routes

mod admin;
mod appointments;
mod auth;
mod clinics;
mod doctors;
mod health;
pub mod metrics;
mod owned;
mod services;
pub mod types;

use axum::{Router, http::StatusCode, response::IntoResponse};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::state::{AppState, MetricsHandle};

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        axum::Json(json!({ "success": false, "message": "Route not found" })),
    )
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        axum::Json(json!({ "success": false, "message": "Method not allowed" })),
    )
}

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let mut router = Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(doctors::routes())
        .merge(clinics::routes())
        .merge(services::routes())
        .merge(appointments::routes())
        .merge(admin::routes())
        .with_state(state);

    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    // Applies to every route registered above, so it must come after the merges
    router
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
        .layer(CorsLayer::permissive())
}
