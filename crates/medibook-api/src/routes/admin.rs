//! Administrator routes

use axum::{Json, Router, extract::State, routing::get};
use medibook_auth::RequireAdmin;
use medibook_db::Principal;
use tracing::debug;

use crate::error::ApiError;
use crate::response::Envelope;
use crate::state::AppState;

/// GET /api/v1/admin/principals
async fn list_principals(
    admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<Principal>>>, ApiError> {
    let principals = state.db.list_principals().await?;
    debug!("Admin {} listed {} principals", admin.user().id, principals.len());
    Ok(Envelope::ok("Principals retrieved", principals))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/v1/admin/principals", get(list_principals))
}
