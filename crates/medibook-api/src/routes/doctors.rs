//! Public doctor directory

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use medibook_db::Principal;

use crate::error::ApiError;
use crate::response::{ApiPath, Envelope};
use crate::state::AppState;

use super::types::{DoctorProfile, DoctorQuery};

/// GET /api/v1/doctors
async fn list_doctors(
    State(state): State<AppState>,
    Query(query): Query<DoctorQuery>,
) -> Result<Json<Envelope<Vec<Principal>>>, ApiError> {
    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let doctors = state.db.list_doctors(search).await?;
    Ok(Envelope::ok("Doctors retrieved", doctors))
}

/// GET /api/v1/doctors/{id}
async fn get_doctor(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Envelope<DoctorProfile>>, ApiError> {
    let doctor = state
        .db
        .find_doctor(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Doctor not found".to_string()))?;

    let clinics = state.db.list_active_clinics(doctor.id).await?;
    let services = state.db.list_active_services(doctor.id).await?;

    Ok(Envelope::ok(
        "Doctor retrieved",
        DoctorProfile {
            doctor,
            clinics,
            services,
        },
    ))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/doctors", get(list_doctors))
        .route("/api/v1/doctors/{id}", get(get_doctor))
}
