//! Doctor-owned clinic routes

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, put},
};
use medibook_auth::RequireDoctor;
use medibook_db::{Clinic, NewClinic, UpdateSet};
use tracing::info;

use crate::error::ApiError;
use crate::response::{ApiJson, ApiPath, Envelope};
use crate::state::AppState;
use crate::validation::{MAX_NAME_LENGTH, MAX_TEXT_LENGTH, Validator, blank_to_none};

use super::owned;
use super::types::{CreateClinicRequest, UpdateClinicRequest};

const MAX_PHONE_LENGTH: usize = 32;

/// GET /api/v1/clinics
async fn list_clinics(
    doctor: RequireDoctor,
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<Clinic>>>, ApiError> {
    let clinics = state.db.list_owned::<Clinic>(doctor.user().id).await?;
    Ok(Envelope::ok("Clinics retrieved", clinics))
}

/// POST /api/v1/clinics
async fn create_clinic(
    doctor: RequireDoctor,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateClinicRequest>,
) -> Result<(StatusCode, Json<Envelope<Clinic>>), ApiError> {
    let phone = blank_to_none(req.phone);
    Validator::new()
        .text("name", &req.name, MAX_NAME_LENGTH)
        .text("address", &req.address, MAX_TEXT_LENGTH)
        .text("city", &req.city, MAX_NAME_LENGTH)
        .optional_text("phone", phone.as_deref(), MAX_PHONE_LENGTH)
        .finish()?;

    let doctor_id = doctor.user().id;
    let clinic = state
        .db
        .insert_clinic(
            doctor_id,
            NewClinic {
                name: req.name.trim().to_string(),
                address: req.address.trim().to_string(),
                city: req.city.trim().to_string(),
                phone,
                is_active: req.is_active.unwrap_or(true),
            },
        )
        .await?;

    info!("Doctor {} created clinic {}", doctor_id, clinic.id);
    Ok((StatusCode::CREATED, Envelope::ok("Clinic created", clinic)))
}

fn clinic_update(req: UpdateClinicRequest) -> Result<UpdateSet, ApiError> {
    let mut v = Validator::new();
    if let Some(name) = &req.name {
        v.text("name", name, MAX_NAME_LENGTH);
    }
    if let Some(address) = &req.address {
        v.text("address", address, MAX_TEXT_LENGTH);
    }
    if let Some(city) = &req.city {
        v.text("city", city, MAX_NAME_LENGTH);
    }
    v.optional_text("phone", req.phone.as_deref(), MAX_PHONE_LENGTH);
    v.finish()?;

    Ok(UpdateSet::new()
        .set_opt("name", req.name.map(|s| s.trim().to_string()))
        .set_opt("address", req.address.map(|s| s.trim().to_string()))
        .set_opt("city", req.city.map(|s| s.trim().to_string()))
        .set_opt("phone", req.phone.map(|p| blank_to_none(Some(p))))
        .set_opt("is_active", req.is_active))
}

/// PUT /api/v1/clinics/{id}
async fn update_clinic(
    doctor: RequireDoctor,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdateClinicRequest>,
) -> Result<Json<Envelope<Clinic>>, ApiError> {
    let update = clinic_update(req)?;
    let clinic = owned::update::<Clinic>(&state.db, id, doctor.user().id, update).await?;
    Ok(Envelope::ok("Clinic updated", clinic))
}

/// DELETE /api/v1/clinics/{id}
async fn delete_clinic(
    doctor: RequireDoctor,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Envelope<()>>, ApiError> {
    owned::delete::<Clinic>(&state.db, id, doctor.user().id).await?;
    Ok(Envelope::message("Clinic deleted"))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/clinics", get(list_clinics).post(create_clinic))
        .route("/api/v1/clinics/{id}", put(update_clinic).delete(delete_clinic))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_present_fields_are_updated() {
        let update = clinic_update(UpdateClinicRequest {
            city: Some(" Shelbyville ".to_string()),
            phone: Some(String::new()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(update.columns().collect::<Vec<_>>(), vec!["city", "phone"]);
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let result = clinic_update(UpdateClinicRequest {
            name: Some("  ".to_string()),
            ..Default::default()
        });
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }
}
