//! Appointment request routes

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, put},
};
use chrono::Utc;
use medibook_auth::{AuthUser, OptionalAuth, RequireAuth, RequireDoctor};
use medibook_db::{Appointment, NewAppointment, Role, UpdateSet};
use tracing::info;

use crate::error::ApiError;
use crate::response::{ApiJson, ApiPath, Envelope};
use crate::state::AppState;
use crate::validation::{
    MAX_NAME_LENGTH, MAX_TEXT_LENGTH, Validator, blank_to_none, normalize_email,
};

use super::owned;
use super::types::{CreateAppointmentRequest, UpdateAppointmentStatusRequest};

/// Contact details from the request, falling back to the logged-in patient
async fn contact_details(
    state: &AppState,
    patient: Option<&AuthUser>,
    name: Option<String>,
    email: Option<String>,
) -> Result<(String, String), ApiError> {
    let name = blank_to_none(name);
    let email = blank_to_none(email).map(|e| normalize_email(&e));

    match (name, email, patient) {
        (Some(name), Some(email), _) => Ok((name, email)),
        (name, email, Some(patient)) => {
            let name = match name {
                Some(name) => name,
                None => state
                    .db
                    .find_principal_by_id(patient.id)
                    .await?
                    .map(|p| p.name)
                    .unwrap_or_default(),
            };
            Ok((name, email.unwrap_or_else(|| patient.email.clone())))
        }
        (name, email, None) => Ok((name.unwrap_or_default(), email.unwrap_or_default())),
    }
}

/// POST /api/v1/appointments
///
/// Open to anonymous visitors; a logged-in patient is linked to the request.
async fn create_appointment(
    OptionalAuth(user): OptionalAuth,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Envelope<Appointment>>), ApiError> {
    let patient = user.filter(|u| u.role == Role::Patient);
    let (patient_name, patient_email) =
        contact_details(&state, patient.as_ref(), req.patient_name, req.patient_email).await?;
    let patient_phone = blank_to_none(req.patient_phone);
    let message = blank_to_none(req.message);

    Validator::new()
        .text("patient_name", &patient_name, MAX_NAME_LENGTH)
        .email("patient_email", &patient_email)
        .optional_text("patient_phone", patient_phone.as_deref(), 32)
        .optional_text("message", message.as_deref(), MAX_TEXT_LENGTH)
        .check(
            req.preferred_at > Utc::now(),
            "preferred_at",
            "Must be in the future",
        )
        .finish()?;

    let doctor = state
        .db
        .find_doctor(req.doctor_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Doctor not found".to_string()))?;

    if let Some(service_id) = req.service_id {
        let offered = state
            .db
            .find_active_service(service_id)
            .await?
            .is_some_and(|s| s.doctor_id == doctor.id);
        if !offered {
            return Err(ApiError::invalid(
                "service_id",
                "Service is not offered by this doctor",
            ));
        }
    }

    let appointment = state
        .db
        .insert_appointment(NewAppointment {
            doctor_id: doctor.id,
            patient_id: patient.as_ref().map(|p| p.id),
            service_id: req.service_id,
            patient_name,
            patient_email,
            patient_phone,
            preferred_at: req.preferred_at,
            message,
        })
        .await?;

    info!(
        "Appointment {} requested with doctor {}",
        appointment.id, doctor.id
    );
    Ok((
        StatusCode::CREATED,
        Envelope::ok("Appointment requested", appointment),
    ))
}

/// GET /api/v1/appointments
async fn list_appointments(
    doctor: RequireDoctor,
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<Appointment>>>, ApiError> {
    let appointments = state.db.list_owned::<Appointment>(doctor.user().id).await?;
    Ok(Envelope::ok("Appointments retrieved", appointments))
}

/// GET /api/v1/appointments/mine
async fn my_appointments(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<Appointment>>>, ApiError> {
    let appointments = state.db.list_patient_appointments(user.id).await?;
    Ok(Envelope::ok("Appointments retrieved", appointments))
}

/// PUT /api/v1/appointments/{id}/status
async fn update_status(
    doctor: RequireDoctor,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdateAppointmentStatusRequest>,
) -> Result<Json<Envelope<Appointment>>, ApiError> {
    let update = UpdateSet::new().set("status", req.status.as_str());
    let appointment = owned::update::<Appointment>(&state.db, id, doctor.user().id, update).await?;
    Ok(Envelope::ok("Appointment status updated", appointment))
}

/// DELETE /api/v1/appointments/{id}
async fn delete_appointment(
    doctor: RequireDoctor,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Envelope<()>>, ApiError> {
    owned::delete::<Appointment>(&state.db, id, doctor.user().id).await?;
    Ok(Envelope::message("Appointment deleted"))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/appointments",
            get(list_appointments).post(create_appointment),
        )
        .route("/api/v1/appointments/mine", get(my_appointments))
        .route("/api/v1/appointments/{id}/status", put(update_status))
        .route("/api/v1/appointments/{id}", delete(delete_appointment))
}
