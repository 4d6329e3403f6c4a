//! Doctor-owned service routes

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, put},
};
use medibook_auth::RequireDoctor;
use medibook_db::{NewService, Service, UpdateSet};
use tracing::info;

use crate::error::ApiError;
use crate::response::{ApiJson, ApiPath, Envelope};
use crate::state::AppState;
use crate::validation::{MAX_NAME_LENGTH, MAX_TEXT_LENGTH, Validator, blank_to_none};

use super::owned;
use super::types::{CreateServiceRequest, UpdateServiceRequest};

/// Longest bookable service, in minutes
const MAX_DURATION_MINUTES: i64 = 24 * 60;

fn check_price(v: &mut Validator, price_cents: i64) {
    v.check(price_cents >= 0, "price_cents", "Must not be negative");
}

fn check_duration(v: &mut Validator, minutes: i64) {
    v.check(
        (1..=MAX_DURATION_MINUTES).contains(&minutes),
        "duration_minutes",
        format!("Must be between 1 and {}", MAX_DURATION_MINUTES),
    );
}

/// GET /api/v1/services
async fn list_services(
    doctor: RequireDoctor,
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<Service>>>, ApiError> {
    let services = state.db.list_owned::<Service>(doctor.user().id).await?;
    Ok(Envelope::ok("Services retrieved", services))
}

/// POST /api/v1/services
async fn create_service(
    doctor: RequireDoctor,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateServiceRequest>,
) -> Result<(StatusCode, Json<Envelope<Service>>), ApiError> {
    let description = blank_to_none(req.description);
    let mut v = Validator::new();
    v.text("name", &req.name, MAX_NAME_LENGTH)
        .optional_text("description", description.as_deref(), MAX_TEXT_LENGTH);
    check_price(&mut v, req.price_cents);
    check_duration(&mut v, req.duration_minutes);
    v.finish()?;

    let doctor_id = doctor.user().id;
    let service = state
        .db
        .insert_service(
            doctor_id,
            NewService {
                name: req.name.trim().to_string(),
                description,
                price_cents: req.price_cents,
                duration_minutes: req.duration_minutes,
                is_active: req.is_active.unwrap_or(true),
            },
        )
        .await?;

    info!("Doctor {} created service {}", doctor_id, service.id);
    Ok((StatusCode::CREATED, Envelope::ok("Service created", service)))
}

fn service_update(req: UpdateServiceRequest) -> Result<UpdateSet, ApiError> {
    let mut v = Validator::new();
    if let Some(name) = &req.name {
        v.text("name", name, MAX_NAME_LENGTH);
    }
    v.optional_text("description", req.description.as_deref(), MAX_TEXT_LENGTH);
    if let Some(price) = req.price_cents {
        check_price(&mut v, price);
    }
    if let Some(minutes) = req.duration_minutes {
        check_duration(&mut v, minutes);
    }
    v.finish()?;

    Ok(UpdateSet::new()
        .set_opt("name", req.name.map(|s| s.trim().to_string()))
        .set_opt("description", req.description.map(|d| blank_to_none(Some(d))))
        .set_opt("price_cents", req.price_cents)
        .set_opt("duration_minutes", req.duration_minutes)
        .set_opt("is_active", req.is_active))
}

/// PUT /api/v1/services/{id}
async fn update_service(
    doctor: RequireDoctor,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdateServiceRequest>,
) -> Result<Json<Envelope<Service>>, ApiError> {
    let update = service_update(req)?;
    let service = owned::update::<Service>(&state.db, id, doctor.user().id, update).await?;
    Ok(Envelope::ok("Service updated", service))
}

/// DELETE /api/v1/services/{id}
async fn delete_service(
    doctor: RequireDoctor,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Envelope<()>>, ApiError> {
    owned::delete::<Service>(&state.db, id, doctor.user().id).await?;
    Ok(Envelope::message("Service deleted"))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/services", get(list_services).post(create_service))
        .route("/api/v1/services/{id}", put(update_service).delete(delete_service))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_numbers_are_reported_together() {
        let err = service_update(UpdateServiceRequest {
            price_cents: Some(-1),
            duration_minutes: Some(0),
            ..Default::default()
        })
        .unwrap_err();

        match err {
            ApiError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_request_builds_empty_update() {
        assert!(service_update(UpdateServiceRequest::default()).unwrap().is_empty());
    }
}
