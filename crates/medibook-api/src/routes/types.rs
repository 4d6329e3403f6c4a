//! Request/Response DTOs

use chrono::{DateTime, Utc};
use medibook_db::{AppointmentStatus, Clinic, Principal, Role, Service};
use serde::{Deserialize, Serialize};

// ==================== Auth Types ====================

/// Registration request
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    /// Defaults to the local part of the email
    pub name: Option<String>,
    /// `patient` when omitted
    pub role: Option<Role>,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Register/login response
#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub user: Principal,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

// ==================== Directory Types ====================

#[derive(Debug, Default, Deserialize)]
pub struct DoctorQuery {
    /// Case-insensitive substring of the doctor's name
    pub search: Option<String>,
}

/// Public doctor profile with what they currently offer
#[derive(Serialize)]
pub struct DoctorProfile {
    #[serde(flatten)]
    pub doctor: Principal,
    pub clinics: Vec<Clinic>,
    pub services: Vec<Service>,
}

// ==================== Clinic Types ====================

#[derive(Debug, Deserialize)]
pub struct CreateClinicRequest {
    pub name: String,
    pub address: String,
    pub city: String,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

/// Partial clinic update; an empty `phone` clears it
#[derive(Debug, Default, Deserialize)]
pub struct UpdateClinicRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

// ==================== Service Types ====================

#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub duration_minutes: i64,
    pub is_active: Option<bool>,
}

/// Partial service update; an empty `description` clears it
#[derive(Debug, Default, Deserialize)]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub duration_minutes: Option<i64>,
    pub is_active: Option<bool>,
}

// ==================== Appointment Types ====================

/// Appointment request; contact fields default to the logged-in patient
#[derive(Debug, Deserialize)]
pub struct CreateAppointmentRequest {
    pub doctor_id: i64,
    pub service_id: Option<i64>,
    pub patient_name: Option<String>,
    pub patient_email: Option<String>,
    pub patient_phone: Option<String>,
    pub preferred_at: DateTime<Utc>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAppointmentStatusRequest {
    pub status: AppointmentStatus,
}
