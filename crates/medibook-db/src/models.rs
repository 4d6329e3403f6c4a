//! Database models

use crate::utils::parse_datetime_or_now;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use std::fmt;
use std::str::FromStr;

/// Error type for parsing models from strings
#[derive(Debug, Clone)]
pub enum ParseError {
    InvalidRole(String),
    InvalidAppointmentStatus(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidRole(s) => write!(f, "Invalid role: {}", s),
            ParseError::InvalidAppointmentStatus(s) => {
                write!(f, "Invalid appointment status: {}", s)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Principal role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient" => Ok(Role::Patient),
            "doctor" => Ok(Role::Doctor),
            "admin" => Ok(Role::Admin),
            _ => Err(ParseError::InvalidRole(s.to_string())),
        }
    }
}

/// A registered identity with its credential
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New principal (for insertion)
#[derive(Debug, Clone)]
pub struct NewPrincipal {
    /// Must already be lowercased by the caller
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
}

/// Clinic owned by a doctor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clinic {
    pub id: i64,
    pub doctor_id: i64,
    pub name: String,
    pub address: String,
    pub city: String,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New clinic (for insertion)
#[derive(Debug, Clone)]
pub struct NewClinic {
    pub name: String,
    pub address: String,
    pub city: String,
    pub phone: Option<String>,
    pub is_active: bool,
}

/// Bookable service offered by a doctor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub doctor_id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Price in minor currency units
    pub price_cents: i64,
    pub duration_minutes: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New service (for insertion)
#[derive(Debug, Clone)]
pub struct NewService {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub duration_minutes: i64,
    pub is_active: bool,
}

/// Appointment request lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "completed" => Ok(AppointmentStatus::Completed),
            _ => Err(ParseError::InvalidAppointmentStatus(s.to_string())),
        }
    }
}

/// Appointment request addressed to a doctor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub doctor_id: i64,
    /// Set when the request was submitted by a logged-in patient
    pub patient_id: Option<i64>,
    pub service_id: Option<i64>,
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: Option<String>,
    pub preferred_at: DateTime<Utc>,
    pub message: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New appointment request (for insertion)
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub doctor_id: i64,
    pub patient_id: Option<i64>,
    pub service_id: Option<i64>,
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: Option<String>,
    pub preferred_at: DateTime<Utc>,
    pub message: Option<String>,
}

// ==================== TryFrom Implementations ====================

fn decode_err(e: ParseError) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(e))
}

impl TryFrom<&SqliteRow> for Principal {
    type Error = sqlx::Error;

    fn try_from(row: &SqliteRow) -> Result<Self, Self::Error> {
        let role: String = row.try_get("role")?;
        Ok(Principal {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            name: row.try_get("name")?,
            role: Role::from_str(&role).map_err(decode_err)?,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

impl TryFrom<&SqliteRow> for Clinic {
    type Error = sqlx::Error;

    fn try_from(row: &SqliteRow) -> Result<Self, Self::Error> {
        Ok(Clinic {
            id: row.try_get("id")?,
            doctor_id: row.try_get("doctor_id")?,
            name: row.try_get("name")?,
            address: row.try_get("address")?,
            city: row.try_get("city")?,
            phone: row.try_get("phone")?,
            is_active: row.try_get("is_active")?,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

impl TryFrom<&SqliteRow> for Service {
    type Error = sqlx::Error;

    fn try_from(row: &SqliteRow) -> Result<Self, Self::Error> {
        Ok(Service {
            id: row.try_get("id")?,
            doctor_id: row.try_get("doctor_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price_cents: row.try_get("price_cents")?,
            duration_minutes: row.try_get("duration_minutes")?,
            is_active: row.try_get("is_active")?,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

impl TryFrom<&SqliteRow> for Appointment {
    type Error = sqlx::Error;

    fn try_from(row: &SqliteRow) -> Result<Self, Self::Error> {
        let status: String = row.try_get("status")?;
        Ok(Appointment {
            id: row.try_get("id")?,
            doctor_id: row.try_get("doctor_id")?,
            patient_id: row.try_get("patient_id")?,
            service_id: row.try_get("service_id")?,
            patient_name: row.try_get("patient_name")?,
            patient_email: row.try_get("patient_email")?,
            patient_phone: row.try_get("patient_phone")?,
            preferred_at: parse_datetime_or_now(&row.try_get::<String, _>("preferred_at")?),
            message: row.try_get("message")?,
            status: AppointmentStatus::from_str(&status).map_err(decode_err)?,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}
