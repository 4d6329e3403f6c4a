//! Owner-scoped resources
//!
//! A resource implementing [`OwnedResource`] carries an owner column. Every
//! mutation of it goes through `Database::update_owned` /
//! `Database::delete_owned`, which constrain the statement by both primary
//! key and owner so the ownership check is atomic with the write.

use sqlx::sqlite::SqliteRow;

use crate::models::{Appointment, Clinic, Service};

pub trait OwnedResource:
    for<'r> TryFrom<&'r SqliteRow, Error = sqlx::Error> + Send + Unpin + 'static
{
    /// Singular name used in error messages
    const RESOURCE: &'static str;
    const TABLE: &'static str;
    const OWNER_COLUMN: &'static str;
    /// Select list for reads
    const COLUMNS: &'static str;
    /// Columns a partial update may touch
    const UPDATABLE: &'static [&'static str];
    const ORDER_BY: &'static str;
}

impl OwnedResource for Clinic {
    const RESOURCE: &'static str = "clinic";
    const TABLE: &'static str = "clinics";
    const OWNER_COLUMN: &'static str = "doctor_id";
    const COLUMNS: &'static str =
        "id, doctor_id, name, address, city, phone, is_active, created_at, updated_at";
    const UPDATABLE: &'static [&'static str] = &["name", "address", "city", "phone", "is_active"];
    const ORDER_BY: &'static str = "name ASC";
}

impl OwnedResource for Service {
    const RESOURCE: &'static str = "service";
    const TABLE: &'static str = "services";
    const OWNER_COLUMN: &'static str = "doctor_id";
    const COLUMNS: &'static str = "id, doctor_id, name, description, price_cents, \
         duration_minutes, is_active, created_at, updated_at";
    const UPDATABLE: &'static [&'static str] = &[
        "name",
        "description",
        "price_cents",
        "duration_minutes",
        "is_active",
    ];
    const ORDER_BY: &'static str = "name ASC";
}

impl OwnedResource for Appointment {
    const RESOURCE: &'static str = "appointment";
    const TABLE: &'static str = "appointments";
    const OWNER_COLUMN: &'static str = "doctor_id";
    const COLUMNS: &'static str = "id, doctor_id, patient_id, service_id, patient_name, \
         patient_email, patient_phone, preferred_at, message, status, created_at, updated_at";
    const UPDATABLE: &'static [&'static str] = &["status"];
    const ORDER_BY: &'static str = "preferred_at ASC";
}
