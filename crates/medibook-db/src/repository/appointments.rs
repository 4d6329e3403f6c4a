//! Appointment request operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{Appointment, AppointmentStatus, NewAppointment};
use crate::owned::OwnedResource;
use crate::repository::Database;

impl Database {
    /// Record a new appointment request in `pending` state
    pub async fn insert_appointment(
        &self,
        appointment: NewAppointment,
    ) -> Result<Appointment, DbError> {
        let now = Utc::now();
        let status = AppointmentStatus::Pending;
        let result = sqlx::query(
            r#"
            INSERT INTO appointments (doctor_id, patient_id, service_id, patient_name, patient_email,
                                      patient_phone, preferred_at, message, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(appointment.doctor_id)
        .bind(appointment.patient_id)
        .bind(appointment.service_id)
        .bind(&appointment.patient_name)
        .bind(&appointment.patient_email)
        .bind(&appointment.patient_phone)
        .bind(appointment.preferred_at.to_rfc3339())
        .bind(&appointment.message)
        .bind(status.as_str())
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = result.get("id");

        Ok(Appointment {
            id,
            doctor_id: appointment.doctor_id,
            patient_id: appointment.patient_id,
            service_id: appointment.service_id,
            patient_name: appointment.patient_name,
            patient_email: appointment.patient_email,
            patient_phone: appointment.patient_phone,
            preferred_at: appointment.preferred_at,
            message: appointment.message,
            status,
            created_at: now,
            updated_at: now,
        })
    }

    /// Appointments a patient submitted while logged in
    pub async fn list_patient_appointments(
        &self,
        patient_id: i64,
    ) -> Result<Vec<Appointment>, DbError> {
        let sql = format!(
            "SELECT {} FROM appointments WHERE patient_id = ? ORDER BY {}",
            Appointment::COLUMNS,
            Appointment::ORDER_BY
        );
        let rows = sqlx::query(&sql)
            .bind(patient_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| Appointment::try_from(row).map_err(DbError::from))
            .collect()
    }
}
