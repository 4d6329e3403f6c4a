//! Clinic operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{Clinic, NewClinic};
use crate::owned::OwnedResource;
use crate::repository::Database;

impl Database {
    /// Insert a clinic owned by `doctor_id`
    pub async fn insert_clinic(&self, doctor_id: i64, clinic: NewClinic) -> Result<Clinic, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO clinics (doctor_id, name, address, city, phone, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(doctor_id)
        .bind(&clinic.name)
        .bind(&clinic.address)
        .bind(&clinic.city)
        .bind(&clinic.phone)
        .bind(clinic.is_active)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = result.get("id");

        Ok(Clinic {
            id,
            doctor_id,
            name: clinic.name,
            address: clinic.address,
            city: clinic.city,
            phone: clinic.phone,
            is_active: clinic.is_active,
            created_at: now,
            updated_at: now,
        })
    }

    /// Active clinics of a doctor, for the public directory
    pub async fn list_active_clinics(&self, doctor_id: i64) -> Result<Vec<Clinic>, DbError> {
        let sql = format!(
            "SELECT {} FROM clinics WHERE doctor_id = ? AND is_active = 1 ORDER BY {}",
            Clinic::COLUMNS,
            Clinic::ORDER_BY
        );
        let rows = sqlx::query(&sql)
            .bind(doctor_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| Clinic::try_from(row).map_err(DbError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::repository::test_support::{memory_db, principal};

    #[tokio::test]
    async fn test_public_listing_hides_inactive_clinics() {
        let db = memory_db().await;
        let doctor = principal(&db, "doc@x.com", Role::Doctor).await;

        for (name, is_active) in [("Open", true), ("Closed", false)] {
            db.insert_clinic(
                doctor.id,
                NewClinic {
                    name: name.to_string(),
                    address: "2 Side St".to_string(),
                    city: "Ogdenville".to_string(),
                    phone: Some("555-0100".to_string()),
                    is_active,
                },
            )
            .await
            .unwrap();
        }

        let public = db.list_active_clinics(doctor.id).await.unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].name, "Open");
        assert_eq!(public[0].phone.as_deref(), Some("555-0100"));
    }
}
