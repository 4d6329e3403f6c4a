//! Service operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{NewService, Service};
use crate::owned::OwnedResource;
use crate::repository::Database;

impl Database {
    /// Insert a service owned by `doctor_id`
    pub async fn insert_service(
        &self,
        doctor_id: i64,
        service: NewService,
    ) -> Result<Service, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO services (doctor_id, name, description, price_cents, duration_minutes,
                                  is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(doctor_id)
        .bind(&service.name)
        .bind(&service.description)
        .bind(service.price_cents)
        .bind(service.duration_minutes)
        .bind(service.is_active)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = result.get("id");

        Ok(Service {
            id,
            doctor_id,
            name: service.name,
            description: service.description,
            price_cents: service.price_cents,
            duration_minutes: service.duration_minutes,
            is_active: service.is_active,
            created_at: now,
            updated_at: now,
        })
    }

    /// Active services of a doctor, for the public directory
    pub async fn list_active_services(&self, doctor_id: i64) -> Result<Vec<Service>, DbError> {
        let sql = format!(
            "SELECT {} FROM services WHERE doctor_id = ? AND is_active = 1 ORDER BY {}",
            Service::COLUMNS,
            Service::ORDER_BY
        );
        let rows = sqlx::query(&sql)
            .bind(doctor_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| Service::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Get an active service by ID regardless of owner
    pub async fn find_active_service(&self, id: i64) -> Result<Option<Service>, DbError> {
        let sql = format!(
            "SELECT {} FROM services WHERE id = ? AND is_active = 1",
            Service::COLUMNS
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        result
            .map(|row| Service::try_from(&row).map_err(DbError::from))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::repository::test_support::{memory_db, principal};
    use crate::update::UpdateSet;

    fn consult(is_active: bool) -> NewService {
        NewService {
            name: "Consultation".to_string(),
            description: Some("30 minute consult".to_string()),
            price_cents: 4500,
            duration_minutes: 30,
            is_active,
        }
    }

    #[tokio::test]
    async fn test_deactivated_service_leaves_public_listing() {
        let db = memory_db().await;
        let doctor = principal(&db, "doc@x.com", Role::Doctor).await;
        let service = db.insert_service(doctor.id, consult(true)).await.unwrap();

        assert_eq!(db.list_active_services(doctor.id).await.unwrap().len(), 1);
        assert!(db.find_active_service(service.id).await.unwrap().is_some());

        let affected = db
            .update_owned::<Service>(service.id, doctor.id, UpdateSet::new().set("is_active", false))
            .await
            .unwrap();
        assert_eq!(affected, 1);

        assert!(db.list_active_services(doctor.id).await.unwrap().is_empty());
        assert!(db.find_active_service(service.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_nullable_description_can_be_cleared() {
        let db = memory_db().await;
        let doctor = principal(&db, "doc@x.com", Role::Doctor).await;
        let service = db.insert_service(doctor.id, consult(true)).await.unwrap();

        db.update_owned::<Service>(
            service.id,
            doctor.id,
            UpdateSet::new().set("description", None::<String>),
        )
        .await
        .unwrap();

        let reloaded = db
            .get_owned::<Service>(service.id, doctor.id)
            .await
            .unwrap()
            .unwrap();
        assert!(reloaded.description.is_none());
        assert_eq!(reloaded.price_cents, 4500);
    }
}
