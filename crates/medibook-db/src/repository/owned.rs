//! Generic owner-scoped operations

use chrono::Utc;
use tracing::debug;

use crate::error::DbError;
use crate::owned::OwnedResource;
use crate::repository::Database;
use crate::update::UpdateSet;

impl Database {
    /// List every row of `R` owned by `owner_id`
    pub async fn list_owned<R: OwnedResource>(&self, owner_id: i64) -> Result<Vec<R>, DbError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ? ORDER BY {}",
            R::COLUMNS,
            R::TABLE,
            R::OWNER_COLUMN,
            R::ORDER_BY
        );
        let rows = sqlx::query(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| R::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Get one row of `R`, only if `owner_id` owns it
    pub async fn get_owned<R: OwnedResource>(
        &self,
        id: i64,
        owner_id: i64,
    ) -> Result<Option<R>, DbError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ? AND {} = ?",
            R::COLUMNS,
            R::TABLE,
            R::OWNER_COLUMN
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;

        result
            .map(|row| R::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// Apply a partial update in one statement scoped by id and owner
    ///
    /// Returns the affected row count; zero means the row does not exist or
    /// belongs to someone else, and the two cases are indistinguishable.
    pub async fn update_owned<R: OwnedResource>(
        &self,
        id: i64,
        owner_id: i64,
        update: UpdateSet,
    ) -> Result<u64, DbError> {
        let mut qb = update.into_owned_update::<R>(id, owner_id, Utc::now().to_rfc3339())?;
        debug!("Owned update on {}: {}", R::TABLE, qb.sql());

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Delete in one statement scoped by id and owner, returning the affected row count
    pub async fn delete_owned<R: OwnedResource>(
        &self,
        id: i64,
        owner_id: i64,
    ) -> Result<u64, DbError> {
        let sql = format!(
            "DELETE FROM {} WHERE id = ? AND {} = ?",
            R::TABLE,
            R::OWNER_COLUMN
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Clinic, NewClinic, Role};
    use crate::repository::test_support::{memory_db, principal};

    fn clinic(name: &str) -> NewClinic {
        NewClinic {
            name: name.to_string(),
            address: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            phone: None,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_update_by_non_owner_affects_nothing() {
        let db = memory_db().await;
        let owner = principal(&db, "a@x.com", Role::Doctor).await;
        let other = principal(&db, "b@x.com", Role::Doctor).await;
        let created = db.insert_clinic(owner.id, clinic("North")).await.unwrap();

        let affected = db
            .update_owned::<Clinic>(created.id, other.id, UpdateSet::new().set("name", "Stolen"))
            .await
            .unwrap();
        assert_eq!(affected, 0);

        let unchanged = db.get_owned::<Clinic>(created.id, owner.id).await.unwrap().unwrap();
        assert_eq!(unchanged.name, "North");
    }

    #[tokio::test]
    async fn test_update_by_owner_touches_only_present_fields() {
        let db = memory_db().await;
        let owner = principal(&db, "a@x.com", Role::Doctor).await;
        let created = db.insert_clinic(owner.id, clinic("North")).await.unwrap();

        let update = UpdateSet::new()
            .set("city", "Shelbyville")
            .set("is_active", false);
        let affected = db.update_owned::<Clinic>(created.id, owner.id, update).await.unwrap();
        assert_eq!(affected, 1);

        let updated = db.get_owned::<Clinic>(created.id, owner.id).await.unwrap().unwrap();
        assert_eq!(updated.name, "North");
        assert_eq!(updated.city, "Shelbyville");
        assert!(!updated.is_active);
    }

    #[tokio::test]
    async fn test_delete_is_owner_scoped() {
        let db = memory_db().await;
        let owner = principal(&db, "a@x.com", Role::Doctor).await;
        let other = principal(&db, "b@x.com", Role::Doctor).await;
        let created = db.insert_clinic(owner.id, clinic("North")).await.unwrap();

        assert_eq!(db.delete_owned::<Clinic>(created.id, other.id).await.unwrap(), 0);
        assert_eq!(db.delete_owned::<Clinic>(created.id, owner.id).await.unwrap(), 1);
        assert_eq!(db.delete_owned::<Clinic>(created.id, owner.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_owned_returns_only_own_rows() {
        let db = memory_db().await;
        let a = principal(&db, "a@x.com", Role::Doctor).await;
        let b = principal(&db, "b@x.com", Role::Doctor).await;
        db.insert_clinic(a.id, clinic("Beta")).await.unwrap();
        db.insert_clinic(a.id, clinic("Alpha")).await.unwrap();
        db.insert_clinic(b.id, clinic("Gamma")).await.unwrap();

        let mine: Vec<Clinic> = db.list_owned(a.id).await.unwrap();
        let names: Vec<_> = mine.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Alpha", "Beta"]);
    }
}
