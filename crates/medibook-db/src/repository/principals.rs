//! Principal (credential store) operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{NewPrincipal, Principal, Role};
use crate::repository::Database;

const PRINCIPAL_COLUMNS: &str = "id, email, password_hash, name, role, created_at, updated_at";

impl Database {
    // ==================== Principal Operations ====================

    /// Insert a new principal
    ///
    /// Email uniqueness is enforced by the UNIQUE constraint; a collision
    /// surfaces as [`DbError::Duplicate`].
    pub async fn insert_principal(&self, principal: NewPrincipal) -> Result<Principal, DbError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO principals (email, password_hash, name, role, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&principal.email)
        .bind(&principal.password_hash)
        .bind(&principal.name)
        .bind(principal.role.as_str())
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            DbError::from_insert(e, || format!("Email '{}' is already registered", principal.email))
        })?;

        let id: i64 = result.get("id");

        Ok(Principal {
            id,
            email: principal.email,
            password_hash: principal.password_hash,
            name: principal.name,
            role: principal.role,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a principal by (already lowercased) email
    pub async fn find_principal_by_email(&self, email: &str) -> Result<Option<Principal>, DbError> {
        let result = sqlx::query(&format!(
            "SELECT {PRINCIPAL_COLUMNS} FROM principals WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| Principal::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// Get a principal by ID
    pub async fn find_principal_by_id(&self, id: i64) -> Result<Option<Principal>, DbError> {
        let result = sqlx::query(&format!(
            "SELECT {PRINCIPAL_COLUMNS} FROM principals WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| Principal::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// List all principals
    pub async fn list_principals(&self) -> Result<Vec<Principal>, DbError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRINCIPAL_COLUMNS} FROM principals ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Principal::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Public doctor directory, optionally filtered by a name fragment
    pub async fn list_doctors(&self, search: Option<&str>) -> Result<Vec<Principal>, DbError> {
        let pattern = search.map(|s| format!("%{}%", escape_like(&s.to_lowercase())));
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PRINCIPAL_COLUMNS} FROM principals
            WHERE role = ? AND (? IS NULL OR lower(name) LIKE ? ESCAPE '\')
            ORDER BY name
            "#
        ))
        .bind(Role::Doctor.as_str())
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Principal::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Get a doctor's public profile
    pub async fn find_doctor(&self, id: i64) -> Result<Option<Principal>, DbError> {
        Ok(self
            .find_principal_by_id(id)
            .await?
            .filter(|p| p.role == Role::Doctor))
    }

    /// Update a principal's password hash, returning the affected row count
    pub async fn update_principal_password(
        &self,
        id: i64,
        password_hash: &str,
    ) -> Result<u64, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE principals
            SET password_hash = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(password_hash)
        .bind(now.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Update a principal's display name, returning the affected row count
    pub async fn update_principal_name(&self, id: i64, name: &str) -> Result<u64, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE principals
            SET name = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(name)
        .bind(now.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Check if any admin exists
    pub async fn has_admin(&self) -> Result<bool, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM principals WHERE role = ?")
            .bind(Role::Admin.as_str())
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = result.get("count");
        Ok(count > 0)
    }
}

/// Match `%`, `_` and `\` literally inside a `LIKE ... ESCAPE '\'` pattern
fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
