//! Partial update builder shared by every owned resource
//!
//! Handlers collect only the fields present in a request into an
//! [`UpdateSet`]; the repository turns it into one parameterized
//! `UPDATE ... WHERE id = ? AND <owner> = ?` statement.

use sqlx::{QueryBuilder, Sqlite};

use crate::error::DbError;
use crate::owned::OwnedResource;

/// A bindable column value
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(Option<String>),
    Integer(Option<i64>),
    Bool(bool),
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(Some(v))
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(Some(v.to_string()))
    }
}

impl From<Option<String>> for SqlValue {
    fn from(v: Option<String>) -> Self {
        SqlValue::Text(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(Some(v))
    }
}

impl From<Option<i64>> for SqlValue {
    fn from(v: Option<i64>) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

/// Ordered set of column assignments for a partial update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSet {
    fields: Vec<(&'static str, SqlValue)>,
}

impl UpdateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `column`, replacing an earlier assignment of the same column
    pub fn set(mut self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        let value = value.into();
        match self.fields.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((column, value)),
        }
        self
    }

    /// Assign `column` only when a value is present
    pub fn set_opt<V: Into<SqlValue>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(c, _)| *c)
    }

    /// Build `UPDATE <table> SET ..., updated_at = ? WHERE id = ? AND <owner> = ?`
    ///
    /// Every column must appear in `R::UPDATABLE`; column names are never
    /// taken from request input.
    pub(crate) fn into_owned_update<'a, R: OwnedResource>(
        self,
        id: i64,
        owner_id: i64,
        updated_at: String,
    ) -> Result<QueryBuilder<'a, Sqlite>, DbError> {
        if self.fields.is_empty() {
            return Err(DbError::EmptyUpdate(R::RESOURCE));
        }
        if let Some(column) = self.columns().find(|c| !R::UPDATABLE.contains(c)) {
            return Err(DbError::UnknownColumn(column));
        }

        let mut qb = QueryBuilder::new(format!("UPDATE {} SET ", R::TABLE));
        {
            let mut assignments = qb.separated(", ");
            for (column, value) in self.fields {
                assignments.push(format!("{column} = "));
                match value {
                    SqlValue::Text(v) => assignments.push_bind_unseparated(v),
                    SqlValue::Integer(v) => assignments.push_bind_unseparated(v),
                    SqlValue::Bool(v) => assignments.push_bind_unseparated(v),
                };
            }
            assignments.push("updated_at = ");
            assignments.push_bind_unseparated(updated_at);
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.push(format!(" AND {} = ", R::OWNER_COLUMN));
        qb.push_bind(owner_id);

        Ok(qb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Clinic;

    #[test]
    fn test_only_present_fields_are_emitted() {
        let set = UpdateSet::new()
            .set_opt("name", Some("North Clinic"))
            .set_opt::<String>("address", None)
            .set("phone", None::<String>);

        let qb = set
            .into_owned_update::<Clinic>(7, 3, "now".into())
            .unwrap();

        assert_eq!(
            qb.sql(),
            "UPDATE clinics SET name = ?, phone = ?, updated_at = ? WHERE id = ? AND doctor_id = ?"
        );
    }

    #[test]
    fn test_repeated_column_keeps_last_value() {
        let set = UpdateSet::new().set("name", "a").set("name", "b");
        assert_eq!(set.columns().count(), 1);
        assert_eq!(set.fields[0].1, SqlValue::Text(Some("b".to_string())));
    }

    #[test]
    fn test_empty_set_is_rejected() {
        let err = UpdateSet::new()
            .into_owned_update::<Clinic>(1, 1, "now".into())
            .err().unwrap();
        assert!(matches!(err, DbError::EmptyUpdate("clinic")));
    }

    #[test]
    fn test_column_outside_allow_list_is_rejected() {
        let err = UpdateSet::new()
            .set("doctor_id", 99_i64)
            .into_owned_update::<Clinic>(1, 1, "now".into())
            .err().unwrap();
        assert!(matches!(err, DbError::UnknownColumn("doctor_id")));
    }
}
