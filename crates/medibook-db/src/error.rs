//! Database error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Update for {0} has no fields")]
    EmptyUpdate(&'static str),

    #[error("Column {0} is not updatable")]
    UnknownColumn(&'static str),
}

impl DbError {
    /// Map a UNIQUE constraint violation to `Duplicate`, passing anything else through.
    pub(crate) fn from_insert(err: sqlx::Error, what: impl FnOnce() -> String) -> Self {
        match err.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => DbError::Duplicate(what()),
            _ => DbError::Connection(err),
        }
    }
}
