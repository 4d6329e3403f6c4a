//! MediBook Database Layer
//!
//! This crate provides the credential store and the owner-scoped resource
//! store for MediBook, using SQLite via sqlx for persistence.

pub mod error;
pub mod models;
pub mod owned;
pub mod repository;
pub mod update;
pub mod utils;

pub use error::DbError;
pub use models::*;
pub use owned::OwnedResource;
pub use repository::Database;
pub use update::{SqlValue, UpdateSet};

/// Re-export sqlx types for convenience
pub use sqlx::SqlitePool;
