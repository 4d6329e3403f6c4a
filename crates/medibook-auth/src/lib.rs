//! MediBook Authentication and Authorization
//!
//! This crate provides password hashing, bearer token issuance and
//! verification, and the request extractors that gate the API by identity,
//! role, and resource ownership.

pub mod error;
pub mod gate;
pub mod jwt;
pub mod ownership;
pub mod password;

pub use error::{AuthError, TokenError, UnauthenticatedReason};
pub use gate::{
    AdminOnly, AuthUser, DoctorOnly, OptionalAuth, RequireAdmin, RequireAuth, RequireDoctor,
    RequireRole, RolePolicy,
};
pub use jwt::{Claims, DEFAULT_TOKEN_TTL_DAYS, TokenService};
pub use ownership::{ensure_owned, require_owned};
pub use password::{HashAlgorithm, PasswordPolicy, PasswordService, hash_password, verify_password};
