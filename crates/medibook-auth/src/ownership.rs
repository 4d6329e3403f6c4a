//! Outcome checks for owner-scoped statements

use tracing::debug;

use crate::error::AuthError;

/// Turn the affected-row count of an owner-scoped mutation into a result
///
/// Zero rows means the resource is missing or owned by someone else; both
/// are reported the same way.
pub fn ensure_owned(rows_affected: u64, resource: &'static str) -> Result<(), AuthError> {
    if rows_affected == 0 {
        debug!("Owner-scoped {} mutation matched no rows", resource);
        return Err(AuthError::NotFoundOrForbidden(resource));
    }
    Ok(())
}

/// Same as [`ensure_owned`] for owner-scoped lookups
pub fn require_owned<T>(found: Option<T>, resource: &'static str) -> Result<T, AuthError> {
    found.ok_or(AuthError::NotFoundOrForbidden(resource))
}
