//! Shared update/delete flow for doctor-owned resources

use medibook_auth::{ensure_owned, require_owned};
use medibook_db::{Database, OwnedResource, UpdateSet};
use tracing::info;

use crate::error::ApiError;
use crate::validation::FieldError;

/// Apply `update` if `owner_id` owns row `id`, returning the updated row
pub async fn update<R: OwnedResource>(
    db: &Database,
    id: i64,
    owner_id: i64,
    update: UpdateSet,
) -> Result<R, ApiError> {
    if update.is_empty() {
        return Err(ApiError::Validation(vec![FieldError::new(
            "body",
            "No fields to update",
        )]));
    }

    let affected = db.update_owned::<R>(id, owner_id, update).await?;
    ensure_owned(affected, R::RESOURCE)?;
    info!("Doctor {} updated {} {}", owner_id, R::RESOURCE, id);

    let row = db.get_owned::<R>(id, owner_id).await?;
    Ok(require_owned(row, R::RESOURCE)?)
}

/// Delete row `id` if `owner_id` owns it
pub async fn delete<R: OwnedResource>(db: &Database, id: i64, owner_id: i64) -> Result<(), ApiError> {
    let affected = db.delete_owned::<R>(id, owner_id).await?;
    ensure_owned(affected, R::RESOURCE)?;
    info!("Doctor {} deleted {} {}", owner_id, R::RESOURCE, id);
    Ok(())
}
