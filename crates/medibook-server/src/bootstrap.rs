//! First-run administrator account

use anyhow::{Result, bail};
use medibook_auth::PasswordService;
use medibook_db::{Database, NewPrincipal, Role};
use tracing::info;

use crate::config::BootstrapAdmin;

/// Create the configured administrator unless one already exists
///
/// Returns whether an account was created.
pub async fn ensure_admin(
    db: &Database,
    passwords: &PasswordService,
    admin: Option<&BootstrapAdmin>,
) -> Result<bool> {
    let Some(admin) = admin else {
        return Ok(false);
    };
    if db.has_admin().await? {
        return Ok(false);
    }
    if admin.password.len() < 8 {
        bail!("auth.bootstrap_admin.password must be at least 8 characters");
    }

    let email = admin.email.trim().to_lowercase();
    let password_hash = passwords.hash(&admin.password).await?;
    let principal = db
        .insert_principal(NewPrincipal {
            email,
            password_hash,
            name: "Administrator".to_string(),
            role: Role::Admin,
        })
        .await?;

    info!("Bootstrap administrator created ({})", principal.email);
    Ok(true)
}
