//! Admin role management.
//!
//! Admins are ordinary accounts with the `admin` role; there is no separate
//! admin login. The user must have signed up on the storefront first.

use akf_core::{Email, UserRole};
use akf_storefront::db::UserRepository;

use super::{CommandError, connect};

async fn find_user(
    users: &UserRepository<'_>,
    email: &str,
) -> Result<akf_storefront::models::User, CommandError> {
    let email = Email::parse(email).map_err(|_| CommandError::InvalidEmail(email.to_owned()))?;
    users
        .get_by_email(&email)
        .await?
        .ok_or_else(|| CommandError::UnknownUser(email.to_string()))
}

/// Grant the admin role.
///
/// # Errors
///
/// Returns an error for an invalid or unknown email, or a database failure.
pub async fn grant(email: &str) -> Result<(), CommandError> {
    let pool = connect().await?;
    let users = UserRepository::new(&pool);
    let user = find_user(&users, email).await?;

    users.grant_role(user.id, UserRole::Admin).await?;
    tracing::info!(user_id = %user.id, "Admin role granted to {}", user.email);
    Ok(())
}

/// Revoke the admin role.
///
/// # Errors
///
/// Returns an error for an invalid or unknown email, or a database failure.
pub async fn revoke(email: &str) -> Result<(), CommandError> {
    let pool = connect().await?;
    let users = UserRepository::new(&pool);
    let user = find_user(&users, email).await?;

    if users.revoke_role(user.id, UserRole::Admin).await? {
        tracing::info!(user_id = %user.id, "Admin role revoked from {}", user.email);
    } else {
        tracing::warn!("{} was not an admin", user.email);
    }
    Ok(())
}
