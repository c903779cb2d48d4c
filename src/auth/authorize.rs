//! Role and ownership checks.
//!
//! Roles live on the user row, not in the token, so every privileged
//! handler loads the caller before deciding. Admins pass ownership checks
//! for any resource.

use sqlx::PgPool;

use crate::domain::users::Role;
use crate::error::ApiError;

/// The caller as known to the platform (id plus stored role).
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Load the caller's row. Callers that have authenticated but never created
/// a profile are rejected with 404, matching the store-backed role lookup.
pub async fn load_current_user(db: &PgPool, user_id: &str) -> Result<CurrentUser, ApiError> {
    let role: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await?;

    let role = role.ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(CurrentUser {
        id: user_id.to_string(),
        role: Role::from_str(&role),
    })
}

/// Require that the caller holds one of the given roles.
pub fn ensure_role(current: &CurrentUser, roles: &[Role]) -> Result<(), ApiError> {
    if roles.contains(&current.role) {
        return Ok(());
    }

    Err(ApiError::forbidden("Insufficient permissions"))
}

/// Require that the caller owns the resource, or is an admin.
pub fn ensure_owner_or_admin(current: &CurrentUser, resource_user_id: &str) -> Result<(), ApiError> {
    if current.is_admin() || current.id == resource_user_id {
        return Ok(());
    }

    Err(ApiError::forbidden(
        "Access denied. You can only access your own resources.",
    ))
}

/// Owner-or-admin check that skips the role lookup for the owner case, so
/// callers writing their own not-yet-created profile aren't rejected.
pub async fn ensure_self_or_admin(
    db: &PgPool,
    auth_user_id: &str,
    resource_user_id: &str,
) -> Result<(), ApiError> {
    if auth_user_id == resource_user_id {
        return Ok(());
    }

    let current = load_current_user(db, auth_user_id).await?;
    ensure_owner_or_admin(&current, resource_user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, role: Role) -> CurrentUser {
        CurrentUser {
            id: id.to_string(),
            role,
        }
    }

    #[test]
    fn owner_passes_ownership_check() {
        assert!(ensure_owner_or_admin(&user("u1", Role::User), "u1").is_ok());
    }

    #[test]
    fn non_owner_is_rejected() {
        assert!(ensure_owner_or_admin(&user("u1", Role::Vendor), "u2").is_err());
    }

    #[test]
    fn admin_bypasses_ownership() {
        assert!(ensure_owner_or_admin(&user("root", Role::Admin), "u2").is_ok());
    }

    #[test]
    fn role_check_requires_membership() {
        assert!(ensure_role(&user("u1", Role::Vendor), &[Role::Admin]).is_err());
        assert!(ensure_role(&user("u1", Role::Vendor), &[Role::Admin, Role::Vendor]).is_ok());
    }
}
