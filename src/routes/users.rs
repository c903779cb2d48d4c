//! User profile routes
//!
//! Profile reads are cached in Redis; writes upsert (the first profile
//! write after signup creates the row) and invalidate the cache. Account
//! deletion cascades through everything keyed to the user.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;

use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::auth::authorize::ensure_self_or_admin;
use crate::auth::RequireAuth;
use crate::domain::users::{Role, UpdateProfileRequest, UserProfile, VendorStatus};
use crate::error::ApiError;
use crate::services::cache::{keys as cache_keys, ttl as cache_ttl};

pub(crate) const USER_COLUMNS: &str = "id, email, full_name, phone, location, role, status, \
     company_name, contact_person, address, tax_id, tier, preferences, created_at, updated_at";

/// Database row for a user/vendor
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRow {
    pub id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub role: String,
    pub status: Option<String>,
    pub company_name: Option<String>,
    pub contact_person: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
    pub tier: String,
    pub preferences: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            phone: row.phone,
            location: row.location,
            role: Role::from_str(&row.role),
            status: row.status.as_deref().and_then(VendorStatus::from_str),
            company_name: row.company_name,
            contact_person: row.contact_person,
            address: row.address,
            tax_id: row.tax_id,
            tier: row.tier,
            preferences: row.preferences,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// GET /users/:user_id
///
/// Profile read, owner or admin. Served from Redis when warm.
pub async fn get_profile(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_self_or_admin(&state.db, &auth.user_id, &user_id).await?;

    let cache_key = cache_keys::profile(&user_id);
    if let Some(cached) = state.cache.get::<UserProfile>(&cache_key).await {
        return Ok(Json(DataResponse::new(cached)));
    }

    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {} FROM users WHERE id = $1",
        USER_COLUMNS
    ))
    .bind(&user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("User not found"))?;

    let profile: UserProfile = row.into();

    let _ = state
        .cache
        .set_with_ttl(&cache_key, &profile, cache_ttl::PROFILE)
        .await;

    Ok(Json(DataResponse::new(profile)))
}

/// PUT /users/:user_id
///
/// Merge-style profile update, owner or admin. The row is created on first
/// write. Selecting the vendor role puts the account into the pending
/// approval queue.
pub async fn update_profile(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_self_or_admin(&state.db, &auth.user_id, &user_id).await?;

    let role = req.role.map(|r| r.as_str());

    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        INSERT INTO users (id, email, full_name, phone, location, role, status, company_name, tax_id, preferences)
        VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'user'),
                CASE WHEN $6 = 'vendor' THEN 'pending' END,
                $7, $8, $9)
        ON CONFLICT (id) DO UPDATE SET
            email = COALESCE(users.email, $2),
            full_name = COALESCE($3, users.full_name),
            phone = COALESCE($4, users.phone),
            location = COALESCE($5, users.location),
            role = COALESCE($6, users.role),
            status = CASE WHEN $6 = 'vendor' THEN 'pending' ELSE users.status END,
            company_name = COALESCE($7, users.company_name),
            tax_id = COALESCE($8, users.tax_id),
            preferences = COALESCE($9, users.preferences),
            updated_at = NOW()
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(&user_id)
    .bind(&auth.email)
    .bind(&req.full_name)
    .bind(&req.phone)
    .bind(&req.location)
    .bind(role)
    .bind(&req.company_name)
    .bind(&req.tax_id)
    .bind(&req.preferences)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(user_id = %user_id, role = ?role, "Profile updated");

    let profile: UserProfile = row.into();

    let cache_key = cache_keys::profile(&user_id);
    let _ = state.cache.delete(&cache_key).await;
    let _ = state
        .cache
        .set_with_ttl(&cache_key, &profile, cache_ttl::PROFILE)
        .await;

    Ok(Json(DataResponse::new(profile)))
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserResponse {
    pub message: String,
    pub user_id: String,
}

/// DELETE /users/:user_id
///
/// Cascade delete of the account and everything keyed to it, owner or
/// admin. Identity-provider cleanup is best-effort: a failure there is
/// logged and the platform-side deletion stands.
pub async fn delete_user(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_self_or_admin(&state.db, &auth.user_id, &user_id).await?;

    tracing::info!(user_id = %user_id, "Starting account deletion");

    let role: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
        .bind(&user_id)
        .fetch_optional(&state.db)
        .await?;

    if role.as_deref() == Some("vendor") {
        let results = join_all([
            sqlx::query("DELETE FROM products WHERE vendor_id = $1")
                .bind(&user_id)
                .execute(&state.db),
            sqlx::query("DELETE FROM placement_bids WHERE vendor_id = $1")
                .bind(&user_id)
                .execute(&state.db),
            sqlx::query("DELETE FROM leads WHERE vendor_id = $1")
                .bind(&user_id)
                .execute(&state.db),
        ])
        .await;

        for result in results {
            let outcome = result?;
            tracing::debug!(rows = outcome.rows_affected(), "Vendor data removed");
        }
    }

    let results = join_all([
        sqlx::query("DELETE FROM saved_quotes WHERE user_id = $1")
            .bind(&user_id)
            .execute(&state.db),
        sqlx::query("DELETE FROM leads WHERE user_id = $1")
            .bind(&user_id)
            .execute(&state.db),
        sqlx::query("DELETE FROM payments WHERE user_id = $1")
            .bind(&user_id)
            .execute(&state.db),
    ])
    .await;

    for result in results {
        let outcome = result?;
        tracing::debug!(rows = outcome.rows_affected(), "User data removed");
    }

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(&user_id)
        .execute(&state.db)
        .await?;

    // Best-effort deletion at the identity provider; log and continue
    if let (Some(mgmt_url), Some(mgmt_token)) = (
        &state.settings.auth_mgmt_url,
        &state.settings.auth_mgmt_token,
    ) {
        let endpoint = format!("{}/users/{}", mgmt_url.trim_end_matches('/'), user_id);
        match state
            .http_client
            .delete(&endpoint)
            .bearer_auth(mgmt_token)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!(user_id = %user_id, "Identity provider record deleted");
            }
            Ok(resp) => {
                tracing::warn!(user_id = %user_id, status = %resp.status(), "Identity provider deletion failed");
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Identity provider deletion failed");
            }
        }
    }

    let _ = state
        .cache
        .delete_pattern(&cache_keys::user_pattern(&user_id))
        .await;

    tracing::info!(user_id = %user_id, "Account and associated data deleted");

    Ok(Json(DeleteUserResponse {
        message: "User account and all associated data deleted successfully".to_string(),
        user_id,
    }))
}
