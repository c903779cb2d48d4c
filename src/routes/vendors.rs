//! Vendor routes
//!
//! Vendor onboarding and self-service profile lookup. Applications land in
//! the pending queue until an admin approves them.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::users::{UserProfile, VendorApplicationRequest};
use crate::error::ApiError;
use crate::services::cache::keys as cache_keys;

use super::users::{UserRow, USER_COLUMNS};

/// POST /vendors
///
/// Apply to list products on the marketplace. Sets the vendor role and
/// company details on the caller's row and queues it for approval. Admin
/// notification delivery is out-of-band; the application itself is the
/// record.
pub async fn apply_as_vendor(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<VendorApplicationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.company_name.trim().is_empty() {
        return Err(ApiError::bad_request("Company name is required"));
    }

    let email = req.email.clone().or_else(|| auth.email.clone());

    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        INSERT INTO users (id, email, phone, role, status, company_name, contact_person, address)
        VALUES ($1, $2, $3, 'vendor', 'pending', $4, $5, $6)
        ON CONFLICT (id) DO UPDATE SET
            email = COALESCE(users.email, $2),
            phone = COALESCE($3, users.phone),
            role = 'vendor',
            status = 'pending',
            company_name = $4,
            contact_person = COALESCE($5, users.contact_person),
            address = COALESCE($6, users.address),
            updated_at = NOW()
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(&auth.user_id)
    .bind(&email)
    .bind(&req.phone)
    .bind(&req.company_name)
    .bind(&req.contact_person)
    .bind(&req.address)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(
        user_id = %auth.user_id,
        company_name = %req.company_name,
        "Vendor application submitted"
    );

    let _ = state
        .cache
        .delete(&cache_keys::profile(&auth.user_id))
        .await;

    let profile: UserProfile = row.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(profile))))
}

/// GET /vendors/me
///
/// The caller's vendor profile, or 404 if they never applied.
pub async fn get_vendor_profile(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {} FROM users WHERE id = $1 AND role = 'vendor'",
        USER_COLUMNS
    ))
    .bind(&auth.user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Vendor profile not found"))?;

    let profile: UserProfile = row.into();
    Ok(Json(DataResponse::new(profile)))
}
