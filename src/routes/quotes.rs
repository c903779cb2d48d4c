//! Saved quote routes
//!
//! Consumers keep quotes they like, bounded by the tier save quota. Reads
//! attach the vendor's contact details so the client can follow up.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::{DataResponse, MessageResponse};
use crate::app::AppState;
use crate::auth::authorize::{ensure_owner_or_admin, ensure_self_or_admin, load_current_user};
use crate::auth::RequireAuth;
use crate::domain::quotes::{SaveQuoteRequest, SavedQuoteResponse};
use crate::domain::subscriptions::{save_quota, Tier};
use crate::error::ApiError;

/// Database row for a saved quote
#[derive(Debug, sqlx::FromRow)]
struct SavedQuoteRow {
    id: Uuid,
    user_id: String,
    vendor_id: Option<String>,
    product_id: Option<Uuid>,
    quote: serde_json::Value,
    saved_at: DateTime<Utc>,
}

const QUOTE_COLUMNS: &str = "id, user_id, vendor_id, product_id, quote, saved_at";

#[derive(Debug, sqlx::FromRow)]
struct SaverTermsRow {
    tier: String,
    limits: Option<serde_json::Value>,
}

#[derive(Debug, sqlx::FromRow)]
struct VendorContactRow {
    id: String,
    email: Option<String>,
    phone: Option<String>,
    company_name: Option<String>,
    full_name: Option<String>,
}

fn quote_response(row: SavedQuoteRow, contact: Option<&VendorContactRow>) -> SavedQuoteResponse {
    SavedQuoteResponse {
        id: row.id,
        user_id: row.user_id,
        vendor_id: row.vendor_id,
        product_id: row.product_id,
        quote: row.quote,
        saved_at: row.saved_at,
        vendor_email: contact.and_then(|c| c.email.clone()),
        vendor_phone: contact.and_then(|c| c.phone.clone()),
        vendor_company_name: contact.map(|c| {
            c.company_name
                .clone()
                .or_else(|| c.full_name.clone())
                .unwrap_or_else(|| "Unknown Vendor".to_string())
        }),
    }
}

/// POST /users/:user_id/quotes
///
/// Save a quote, owner or admin. Counts existing saves against the tier
/// quota; over quota yields 403 with the upgrade payload.
pub async fn save_quote(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(req): Json<SaveQuoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_self_or_admin(&state.db, &auth.user_id, &user_id).await?;

    let terms = sqlx::query_as::<_, SaverTermsRow>("SELECT tier, limits FROM users WHERE id = $1")
        .bind(&user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let quota = terms
        .limits
        .as_ref()
        .and_then(|l| l.get("save"))
        .and_then(|v| v.as_i64())
        .unwrap_or_else(|| save_quota(Tier::from_str(&terms.tier)));

    let current: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM saved_quotes WHERE user_id = $1")
        .bind(&user_id)
        .fetch_one(&state.db)
        .await?;

    if current >= quota {
        return Err(ApiError::upgrade_required(
            "Saved quote limit reached",
            quota,
            current,
        ));
    }

    let row = sqlx::query_as::<_, SavedQuoteRow>(&format!(
        r#"
        INSERT INTO saved_quotes (user_id, vendor_id, product_id, quote)
        VALUES ($1, $2, $3, $4)
        RETURNING {}
        "#,
        QUOTE_COLUMNS
    ))
    .bind(&user_id)
    .bind(&req.vendor_id)
    .bind(req.product_id)
    .bind(&req.quote)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(user_id = %user_id, quote_id = %row.id, "Quote saved");

    let response = quote_response(row, None);
    Ok((StatusCode::CREATED, Json(DataResponse::new(response))))
}

/// GET /users/:user_id/quotes
///
/// A consumer's saved quotes with vendor contact details, newest first.
pub async fn list_saved_quotes(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_self_or_admin(&state.db, &auth.user_id, &user_id).await?;

    let rows = sqlx::query_as::<_, SavedQuoteRow>(&format!(
        "SELECT {} FROM saved_quotes WHERE user_id = $1 ORDER BY saved_at DESC",
        QUOTE_COLUMNS
    ))
    .bind(&user_id)
    .fetch_all(&state.db)
    .await?;

    // One contact lookup across all referenced vendors
    let vendor_ids: Vec<String> = {
        let mut ids: Vec<String> = rows.iter().filter_map(|r| r.vendor_id.clone()).collect();
        ids.sort();
        ids.dedup();
        ids
    };

    let contacts: HashMap<String, VendorContactRow> = if vendor_ids.is_empty() {
        HashMap::new()
    } else {
        sqlx::query_as::<_, VendorContactRow>(
            "SELECT id, email, phone, company_name, full_name FROM users WHERE id = ANY($1)",
        )
        .bind(&vendor_ids)
        .fetch_all(&state.db)
        .await?
        .into_iter()
        .map(|c| (c.id.clone(), c))
        .collect()
    };

    let quotes: Vec<SavedQuoteResponse> = rows
        .into_iter()
        .map(|row| {
            let contact = row.vendor_id.as_ref().and_then(|id| contacts.get(id));
            quote_response(row, contact)
        })
        .collect();

    Ok(Json(DataResponse::new(quotes)))
}

/// DELETE /quotes/:quote_id
///
/// Delete a saved quote, quote owner or admin.
pub async fn delete_quote(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(quote_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let owner: Option<String> =
        sqlx::query_scalar("SELECT user_id FROM saved_quotes WHERE id = $1")
            .bind(quote_id)
            .fetch_optional(&state.db)
            .await?;

    let owner = owner.ok_or_else(|| ApiError::not_found("Quote not found"))?;

    if owner != auth.user_id {
        let current = load_current_user(&state.db, &auth.user_id).await?;
        ensure_owner_or_admin(&current, &owner)?;
    }

    sqlx::query("DELETE FROM saved_quotes WHERE id = $1")
        .bind(quote_id)
        .execute(&state.db)
        .await?;

    tracing::info!(quote_id = %quote_id, "Quote deleted");

    Ok(Json(MessageResponse::new("Quote deleted successfully")))
}
