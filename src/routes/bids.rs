//! Placement bid routes
//!
//! Vendors bid for recommendation placement in a category. Bidding is a
//! paid feature: tiers without bidding access get the upgrade payload.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::pagination::{Paginated, PaginationParams};
use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::auth::authorize::ensure_self_or_admin;
use crate::auth::RequireAuth;
use crate::domain::bids::{CreatePlacementBidRequest, PlacementBidResponse, PlacementBidStatus};
use crate::domain::subscriptions::{bidding_allowed, Tier};
use crate::error::ApiError;

/// Database row for a placement bid
#[derive(Debug, sqlx::FromRow)]
struct PlacementBidRow {
    id: Uuid,
    vendor_id: String,
    category_target: String,
    bid_amount: rust_decimal::Decimal,
    priority_slot: i32,
    max_spend: Option<rust_decimal::Decimal>,
    status: String,
    start_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

const BID_COLUMNS: &str =
    "id, vendor_id, category_target, bid_amount, priority_slot, max_spend, status, start_at, created_at";

impl From<PlacementBidRow> for PlacementBidResponse {
    fn from(row: PlacementBidRow) -> Self {
        Self {
            id: row.id,
            vendor_id: row.vendor_id,
            category_target: row.category_target,
            bid_amount: row.bid_amount.to_f64().unwrap_or(0.0),
            priority_slot: row.priority_slot,
            max_spend: row.max_spend.and_then(|m| m.to_f64()),
            status: PlacementBidStatus::from_str(&row.status),
            start_at: row.start_at,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BiddingTermsRow {
    role: String,
    tier: String,
    limits: Option<serde_json::Value>,
}

/// POST /vendors/:vendor_id/bids
///
/// Open a placement bid. Vendor-owned, and gated on the tier's bidding
/// access.
pub async fn create_bid(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(vendor_id): Path<String>,
    Json(req): Json<CreatePlacementBidRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_self_or_admin(&state.db, &auth.user_id, &vendor_id).await?;

    let terms = sqlx::query_as::<_, BiddingTermsRow>(
        "SELECT role, tier, limits FROM users WHERE id = $1",
    )
    .bind(&vendor_id)
    .fetch_optional(&state.db)
    .await?
    .filter(|t| t.role == "vendor")
    .ok_or_else(|| ApiError::not_found("Vendor not found"))?;

    let allowed = terms
        .limits
        .as_ref()
        .and_then(|l| l.get("bidding"))
        .and_then(|v| v.as_bool())
        .unwrap_or_else(|| bidding_allowed(Tier::from_str(&terms.tier)));

    if !allowed {
        return Err(ApiError::feature_locked(
            "Placement bidding requires a higher subscription tier",
        ));
    }

    let bid_amount = Decimal::from_f64_retain(req.bid_amount)
        .filter(|d| !d.is_sign_negative())
        .ok_or_else(|| ApiError::bad_request("Invalid bid amount"))?;
    let max_spend = req
        .max_spend
        .map(|m| {
            Decimal::from_f64_retain(m).ok_or_else(|| ApiError::bad_request("Invalid max spend"))
        })
        .transpose()?;

    let row = sqlx::query_as::<_, PlacementBidRow>(&format!(
        r#"
        INSERT INTO placement_bids (vendor_id, category_target, bid_amount, priority_slot, max_spend, status, start_at)
        VALUES ($1, $2, $3, $4, $5, 'active', NOW())
        RETURNING {}
        "#,
        BID_COLUMNS
    ))
    .bind(&vendor_id)
    .bind(&req.category_target)
    .bind(bid_amount)
    .bind(req.priority_slot.unwrap_or(1))
    .bind(max_spend)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(
        vendor_id = %vendor_id,
        bid_id = %row.id,
        category = %row.category_target,
        "Placement bid created"
    );

    let response: PlacementBidResponse = row.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(response))))
}

/// GET /vendors/:vendor_id/bids
///
/// A vendor's placement bids, newest first. Vendor-owned.
pub async fn list_vendor_bids(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(vendor_id): Path<String>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_self_or_admin(&state.db, &auth.user_id, &vendor_id).await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM placement_bids WHERE vendor_id = $1")
        .bind(&vendor_id)
        .fetch_one(&state.db)
        .await?;

    let rows = sqlx::query_as::<_, PlacementBidRow>(&format!(
        "SELECT {} FROM placement_bids WHERE vendor_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        BID_COLUMNS
    ))
    .bind(&vendor_id)
    .bind(pagination.limit() as i64)
    .bind(pagination.offset() as i64)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<PlacementBidResponse> = rows.into_iter().map(Into::into).collect();
    Ok(Json(Paginated::new(data, &pagination, total as u64)))
}
