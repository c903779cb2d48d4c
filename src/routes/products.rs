//! Product routes
//!
//! Vendor product listings, gated by the vendor's tier quota. A product
//! may only go active while its owning vendor is approved.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::auth::authorize::ensure_self_or_admin;
use crate::auth::RequireAuth;
use crate::domain::products::{CreateProductRequest, ProductResponse, ProductStatus};
use crate::domain::subscriptions::{product_quota, Tier};
use crate::error::ApiError;

/// Database row for a product
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    pub id: Uuid,
    pub vendor_id: String,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub premium: rust_decimal::Decimal,
    pub currency: String,
    pub coverage_amount: Option<rust_decimal::Decimal>,
    pub requirements: Vec<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) const PRODUCT_COLUMNS: &str = "id, vendor_id, name, category, description, premium, \
     currency, coverage_amount, requirements, status, created_at, updated_at";

impl From<ProductRow> for ProductResponse {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            vendor_id: row.vendor_id,
            name: row.name,
            category: row.category,
            description: row.description,
            premium: row.premium.to_f64().unwrap_or(0.0),
            currency: row.currency,
            coverage_amount: row.coverage_amount.and_then(|c| c.to_f64()),
            requirements: row.requirements,
            status: ProductStatus::from_str(&row.status),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Subscription terms looked up when enforcing the product quota
#[derive(Debug, sqlx::FromRow)]
struct VendorTermsRow {
    role: String,
    status: Option<String>,
    tier: String,
    limits: Option<serde_json::Value>,
}

/// POST /vendors/:vendor_id/products
///
/// Create a product for a vendor. Counts existing products against the
/// tier quota; over quota yields 403 with the upgrade payload.
pub async fn create_product(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(vendor_id): Path<String>,
    Json(req): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_self_or_admin(&state.db, &auth.user_id, &vendor_id).await?;

    let terms = sqlx::query_as::<_, VendorTermsRow>(
        "SELECT role, status, tier, limits FROM users WHERE id = $1",
    )
    .bind(&vendor_id)
    .fetch_optional(&state.db)
    .await?
    .filter(|t| t.role == "vendor")
    .ok_or_else(|| ApiError::not_found("Vendor not found"))?;

    // Stored limits (written by the billing webhook) win over the table
    let quota = terms
        .limits
        .as_ref()
        .and_then(|l| l.get("products"))
        .and_then(|v| v.as_i64())
        .unwrap_or_else(|| product_quota(Tier::from_str(&terms.tier)));

    let current: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE vendor_id = $1")
        .bind(&vendor_id)
        .fetch_one(&state.db)
        .await?;

    if current >= quota {
        return Err(ApiError::upgrade_required(
            "Product limit reached",
            quota,
            current,
        ));
    }

    // A product may only be active while its owning vendor is approved
    if req.status == ProductStatus::Active && terms.status.as_deref() != Some("approved") {
        return Err(ApiError::forbidden(
            "Products can only be activated once the vendor is approved",
        ));
    }

    let premium = Decimal::from_f64_retain(req.premium)
        .ok_or_else(|| ApiError::bad_request("Invalid premium amount"))?;
    let coverage = req
        .coverage_amount
        .map(|c| {
            Decimal::from_f64_retain(c)
                .ok_or_else(|| ApiError::bad_request("Invalid coverage amount"))
        })
        .transpose()?;

    let row = sqlx::query_as::<_, ProductRow>(&format!(
        r#"
        INSERT INTO products (vendor_id, name, category, description, premium, currency, coverage_amount, requirements, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {}
        "#,
        PRODUCT_COLUMNS
    ))
    .bind(&vendor_id)
    .bind(&req.name)
    .bind(&req.category)
    .bind(&req.description)
    .bind(premium)
    .bind(req.currency.as_deref().unwrap_or("BWP"))
    .bind(coverage)
    .bind(&req.requirements)
    .bind(req.status.as_str())
    .fetch_one(&state.db)
    .await?;

    tracing::info!(
        vendor_id = %vendor_id,
        product_id = %row.id,
        status = %row.status,
        "Product created"
    );

    let response: ProductResponse = row.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(response))))
}

/// GET /vendors/:vendor_id/products
///
/// List a vendor's products. Listings are marketplace-public to any
/// authenticated caller.
pub async fn list_vendor_products(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(vendor_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {} FROM products WHERE vendor_id = $1 ORDER BY created_at DESC",
        PRODUCT_COLUMNS
    ))
    .bind(&vendor_id)
    .fetch_all(&state.db)
    .await?;

    let products: Vec<ProductResponse> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse::new(products)))
}
