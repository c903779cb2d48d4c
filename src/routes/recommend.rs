//! Quiz recommendations
//!
//! Collects the approved-vendor catalogue, attaches vendor contact
//! details, and forwards everything with the quiz answers to the scoring
//! service. The service's ranked top picks are returned verbatim.

use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};
use rust_decimal::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::OptionalAuth;
use crate::error::ApiError;
use crate::middleware::RequestIdExt;

#[derive(Debug, sqlx::FromRow)]
struct CatalogueRow {
    id: Uuid,
    vendor_id: String,
    name: String,
    category: String,
    description: Option<String>,
    premium: rust_decimal::Decimal,
    currency: String,
    coverage_amount: Option<rust_decimal::Decimal>,
    requirements: Vec<String>,
    vendor_email: Option<String>,
    vendor_phone: Option<String>,
    vendor_company_name: Option<String>,
}

/// POST /recommend
///
/// Body: the consumer's quiz answers as a JSON object. Open to anonymous
/// callers; the quiz answers alone drive the ranking.
pub async fn recommend(
    auth: OptionalAuth,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    let mut payload = match body {
        serde_json::Value::Object(map) => map,
        _ => return Err(ApiError::bad_request("Expected a JSON object")),
    };

    let active_vendor_ids: Vec<String> = sqlx::query_scalar(
        "SELECT id FROM users WHERE role = 'vendor' AND status = 'approved'",
    )
    .fetch_all(&state.db)
    .await?;

    // Active products of approved vendors, with contact details attached
    let catalogue = sqlx::query_as::<_, CatalogueRow>(
        r#"
        SELECT p.id, p.vendor_id, p.name, p.category, p.description, p.premium,
               p.currency, p.coverage_amount, p.requirements,
               u.email AS vendor_email, u.phone AS vendor_phone,
               COALESCE(u.company_name, u.full_name) AS vendor_company_name
        FROM products p
        JOIN users u ON u.id = p.vendor_id
        WHERE p.status = 'active' AND u.role = 'vendor' AND u.status = 'approved'
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    let products: Vec<serde_json::Value> = catalogue
        .into_iter()
        .map(|p| {
            serde_json::json!({
                "id": p.id,
                "vendorId": p.vendor_id,
                "name": p.name,
                "category": p.category,
                "description": p.description,
                "premiumAmount": p.premium.to_f64().unwrap_or(0.0),
                "currency": p.currency,
                "coverageAmount": p.coverage_amount.and_then(|c| c.to_f64()),
                "requirements": p.requirements,
                "vendorEmail": p.vendor_email,
                "vendorPhone": p.vendor_phone,
                "vendorCompanyName": p.vendor_company_name.unwrap_or_else(|| "Unknown Vendor".to_string()),
            })
        })
        .collect();

    tracing::info!(
        user_id = auth.user_id().unwrap_or("anonymous"),
        vendors = active_vendor_ids.len(),
        products = products.len(),
        "Requesting recommendations"
    );

    payload.insert(
        "active_vendor_ids".to_string(),
        serde_json::json!(active_vendor_ids),
    );
    payload.insert("products".to_string(), serde_json::Value::Array(products));

    let response = state
        .ai_client
        .recommend(&serde_json::Value::Object(payload), headers.request_id())
        .await?;

    Ok(Json(response))
}
