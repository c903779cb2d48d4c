//! Unified search
//!
//! In-memory fuzzy matching over approved vendors and active products.
//! Authenticated callers additionally get AI compatibility scores on the
//! product hits; a scoring-service failure degrades to unscored results.

use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};
use rust_decimal::prelude::*;
use std::cmp::Ordering;
use std::sync::Arc;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::OptionalAuth;
use crate::domain::search::{
    fuzzy_score, product_score, ProductHit, SearchRequest, SearchResults, VendorHit,
    MAX_PRODUCT_HITS, MAX_VENDOR_HITS, RELEVANCE_THRESHOLD,
};
use crate::error::ApiError;
use crate::middleware::RequestIdExt;
use crate::services::ai_client::{CompatibilityProduct, CompatibilityProfile};

#[derive(Debug, sqlx::FromRow)]
struct VendorSearchRow {
    id: String,
    company_name: Option<String>,
    address: Option<String>,
    email: Option<String>,
    phone: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct ProductSearchRow {
    id: Uuid,
    vendor_id: String,
    name: String,
    category: String,
    description: Option<String>,
    premium: rust_decimal::Decimal,
    requirements: Vec<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct SearcherProfileRow {
    location: Option<String>,
    preferences: Option<serde_json::Value>,
}

fn pref_field(prefs: &Option<serde_json::Value>, key: &str, default: &str) -> String {
    prefs
        .as_ref()
        .and_then(|p| p.get(key))
        .and_then(|v| {
            v.as_str()
                .map(str::to_string)
                .or_else(|| v.as_i64().map(|n| n.to_string()))
                .or_else(|| v.as_f64().map(|n| n.to_string()))
        })
        .unwrap_or_else(|| default.to_string())
}

/// POST /search
///
/// Body: `{ query, filters: { type: all | vendors | products } }`.
/// Anonymous callers get fuzzy-ranked hits; authenticated callers get
/// compatibility-scored product hits on top.
pub async fn unified_search(
    auth: OptionalAuth,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<SearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let query = req.query.trim().to_string();
    if query.is_empty() {
        return Err(ApiError::bad_request("Search query is required"));
    }

    let mut results = SearchResults::default();

    if req.filters.kind.includes_vendors() {
        let vendors = sqlx::query_as::<_, VendorSearchRow>(
            "SELECT id, company_name, address, email, phone FROM users \
             WHERE role = 'vendor' AND status = 'approved'",
        )
        .fetch_all(&state.db)
        .await?;

        let mut hits: Vec<VendorHit> = vendors
            .into_iter()
            .filter_map(|v| {
                let company_name = v.company_name?;
                let score = fuzzy_score(&query, &company_name);
                (score > RELEVANCE_THRESHOLD).then_some(VendorHit {
                    id: v.id,
                    company_name,
                    address: v.address,
                    email: v.email,
                    phone: v.phone,
                    score,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits.truncate(MAX_VENDOR_HITS);
        results.vendors = hits;
    }

    if req.filters.kind.includes_products() {
        let products = sqlx::query_as::<_, ProductSearchRow>(
            "SELECT id, vendor_id, name, category, description, premium, requirements \
             FROM products WHERE status = 'active'",
        )
        .fetch_all(&state.db)
        .await?;

        let mut hits: Vec<ProductHit> = products
            .into_iter()
            .filter_map(|p| {
                let name_score = fuzzy_score(&query, &p.name);
                let cat_score = fuzzy_score(&query, &p.category);
                let score = product_score(name_score, cat_score);
                (score > RELEVANCE_THRESHOLD).then_some(ProductHit {
                    id: p.id,
                    name: p.name,
                    category: p.category,
                    premium: p.premium.to_f64().unwrap_or(0.0),
                    description: p.description,
                    requirements: p.requirements,
                    vendor_id: p.vendor_id,
                    score,
                    compatibility_score: None,
                    compatibility_reason: None,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits.truncate(MAX_PRODUCT_HITS);

        if let Some(user_id) = auth.user_id() {
            if !hits.is_empty() {
                attach_compatibility(&state, user_id, &mut hits, headers.request_id()).await;
            }
        }

        results.products = hits;
    }

    tracing::debug!(
        vendor_hits = results.vendors.len(),
        product_hits = results.products.len(),
        "Search completed"
    );

    Ok(Json(results))
}

/// Best-effort AI compatibility enrichment. Failures leave the hits
/// unscored.
async fn attach_compatibility(
    state: &AppState,
    user_id: &str,
    hits: &mut [ProductHit],
    request_id: Option<&str>,
) {
    let profile = match sqlx::query_as::<_, SearcherProfileRow>(
        "SELECT location, preferences FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(&state.db)
    .await
    {
        Ok(Some(row)) => row,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load searcher profile");
            return;
        }
    };

    let user_profile = CompatibilityProfile {
        age: pref_field(&profile.preferences, "age", "N/A"),
        income: pref_field(&profile.preferences, "income", "N/A"),
        budget: pref_field(&profile.preferences, "budget", "N/A"),
        dependents: pref_field(&profile.preferences, "dependents", "0"),
        category: pref_field(&profile.preferences, "category", "General"),
        location: profile.location.unwrap_or_else(|| "N/A".to_string()),
    };

    let products: Vec<CompatibilityProduct> = hits
        .iter()
        .map(|p| CompatibilityProduct {
            id: p.id.to_string(),
            name: p.name.clone(),
            category: p.category.clone(),
            premium: p.premium,
            description: p.description.clone(),
            requirements: p.requirements.clone(),
        })
        .collect();

    match state
        .ai_client
        .compatibility(&user_profile, &products, request_id)
        .await
    {
        Ok(scored) => {
            for hit in hits.iter_mut() {
                if let Some(s) = scored.iter().find(|s| s.product_id == hit.id.to_string()) {
                    hit.compatibility_score = Some(s.score);
                    hit.compatibility_reason = s.reasoning.clone();
                }
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Compatibility scoring failed, returning unscored hits");
        }
    }
}
