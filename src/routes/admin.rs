//! Admin routes
//!
//! Dashboard stats, the vendor approval queue, and approval decisions.
//! Everything here requires the admin role.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::api::response::{DataResponse, MessageResponse};
use crate::app::AppState;
use crate::auth::authorize::{ensure_role, load_current_user};
use crate::auth::RequireAuth;
use crate::domain::analytics::{CategoryStat, DashboardStats, FunnelStats};
use crate::domain::users::{Role, UserProfile, VendorStatus};
use crate::error::ApiError;
use crate::services::cache::keys as cache_keys;

use super::users::{UserRow, USER_COLUMNS};

/// Quote events sampled for category popularity.
const CATEGORY_SAMPLE_SIZE: i64 = 1000;

async fn require_admin(state: &AppState, auth: &RequireAuth) -> Result<(), ApiError> {
    let current = load_current_user(&state.db, &auth.user_id).await?;
    ensure_role(&current, &[Role::Admin])
}

/// GET /admin/analytics/stats
///
/// Funnel counts, category popularity over the most recent quote events,
/// and this month's signups.
pub async fn get_dashboard_stats(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &auth).await?;

    let count_events = |event_type: &'static str| {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM analytics_events WHERE event_type = $1",
        )
        .bind(event_type)
        .fetch_one(&state.db)
    };

    let (views, quotes, leads) = tokio::join!(
        count_events("view_product"),
        count_events("generate_quote"),
        count_events("convert_lead"),
    );

    // Category popularity: aggregate the recent quote events in memory
    // (the store has no native group-by over JSON metadata)
    let metadatas: Vec<serde_json::Value> = sqlx::query_scalar(
        "SELECT metadata FROM analytics_events WHERE event_type = 'generate_quote' \
         ORDER BY created_at DESC LIMIT $1",
    )
    .bind(CATEGORY_SAMPLE_SIZE)
    .fetch_all(&state.db)
    .await?;

    let category_stats = aggregate_categories(&metadatas);

    let new_users_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM users WHERE created_at >= date_trunc('month', NOW())",
    )
    .fetch_one(&state.db)
    .await?;

    Ok(Json(DashboardStats {
        funnel: FunnelStats {
            views: views?,
            quotes: quotes?,
            leads: leads?,
        },
        category_stats,
        new_users_count,
    }))
}

/// Count quote events per category, most popular first.
fn aggregate_categories(metadatas: &[serde_json::Value]) -> Vec<CategoryStat> {
    let mut counts: HashMap<String, i64> = HashMap::new();

    for metadata in metadatas {
        let category = metadata
            .get("category")
            .and_then(|c| c.as_str())
            .unwrap_or("Unknown")
            .to_string();
        *counts.entry(category).or_insert(0) += 1;
    }

    let mut stats: Vec<CategoryStat> = counts
        .into_iter()
        .map(|(name, value)| CategoryStat { name, value })
        .collect();

    stats.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
    stats
}

/// GET /admin/vendors/pending
///
/// Vendors awaiting an approval decision.
pub async fn list_pending_vendors(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &auth).await?;

    let rows = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {} FROM users WHERE role = 'vendor' AND status = 'pending' ORDER BY created_at ASC",
        USER_COLUMNS
    ))
    .fetch_all(&state.db)
    .await?;

    let vendors: Vec<UserProfile> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse::new(vendors)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateVendorStatusRequest {
    pub status: String,
}

/// PUT /admin/vendors/:user_id/status
///
/// Approve or reject a vendor application. Rejection pulls the vendor's
/// active products back to draft so nothing stays listed without an
/// approved owner.
pub async fn update_vendor_status(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(req): Json<UpdateVendorStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &auth).await?;

    let status = match VendorStatus::from_str(&req.status) {
        Some(status @ (VendorStatus::Approved | VendorStatus::Rejected)) => status,
        _ => return Err(ApiError::bad_request("Invalid status")),
    };

    let updated = sqlx::query("UPDATE users SET status = $2, updated_at = NOW() WHERE id = $1 AND role = 'vendor'")
        .bind(&user_id)
        .bind(status.as_str())
        .execute(&state.db)
        .await?;

    if updated.rows_affected() == 0 {
        return Err(ApiError::not_found("Vendor not found"));
    }

    if status == VendorStatus::Rejected {
        let deactivated = sqlx::query(
            "UPDATE products SET status = 'draft', updated_at = NOW() \
             WHERE vendor_id = $1 AND status = 'active'",
        )
        .bind(&user_id)
        .execute(&state.db)
        .await?;

        if deactivated.rows_affected() > 0 {
            tracing::info!(
                vendor_id = %user_id,
                products = deactivated.rows_affected(),
                "Deactivated products of rejected vendor"
            );
        }
    }

    let _ = state.cache.delete(&cache_keys::profile(&user_id)).await;

    tracing::info!(vendor_id = %user_id, status = status.as_str(), "Vendor status updated");

    Ok(Json(MessageResponse::new(format!(
        "Vendor status updated to {}",
        status.as_str()
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn categories_are_counted_and_ranked() {
        let metadatas = vec![
            json!({"category": "Motor"}),
            json!({"category": "Motor"}),
            json!({"category": "Home"}),
            json!({"source": "quiz"}),
            json!({"category": "Motor"}),
        ];

        let stats = aggregate_categories(&metadatas);
        assert_eq!(
            stats,
            vec![
                CategoryStat {
                    name: "Motor".to_string(),
                    value: 3
                },
                CategoryStat {
                    name: "Home".to_string(),
                    value: 1
                },
                CategoryStat {
                    name: "Unknown".to_string(),
                    value: 1
                },
            ]
        );
    }

    #[test]
    fn empty_sample_yields_no_stats() {
        assert!(aggregate_categories(&[]).is_empty());
    }
}
