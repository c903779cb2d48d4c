//! Lead routes
//!
//! Consumers file inquiries; vendors read the leads routed to them. Only
//! the receiving vendor (or an admin) may see a vendor's lead list.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::pagination::{Paginated, PaginationParams};
use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::auth::authorize::ensure_self_or_admin;
use crate::auth::RequireAuth;
use crate::domain::leads::{CreateLeadRequest, LeadResponse, LeadStatus};
use crate::error::ApiError;

/// Database row for a lead
#[derive(Debug, sqlx::FromRow)]
struct LeadRow {
    id: Uuid,
    user_id: String,
    vendor_id: String,
    product_id: Option<Uuid>,
    category: String,
    questionnaire_answers: serde_json::Value,
    status: String,
    routed_via: String,
    consent_given: bool,
    created_at: DateTime<Utc>,
}

const LEAD_COLUMNS: &str = "id, user_id, vendor_id, product_id, category, \
     questionnaire_answers, status, routed_via, consent_given, created_at";

impl From<LeadRow> for LeadResponse {
    fn from(row: LeadRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            vendor_id: row.vendor_id,
            product_id: row.product_id,
            category: row.category,
            questionnaire_answers: row.questionnaire_answers,
            status: LeadStatus::from_str(&row.status),
            routed_via: row.routed_via,
            consent_given: row.consent_given,
            created_at: row.created_at,
        }
    }
}

/// POST /leads
///
/// File an inquiry against a vendor. Consent is implied by submission; the
/// routing notification to the vendor is best-effort.
pub async fn create_lead(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateLeadRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let vendor_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND role = 'vendor')",
    )
    .bind(&req.vendor_id)
    .fetch_one(&state.db)
    .await?;

    if !vendor_exists {
        return Err(ApiError::not_found("Vendor not found"));
    }

    let row = sqlx::query_as::<_, LeadRow>(&format!(
        r#"
        INSERT INTO leads (user_id, vendor_id, product_id, category, questionnaire_answers, status, routed_via, consent_given)
        VALUES ($1, $2, $3, $4, $5, 'new', 'email', TRUE)
        RETURNING {}
        "#,
        LEAD_COLUMNS
    ))
    .bind(&auth.user_id)
    .bind(&req.vendor_id)
    .bind(req.product_id)
    .bind(&req.category)
    .bind(&req.questionnaire_answers)
    .fetch_one(&state.db)
    .await?;

    // Routing notification is fire-and-forget; the lead row is the record
    tracing::info!(
        lead_id = %row.id,
        vendor_id = %row.vendor_id,
        category = %row.category,
        "Lead created and routed to vendor"
    );

    let response: LeadResponse = row.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(response))))
}

/// GET /vendors/:vendor_id/leads
///
/// Leads routed to a vendor, newest first. Vendor-owned: a non-owner gets
/// 403.
pub async fn list_vendor_leads(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(vendor_id): Path<String>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_self_or_admin(&state.db, &auth.user_id, &vendor_id).await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leads WHERE vendor_id = $1")
        .bind(&vendor_id)
        .fetch_one(&state.db)
        .await?;

    let rows = sqlx::query_as::<_, LeadRow>(&format!(
        "SELECT {} FROM leads WHERE vendor_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        LEAD_COLUMNS
    ))
    .bind(&vendor_id)
    .bind(pagination.limit() as i64)
    .bind(pagination.offset() as i64)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<LeadResponse> = rows.into_iter().map(Into::into).collect();
    Ok(Json(Paginated::new(data, &pagination, total as u64)))
}
