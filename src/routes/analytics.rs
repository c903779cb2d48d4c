//! Analytics event logging
//!
//! Funnel events are accepted from anonymous and authenticated clients; a
//! verified token identity always beats a self-reported one.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

use crate::api::response::MessageResponse;
use crate::app::AppState;
use crate::auth::OptionalAuth;
use crate::domain::analytics::LogEventRequest;
use crate::error::ApiError;

/// POST /analytics/events
pub async fn log_event(
    auth: OptionalAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<LogEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.event_type.trim().is_empty() {
        return Err(ApiError::bad_request("Event type is required"));
    }

    let user_id = auth
        .user_id()
        .map(str::to_string)
        .or(req.user_id)
        .unwrap_or_else(|| "anonymous".to_string());

    let metadata = req.metadata.unwrap_or_else(|| serde_json::json!({}));

    sqlx::query("INSERT INTO analytics_events (event_type, user_id, metadata) VALUES ($1, $2, $3)")
        .bind(&req.event_type)
        .bind(&user_id)
        .bind(&metadata)
        .execute(&state.db)
        .await?;

    tracing::debug!(event_type = %req.event_type, user_id = %user_id, "Event logged");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Event logged successfully")),
    ))
}
