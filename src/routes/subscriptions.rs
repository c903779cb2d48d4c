//! Subscription routes
//!
//! Checkout/portal session creation, status reads, and the signed billing
//! webhook that moves accounts between tiers.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::auth::authorize::ensure_self_or_admin;
use crate::auth::RequireAuth;
use crate::domain::subscriptions::{
    tier_for_price, tier_limits, CheckoutSessionRequest, PortalSessionRequest, SubscriberType,
    SubscriptionStatusResponse, Tier, TierLimits,
};
use crate::error::ApiError;
use crate::services::cache::{keys as cache_keys, ttl as cache_ttl};
use crate::services::stripe::{
    parse_webhook_event, verify_webhook_signature, WebhookEvent, SIGNATURE_TOLERANCE_SECS,
};

#[derive(Serialize)]
struct SessionUrlResponse {
    url: String,
}

fn validated_url(value: &str, field: &str) -> Result<(), ApiError> {
    url::Url::parse(value).map_err(|_| ApiError::bad_request(format!("Invalid {}", field)))?;
    Ok(())
}

/// POST /subscriptions/checkout-session
///
/// Create a subscription-mode Checkout session for the caller.
pub async fn create_checkout_session(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CheckoutSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_self_or_admin(&state.db, &auth.user_id, &req.user_id).await?;
    validated_url(&req.success_url, "success URL")?;
    validated_url(&req.cancel_url, "cancel URL")?;

    let user_type = match req.user_type {
        SubscriberType::User => "user",
        SubscriberType::Vendor => "vendor",
    };

    let session = state
        .stripe
        .create_checkout_session(
            &req.price_id,
            &req.user_id,
            user_type,
            &req.success_url,
            &req.cancel_url,
        )
        .await?;

    tracing::info!(
        user_id = %req.user_id,
        price_id = %req.price_id,
        session_id = %session.id,
        "Checkout session created"
    );

    Ok(Json(SessionUrlResponse { url: session.url }))
}

/// POST /subscriptions/portal-session
///
/// Create a billing-portal session for subscription self-service.
pub async fn create_portal_session(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<PortalSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validated_url(&req.return_url, "return URL")?;

    let session = state
        .stripe
        .create_portal_session(&req.customer_id, &req.return_url)
        .await?;

    Ok(Json(SessionUrlResponse { url: session.url }))
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    tier: String,
    subscription_status: Option<String>,
    limits: Option<serde_json::Value>,
}

/// GET /subscriptions/status/:user_id
///
/// Tier, status and limits for an account, owner or admin. Accounts with
/// no subscription on file read as free/inactive.
pub async fn subscription_status(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_self_or_admin(&state.db, &auth.user_id, &user_id).await?;

    let cache_key = cache_keys::subscription(&user_id);
    if let Some(cached) = state
        .cache
        .get::<SubscriptionStatusResponse>(&cache_key)
        .await
    {
        return Ok(Json(DataResponse::new(cached)));
    }

    let row = sqlx::query_as::<_, SubscriptionRow>(
        "SELECT tier, subscription_status, limits FROM users WHERE id = $1",
    )
    .bind(&user_id)
    .fetch_optional(&state.db)
    .await?;

    let response = match row {
        Some(row) => {
            let tier = Tier::from_str(&row.tier);
            let limits = row
                .limits
                .and_then(|l| serde_json::from_value::<TierLimits>(l).ok())
                .unwrap_or_else(|| tier_limits(tier));
            SubscriptionStatusResponse {
                tier: row.tier,
                status: row
                    .subscription_status
                    .unwrap_or_else(|| "inactive".to_string()),
                limits,
            }
        }
        None => SubscriptionStatusResponse {
            tier: "free".to_string(),
            status: "inactive".to_string(),
            limits: TierLimits::default(),
        },
    };

    let _ = state
        .cache
        .set_with_ttl(&cache_key, &response, cache_ttl::SUBSCRIPTION)
        .await;

    Ok(Json(DataResponse::new(response)))
}

#[derive(Serialize)]
struct WebhookAck {
    received: bool,
}

/// POST /subscriptions/webhook
///
/// Raw-body Stripe webhook. A bad signature is a 400; everything else is
/// acknowledged so the provider doesn't retry forever.
pub async fn webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::bad_request("Missing Stripe-Signature header"))?;

    verify_webhook_signature(
        &body,
        signature,
        &state.settings.stripe_webhook_secret,
        SIGNATURE_TOLERANCE_SECS,
        chrono::Utc::now().timestamp(),
    )?;

    let event = parse_webhook_event(&body)?;

    match event.event_type.as_str() {
        "checkout.session.completed" => {
            let metadata = &event.data.object["metadata"];
            tracing::info!(
                user_id = metadata["userId"].as_str().unwrap_or("unknown"),
                user_type = metadata["userType"].as_str().unwrap_or("unknown"),
                "Checkout completed"
            );
        }
        "customer.subscription.updated" | "customer.subscription.deleted" => {
            apply_subscription_update(&state, &event).await?;
        }
        other => {
            tracing::debug!(event_type = other, "Unhandled webhook event type");
        }
    }

    Ok(Json(WebhookAck { received: true }))
}

/// Persist a subscription lifecycle change onto the subscriber's row.
async fn apply_subscription_update(state: &AppState, event: &WebhookEvent) -> Result<(), ApiError> {
    let object = &event.data.object;

    let Some(user_id) = object["metadata"]["userId"].as_str() else {
        tracing::warn!(event_id = %event.id, "Subscription event without userId metadata");
        return Ok(());
    };

    let price_id = object["items"]["data"][0]["price"]["id"]
        .as_str()
        .unwrap_or_default();

    let tier = match tier_for_price(price_id) {
        Some(tier) => tier,
        None => {
            tracing::warn!(price_id = price_id, "Unknown price id, keeping free terms");
            Tier::Free
        }
    };

    let customer_id = object["customer"].as_str().unwrap_or_default();
    let subscription_id = object["id"].as_str().unwrap_or_default();
    let status = if event.event_type == "customer.subscription.deleted" {
        "canceled"
    } else {
        object["status"].as_str().unwrap_or("active")
    };

    let limits = serde_json::to_value(tier_limits(tier))
        .map_err(|e| ApiError::internal(format!("Failed to encode limits: {}", e)))?;

    let result = sqlx::query(
        r#"
        UPDATE users SET
            stripe_customer_id = $2,
            stripe_subscription_id = $3,
            tier = $4,
            subscription_status = $5,
            limits = $6,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .bind(customer_id)
    .bind(subscription_id)
    .bind(tier.as_str())
    .bind(status)
    .bind(&limits)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        tracing::warn!(user_id = %user_id, "Subscription event for unknown user");
        return Ok(());
    }

    let _ = state
        .cache
        .delete_pattern(&cache_keys::user_pattern(user_id))
        .await;

    tracing::info!(
        user_id = %user_id,
        tier = tier.as_str(),
        status = status,
        "Subscription updated"
    );

    Ok(())
}
