//! One-off payment routes (DPO gateway)
//!
//! Opening a transaction records a `payments` row in `created` state; the
//! verify endpoint moves it along as the gateway reports progress.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::payments::{
    CreatePaymentRequest, PaymentResponse, PaymentStatus, PaymentTokenResponse,
    PaymentVerificationResponse, VerifyPaymentRequest,
};
use crate::error::ApiError;

/// Database row for a payment record
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    user_id: String,
    provider: String,
    reference: String,
    amount: rust_decimal::Decimal,
    currency: String,
    description: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PaymentRow> for PaymentResponse {
    fn from(row: PaymentRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            provider: row.provider,
            reference: row.reference,
            amount: row.amount.to_f64().unwrap_or(0.0),
            currency: row.currency,
            description: row.description,
            status: PaymentStatus::from_str(&row.status),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn validated_url(value: &str, field: &str) -> Result<(), ApiError> {
    url::Url::parse(value).map_err(|_| ApiError::bad_request(format!("Invalid {}", field)))?;
    Ok(())
}

/// POST /payments/token
///
/// Open a gateway transaction and return the redirect token.
pub async fn create_payment_token(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.amount <= 0.0 {
        return Err(ApiError::bad_request("Payment amount must be positive"));
    }
    validated_url(&req.redirect_url, "redirect URL")?;
    validated_url(&req.back_url, "back URL")?;

    let amount = Decimal::from_f64_retain(req.amount)
        .ok_or_else(|| ApiError::bad_request("Invalid payment amount"))?;

    let token = state.dpo.create_token(&req).await?;

    let payment_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO payments (user_id, provider, reference, trans_token, amount, currency, description, status)
        VALUES ($1, 'dpo', $2, $3, $4, $5, $6, 'created')
        RETURNING id
        "#,
    )
    .bind(&auth.user_id)
    .bind(&req.reference)
    .bind(&token.trans_token)
    .bind(amount)
    .bind(&req.currency)
    .bind(&req.description)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(
        user_id = %auth.user_id,
        payment_id = %payment_id,
        reference = %req.reference,
        "Payment transaction opened"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(PaymentTokenResponse {
            payment_id,
            trans_token: token.trans_token,
            trans_ref: token.trans_ref,
            payment_url: token.payment_url,
        })),
    ))
}

/// POST /payments/verify
///
/// Ask the gateway for the transaction outcome and sync the stored record.
pub async fn verify_payment(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyPaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let verification = state.dpo.verify_token(&req.trans_token).await?;

    let updated = sqlx::query(
        "UPDATE payments SET status = $2, updated_at = NOW() WHERE trans_token = $1",
    )
    .bind(&req.trans_token)
    .bind(verification.status.as_str())
    .execute(&state.db)
    .await?;

    if updated.rows_affected() == 0 {
        tracing::warn!(user_id = %auth.user_id, "Verify called for unknown transaction token");
    }

    tracing::info!(
        user_id = %auth.user_id,
        status = verification.status.as_str(),
        "Payment verification completed"
    );

    Ok(Json(DataResponse::new(PaymentVerificationResponse {
        status: verification.status,
        customer_name: verification.customer_name,
        customer_phone: verification.customer_phone,
        transaction_amount: verification.transaction_amount,
        transaction_currency: verification.transaction_currency,
        explanation: verification.explanation,
    })))
}

/// GET /payments
///
/// The caller's payment history, newest first.
pub async fn list_payments(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, PaymentRow>(
        "SELECT id, user_id, provider, reference, amount, currency, description, status, \
         created_at, updated_at FROM payments WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(&auth.user_id)
    .fetch_all(&state.db)
    .await?;

    let payments: Vec<PaymentResponse> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse::new(payments)))
}
