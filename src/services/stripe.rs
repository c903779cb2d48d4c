//! Stripe billing client.
//!
//! Checkout/portal session creation over Stripe's form-encoded REST API,
//! plus webhook signature verification. Only the subscription lifecycle
//! events this platform acts on are modeled; everything else in a webhook
//! payload stays as raw JSON.

use anyhow::{Context, Result};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use std::time::Duration;
use tracing::{debug, error};

use crate::error::ApiError;

type HmacSha256 = Hmac<Sha256>;

/// Accepted clock skew between the webhook timestamp and our clock.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

const API_BASE: &str = "https://api.stripe.com";

/// Client for Stripe's HTTP API.
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: String,
}

/// A created Checkout or billing-portal session.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeSession {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

impl StripeClient {
    pub fn new(secret_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            secret_key: secret_key.to_string(),
        })
    }

    /// POST a form-encoded request to the Stripe API.
    async fn post_form<R: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<R, ApiError> {
        let url = format!("{}{}", API_BASE, path);

        debug!(url = %url, "Stripe API request");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.secret_key, None::<&str>)
            .form(form)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Stripe request failed");
                ApiError::upstream(format!("Stripe unavailable: {}", e))
            })?;

        let status = response.status();

        if status.is_success() {
            response.json::<R>().await.map_err(|e| {
                error!(error = %e, "Failed to parse Stripe response");
                ApiError::upstream(format!("Invalid Stripe response: {}", e))
            })
        } else {
            let message = response
                .json::<StripeErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or_else(|| format!("Stripe error: {}", status));

            error!(status = %status, message = %message, "Stripe API error");
            Err(ApiError::upstream(message))
        }
    }

    /// Create a subscription-mode Checkout session. The subscriber's id and
    /// kind travel in metadata so the webhook can attribute the
    /// subscription later.
    pub async fn create_checkout_session(
        &self,
        price_id: &str,
        user_id: &str,
        user_type: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<StripeSession, ApiError> {
        self.post_form(
            "/v1/checkout/sessions",
            &[
                ("mode", "subscription"),
                ("payment_method_types[0]", "card"),
                ("line_items[0][price]", price_id),
                ("line_items[0][quantity]", "1"),
                ("success_url", success_url),
                ("cancel_url", cancel_url),
                ("metadata[userId]", user_id),
                ("metadata[userType]", user_type),
                ("subscription_data[metadata][userId]", user_id),
                ("subscription_data[metadata][userType]", user_type),
            ],
        )
        .await
    }

    /// Create a billing-portal session for subscription self-service.
    pub async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<StripeSession, ApiError> {
        self.post_form(
            "/v1/billing_portal/sessions",
            &[("customer", customer_id), ("return_url", return_url)],
        )
        .await
    }
}

/// A parsed webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    pub object: serde_json::Value,
}

/// Verify a `Stripe-Signature` header against the raw payload.
///
/// The header carries a unix timestamp and one or more `v1` HMAC-SHA256
/// signatures over `"{timestamp}.{payload}"`. The timestamp must be within
/// `tolerance_secs` of `now` to blunt replay.
pub fn verify_webhook_signature(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
    tolerance_secs: i64,
    now_unix: i64,
) -> Result<(), ApiError> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<&str> = Vec::new();

    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| ApiError::bad_request("Malformed webhook signature header"))?;

    if candidates.is_empty() {
        return Err(ApiError::bad_request("Missing webhook signature"));
    }

    if (now_unix - timestamp).abs() > tolerance_secs {
        return Err(ApiError::bad_request("Webhook timestamp outside tolerance"));
    }

    for candidate in candidates {
        if let Ok(decoded) = hex::decode(candidate) {
            // Mac::verify_slice gives a constant-time compare
            let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
                .map_err(|_| ApiError::internal("Invalid webhook secret"))?;
            mac.update(timestamp.to_string().as_bytes());
            mac.update(b".");
            mac.update(payload);
            if mac.verify_slice(&decoded).is_ok() {
                return Ok(());
            }
        }
    }

    Err(ApiError::bad_request("Webhook signature mismatch"))
}

/// Parse a verified webhook payload.
pub fn parse_webhook_event(payload: &[u8]) -> Result<WebhookEvent, ApiError> {
    serde_json::from_slice(payload)
        .map_err(|e| ApiError::bad_request(format!("Malformed webhook payload: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn valid_signature_passes() {
        let payload = br#"{"id": "evt_1", "type": "customer.subscription.updated"}"#;
        let secret = "whsec_test";
        let header = format!("t=1700000000,v1={}", sign(payload, secret, 1_700_000_000));

        assert!(
            verify_webhook_signature(payload, &header, secret, 300, 1_700_000_100).is_ok()
        );
    }

    #[test]
    fn tampered_payload_fails() {
        let payload = br#"{"id": "evt_1"}"#;
        let secret = "whsec_test";
        let header = format!("t=1700000000,v1={}", sign(payload, secret, 1_700_000_000));

        let tampered = br#"{"id": "evt_2"}"#;
        assert!(
            verify_webhook_signature(tampered, &header, secret, 300, 1_700_000_100).is_err()
        );
    }

    #[test]
    fn stale_timestamp_fails() {
        let payload = b"{}";
        let secret = "whsec_test";
        let header = format!("t=1700000000,v1={}", sign(payload, secret, 1_700_000_000));

        assert!(
            verify_webhook_signature(payload, &header, secret, 300, 1_700_009_999).is_err()
        );
    }

    #[test]
    fn header_without_signature_fails() {
        assert!(verify_webhook_signature(b"{}", "t=1700000000", "s", 300, 1_700_000_000).is_err());
        assert!(verify_webhook_signature(b"{}", "garbage", "s", 300, 1_700_000_000).is_err());
    }

    #[test]
    fn any_matching_v1_passes() {
        let payload = b"{}";
        let secret = "whsec_test";
        let good = sign(payload, secret, 1_700_000_000);
        let header = format!("t=1700000000,v1={},v1={}", "00".repeat(32), good);

        assert!(
            verify_webhook_signature(payload, &header, secret, 300, 1_700_000_000).is_ok()
        );
    }

    #[test]
    fn event_parsing_extracts_type_and_object() {
        let payload = br#"{
            "id": "evt_123",
            "type": "customer.subscription.deleted",
            "data": {"object": {"id": "sub_1", "status": "canceled"}}
        }"#;

        let event = parse_webhook_event(payload).unwrap();
        assert_eq!(event.event_type, "customer.subscription.deleted");
        assert_eq!(event.data.object["status"], "canceled");
    }
}
