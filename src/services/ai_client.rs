//! Client for the recommendation/compatibility scoring service.
//!
//! The scoring service ranks products against a consumer's quiz answers
//! (`/recommend`) and scores how well individual products fit a stored
//! profile (`/compatibility`). Recommendation calls retry transient
//! failures with bounded exponential backoff; compatibility calls are
//! best-effort and left to the caller to degrade.

use anyhow::{Context, Result};
use backoff::ExponentialBackoffBuilder;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use crate::error::ApiError;

/// Client for the AI scoring service.
#[derive(Clone)]
pub struct AiClient {
    client: Client,
    base_url: String,
    token: String,
}

/// Error response from the scoring service.
#[derive(Debug, Deserialize)]
struct AiErrorResponse {
    #[serde(alias = "detail")]
    message: String,
}

/// Consumer profile fields forwarded for compatibility scoring.
#[derive(Debug, Clone, Serialize)]
pub struct CompatibilityProfile {
    pub age: String,
    pub income: String,
    pub budget: String,
    pub dependents: String,
    pub category: String,
    pub location: String,
}

/// Product fields forwarded for compatibility scoring.
#[derive(Debug, Clone, Serialize)]
pub struct CompatibilityProduct {
    pub id: String,
    pub name: String,
    pub category: String,
    pub premium: f64,
    pub description: Option<String>,
    pub requirements: Vec<String>,
}

/// One scored product from the compatibility endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoredProduct {
    pub product_id: String,
    pub score: f64,
    #[serde(default)]
    pub reasoning: Option<String>,
}

impl AiClient {
    /// Create a new scoring-service client.
    pub fn new(base_url: &str, token: &str, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        tracing::info!(base_url = base_url, "AI client initialized");

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Make a POST request to the scoring service.
    async fn post<T: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
        request_id: Option<&str>,
    ) -> Result<R, ApiError> {
        let url = format!("{}{}", self.base_url, path);

        let mut req = self
            .client
            .post(&url)
            .header("X-Internal-Token", &self.token)
            .header("Content-Type", "application/json");

        if let Some(rid) = request_id {
            req = req.header("x-request-id", rid);
        }

        debug!(url = %url, "AI service request");

        let response = req.json(body).send().await.map_err(|e| {
            error!(error = %e, "AI service request failed");
            ApiError::upstream(format!("AI service unavailable: {}", e))
        })?;

        let status = response.status();

        if status.is_success() {
            response.json::<R>().await.map_err(|e| {
                error!(error = %e, "Failed to parse AI service response");
                ApiError::upstream(format!("Invalid AI service response: {}", e))
            })
        } else {
            let message = response
                .json::<AiErrorResponse>()
                .await
                .map(|e| e.message)
                .unwrap_or_else(|_| format!("AI service error: {}", status));

            match status {
                StatusCode::BAD_REQUEST => Err(ApiError::BadRequest(message)),
                StatusCode::UNAUTHORIZED => {
                    error!("AI service authentication failed");
                    Err(ApiError::internal("AI service auth error"))
                }
                _ => {
                    error!(status = %status, message = %message, "AI service error");
                    Err(ApiError::upstream(message))
                }
            }
        }
    }

    /// Check scoring-service availability. The service root doubles as its
    /// health probe.
    pub async fn health_check(&self) -> Result<()> {
        let url = format!("{}/", self.base_url);

        self.client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .context("AI service health check failed")?
            .error_for_status()
            .context("AI service unhealthy")?;

        Ok(())
    }

    /// Rank products for a quiz payload. The payload already carries the
    /// quiz answers plus `active_vendor_ids` and `products` assembled by
    /// the caller; the response's ranked top picks are returned verbatim.
    pub async fn recommend(
        &self,
        payload: &serde_json::Value,
        request_id: Option<&str>,
    ) -> Result<serde_json::Value, ApiError> {
        let backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(250))
            .with_max_elapsed_time(Some(Duration::from_secs(5)))
            .build();

        backoff::future::retry(backoff, || async {
            self.post::<_, serde_json::Value>("/recommend", payload, request_id)
                .await
                .map_err(|e| match e {
                    // Malformed input won't get better on retry
                    ApiError::BadRequest(_) => backoff::Error::permanent(e),
                    other => backoff::Error::transient(other),
                })
        })
        .await
    }

    /// Score products against a stored consumer profile.
    pub async fn compatibility(
        &self,
        user_profile: &CompatibilityProfile,
        products: &[CompatibilityProduct],
        request_id: Option<&str>,
    ) -> Result<Vec<ScoredProduct>, ApiError> {
        #[derive(Serialize)]
        struct Request<'a> {
            user_profile: &'a CompatibilityProfile,
            products: &'a [CompatibilityProduct],
        }

        #[derive(Deserialize)]
        struct Response {
            #[serde(default)]
            scored_products: Vec<ScoredProduct>,
        }

        let response: Response = self
            .post(
                "/compatibility",
                &Request {
                    user_profile,
                    products,
                },
                request_id,
            )
            .await?;

        Ok(response.scored_products)
    }
}
