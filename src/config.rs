use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }

    #[allow(dead_code)]
    pub fn is_prod(&self) -> bool {
        matches!(self, Self::Prod)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub server_addr: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // Redis
    pub redis_url: String,
    pub redis_cache_ttl_seconds: u64,

    // CORS
    pub cors_allow_origins: Vec<String>,

    // Identity provider (JWT bearer auth)
    pub auth_jwks_url: String,
    pub auth_issuer: String,
    pub auth_audience: String,
    pub jwks_cache_ttl_seconds: u64,

    // Identity provider management API, for best-effort account deletion.
    // Optional: without it, provider-side records are left for out-of-band
    // cleanup.
    pub auth_mgmt_url: Option<String>,
    pub auth_mgmt_token: Option<String>,

    // AI scoring service
    pub ai_service_url: String,
    pub ai_service_token: String,
    pub ai_service_timeout_seconds: u64,

    // Stripe
    pub stripe_secret_key: String,
    pub stripe_webhook_secret: String,

    // DPO payment gateway
    pub dpo_base_url: String,
    pub dpo_company_token: String,
    pub dpo_service_type: String,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let env = Environment::from_str(&env::var("ENV").unwrap_or_else(|_| "dev".to_string()));
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        // Database
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        // Redis
        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://redis:6379/0".to_string());
        let redis_cache_ttl_seconds = env::var("REDIS_CACHE_TTL_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3600); // 1 hour default

        // CORS
        let cors_allow_origins = env::var("CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // Identity provider
        let auth_jwks_url = env::var("AUTH_JWKS_URL").context("AUTH_JWKS_URL must be set")?;
        let auth_issuer = env::var("AUTH_ISSUER").context("AUTH_ISSUER must be set")?;
        let auth_audience = env::var("AUTH_AUDIENCE").context("AUTH_AUDIENCE must be set")?;
        let jwks_cache_ttl_seconds = env::var("JWKS_CACHE_TTL_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1800); // 30 minutes default
        let auth_mgmt_url = env::var("AUTH_MGMT_URL").ok().filter(|s| !s.is_empty());
        let auth_mgmt_token = env::var("AUTH_MGMT_TOKEN").ok().filter(|s| !s.is_empty());

        // AI scoring service
        let ai_service_url =
            env::var("AI_SERVICE_URL").unwrap_or_else(|_| "http://ai-service:8000".to_string());
        let ai_service_token =
            env::var("AI_SERVICE_TOKEN").context("AI_SERVICE_TOKEN must be set")?;
        let ai_service_timeout_seconds = env::var("AI_SERVICE_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        // Stripe
        let stripe_secret_key =
            env::var("STRIPE_SECRET_KEY").context("STRIPE_SECRET_KEY must be set")?;
        let stripe_webhook_secret =
            env::var("STRIPE_WEBHOOK_SECRET").context("STRIPE_WEBHOOK_SECRET must be set")?;

        // DPO payment gateway
        let dpo_base_url = env::var("DPO_BASE_URL")
            .unwrap_or_else(|_| "https://secure.3gdirectpay.com/API/v6/".to_string());
        let dpo_company_token =
            env::var("DPO_COMPANY_TOKEN").context("DPO_COMPANY_TOKEN must be set")?;
        let dpo_service_type =
            env::var("DPO_SERVICE_TYPE").context("DPO_SERVICE_TYPE must be set")?;

        Ok(Settings {
            env,
            server_addr,
            database_url,
            database_max_connections,
            redis_url,
            redis_cache_ttl_seconds,
            cors_allow_origins,
            auth_jwks_url,
            auth_issuer,
            auth_audience,
            jwks_cache_ttl_seconds,
            auth_mgmt_url,
            auth_mgmt_token,
            ai_service_url,
            ai_service_token,
            ai_service_timeout_seconds,
            stripe_secret_key,
            stripe_webhook_secret,
            dpo_base_url,
            dpo_company_token,
            dpo_service_type,
        })
    }
}
