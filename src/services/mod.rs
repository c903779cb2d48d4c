//! Service layer modules for external integrations.
//!
//! Clients for Redis caching, the AI scoring service, Stripe billing and
//! the DPO payment gateway.

pub mod ai_client;
pub mod cache;
pub mod dpo;
pub mod stripe;

pub use ai_client::AiClient;
pub use cache::RedisCache;
pub use dpo::DpoClient;
pub use stripe::StripeClient;
