pub mod admin;
pub mod analytics;
pub mod bids;
pub mod health;
pub mod leads;
pub mod me;
pub mod payments;
pub mod products;
pub mod quotes;
pub mod recommend;
pub mod search;
pub mod subscriptions;
pub mod users;
pub mod vendors;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        .route("/me", get(me::get_me))
        // Users
        .route("/users/:user_id", get(users::get_profile))
        .route("/users/:user_id", put(users::update_profile))
        .route("/users/:user_id", delete(users::delete_user))
        // Vendors
        .route("/vendors", post(vendors::apply_as_vendor))
        .route("/vendors/me", get(vendors::get_vendor_profile))
        // Products (nested under vendors)
        .route(
            "/vendors/:vendor_id/products",
            post(products::create_product),
        )
        .route(
            "/vendors/:vendor_id/products",
            get(products::list_vendor_products),
        )
        // Leads
        .route("/leads", post(leads::create_lead))
        .route("/vendors/:vendor_id/leads", get(leads::list_vendor_leads))
        // Placement bids (nested under vendors)
        .route("/vendors/:vendor_id/bids", post(bids::create_bid))
        .route("/vendors/:vendor_id/bids", get(bids::list_vendor_bids))
        // Saved quotes (nested under users)
        .route("/users/:user_id/quotes", post(quotes::save_quote))
        .route("/users/:user_id/quotes", get(quotes::list_saved_quotes))
        .route("/quotes/:quote_id", delete(quotes::delete_quote))
        // Search & recommendations (open to anonymous callers)
        .route("/search", post(search::unified_search))
        .route("/recommend", post(recommend::recommend))
        // Subscriptions
        .route(
            "/subscriptions/checkout-session",
            post(subscriptions::create_checkout_session),
        )
        .route(
            "/subscriptions/portal-session",
            post(subscriptions::create_portal_session),
        )
        .route(
            "/subscriptions/status/:user_id",
            get(subscriptions::subscription_status),
        )
        .route("/subscriptions/webhook", post(subscriptions::webhook))
        // One-off payments via the DPO gateway
        .route("/payments", get(payments::list_payments))
        .route("/payments/token", post(payments::create_payment_token))
        .route("/payments/verify", post(payments::verify_payment))
        // Analytics
        .route("/analytics/events", post(analytics::log_event))
        // Admin
        .route(
            "/admin/analytics/stats",
            get(admin::get_dashboard_stats),
        )
        .route("/admin/vendors/pending", get(admin::list_pending_vendors))
        .route(
            "/admin/vendors/:user_id/status",
            put(admin::update_vendor_status),
        )
}
