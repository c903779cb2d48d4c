use serde::{Deserialize, Serialize};

/// Subscription tiers. Vendor tiers bound listing/bidding features,
/// consumer tiers bound compare/save quotas and AI depth.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Free,
    VendorBronze,
    VendorSilver,
    VendorGold,
    UserLite,
    UserPlus,
    UserUltimate,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::VendorBronze => "vendor_bronze",
            Self::VendorSilver => "vendor_silver",
            Self::VendorGold => "vendor_gold",
            Self::UserLite => "user_lite",
            Self::UserPlus => "user_plus",
            Self::UserUltimate => "user_ultimate",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "vendor_bronze" => Self::VendorBronze,
            "vendor_silver" => Self::VendorSilver,
            "vendor_gold" => Self::VendorGold,
            "user_lite" => Self::UserLite,
            "user_plus" => Self::UserPlus,
            "user_ultimate" => Self::UserUltimate,
            _ => Self::Free,
        }
    }
}

/// Feature quotas for a tier. Vendor and consumer tiers populate different
/// fields; absent fields are omitted from JSON, mirroring the stored shape.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TierLimits {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bidding: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analytics: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai: Option<String>,
}

/// Effectively-unlimited sentinel used by the top tiers.
const UNLIMITED: i64 = 9999;

/// Default product quota when no subscription is on file (starter terms).
pub const DEFAULT_PRODUCT_QUOTA: i64 = 3;

/// Default saved-quote quota when no subscription is on file.
pub const DEFAULT_SAVE_QUOTA: i64 = 5;

/// The tier quota table.
pub fn tier_limits(tier: Tier) -> TierLimits {
    let vendor = |products: i64, bidding: bool, analytics: &str| TierLimits {
        products: Some(products),
        bidding: Some(bidding),
        analytics: Some(analytics.to_string()),
        ..Default::default()
    };
    let consumer = |compare: i64, save: i64, ai: &str| TierLimits {
        compare: Some(compare),
        save: Some(save),
        ai: Some(ai.to_string()),
        ..Default::default()
    };

    match tier {
        Tier::Free => TierLimits::default(),
        Tier::VendorBronze => vendor(3, false, "basic"),
        Tier::VendorSilver => vendor(10, true, "advanced"),
        Tier::VendorGold => vendor(UNLIMITED, true, "full"),
        Tier::UserLite => consumer(3, 5, "standard"),
        Tier::UserPlus => consumer(UNLIMITED, UNLIMITED, "savings"),
        Tier::UserUltimate => consumer(UNLIMITED, UNLIMITED, "advanced"),
    }
}

/// Product quota for a tier, with the starter default for tiers that don't
/// carry one.
pub fn product_quota(tier: Tier) -> i64 {
    tier_limits(tier).products.unwrap_or(DEFAULT_PRODUCT_QUOTA)
}

/// Saved-quote quota for a tier, with the free default.
pub fn save_quota(tier: Tier) -> i64 {
    tier_limits(tier).save.unwrap_or(DEFAULT_SAVE_QUOTA)
}

/// Whether a tier grants access to placement bidding.
pub fn bidding_allowed(tier: Tier) -> bool {
    tier_limits(tier).bidding.unwrap_or(false)
}

/// Map a Stripe price id to its tier. Unknown prices stay on free terms
/// and are logged at the webhook.
pub fn tier_for_price(price_id: &str) -> Option<Tier> {
    match price_id {
        "price_bronze_id" => Some(Tier::VendorBronze),
        "price_silver_id" => Some(Tier::VendorSilver),
        "price_gold_id" => Some(Tier::VendorGold),
        "price_lite_id" => Some(Tier::UserLite),
        "price_plus_id" => Some(Tier::UserPlus),
        "price_ultimate_id" => Some(Tier::UserUltimate),
        _ => None,
    }
}

/// Whether the subscriber is a consumer or a vendor account.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubscriberType {
    User,
    Vendor,
}

/// Request DTO for creating a Stripe Checkout session
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionRequest {
    pub price_id: String,
    pub user_id: String,
    pub user_type: SubscriberType,
    pub success_url: String,
    pub cancel_url: String,
}

/// Request DTO for creating a billing-portal session
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalSessionRequest {
    pub customer_id: String,
    pub return_url: String,
}

/// Response DTO for subscription status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionStatusResponse {
    pub tier: String,
    pub status: String,
    pub limits: TierLimits,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bronze_vendors_cannot_bid() {
        assert!(!bidding_allowed(Tier::VendorBronze));
        assert!(bidding_allowed(Tier::VendorSilver));
        assert!(bidding_allowed(Tier::VendorGold));
    }

    #[test]
    fn quotas_fall_back_to_starter_terms() {
        assert_eq!(product_quota(Tier::Free), DEFAULT_PRODUCT_QUOTA);
        assert_eq!(product_quota(Tier::VendorSilver), 10);
        assert_eq!(save_quota(Tier::Free), DEFAULT_SAVE_QUOTA);
        assert_eq!(save_quota(Tier::UserPlus), 9999);
    }

    #[test]
    fn consumer_tiers_do_not_leak_vendor_fields() {
        let limits = tier_limits(Tier::UserLite);
        assert!(limits.products.is_none());
        assert!(limits.bidding.is_none());
        assert_eq!(limits.save, Some(5));

        let json = serde_json::to_value(&limits).unwrap();
        assert!(json.get("products").is_none());
        assert_eq!(json["save"], 5);
    }

    #[test]
    fn price_map_covers_all_paid_tiers() {
        assert_eq!(tier_for_price("price_gold_id"), Some(Tier::VendorGold));
        assert_eq!(tier_for_price("price_lite_id"), Some(Tier::UserLite));
        assert_eq!(tier_for_price("price_mystery"), None);
    }

    #[test]
    fn tier_names_round_trip() {
        for tier in [
            Tier::Free,
            Tier::VendorBronze,
            Tier::VendorSilver,
            Tier::VendorGold,
            Tier::UserLite,
            Tier::UserPlus,
            Tier::UserUltimate,
        ] {
            assert_eq!(Tier::from_str(tier.as_str()), tier);
        }
    }
}
