use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placement bid status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlacementBidStatus {
    Active,
    Paused,
}

impl PlacementBidStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "paused" => Self::Paused,
            _ => Self::Active,
        }
    }
}

/// A vendor's bid for recommendation placement in a category.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementBidResponse {
    pub id: Uuid,
    pub vendor_id: String,
    pub category_target: String,
    pub bid_amount: f64,
    pub priority_slot: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_spend: Option<f64>,
    pub status: PlacementBidStatus,
    pub start_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Request DTO for creating a placement bid
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlacementBidRequest {
    pub category_target: String,
    pub bid_amount: f64,
    #[serde(default)]
    pub priority_slot: Option<i32>,
    #[serde(default)]
    pub max_spend: Option<f64>,
}
