use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lead lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    New,
    Contacted,
    Closed,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Closed => "closed",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "contacted" => Self::Contacted,
            "closed" => Self::Closed,
            _ => Self::New,
        }
    }
}

/// Response DTO for a consumer inquiry routed to a vendor
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadResponse {
    pub id: Uuid,
    pub user_id: String,
    pub vendor_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<Uuid>,
    pub category: String,
    pub questionnaire_answers: serde_json::Value,
    pub status: LeadStatus,
    pub routed_via: String,
    pub consent_given: bool,
    pub created_at: DateTime<Utc>,
}

/// Request DTO for creating a lead
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadRequest {
    pub vendor_id: String,
    #[serde(default)]
    pub product_id: Option<Uuid>,
    pub category: String,
    #[serde(default)]
    pub questionnaire_answers: serde_json::Value,
}
