use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Product listing status. Only active products are visible to consumers,
/// and a product may only be active while its owning vendor is approved.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Draft,
    Active,
}

impl Default for ProductStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "active" => Self::Active,
            _ => Self::Draft,
        }
    }
}

/// Response DTO for an insurance product
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: Uuid,
    pub vendor_id: String,
    pub name: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub premium: f64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage_amount: Option<f64>,
    pub requirements: Vec<String>,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for creating a product
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    pub premium: f64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub coverage_amount: Option<f64>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub status: ProductStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_defaults_to_draft() {
        let req: CreateProductRequest = serde_json::from_str(
            r#"{"name": "Motor Comprehensive", "category": "Motor", "premium": 450.0}"#,
        )
        .unwrap();
        assert_eq!(req.status, ProductStatus::Draft);
        assert!(req.requirements.is_empty());
    }

    #[test]
    fn unknown_status_string_falls_back_to_draft() {
        assert_eq!(ProductStatus::from_str("archived"), ProductStatus::Draft);
        assert_eq!(ProductStatus::from_str("active"), ProductStatus::Active);
    }
}
