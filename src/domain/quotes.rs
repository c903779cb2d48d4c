use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A quote a consumer chose to keep. The quote payload is stored verbatim;
/// vendor contact fields are attached at read time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedQuoteResponse {
    pub id: Uuid,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<Uuid>,
    pub quote: serde_json::Value,
    pub saved_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_company_name: Option<String>,
}

/// Request DTO for saving a quote. Everything beyond the linkage ids is
/// kept as an opaque payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveQuoteRequest {
    #[serde(default)]
    pub vendor_id: Option<String>,
    #[serde(default)]
    pub product_id: Option<Uuid>,
    #[serde(flatten)]
    pub quote: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_payload_is_captured_by_flatten() {
        let req: SaveQuoteRequest = serde_json::from_str(
            r#"{"vendorId": "v1", "premium": 320.5, "productName": "Home Basic"}"#,
        )
        .unwrap();
        assert_eq!(req.vendor_id.as_deref(), Some("v1"));
        assert_eq!(req.quote["premium"], 320.5);
        assert_eq!(req.quote["productName"], "Home Basic");
    }
}
