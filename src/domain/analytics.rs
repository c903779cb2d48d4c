use serde::{Deserialize, Serialize};

/// Request DTO for logging a funnel event
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEventRequest {
    pub event_type: String,
    /// Anonymous clients may self-report an id; an authenticated caller's
    /// token identity always wins.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Conversion funnel: product views -> generated quotes -> vendor contacts
#[derive(Debug, Clone, Serialize)]
pub struct FunnelStats {
    pub views: i64,
    pub quotes: i64,
    pub leads: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryStat {
    pub name: String,
    pub value: i64,
}

/// Response DTO for the admin dashboard
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub funnel: FunnelStats,
    pub category_stats: Vec<CategoryStat>,
    pub new_users_count: i64,
}
