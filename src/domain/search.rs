use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Hits scoring at or below this are dropped from search results.
pub const RELEVANCE_THRESHOLD: f64 = 30.0;

/// Category matches are worth less than name matches.
pub const CATEGORY_DISCOUNT: f64 = 0.7;

/// Maximum vendor hits returned per search.
pub const MAX_VENDOR_HITS: usize = 10;

/// Maximum product hits returned per search.
pub const MAX_PRODUCT_HITS: usize = 20;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    #[default]
    All,
    Vendors,
    Products,
}

impl SearchType {
    pub fn includes_vendors(&self) -> bool {
        matches!(self, Self::All | Self::Vendors)
    }

    pub fn includes_products(&self) -> bool {
        matches!(self, Self::All | Self::Products)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SearchFilters {
    #[serde(rename = "type", default)]
    pub kind: SearchType,
}

/// Request DTO for the unified search endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub filters: SearchFilters,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorHit {
    pub id: String,
    pub company_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductHit {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub premium: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub requirements: Vec<String>,
    pub vendor_id: String,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compatibility_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compatibility_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct SearchResults {
    pub vendors: Vec<VendorHit>,
    pub products: Vec<ProductHit>,
}

/// Fuzzy relevance score in [0, 100].
///
/// Substring containment is a full match. Otherwise each query word found
/// in the text contributes its share of the query length, so long matched
/// words dominate short ones.
pub fn fuzzy_score(query: &str, text: &str) -> f64 {
    if query.is_empty() || text.is_empty() {
        return 0.0;
    }

    let query = query.to_lowercase();
    let text = text.to_lowercase();

    if text.contains(&query) {
        return 100.0;
    }

    let query_len = query.len() as f64;
    let mut score = 0.0;
    for word in query.split_whitespace() {
        if text.contains(word) {
            score += word.len() as f64 / query_len * 100.0;
        }
    }

    score.min(100.0)
}

/// Blended product relevance: category matches count at a discount.
pub fn product_score(name_score: f64, category_score: f64) -> f64 {
    name_score.max(category_score * CATEGORY_DISCOUNT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_containment_is_a_full_match() {
        assert_eq!(fuzzy_score("blanc", "Blanc Assurance Ltd"), 100.0);
        assert_eq!(fuzzy_score("MOTOR", "comprehensive motor plan"), 100.0);
    }

    #[test]
    fn empty_inputs_score_zero() {
        assert_eq!(fuzzy_score("", "anything"), 0.0);
        assert_eq!(fuzzy_score("anything", ""), 0.0);
    }

    #[test]
    fn partial_word_hits_are_length_weighted() {
        // "family" (6 of 13 chars incl. space) matches, "premium" does not.
        let score = fuzzy_score("family premim", "family cover for everyone");
        assert!(score > 40.0 && score < 50.0, "score was {score}");
    }

    #[test]
    fn score_never_exceeds_cap() {
        let score = fuzzy_score("motor motor motor", "motor");
        assert!(score <= 100.0);
    }

    #[test]
    fn no_overlap_scores_zero() {
        assert_eq!(fuzzy_score("travel", "funeral plan"), 0.0);
    }

    #[test]
    fn category_matches_are_discounted() {
        assert_eq!(product_score(0.0, 100.0), 70.0);
        assert_eq!(product_score(80.0, 100.0), 80.0);
    }

    #[test]
    fn threshold_drops_weak_hits() {
        // Single short word out of a long query stays under the threshold.
        let score = fuzzy_score("cheap car insurance gaborone", "car wash");
        assert!(score <= RELEVANCE_THRESHOLD);
    }

    #[test]
    fn search_type_defaults_to_all() {
        let req: SearchRequest = serde_json::from_str(r#"{"query": "motor"}"#).unwrap();
        assert!(req.filters.kind.includes_vendors());
        assert!(req.filters.kind.includes_products());

        let req: SearchRequest =
            serde_json::from_str(r#"{"query": "motor", "filters": {"type": "vendors"}}"#).unwrap();
        assert!(req.filters.kind.includes_vendors());
        assert!(!req.filters.kind.includes_products());
    }
}
