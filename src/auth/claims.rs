use serde::{Deserialize, Serialize};

/// JWT claims issued by the identity provider.
///
/// Subjects are provider-issued opaque strings; the platform keys user rows
/// by them directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Audience
    pub aud: String,

    /// Issuer
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// User email - optional
    #[serde(default)]
    pub email: Option<String>,

    /// Whether the provider has verified the email - optional
    #[serde(default)]
    pub email_verified: Option<bool>,

    /// Display name - optional
    #[serde(default)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_claims_default() {
        let claims: Claims = serde_json::from_str(
            r#"{
                "sub": "fb-uid-123",
                "aud": "covermarket",
                "iss": "https://securetoken.example.com/covermarket",
                "iat": 1700000000,
                "exp": 1700003600
            }"#,
        )
        .unwrap();

        assert_eq!(claims.sub, "fb-uid-123");
        assert!(claims.email.is_none());
        assert!(claims.name.is_none());
    }
}
