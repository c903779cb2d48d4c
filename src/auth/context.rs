use super::Claims;

/// Authenticated user context extracted from a verified JWT.
///
/// Roles are not trusted from the token; handlers that need one load the
/// user row (see `authorize`).
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Provider-issued user ID (the token's `sub` claim)
    pub user_id: String,

    /// User email if the provider supplied one
    pub email: Option<String>,

    /// Display name if the provider supplied one
    pub name: Option<String>,

    /// Token issuer
    pub issuer: String,

    /// Token audience
    pub audience: String,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims) -> Result<Self, &'static str> {
        if claims.sub.trim().is_empty() {
            return Err("Empty subject in token");
        }

        Ok(Self {
            user_id: claims.sub.clone(),
            email: claims.email.clone(),
            name: claims.name.clone(),
            issuer: claims.iss.clone(),
            audience: claims.aud.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str) -> Claims {
        Claims {
            sub: sub.to_string(),
            aud: "covermarket".to_string(),
            iss: "https://issuer.example.com".to_string(),
            iat: 0,
            exp: 0,
            email: Some("user@example.com".to_string()),
            email_verified: Some(true),
            name: None,
        }
    }

    #[test]
    fn context_carries_subject_verbatim() {
        let ctx = AuthContext::from_claims(&claims("auth0|abc123")).unwrap();
        assert_eq!(ctx.user_id, "auth0|abc123");
        assert_eq!(ctx.email.as_deref(), Some("user@example.com"));
    }

    #[test]
    fn empty_subject_is_rejected() {
        assert!(AuthContext::from_claims(&claims("  ")).is_err());
    }
}
