//! Unified API error handling
//!
//! Provides consistent error responses across all endpoints.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Tier quota exhausted or feature locked behind a higher tier. Quota
    /// errors carry the limit and current usage so the client can render an
    /// upgrade prompt; feature gates carry neither.
    #[error("{message}")]
    UpgradeRequired {
        message: String,
        limit: Option<i64>,
        current: Option<i64>,
    },

    /// Upstream provider (payment gateway, AI service) rejected the call.
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(rename = "upgradeRequired", skip_serializing_if = "Option::is_none")]
    pub upgrade_required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<i64>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            upgrade_required: None,
            limit: None,
            current: None,
        }
    }
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn upgrade_required(msg: impl Into<String>, limit: i64, current: i64) -> Self {
        Self::UpgradeRequired {
            message: msg.into(),
            limit: Some(limit),
            current: Some(current),
        }
    }

    pub fn feature_locked(msg: impl Into<String>) -> Self {
        Self::UpgradeRequired {
            message: msg.into(),
            limit: None,
            current: None,
        }
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(anyhow::anyhow!(msg.into()))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) | Self::UpgradeRequired { .. } => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Conflict(_) => "CONFLICT",
            Self::UpgradeRequired { .. } => "UPGRADE_REQUIRED",
            Self::Upstream(_) => "UPSTREAM_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg)
            | Self::Upstream(msg)
            | Self::UpgradeRequired { message: msg, .. } => msg.clone(),
            // Don't leak internal error details
            Self::Internal(_) | Self::Database(_) => "An internal error occurred".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Log internal errors
        match &self {
            Self::Internal(e) => {
                tracing::error!(error = ?e, "Internal server error");
            }
            Self::Database(e) => {
                tracing::error!(error = ?e, "Database error");
            }
            _ => {
                tracing::warn!(error = %self, "API error");
            }
        }

        let status = self.status_code();
        let mut body = ErrorResponse::new(self.error_code(), self.public_message());

        if let Self::UpgradeRequired { limit, current, .. } = &self {
            body.upgrade_required = Some(true);
            body.limit = *limit;
            body.current = *current;
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_error_carries_upgrade_fields() {
        let err = ApiError::upgrade_required("Product limit reached", 3, 3);
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.error_code(), "UPGRADE_REQUIRED");

        if let ApiError::UpgradeRequired { limit, current, .. } = err {
            assert_eq!((limit, current), (Some(3), Some(3)));
        } else {
            panic!("expected UpgradeRequired");
        }
    }

    #[test]
    fn feature_gate_has_no_quota_numbers() {
        let err = ApiError::feature_locked("Bidding requires a higher tier");
        if let ApiError::UpgradeRequired { limit, current, .. } = err {
            assert_eq!((limit, current), (None, None));
        } else {
            panic!("expected UpgradeRequired");
        }
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let err = ApiError::internal("connection string was postgres://secret");
        assert_eq!(err.public_message(), "An internal error occurred");
    }

    #[test]
    fn upgrade_fields_are_omitted_for_plain_errors() {
        let body = ErrorResponse::new("NOT_FOUND", "Vendor not found");
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("upgradeRequired").is_none());
        assert!(json.get("limit").is_none());
    }
}
