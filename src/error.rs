// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! The sync and research endpoints render errors as JSON bodies. The OAuth
//! handshake never renders them directly; it turns them into a redirect code
//! via [`AppError::redirect_code`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::db::DbError;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Server configuration missing: {0}")]
    Configuration(&'static str),

    #[error("OAuth state mismatch")]
    StateMismatch,

    #[error("Authentication required")]
    NotAuthenticated,

    #[error("No marketplace connection for tenant")]
    NotConnected,

    #[error("Authorization code missing from callback")]
    MissingCode,

    #[error("Connection has no refresh token; re-authorization required")]
    MissingRefreshToken,

    #[error("Token exchange failed with status {status}: {body}")]
    TokenExchange { status: u16, body: String },

    #[error("Token refresh failed with status {status}: {body}")]
    RefreshFailed { status: u16, body: String },

    #[error("Application token request failed with status {status}: {body}")]
    AppToken { status: u16, body: String },

    #[error("Orders fetch failed with status {status}: {body}")]
    OrdersFetch {
        status: u16,
        body: String,
        hint: Option<&'static str>,
    },

    #[error("Catalog search failed with status {status}: {body}")]
    CatalogSearch {
        status: u16,
        body: String,
        by_image: bool,
    },

    #[error("Sales upsert failed: {0}")]
    SalesUpsert(String),

    #[error("Persist failed: {0}")]
    Persistence(String),

    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        AppError::Database(err.to_string())
    }
}

impl AppError {
    /// Error code carried in the `?error=` query parameter of the settings
    /// redirect at the end of a failed handshake.
    pub fn redirect_code(&self) -> String {
        match self {
            AppError::Configuration(_) => "server_config_missing".to_string(),
            AppError::StateMismatch => "state_mismatch".to_string(),
            AppError::NotAuthenticated => "not_authenticated".to_string(),
            AppError::MissingCode => "missing_code".to_string(),
            AppError::TokenExchange { status, .. } => format!("token_exchange_failed:{}", status),
            AppError::Persistence(msg) => format!("persist_failed:{}", msg),
            AppError::Upstream(_) => "token_exchange_failed:unreachable".to_string(),
            other => format!("unexpected:{}", other),
        }
    }

    /// True when the provider rejected the credentials outright and the user
    /// has to go through the consent flow again.
    pub fn requires_reauthorization(&self) -> bool {
        match self {
            AppError::MissingRefreshToken => true,
            AppError::RefreshFailed { status, .. } | AppError::TokenExchange { status, .. } => {
                matches!(status, 400 | 401 | 403)
            }
            _ => false,
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'static str>,
}

impl ErrorResponse {
    fn code(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            status: None,
            detail: None,
            hint: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::NotAuthenticated => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::code("not_authenticated"),
            ),
            AppError::NotConnected => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::code("not_connected"),
            ),
            AppError::BadRequest(code) => (StatusCode::BAD_REQUEST, ErrorResponse::code(code)),
            AppError::OrdersFetch { status, body, hint } => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse {
                    error: "orders_fetch_failed".to_string(),
                    status: Some(*status),
                    detail: Some(body.clone()),
                    hint: *hint,
                },
            ),
            AppError::CatalogSearch {
                status,
                body,
                by_image,
            } => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse {
                    error: if *by_image {
                        "image_browse_failed"
                    } else {
                        "browse_failed"
                    }
                    .to_string(),
                    status: Some(*status),
                    detail: Some(body.clone()),
                    hint: None,
                },
            ),
            AppError::Configuration(what) => {
                tracing::error!(missing = what, "Server configuration missing");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::code("server_config_missing"),
                )
            }
            AppError::MissingRefreshToken => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::code("missing_refresh_token"),
            ),
            AppError::RefreshFailed { status, body } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::code(format!("refresh_failed:{}:{}", status, body)),
            ),
            AppError::AppToken { status, body } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::code(format!("app_token_failed:{}:{}", status, body)),
            ),
            AppError::SalesUpsert(msg) => {
                tracing::error!(error = %msg, "Sales upsert failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::code(format!("sales_upsert_failed:{}", msg)),
                )
            }
            AppError::Persistence(msg) => {
                tracing::error!(error = %msg, "Persistence failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::code(format!("persist_failed:{}", msg)),
                )
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::code("database_error"),
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::code("internal_error"),
                )
            }
            AppError::Upstream(msg) => {
                tracing::warn!(error = %msg, "Upstream request failed");
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorResponse::code("upstream_unreachable"),
                )
            }
            AppError::StateMismatch | AppError::MissingCode => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::code(self.redirect_code()),
            ),
            AppError::TokenExchange { status, .. } => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse {
                    error: "token_exchange_failed".to_string(),
                    status: Some(*status),
                    detail: None,
                    hint: None,
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Cut an upstream response body down to at most `max_chars` characters.
pub fn excerpt(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_codes() {
        assert_eq!(AppError::StateMismatch.redirect_code(), "state_mismatch");
        assert_eq!(AppError::MissingCode.redirect_code(), "missing_code");
        assert_eq!(
            AppError::Configuration("EBAY_APP_ID").redirect_code(),
            "server_config_missing"
        );
        assert_eq!(
            AppError::TokenExchange {
                status: 401,
                body: "invalid_client".to_string()
            }
            .redirect_code(),
            "token_exchange_failed:401"
        );
        assert_eq!(
            AppError::Persistence("row violates policy".to_string()).redirect_code(),
            "persist_failed:row violates policy"
        );
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::NotAuthenticated, StatusCode::UNAUTHORIZED),
            (AppError::NotConnected, StatusCode::BAD_REQUEST),
            (
                AppError::OrdersFetch {
                    status: 403,
                    body: String::new(),
                    hint: None,
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                AppError::RefreshFailed {
                    status: 400,
                    body: String::new(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::SalesUpsert("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn test_upstream_failure_hides_transport_detail() {
        let response = AppError::Upstream(
            "Orders request failed: error sending request for url (http://10.0.0.7/)".to_string(),
        )
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({"error": "upstream_unreachable"}));
    }

    #[test]
    fn test_requires_reauthorization() {
        assert!(AppError::MissingRefreshToken.requires_reauthorization());
        assert!(AppError::RefreshFailed {
            status: 401,
            body: String::new()
        }
        .requires_reauthorization());
        assert!(!AppError::RefreshFailed {
            status: 503,
            body: String::new()
        }
        .requires_reauthorization());
    }

    #[test]
    fn test_excerpt_is_char_safe() {
        assert_eq!(excerpt("héllo wörld", 4), "héll");
        assert_eq!(excerpt("short", 200), "short");
    }
}
