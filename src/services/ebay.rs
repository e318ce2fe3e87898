// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! eBay API client.
//!
//! Handles:
//! - OAuth token endpoint calls (code exchange, refresh, client credentials)
//! - Fulfillment order listing
//! - Browse catalog search
//!
//! Every call is single-shot with a bounded timeout. Retries belong to the
//! caller.

use reqwest::header::{ACCEPT, CACHE_CONTROL};
use serde::Deserialize;
use std::time::Duration;

use crate::config::Config;
use crate::error::{excerpt, AppError};

const MARKETPLACE_HEADER: &str = "X-EBAY-C-MARKETPLACE-ID";

/// Max body chars echoed back from a failed token exchange.
const TOKEN_EXCHANGE_EXCERPT: usize = 200;
const REFRESH_EXCERPT: usize = 120;
const APP_TOKEN_EXCERPT: usize = 200;
const API_EXCERPT: usize = 300;

/// Upper bound on orders fetched per sync; there is no pagination loop.
pub const ORDERS_PAGE_LIMIT: u32 = 20;

/// OAuth client credentials.
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    /// Pull credentials from config, failing if either half is missing.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Ok(Self {
            client_id: config
                .ebay_client_id
                .clone()
                .ok_or(AppError::Configuration("EBAY_APP_ID"))?,
            client_secret: config
                .ebay_client_secret
                .clone()
                .ok_or(AppError::Configuration("EBAY_CERT_ID"))?,
        })
    }
}

/// Token endpoint response. Only `access_token` is guaranteed.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Space-delimited granted scopes
    #[serde(default)]
    pub scope: Option<String>,
}

/// Outcome of a non-success token endpoint call, before it is classified
/// into the caller's error variant.
enum TokenFailure {
    Rejected { status: u16, body: String },
    Transport(AppError),
}

/// eBay API client.
#[derive(Clone)]
pub struct EbayClient {
    http: reqwest::Client,
    token_url: String,
    api_base: String,
    marketplace_id: String,
}

impl EbayClient {
    /// Create a client against the endpoints in `config`.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            http,
            token_url: config.token_url().to_string(),
            api_base: config.api_base_url().to_string(),
            marketplace_id: config.ebay_marketplace_id.clone(),
        })
    }

    // ─── OAuth Token Endpoint ────────────────────────────────────────────────

    /// Exchange a one-time authorization code for user tokens.
    pub async fn exchange_code(
        &self,
        credentials: &ClientCredentials,
        code: &str,
        ru_name: &str,
    ) -> Result<TokenResponse, AppError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", ru_name),
        ];

        self.request_token(credentials, &form)
            .await
            .map_err(|failure| match failure {
                TokenFailure::Rejected { status, body } => AppError::TokenExchange {
                    status,
                    body: excerpt(&body, TOKEN_EXCHANGE_EXCERPT),
                },
                TokenFailure::Transport(e) => e,
            })
    }

    /// Mint a new access token from a refresh token.
    pub async fn refresh_access_token(
        &self,
        credentials: &ClientCredentials,
        refresh_token: &str,
    ) -> Result<TokenResponse, AppError> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        self.request_token(credentials, &form)
            .await
            .map_err(|failure| match failure {
                TokenFailure::Rejected { status, body } => AppError::RefreshFailed {
                    status,
                    body: excerpt(&body, REFRESH_EXCERPT),
                },
                TokenFailure::Transport(e) => e,
            })
    }

    /// Client-credentials grant for application (non-user) calls.
    pub async fn client_credentials_token(
        &self,
        credentials: &ClientCredentials,
        scope: &str,
    ) -> Result<TokenResponse, AppError> {
        let form = [("grant_type", "client_credentials"), ("scope", scope)];

        self.request_token(credentials, &form)
            .await
            .map_err(|failure| match failure {
                TokenFailure::Rejected { status, body } => AppError::AppToken {
                    status,
                    body: excerpt(&body, APP_TOKEN_EXCERPT),
                },
                TokenFailure::Transport(e) => e,
            })
    }

    /// POST a grant to the token endpoint with HTTP Basic client auth.
    /// Token responses must never come from a cache.
    async fn request_token(
        &self,
        credentials: &ClientCredentials,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse, TokenFailure> {
        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .header(CACHE_CONTROL, "no-store")
            .form(form)
            .send()
            .await
            .map_err(|e| {
                TokenFailure::Transport(AppError::Upstream(format!(
                    "Token request failed: {}",
                    e
                )))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "eBay token endpoint rejected request");
            return Err(TokenFailure::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        response.json().await.map_err(|e| {
            TokenFailure::Transport(AppError::Upstream(format!(
                "Failed to parse token response: {}",
                e
            )))
        })
    }

    // ─── Sell Fulfillment ────────────────────────────────────────────────────

    /// List orders created at or after `since` (RFC3339), first page only.
    pub async fn list_orders(
        &self,
        access_token: &str,
        since: &str,
    ) -> Result<serde_json::Value, AppError> {
        let url = format!("{}/sell/fulfillment/v1/order", self.api_base);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/json")
            .header(MARKETPLACE_HEADER, &self.marketplace_id)
            .query(&[
                ("filter", format!("creationdate:[{}..]", since)),
                ("limit", ORDERS_PAGE_LIMIT.to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Orders request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::OrdersFetch {
                status: status.as_u16(),
                body: excerpt(&body, API_EXCERPT),
                hint: orders_hint(status.as_u16()),
            });
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Orders JSON parse error: {}", e)))
    }

    // ─── Buy Browse ──────────────────────────────────────────────────────────

    /// Keyword search over active listings.
    pub async fn search_items(
        &self,
        app_token: &str,
        query: &str,
        limit: u32,
    ) -> Result<serde_json::Value, AppError> {
        let url = format!("{}/buy/browse/v1/item_summary/search", self.api_base);
        let params = [("q", query.to_string()), ("limit", limit.to_string())];
        self.browse(&url, app_token, &params, false).await
    }

    /// Visual search seeded by a publicly reachable image URL.
    pub async fn search_items_by_image(
        &self,
        app_token: &str,
        image_url: &str,
        limit: u32,
    ) -> Result<serde_json::Value, AppError> {
        let url = format!(
            "{}/buy/browse/v1/item_summary/search_by_image",
            self.api_base
        );
        let params = [
            ("image_url", image_url.to_string()),
            ("limit", limit.to_string()),
        ];
        self.browse(&url, app_token, &params, true).await
    }

    async fn browse(
        &self,
        url: &str,
        app_token: &str,
        params: &[(&str, String)],
        by_image: bool,
    ) -> Result<serde_json::Value, AppError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(app_token)
            .header(ACCEPT, "application/json")
            .header(MARKETPLACE_HEADER, &self.marketplace_id)
            .query(params)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Browse request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::CatalogSearch {
                status: status.as_u16(),
                body: excerpt(&body, API_EXCERPT),
                by_image,
            });
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Browse JSON parse error: {}", e)))
    }
}

/// Operator-facing hint for a failed orders fetch. Advisory only.
pub fn orders_hint(status: u16) -> Option<&'static str> {
    match status {
        403 => Some("Check scopes: include sell.fulfillment.readonly and re-connect."),
        400 => Some("Verify filter format and marketplace header."),
        _ => None,
    }
}
