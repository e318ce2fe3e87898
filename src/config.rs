// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Marketplace credentials are optional at load time. Operations that need
//! them report a configuration error per request instead of refusing to boot.

use std::env;

/// Name of the marketplace this service talks to, used as the `marketplace`
/// column of sales and the `provider` of sync state.
pub const MARKETPLACE: &str = "ebay";

const DEFAULT_SCOPE: &str = "https://api.ebay.com/oauth/api_scope";

/// Which eBay environment to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EbayEnvironment {
    Sandbox,
    Production,
}

impl EbayEnvironment {
    /// Parse the `EBAY_ENV` value. Anything other than `production` is sandbox.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("production") {
            Self::Production
        } else {
            Self::Sandbox
        }
    }

    fn authorize_url(self) -> &'static str {
        match self {
            Self::Production => "https://auth.ebay.com/oauth2/authorize",
            Self::Sandbox => "https://auth.sandbox.ebay.com/oauth2/authorize",
        }
    }

    fn token_url(self) -> &'static str {
        match self {
            Self::Production => "https://api.ebay.com/identity/v1/oauth2/token",
            Self::Sandbox => "https://api.sandbox.ebay.com/identity/v1/oauth2/token",
        }
    }

    fn api_base(self) -> &'static str {
        match self {
            Self::Production => "https://api.ebay.com",
            Self::Sandbox => "https://api.sandbox.ebay.com",
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- eBay application (non-sensitive) ---
    pub ebay_env: EbayEnvironment,
    /// eBay App ID (OAuth client id)
    pub ebay_client_id: Option<String>,
    /// eBay RuName: the pre-registered redirect identifier, not a URL
    pub ebay_ru_name: Option<String>,
    /// Scope string requested during the user consent flow
    pub ebay_scope: String,
    /// Scope string for the client-credentials (catalog search) token
    pub ebay_buy_scope: String,
    pub ebay_marketplace_id: String,
    pub ebay_auth_base_url: Option<String>,
    pub ebay_token_url: Option<String>,
    pub ebay_api_base_url: Option<String>,

    // --- Service ---
    /// Origin of the web app hosting `/settings` and `/login`
    pub app_url: String,
    pub port: u16,
    pub http_timeout_secs: u64,
    /// Reject callbacks that arrive without a stored state cookie
    pub oauth_state_strict: bool,
    /// GCP project for Firestore; in-memory store when unset
    pub gcp_project_id: Option<String>,

    // --- Secrets ---
    /// eBay Cert ID (OAuth client secret)
    pub ebay_client_secret: Option<String>,
    /// HMAC key for session tokens and the OAuth state cookie
    pub session_signing_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            ebay_env: EbayEnvironment::parse(
                &env::var("EBAY_ENV").unwrap_or_else(|_| "sandbox".to_string()),
            ),
            ebay_client_id: optional_var("EBAY_APP_ID"),
            ebay_ru_name: optional_var("EBAY_RU_NAME"),
            ebay_scope: optional_var("EBAY_SCOPE").unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
            ebay_buy_scope: optional_var("EBAY_BUY_SCOPE")
                .unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
            ebay_marketplace_id: optional_var("EBAY_MARKETPLACE_ID")
                .unwrap_or_else(|| "EBAY_US".to_string()),
            ebay_auth_base_url: optional_var("EBAY_AUTH_BASE_URL"),
            ebay_token_url: optional_var("EBAY_TOKEN_URL"),
            ebay_api_base_url: optional_var("EBAY_API_BASE_URL"),

            app_url: optional_var("APP_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(20),
            oauth_state_strict: optional_var("OAUTH_STATE_STRICT")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            gcp_project_id: optional_var("GCP_PROJECT_ID"),

            ebay_client_secret: optional_var("EBAY_CERT_ID"),
            session_signing_key: env::var("SESSION_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("SESSION_SIGNING_KEY"))?
                .into_bytes(),
        })
    }

    /// Deterministic config for tests. Endpoints point nowhere until a test
    /// overrides them with a mock server.
    pub fn test_default() -> Self {
        Self {
            ebay_env: EbayEnvironment::Sandbox,
            ebay_client_id: Some("test_client_id".to_string()),
            ebay_ru_name: Some("Test_RuName".to_string()),
            ebay_scope: "https://api.ebay.com/oauth/api_scope/sell.fulfillment.readonly"
                .to_string(),
            ebay_buy_scope: DEFAULT_SCOPE.to_string(),
            ebay_marketplace_id: "EBAY_US".to_string(),
            ebay_auth_base_url: None,
            ebay_token_url: None,
            ebay_api_base_url: None,
            app_url: "http://localhost:3000".to_string(),
            port: 8080,
            http_timeout_secs: 5,
            oauth_state_strict: false,
            gcp_project_id: None,
            ebay_client_secret: Some("test_secret".to_string()),
            session_signing_key: b"test_session_key_32_bytes_min!!!".to_vec(),
        }
    }

    /// Point every eBay endpoint at `base` (a mock server in tests, a proxy
    /// in staging).
    pub fn with_endpoint_base(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.ebay_auth_base_url = Some(format!("{}/oauth2/authorize", base));
        self.ebay_token_url = Some(format!("{}/identity/v1/oauth2/token", base));
        self.ebay_api_base_url = Some(base.to_string());
        self
    }

    pub fn authorize_url(&self) -> &str {
        self.ebay_auth_base_url
            .as_deref()
            .unwrap_or_else(|| self.ebay_env.authorize_url())
    }

    pub fn token_url(&self) -> &str {
        self.ebay_token_url
            .as_deref()
            .unwrap_or_else(|| self.ebay_env.token_url())
    }

    pub fn api_base_url(&self) -> &str {
        self.ebay_api_base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .unwrap_or_else(|| self.ebay_env.api_base())
    }

    /// Cookies carry `Secure` only against production eBay.
    pub fn secure_cookies(&self) -> bool {
        self.ebay_env == EbayEnvironment::Production
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
