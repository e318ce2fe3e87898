// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application (client-credentials) token cache for catalog search.

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};

use crate::config::Config;
use crate::error::AppError;
use crate::services::ebay::{ClientCredentials, EbayClient};
use crate::time_utils::token_expiry;

/// A cached token is replaced once it is within this many seconds of expiry.
const APP_TOKEN_MARGIN_SECS: i64 = 60;

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_APP_TOKEN_TTL_SECS: i64 = 3600;

/// Cached access token with expiry information.
#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Single-slot cache of the application token, shared by every request in
/// the process.
///
/// Concurrent misses are collapsed: one caller fetches while the others wait
/// on `fetch_lock` and then read the fresh slot.
pub struct ApplicationTokenCache {
    client: EbayClient,
    credentials: Option<ClientCredentials>,
    scope: String,
    slot: RwLock<Option<CachedToken>>,
    fetch_lock: Mutex<()>,
}

impl ApplicationTokenCache {
    pub fn new(client: EbayClient, config: &Config) -> Self {
        Self {
            client,
            credentials: ClientCredentials::from_config(config).ok(),
            scope: config.ebay_buy_scope.clone(),
            slot: RwLock::new(None),
            fetch_lock: Mutex::new(()),
        }
    }

    /// Return a bearer token for unauthenticated catalog calls, fetching a
    /// new one only when the cached token is missing or about to expire.
    pub async fn get_application_access_token(&self) -> Result<String, AppError> {
        if let Some(token) = self.fresh_cached(Utc::now()).await {
            return Ok(token);
        }

        let _guard = self.fetch_lock.lock().await;

        // Another caller may have refilled the slot while we waited.
        if let Some(token) = self.fresh_cached(Utc::now()).await {
            return Ok(token);
        }

        let credentials = self
            .credentials
            .as_ref()
            .ok_or(AppError::Configuration("EBAY_APP_ID/EBAY_CERT_ID"))?;

        let response = self
            .client
            .client_credentials_token(credentials, &self.scope)
            .await?;

        let ttl = response.expires_in.unwrap_or(DEFAULT_APP_TOKEN_TTL_SECS);
        let expires_at = token_expiry(Utc::now(), ttl);

        *self.slot.write().await = Some(CachedToken {
            access_token: response.access_token.clone(),
            expires_at,
        });

        tracing::info!(expires_at = %expires_at, "Application token refreshed");
        Ok(response.access_token)
    }

    /// Drop the cached token so the next call fetches a new one.
    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
    }

    async fn fresh_cached(&self, now: DateTime<Utc>) -> Option<String> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|cached| cached.expires_at > now + Duration::seconds(APP_TOKEN_MARGIN_SECS))
            .map(|cached| cached.access_token.clone())
    }
}
