// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Just-in-time refresh of a tenant's user access token.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::db::Datastore;
use crate::error::AppError;
use crate::models::Connection;
use crate::services::ebay::{ClientCredentials, EbayClient};
use crate::time_utils::token_expiry;

/// Margin before token expiration when we proactively refresh (5 minutes).
const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// Shared refresh locks type, keyed by tenant id.
pub type RefreshLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// True unless the connection holds an access token with at least the
/// refresh margin left before expiry.
pub fn needs_refresh(connection: &Connection, now: DateTime<Utc>) -> bool {
    match (&connection.access_token, connection.access_token_expires_at) {
        (Some(_), Some(expires_at)) => {
            expires_at - now < Duration::seconds(TOKEN_REFRESH_MARGIN_SECS)
        }
        _ => true,
    }
}

/// Keeps a tenant's access token usable.
///
/// Refreshes for the same tenant are serialized within this process; a
/// refresh racing in another process is harmless since the last write wins
/// and both tokens are valid.
#[derive(Clone)]
pub struct TokenRefresher {
    client: EbayClient,
    db: Arc<dyn Datastore>,
    credentials: Option<ClientCredentials>,
    refresh_locks: RefreshLocks,
}

impl TokenRefresher {
    pub fn new(client: EbayClient, db: Arc<dyn Datastore>, config: &Config) -> Self {
        Self {
            client,
            db,
            credentials: ClientCredentials::from_config(config).ok(),
            refresh_locks: Arc::new(DashMap::new()),
        }
    }

    /// Return a usable access token for `connection`, refreshing and
    /// persisting a new one if the current token is missing or expiring.
    pub async fn ensure_valid_access_token(
        &self,
        connection: &Connection,
    ) -> Result<String, AppError> {
        // Fast path: no I/O.
        if let Some(token) = usable_token(connection, Utc::now()) {
            return Ok(token);
        }

        // Missing refresh token is terminal and needs no network call.
        if connection.refresh_token.is_none() {
            tracing::warn!(
                tenant_id = %connection.tenant_id,
                "Access token unusable and no refresh token stored"
            );
            return Err(AppError::MissingRefreshToken);
        }

        let lock = self
            .refresh_locks
            .entry(connection.tenant_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Re-read after acquiring the lock: another task may have refreshed.
        let current = self
            .db
            .get_connection(&connection.tenant_id)
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))?
            .unwrap_or_else(|| connection.clone());

        if let Some(token) = usable_token(&current, Utc::now()) {
            tracing::debug!(tenant_id = %current.tenant_id, "Token refreshed by concurrent task");
            return Ok(token);
        }

        let refresh_token = current
            .refresh_token
            .as_deref()
            .ok_or(AppError::MissingRefreshToken)?;

        let credentials = self
            .credentials
            .as_ref()
            .ok_or(AppError::Configuration("EBAY_APP_ID/EBAY_CERT_ID"))?;

        tracing::info!(tenant_id = %current.tenant_id, "Access token expiring, refreshing");

        // On failure the stored connection is left untouched.
        let response = self
            .client
            .refresh_access_token(credentials, refresh_token)
            .await?;

        let now = Utc::now();
        let updated = Connection {
            access_token: Some(response.access_token.clone()),
            access_token_expires_at: Some(token_expiry(now, response.expires_in.unwrap_or(0))),
            updated_at: now,
            ..current
        };

        self.db
            .upsert_connection(&updated)
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))?;

        tracing::info!(tenant_id = %updated.tenant_id, "Access token refreshed and stored");
        Ok(response.access_token)
    }
}

fn usable_token(connection: &Connection, now: DateTime<Utc>) -> Option<String> {
    if needs_refresh(connection, now) {
        None
    } else {
        connection.access_token.clone()
    }
}
