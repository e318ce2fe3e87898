// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! eBay OAuth consent handshake.
//!
//! `start_authorization` builds the authorize URL and a fresh anti-CSRF
//! state. `handle_callback` checks that state, exchanges the one-time code
//! and stores the connection. Cookie handling lives in the route; this
//! module only sees the values.

use chrono::Utc;
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::config::Config;
use crate::db::Datastore;
use crate::error::AppError;
use crate::middleware::auth::CurrentTenant;
use crate::models::{Connection, ConnectionStatus};
use crate::services::ebay::{ClientCredentials, EbayClient};
use crate::time_utils::token_expiry;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// Bytes of entropy in a state token.
const STATE_BYTES: usize = 16;

/// An authorize redirect plus the state that must come back with it.
#[derive(Debug, Clone)]
pub struct AuthorizationStart {
    pub authorize_url: String,
    pub state: String,
    /// Signed form of `state`, suitable for the side-channel cookie
    pub cookie_value: String,
}

/// Drives the authorization-code flow for one marketplace application.
#[derive(Clone)]
pub struct OAuthHandshake {
    client: EbayClient,
    db: Arc<dyn Datastore>,
    config: Config,
    rng: SystemRandom,
}

impl OAuthHandshake {
    pub fn new(client: EbayClient, db: Arc<dyn Datastore>, config: Config) -> Self {
        Self {
            client,
            db,
            config,
            rng: SystemRandom::new(),
        }
    }

    /// Build the authorize URL and a new state token. No network call.
    pub fn start_authorization(&self) -> Result<AuthorizationStart, AppError> {
        let client_id = self
            .config
            .ebay_client_id
            .as_deref()
            .ok_or(AppError::Configuration("EBAY_APP_ID"))?;
        let ru_name = self
            .config
            .ebay_ru_name
            .as_deref()
            .ok_or(AppError::Configuration("EBAY_RU_NAME"))?;

        let mut bytes = [0u8; STATE_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Secure random generation failed")))?;
        let state = hex::encode(bytes);

        let authorize_url = format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}",
            self.config.authorize_url(),
            urlencoding::encode(client_id),
            urlencoding::encode(ru_name),
            urlencoding::encode(&self.config.ebay_scope),
            state
        );

        let cookie_value = sign_state(&state, &self.config.session_signing_key)?;

        tracing::info!(
            client_id = %client_id,
            env = ?self.config.ebay_env,
            "Starting eBay OAuth flow"
        );

        Ok(AuthorizationStart {
            authorize_url,
            state,
            cookie_value,
        })
    }

    /// Complete the handshake.
    ///
    /// `stored_state` is the raw side-channel cookie value, if any. Checks
    /// run in a fixed order: state, session, code, then the exchange.
    pub async fn handle_callback(
        &self,
        stored_state: Option<&str>,
        tenant: Option<&CurrentTenant>,
        code: Option<&str>,
        state: Option<&str>,
    ) -> Result<Connection, AppError> {
        self.check_state(stored_state, state)?;

        let tenant = tenant.ok_or(AppError::NotAuthenticated)?;

        let code = code
            .filter(|c| !c.is_empty())
            .ok_or(AppError::MissingCode)?;

        let credentials = ClientCredentials::from_config(&self.config)?;
        let ru_name = self
            .config
            .ebay_ru_name
            .as_deref()
            .ok_or(AppError::Configuration("EBAY_RU_NAME"))?;

        tracing::info!(tenant_id = %tenant.id, "Exchanging authorization code for tokens");

        // The code is single-use: nothing past this point retries the exchange.
        let tokens = self.client.exchange_code(&credentials, code, ru_name).await?;

        let now = Utc::now();
        let scopes: Vec<String> = tokens
            .scope
            .as_deref()
            .unwrap_or(self.config.ebay_scope.as_str())
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let connection = Connection {
            tenant_id: tenant.id.clone(),
            access_token: Some(tokens.access_token),
            access_token_expires_at: Some(token_expiry(now, tokens.expires_in.unwrap_or(0))),
            refresh_token: tokens.refresh_token,
            scopes,
            status: ConnectionStatus::Connected,
            updated_at: now,
        };

        self.db
            .upsert_connection(&connection)
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))?;

        tracing::info!(
            tenant_id = %connection.tenant_id,
            scopes = connection.scopes.len(),
            has_refresh_token = connection.refresh_token.is_some(),
            "eBay connection stored"
        );

        Ok(connection)
    }

    /// Compare the callback state with the stored one.
    ///
    /// A missing cookie is let through unless strict mode is on. A cookie
    /// whose signature does not verify counts as a mismatch.
    fn check_state(&self, stored: Option<&str>, provided: Option<&str>) -> Result<(), AppError> {
        let Some(stored) = stored else {
            if self.config.oauth_state_strict {
                tracing::warn!("OAuth callback without state cookie (strict mode)");
                return Err(AppError::StateMismatch);
            }
            tracing::debug!("OAuth callback without state cookie, continuing");
            return Ok(());
        };

        let expected = verify_state(stored, &self.config.session_signing_key);
        let matches = match (expected, provided) {
            (Some(expected), Some(provided)) => {
                bool::from(expected.as_bytes().ct_eq(provided.as_bytes()))
            }
            _ => false,
        };

        if matches {
            Ok(())
        } else {
            tracing::warn!("OAuth state mismatch, aborting handshake");
            Err(AppError::StateMismatch)
        }
    }
}

/// Sign a state token for the cookie: `<state>.<hmac hex>`.
pub fn sign_state(state: &str, key: &[u8]) -> Result<String, AppError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(state.as_bytes());
    Ok(format!("{}.{}", state, hex::encode(mac.finalize().into_bytes())))
}

/// Verify a signed cookie value and return the state it carries.
pub fn verify_state(cookie_value: &str, key: &[u8]) -> Option<String> {
    let (state, signature_hex) = cookie_value.rsplit_once('.')?;
    let signature = hex::decode(signature_hex).ok()?;

    let mut mac = HmacSha256::new_from_slice(key).ok()?;
    mac.update(state.as_bytes());
    mac.verify_slice(&signature).ok()?;

    Some(state.to_string())
}
