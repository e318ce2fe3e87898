// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Marketplace OAuth connection, one per tenant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Persisted connection status. Error states are never stored; they travel
/// back to the browser as redirect query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

/// Stored OAuth connection (document id = tenant id).
#[derive(Clone, Serialize, Deserialize)]
pub struct Connection {
    /// Owning tenant (unique key)
    pub tenant_id: String,
    /// Bearer credential for marketplace API calls
    pub access_token: Option<String>,
    pub access_token_expires_at: Option<DateTime<Utc>>,
    /// Long-lived credential used to mint new access tokens
    pub refresh_token: Option<String>,
    /// Granted scopes, in the order the provider reported them
    #[serde(default)]
    pub scopes: Vec<String>,
    pub status: ConnectionStatus,
    pub updated_at: DateTime<Utc>,
}

impl Connection {
    /// True when the connection can yield an access token, either directly
    /// or through a refresh.
    pub fn has_credentials(&self) -> bool {
        self.access_token.is_some() || self.refresh_token.is_some()
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }
}

// Tokens stay out of logs.
impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("tenant_id", &self.tenant_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("access_token_expires_at", &self.access_token_expires_at)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("scopes", &self.scopes)
            .field("status", &self.status)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}
