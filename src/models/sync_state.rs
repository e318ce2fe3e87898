// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Per-tenant sync bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::key_part;

/// Sync marker for one `(tenant, provider, resource)` triple.
///
/// Descriptive only: the order sync always looks back a fixed window and
/// does not derive it from `last_synced_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    pub tenant_id: String,
    pub provider: String,
    pub resource: String,
    pub last_synced_at: DateTime<Utc>,
}

impl SyncState {
    pub fn new(tenant_id: &str, provider: &str, resource: &str, at: DateTime<Utc>) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            provider: provider.to_string(),
            resource: resource.to_string(),
            last_synced_at: at,
        }
    }

    pub fn doc_id(&self) -> String {
        Self::key(&self.tenant_id, &self.provider, &self.resource)
    }

    pub fn key(tenant_id: &str, provider: &str, resource: &str) -> String {
        format!(
            "{}_{}_{}",
            key_part(tenant_id),
            key_part(provider),
            key_part(resource)
        )
    }
}
