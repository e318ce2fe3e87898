// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Order sync: reconcile recent eBay orders into sale records.
//!
//! Each run is strictly sequential: token, fetch, narrow, map, upsert,
//! mark synced. Runs are safe to repeat and to overlap because every write
//! is an upsert keyed by the remote order.

use chrono::{Duration, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::config::MARKETPLACE;
use crate::db::Datastore;
use crate::error::AppError;
use crate::models::{narrow_orders, SaleRecord, SyncState};
use crate::services::ebay::EbayClient;
use crate::services::token_refresh::TokenRefresher;
use crate::time_utils::format_utc_rfc3339;

/// Every run re-examines this many trailing days so late or corrected
/// orders are picked up.
const LOOKBACK_DAYS: i64 = 7;

pub const ORDERS_RESOURCE: &str = "orders";

/// Result of one sync run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    /// Orders the marketplace returned, valid or not
    pub order_count: usize,
    /// Rows handed to the sales upsert
    pub upserted: usize,
    /// Orders excluded by validation
    pub rejected: usize,
}

/// Orchestrates a tenant's order sync.
#[derive(Clone)]
pub struct OrderSyncEngine {
    client: EbayClient,
    refresher: TokenRefresher,
    db: Arc<dyn Datastore>,
}

impl OrderSyncEngine {
    pub fn new(client: EbayClient, refresher: TokenRefresher, db: Arc<dyn Datastore>) -> Self {
        Self {
            client,
            refresher,
            db,
        }
    }

    /// Sync the trailing week of orders for `tenant_id`.
    ///
    /// The sync-state marker is written once the fetch succeeds, even if the
    /// sales upsert then fails; a retry re-covers the same window anyway.
    pub async fn sync_orders(&self, tenant_id: &str) -> Result<SyncSummary, AppError> {
        let connection = self
            .db
            .get_connection(tenant_id)
            .await?
            .filter(|c| c.is_connected())
            .ok_or(AppError::NotConnected)?;

        if !connection.has_credentials() {
            tracing::warn!(tenant_id, "Connected row carries no tokens");
        }

        let access_token = self.refresher.ensure_valid_access_token(&connection).await?;

        let since = format_utc_rfc3339(Utc::now() - Duration::days(LOOKBACK_DAYS));
        let body = self
            .client
            .list_orders(&access_token, &since)
            .await
            .inspect_err(|e| tracing::warn!(tenant_id, error = %e, "Orders fetch failed"))?;

        let narrowed = narrow_orders(&body);
        for (index, reason) in &narrowed.rejected {
            tracing::warn!(
                tenant_id,
                index,
                reason = reason.as_str(),
                "Skipping malformed order"
            );
        }

        let now = Utc::now();
        let rows: Vec<SaleRecord> = narrowed
            .orders
            .iter()
            .map(|order| SaleRecord::from_remote_order(tenant_id, MARKETPLACE, order, now))
            .collect();

        let upsert_result = if rows.is_empty() {
            Ok(())
        } else {
            self.db.upsert_sales(&rows).await
        };

        // Advisory marker: a failure here is logged, not surfaced.
        let marker = SyncState::new(tenant_id, MARKETPLACE, ORDERS_RESOURCE, Utc::now());
        if let Err(e) = self.db.upsert_sync_state(&marker).await {
            tracing::warn!(tenant_id, error = %e, "Failed to record sync state");
        }

        upsert_result.map_err(|e| AppError::SalesUpsert(e.to_string()))?;

        tracing::info!(
            tenant_id,
            order_count = narrowed.returned,
            upserted = rows.len(),
            rejected = narrowed.rejected.len(),
            "Order sync complete"
        );

        Ok(SyncSummary {
            order_count: narrowed.returned,
            upserted: rows.len(),
            rejected: narrowed.rejected.len(),
        })
    }
}
