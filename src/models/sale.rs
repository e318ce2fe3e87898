// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Sale records reconciled from marketplace orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::models::{key_part, RemoteOrder};
use crate::time_utils::format_utc_rfc3339;

/// Stored sale. Unique per `(tenant_id, marketplace, marketplace_sale_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub tenant_id: String,
    pub marketplace: String,
    /// Remote order id; None when the marketplace did not send one
    pub marketplace_sale_id: Option<String>,
    /// Sale date/time (ISO 8601)
    pub sale_date: String,
    pub quantity: u32,
    pub gross_amount: f64,
    pub fees: f64,
    pub shipping_income: f64,
    /// Not derivable from the order feed; left for manual entry
    pub shipping_cost: f64,
    pub tax: f64,
    pub note: Option<String>,
    /// Raw remote order, kept for audit and debugging
    pub external_payload: serde_json::Value,
    /// When this row was last written by a sync
    pub synced_at: String,
}

impl SaleRecord {
    /// Map a validated remote order to a sale row for `tenant_id`.
    pub fn from_remote_order(
        tenant_id: &str,
        marketplace: &str,
        order: &RemoteOrder,
        now: DateTime<Utc>,
    ) -> Self {
        let pricing = &order.pricing;

        Self {
            tenant_id: tenant_id.to_string(),
            marketplace: marketplace.to_string(),
            marketplace_sale_id: order.order_id.clone(),
            sale_date: format_utc_rfc3339(order.creation_date.unwrap_or(now)),
            quantity: order.quantity(),
            gross_amount: pricing.total,
            fees: pricing.total_marketplace_fee + pricing.payment_discount,
            shipping_income: pricing.delivery_cost,
            shipping_cost: 0.0,
            tax: pricing.total_tax,
            note: None,
            external_payload: order.raw.clone(),
            synced_at: format_utc_rfc3339(now),
        }
    }

    /// Storage key derived from the natural key. Orders without a remote id
    /// are keyed by a fingerprint of their payload so re-syncing them stays
    /// idempotent.
    pub fn natural_key(&self) -> String {
        let remote_id = match &self.marketplace_sale_id {
            Some(id) => key_part(id),
            // `:` never survives key_part, so this cannot collide with an id.
            None => {
                let payload = self.external_payload.to_string();
                format!("sha256:{}", hex::encode(Sha256::digest(payload.as_bytes())))
            }
        };
        format!(
            "{}_{}_{}",
            key_part(&self.tenant_id),
            key_part(&self.marketplace),
            remote_id
        )
    }
}
