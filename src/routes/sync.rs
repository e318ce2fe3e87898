// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Order sync trigger.
//! The auth middleware is applied in routes/mod.rs for these routes.

use crate::error::Result;
use crate::middleware::auth::CurrentTenant;
use crate::services::order_sync::ORDERS_RESOURCE;
use crate::AppState;
use axum::{extract::State, routing::post, Extension, Json, Router};
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/sync/orders", post(sync_orders))
}

/// Successful sync outcome.
#[derive(Serialize)]
pub struct SyncResponse {
    pub ok: bool,
    pub resource: &'static str,
    pub count: usize,
    pub upserted: usize,
    pub rejected: usize,
}

/// Run one order sync for the signed-in tenant.
async fn sync_orders(
    State(state): State<Arc<AppState>>,
    Extension(tenant): Extension<CurrentTenant>,
) -> Result<Json<SyncResponse>> {
    let summary = state
        .order_sync
        .sync_orders(&tenant.id)
        .await
        .inspect_err(|e| {
            if e.requires_reauthorization() {
                tracing::warn!(tenant_id = %tenant.id, error = %e, "Sync needs re-authorization");
            } else {
                tracing::error!(tenant_id = %tenant.id, error = %e, "Order sync failed");
            }
        })?;

    Ok(Json(SyncResponse {
        ok: true,
        resource: ORDERS_RESOURCE,
        count: summary.order_count,
        upserted: summary.upserted,
        rejected: summary.rejected,
    }))
}
