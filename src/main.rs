// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Resale-ledger API server
//!
//! Connects tenants' eBay seller accounts and reconciles their recent
//! orders into sale records.

use resale_ledger::{
    config::Config,
    db::{Datastore, FirestoreDb, MemoryDb},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        env = ?config.ebay_env,
        "Starting resale-ledger API"
    );

    if config.ebay_client_id.is_none() || config.ebay_client_secret.is_none() {
        tracing::warn!("EBAY_APP_ID/EBAY_CERT_ID not set; eBay calls will fail");
    }

    let db: Arc<dyn Datastore> = match config.gcp_project_id.as_deref() {
        Some(project_id) => Arc::new(FirestoreDb::new(project_id).await?),
        None => {
            tracing::warn!("GCP_PROJECT_ID not set; using in-memory store");
            Arc::new(MemoryDb::new())
        }
    };

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db)?);

    // Build router
    let app = resale_ledger::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("resale_ledger=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
