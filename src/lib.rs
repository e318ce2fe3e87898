// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Resale-ledger: eBay connection and order sync for a reseller back office
//!
//! This crate provides the backend for connecting a tenant's eBay account
//! over OAuth, keeping its tokens fresh, and reconciling recent orders into
//! sale records. It also serves app-token catalog search for research.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Datastore;
use error::AppError;
use services::{ApplicationTokenCache, EbayClient, OAuthHandshake, OrderSyncEngine, TokenRefresher};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn Datastore>,
    pub ebay: EbayClient,
    pub handshake: OAuthHandshake,
    pub order_sync: OrderSyncEngine,
    pub app_tokens: ApplicationTokenCache,
}

impl AppState {
    /// Wire every service against one datastore and one HTTP client.
    pub fn new(config: Config, db: Arc<dyn Datastore>) -> Result<Self, AppError> {
        let ebay = EbayClient::new(&config)?;
        let refresher = TokenRefresher::new(ebay.clone(), db.clone(), &config);

        Ok(Self {
            handshake: OAuthHandshake::new(ebay.clone(), db.clone(), config.clone()),
            order_sync: OrderSyncEngine::new(ebay.clone(), refresher, db.clone()),
            app_tokens: ApplicationTokenCache::new(ebay.clone(), &config),
            ebay,
            db,
            config,
        })
    }
}
