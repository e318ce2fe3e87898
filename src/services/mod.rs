// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Business logic services.

pub mod app_token;
pub mod ebay;
pub mod oauth;
pub mod order_sync;
pub mod token_refresh;

pub use app_token::ApplicationTokenCache;
pub use ebay::EbayClient;
pub use oauth::OAuthHandshake;
pub use order_sync::{OrderSyncEngine, SyncSummary};
pub use token_refresh::TokenRefresher;
