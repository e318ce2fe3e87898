// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Product research over the eBay catalog.
//!
//! These calls use the application token, not a tenant connection, so no
//! session is required.

use crate::error::{AppError, Result};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

const DEFAULT_LIMIT: u32 = 12;
const MAX_LIMIT: u32 = 50;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/research/search", get(search))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    #[validate(length(max = 350))]
    q: Option<String>,
    #[validate(url)]
    image_url: Option<String>,
    limit: Option<String>,
}

impl SearchParams {
    /// Trim inputs and drop empty ones.
    fn normalized(self) -> Self {
        let clean = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        Self {
            q: clean(self.q),
            image_url: clean(self.image_url),
            limit: self.limit,
        }
    }
}

enum SearchTarget<'a> {
    Keywords(&'a str),
    Image(&'a str),
}

/// Clamp a requested page size to 1..=50. Unparseable input gets the default.
pub fn clamp_limit(raw: Option<&str>) -> u32 {
    match raw.map(str::trim).and_then(|s| s.parse::<i64>().ok()) {
        Some(n) => n.clamp(1, MAX_LIMIT as i64) as u32,
        None => DEFAULT_LIMIT,
    }
}

/// Keyword search when `q` is present, otherwise image search by URL.
async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<serde_json::Value>> {
    let params = params.normalized();
    let target = match (&params.q, &params.image_url) {
        (Some(q), _) => SearchTarget::Keywords(q.as_str()),
        (None, Some(image_url)) => SearchTarget::Image(image_url.as_str()),
        (None, None) => return Err(AppError::BadRequest("missing_parameters".to_string())),
    };
    params
        .validate()
        .map_err(|_| AppError::BadRequest("invalid_parameters".to_string()))?;

    let limit = clamp_limit(params.limit.as_deref());
    let token = state.app_tokens.get_application_access_token().await?;

    let result = match target {
        SearchTarget::Keywords(q) => state.ebay.search_items(&token, q, limit).await,
        SearchTarget::Image(url) => state.ebay.search_items_by_image(&token, url, limit).await,
    };

    if let Err(AppError::CatalogSearch { status: 401, .. }) = &result {
        // Revoked or rotated credentials: the next call fetches a new token.
        state.app_tokens.invalidate().await;
    }

    Ok(Json(result?))
}
