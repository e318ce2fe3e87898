// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! eBay OAuth connection routes.
//!
//! Handshake failures never surface as error pages: the callback always
//! redirects to the settings surface with a query-encoded outcome.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::MARKETPLACE;
use crate::error::{AppError, Result};
use crate::middleware::auth::CurrentTenant;
use crate::services::order_sync::ORDERS_RESOURCE;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;

pub const STATE_COOKIE: &str = "ebay_oauth_state";

/// State cookie lifetime (10 minutes).
const STATE_COOKIE_TTL_MINUTES: i64 = 10;

/// Handshake routes (session checked inside each handler).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/connect/start", get(connect_start))
        .route("/connect/callback", get(connect_callback))
}

/// Routes that sit behind the session middleware.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/connect/status", get(connect_status))
}

/// 302 Found to `location`.
fn found(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

fn login_redirect(state: &AppState) -> Response {
    found(format!(
        "{}/login?next={}",
        state.config.app_url,
        urlencoding::encode("/settings")
    ))
}

fn settings_redirect(state: &AppState, outcome: std::result::Result<(), &AppError>) -> Response {
    let query = match outcome {
        Ok(()) => "connected=1".to_string(),
        Err(err) => format!("error={}", urlencoding::encode(&err.redirect_code())),
    };
    found(format!("{}/settings?{}", state.config.app_url, query))
}

/// Start OAuth flow - redirect to eBay consent.
async fn connect_start(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Response {
    if CurrentTenant::from_headers(&headers, &state.config.session_signing_key).is_none() {
        return login_redirect(&state);
    }

    let start = match state.handshake.start_authorization() {
        Ok(start) => start,
        Err(e) => return e.into_response(),
    };

    let cookie = Cookie::build((STATE_COOKIE, start.cookie_value))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.secure_cookies())
        .path("/")
        .max_age(time::Duration::minutes(STATE_COOKIE_TTL_MINUTES))
        .build();

    (jar.add(cookie), found(start.authorize_url)).into_response()
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

/// OAuth callback - exchange code for tokens, store the connection.
async fn connect_callback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Response {
    // The stored state is single-use: read it and drop it whatever happens next.
    let stored_state = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(Cookie::build(STATE_COOKIE).path("/"));

    let tenant = CurrentTenant::from_headers(&headers, &state.config.session_signing_key);

    let result = state
        .handshake
        .handle_callback(
            stored_state.as_deref(),
            tenant.as_ref(),
            params.code.as_deref(),
            params.state.as_deref(),
        )
        .await;

    let response = match result {
        Ok(_) => settings_redirect(&state, Ok(())),
        Err(AppError::NotAuthenticated) => login_redirect(&state),
        Err(e) => {
            tracing::warn!(code = %e.redirect_code(), "eBay OAuth callback failed");
            settings_redirect(&state, Err(&e))
        }
    };

    (jar, response).into_response()
}

/// Connection summary for the settings surface. Never includes tokens.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatusResponse {
    pub connected: bool,
    pub scopes: Vec<String>,
    pub access_token_expires_at: Option<String>,
    pub last_synced_at: Option<String>,
}

async fn connect_status(
    State(state): State<Arc<AppState>>,
    Extension(tenant): Extension<CurrentTenant>,
) -> Result<Json<ConnectionStatusResponse>> {
    let connection = state.db.get_connection(&tenant.id).await?;
    let sync_state = state
        .db
        .get_sync_state(&tenant.id, MARKETPLACE, ORDERS_RESOURCE)
        .await?;

    let response = match connection {
        Some(c) => ConnectionStatusResponse {
            connected: c.is_connected(),
            scopes: c.scopes,
            access_token_expires_at: c.access_token_expires_at.map(format_utc_rfc3339),
            last_synced_at: sync_state.map(|s| format_utc_rfc3339(s.last_synced_at)),
        },
        None => ConnectionStatusResponse {
            connected: false,
            scopes: Vec::new(),
            access_token_expires_at: None,
            last_synced_at: None,
        },
    };

    Ok(Json(response))
}
