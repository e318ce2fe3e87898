// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session authentication.
//!
//! Sessions are HS256 JWTs issued by the identity side of the app and read
//! from the `session` cookie or an `Authorization: Bearer` header.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const SESSION_COOKIE: &str = "session";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (tenant id)
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// The signed-in tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentTenant {
    pub id: String,
    pub email: Option<String>,
}

impl CurrentTenant {
    /// Resolve the session from request headers. `None` means
    /// unauthenticated; a bad or expired token is treated the same way.
    pub fn from_headers(headers: &HeaderMap, signing_key: &[u8]) -> Option<Self> {
        let jar = CookieJar::from_headers(headers);

        // Try cookie first, then header
        let token = match jar.get(SESSION_COOKIE) {
            Some(cookie) => cookie.value().to_string(),
            None => headers
                .get(header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(str::to_string)?,
        };

        let key = DecodingKey::from_secret(signing_key);
        let validation = Validation::new(Algorithm::HS256);
        let token_data = decode::<Claims>(&token, &key, &validation).ok()?;

        if token_data.claims.sub.is_empty() {
            return None;
        }

        Some(Self {
            id: token_data.claims.sub,
            email: token_data.claims.email,
        })
    }
}

/// Middleware that requires a valid session and exposes it as an
/// `Extension<CurrentTenant>`.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    match CurrentTenant::from_headers(request.headers(), &state.config.session_signing_key) {
        Some(tenant) => {
            request.extensions_mut().insert(tenant);
            next.run(request).await
        }
        None => AppError::NotAuthenticated.into_response(),
    }
}

/// Create a JWT for a tenant session.
pub fn create_session_token(
    tenant_id: &str,
    email: Option<&str>,
    signing_key: &[u8],
) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: tenant_id.to_string(),
        email: email.map(str::to_string),
        iat: now,
        exp: now + 7 * 24 * 60 * 60, // 7 days
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const KEY: &[u8] = b"test_session_key_32_bytes_min!!!";

    #[test]
    fn test_session_from_cookie() {
        let token = create_session_token("tenant-1", Some("a@example.com"), KEY).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("{}={}", SESSION_COOKIE, token)).unwrap(),
        );

        let tenant = CurrentTenant::from_headers(&headers, KEY).unwrap();
        assert_eq!(tenant.id, "tenant-1");
        assert_eq!(tenant.email.as_deref(), Some("a@example.com"));
    }

    #[test]
    fn test_session_from_bearer() {
        let token = create_session_token("tenant-2", None, KEY).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );

        let tenant = CurrentTenant::from_headers(&headers, KEY).unwrap();
        assert_eq!(tenant.id, "tenant-2");
    }

    #[test]
    fn test_session_wrong_key_is_anonymous() {
        let token = create_session_token("tenant-1", None, b"another_key").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );

        assert!(CurrentTenant::from_headers(&headers, KEY).is_none());
    }

    #[test]
    fn test_no_credentials_is_anonymous() {
        assert!(CurrentTenant::from_headers(&HeaderMap::new(), KEY).is_none());
    }
}
