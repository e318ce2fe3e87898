// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use chrono::{DateTime, Duration, Utc};
use resale_ledger::config::Config;
use resale_ledger::db::{Datastore, DbError, FirestoreDb, MemoryDb};
use resale_ledger::middleware::auth::{create_session_token, SESSION_COOKIE};
use resale_ledger::models::{Connection, ConnectionStatus, SaleRecord, SyncState};
use resale_ledger::routes::create_router;
use resale_ledger::AppState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[allow(dead_code)]
pub const TENANT: &str = "tenant-1";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Config with every eBay endpoint pointed at a mock server.
#[allow(dead_code)]
pub fn test_config(mock_base: &str) -> Config {
    Config::test_default().with_endpoint_base(mock_base)
}

/// Datastore wrapper that can be told to fail specific writes.
#[allow(dead_code)]
#[derive(Default)]
pub struct FlakyDb {
    pub inner: MemoryDb,
    pub fail_connections: AtomicBool,
    pub fail_sales: AtomicBool,
    pub fail_sync_state: AtomicBool,
}

#[allow(dead_code)]
impl FlakyDb {
    pub fn fail_connection_writes(&self) {
        self.fail_connections.store(true, Ordering::SeqCst);
    }

    pub fn fail_sales_writes(&self) {
        self.fail_sales.store(true, Ordering::SeqCst);
    }

    pub fn fail_sync_state_writes(&self) {
        self.fail_sync_state.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Datastore for FlakyDb {
    async fn get_connection(&self, tenant_id: &str) -> Result<Option<Connection>, DbError> {
        self.inner.get_connection(tenant_id).await
    }

    async fn upsert_connection(&self, connection: &Connection) -> Result<(), DbError> {
        if self.fail_connections.load(Ordering::SeqCst) {
            return Err(DbError("connection write rejected".to_string()));
        }
        self.inner.upsert_connection(connection).await
    }

    async fn upsert_sales(&self, rows: &[SaleRecord]) -> Result<(), DbError> {
        if self.fail_sales.load(Ordering::SeqCst) {
            return Err(DbError("sales write rejected".to_string()));
        }
        self.inner.upsert_sales(rows).await
    }

    async fn list_sales(&self, tenant_id: &str) -> Result<Vec<SaleRecord>, DbError> {
        self.inner.list_sales(tenant_id).await
    }

    async fn get_sync_state(
        &self,
        tenant_id: &str,
        provider: &str,
        resource: &str,
    ) -> Result<Option<SyncState>, DbError> {
        self.inner.get_sync_state(tenant_id, provider, resource).await
    }

    async fn upsert_sync_state(&self, state: &SyncState) -> Result<(), DbError> {
        if self.fail_sync_state.load(Ordering::SeqCst) {
            return Err(DbError("sync state write rejected".to_string()));
        }
        self.inner.upsert_sync_state(state).await
    }
}

/// Create a test app against a mock eBay at `mock_base`.
/// Returns the router, the shared state and the backing store.
#[allow(dead_code)]
pub fn create_test_app(mock_base: &str) -> (axum::Router, Arc<AppState>, Arc<FlakyDb>) {
    create_test_app_with_config(test_config(mock_base))
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>, Arc<FlakyDb>) {
    let db = Arc::new(FlakyDb::default());
    let state = Arc::new(AppState::new(config, db.clone()).expect("Failed to build state"));
    (create_router(state.clone()), state, db)
}

/// Session JWT for `tenant_id` signed with the test key.
#[allow(dead_code)]
pub fn session_token(tenant_id: &str) -> String {
    create_session_token(
        tenant_id,
        Some("seller@example.com"),
        &Config::test_default().session_signing_key,
    )
    .expect("Failed to create session token")
}

/// `Cookie` header value carrying a session and any extra cookies.
#[allow(dead_code)]
pub fn cookie_header(tenant_id: Option<&str>, extra: &[(&str, &str)]) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(tenant_id) = tenant_id {
        parts.push(format!("{}={}", SESSION_COOKIE, session_token(tenant_id)));
    }
    for (name, value) in extra {
        parts.push(format!("{}={}", name, value));
    }
    parts.join("; ")
}

/// GET request with the given cookies.
#[allow(dead_code)]
pub fn get_with_cookies(uri: &str, cookies: &str) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if !cookies.is_empty() {
        builder = builder.header(header::COOKIE, cookies);
    }
    builder.body(Body::empty()).unwrap()
}

/// Authenticated POST for `tenant_id`.
#[allow(dead_code)]
pub fn post_as(uri: &str, tenant_id: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", session_token(tenant_id)))
        .body(Body::empty())
        .unwrap()
}

/// A connected row whose access token expires at `expires_at`.
#[allow(dead_code)]
pub fn connection(
    tenant_id: &str,
    access_token: &str,
    expires_at: DateTime<Utc>,
    refresh_token: Option<&str>,
) -> Connection {
    Connection {
        tenant_id: tenant_id.to_string(),
        access_token: Some(access_token.to_string()),
        access_token_expires_at: Some(expires_at),
        refresh_token: refresh_token.map(str::to_string),
        scopes: vec!["https://api.ebay.com/oauth/api_scope/sell.fulfillment.readonly".to_string()],
        status: ConnectionStatus::Connected,
        updated_at: Utc::now() - Duration::hours(1),
    }
}

/// A connected row with a comfortably fresh token.
#[allow(dead_code)]
pub fn fresh_connection(tenant_id: &str) -> Connection {
    connection(
        tenant_id,
        "fresh-access",
        Utc::now() + Duration::hours(1),
        Some("refresh-1"),
    )
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// All `Set-Cookie` headers from a response.
#[allow(dead_code)]
pub fn set_cookie_headers(response: &axum::response::Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// The `Set-Cookie` header for `name`, if any.
#[allow(dead_code)]
pub fn find_cookie<'a>(cookies: &'a [String], name: &str) -> Option<&'a String> {
    cookies.iter().find(|c| c.starts_with(&format!("{}=", name)))
}

/// `Location` header of a redirect.
#[allow(dead_code)]
pub fn location(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect without Location")
        .to_str()
        .unwrap()
        .to_string()
}
