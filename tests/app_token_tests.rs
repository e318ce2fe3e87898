// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application token cache tests.

use resale_ledger::error::AppError;
use resale_ledger::services::{ApplicationTokenCache, EbayClient};
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::*;

const TOKEN_PATH: &str = "/identity/v1/oauth2/token";

fn cache(server: &MockServer) -> ApplicationTokenCache {
    let config = test_config(&server.uri());
    ApplicationTokenCache::new(EbayClient::new(&config).unwrap(), &config)
}

async fn mount_app_token(server: &MockServer, expires_in: Option<i64>, times: u64) {
    let mut body = serde_json::json!({
        "access_token": "app-token-1",
        "token_type": "Application Access Token"
    });
    if let Some(expires_in) = expires_in {
        body["expires_in"] = expires_in.into();
    }

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(header("cache-control", "no-store"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("scope=https%3A%2F%2Fapi.ebay.com%2Foauth%2Fapi_scope"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_token_reused_within_validity() {
    let server = MockServer::start().await;
    mount_app_token(&server, Some(7200), 1).await;
    let cache = cache(&server);

    assert_eq!(cache.get_application_access_token().await.unwrap(), "app-token-1");
    assert_eq!(cache.get_application_access_token().await.unwrap(), "app-token-1");
}

#[tokio::test]
async fn test_token_inside_margin_is_refetched() {
    let server = MockServer::start().await;
    // Expires within the 60 second margin, so never reused.
    mount_app_token(&server, Some(30), 2).await;
    let cache = cache(&server);

    cache.get_application_access_token().await.unwrap();
    cache.get_application_access_token().await.unwrap();
}

#[tokio::test]
async fn test_missing_expires_in_uses_default_lifetime() {
    let server = MockServer::start().await;
    mount_app_token(&server, None, 1).await;
    let cache = cache(&server);

    cache.get_application_access_token().await.unwrap();
    cache.get_application_access_token().await.unwrap();
}

#[tokio::test]
async fn test_huge_expires_in_is_clamped() {
    let server = MockServer::start().await;
    mount_app_token(&server, Some(100_000_000_000_000), 1).await;
    let cache = cache(&server);

    assert_eq!(cache.get_application_access_token().await.unwrap(), "app-token-1");
    assert_eq!(cache.get_application_access_token().await.unwrap(), "app-token-1");
}

#[tokio::test]
async fn test_invalidate_forces_refetch() {
    let server = MockServer::start().await;
    mount_app_token(&server, Some(7200), 2).await;
    let cache = cache(&server);

    cache.get_application_access_token().await.unwrap();
    cache.invalidate().await;
    cache.get_application_access_token().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_misses_fetch_once() {
    let server = MockServer::start().await;
    mount_app_token(&server, Some(7200), 1).await;
    let cache = Arc::new(cache(&server));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            cache.get_application_access_token().await
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "app-token-1");
    }
}

#[tokio::test]
async fn test_rejected_grant_is_app_token_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": "invalid_client",
            "error_description": "client authentication failed"
        })))
        .expect(1)
        .mount(&server)
        .await;
    let cache = cache(&server);

    let err = cache.get_application_access_token().await.unwrap_err();
    match err {
        AppError::AppToken { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("invalid_client"));
        }
        other => panic!("expected AppToken, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_fetch_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_app_token(&server, Some(7200), 1).await;
    let cache = cache(&server);

    assert!(cache.get_application_access_token().await.is_err());
    assert_eq!(cache.get_application_access_token().await.unwrap(), "app-token-1");
}

#[tokio::test]
async fn test_missing_credentials_is_config_error() {
    let server = MockServer::start().await;
    let mut config = test_config(&server.uri());
    config.ebay_client_secret = None;
    let cache = ApplicationTokenCache::new(EbayClient::new(&config).unwrap(), &config);

    let err = cache.get_application_access_token().await.unwrap_err();
    assert!(matches!(err, AppError::Configuration(_)));
}
