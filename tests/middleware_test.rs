// ABOUTME: Integration tests for the axum middleware seams
// ABOUTME: Exercises rate-limit 429 rejection and bearer-token 401 admission end to end
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;
use localgate::auth::AuthManager;
use localgate::context::GatewayContext;
use localgate::middleware::{enforce_rate_limit, require_admin_token};
use localgate::oauth::{
    OAuthError, OAuthTokenRefresher, RefresherConfig, TokenExchange, TokenResponse,
};
use localgate::rate_limiting::{RateLimitConfig, RateLimiter};
use localgate::storage::{SettingsStore, UserStore};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const SECRET: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

struct NeverExchange;

#[async_trait]
impl TokenExchange for NeverExchange {
    async fn refresh(&self, _refresh_token: &str) -> Result<TokenResponse, OAuthError> {
        Err(OAuthError::ExchangeFailed("not wired in this test".to_owned()))
    }
}

fn context(dir: &TempDir, rate_limit: RateLimitConfig) -> GatewayContext {
    let auth = Arc::new(AuthManager::new(
        UserStore::new(dir.path().join("admin_users.json")),
        SECRET.to_owned(),
    ));
    let rate_limiter = Arc::new(RateLimiter::new(rate_limit));
    let refresher = Arc::new(OAuthTokenRefresher::new(
        RefresherConfig::default(),
        Arc::new(SettingsStore::new(dir.path().join("settings.json"))),
        Arc::new(NeverExchange),
    ));
    GatewayContext::from_parts(auth, rate_limiter, refresher)
}

fn rate_limited_app(context: GatewayContext) -> Router {
    Router::new()
        .route("/", get(|| async { "ok" }))
        .layer(from_fn_with_state(context, enforce_rate_limit))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn over_limit_requests_get_429_with_contract_body() {
    let dir = TempDir::new().unwrap();
    let app = rate_limited_app(context(
        &dir,
        RateLimitConfig {
            enabled: true,
            requests_per_minute: 1,
            requests_per_hour: 100,
            requests_per_day: 1_000,
        },
    ));

    let request = || {
        Request::builder()
            .uri("/")
            .header("authorization", "Bearer same-caller-key")
            .body(Body::empty())
            .unwrap()
    };

    let first = app.clone().oneshot(request()).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.clone().oneshot(request()).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    let json = body_json(second).await;
    assert_eq!(
        json["error"]["message"],
        "Rate limit exceeded: 1 requests per minute"
    );
    assert_eq!(json["error"]["type"], "rate_limit_error");
    assert_eq!(json["error"]["code"], "rate_limit_exceeded");
}

#[tokio::test]
async fn distinct_callers_do_not_share_a_ledger() {
    let dir = TempDir::new().unwrap();
    let app = rate_limited_app(context(
        &dir,
        RateLimitConfig {
            enabled: true,
            requests_per_minute: 1,
            requests_per_hour: 100,
            requests_per_day: 1_000,
        },
    ));

    let request = |key: &str| {
        Request::builder()
            .uri("/")
            .header("authorization", key.to_owned())
            .body(Body::empty())
            .unwrap()
    };

    assert_eq!(
        app.clone().oneshot(request("caller-one-key-000000")).await.unwrap().status(),
        StatusCode::OK
    );
    assert_eq!(
        app.clone().oneshot(request("caller-two-key-000000")).await.unwrap().status(),
        StatusCode::OK
    );
    assert_eq!(
        app.clone().oneshot(request("caller-one-key-000000")).await.unwrap().status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn disabled_limiter_admits_everything() {
    let dir = TempDir::new().unwrap();
    let app = rate_limited_app(context(
        &dir,
        RateLimitConfig {
            enabled: false,
            requests_per_minute: 1,
            requests_per_hour: 1,
            requests_per_day: 1,
        },
    ));

    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn admin_routes_require_a_live_session_token() {
    let dir = TempDir::new().unwrap();
    let context = context(&dir, RateLimitConfig::default());
    context.auth.create_user("alice", "hunter2");
    let token = context.auth.authenticate("alice", "hunter2").unwrap();

    let app = Router::new()
        .route("/admin", get(|| async { "admin ok" }))
        .layer(from_fn_with_state(context.clone(), require_admin_token));

    // No token.
    let bare = app
        .clone()
        .oneshot(Request::builder().uri("/admin").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(bare.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(bare).await;
    assert_eq!(json["error"]["type"], "auth_error");
    assert_eq!(json["error"]["code"], "auth_invalid");

    // Garbage token.
    let garbage = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/admin")
                .header("authorization", "Bearer nonsense")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);

    // Live token.
    let authed = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/admin")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(authed.status(), StatusCode::OK);

    // Revoked token.
    context.auth.logout(&token);
    let revoked = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/admin")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(revoked.status(), StatusCode::UNAUTHORIZED);
}
