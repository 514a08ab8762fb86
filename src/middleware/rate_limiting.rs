// ABOUTME: Per-caller rate limiting middleware and caller identity derivation
// ABOUTME: Consults the sliding-window limiter and answers HTTP 429 with the contract body
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Rate limiting middleware.
//!
//! Caller identity precedence: the first 20 characters of the
//! `Authorization` header value, else the peer socket address, else the
//! literal `"unknown"`. Rejections answer 429 with
//! `{"error": {"message", "type": "rate_limit_error", "code": "rate_limit_exceeded"}}`.

use crate::constants::{limits, protocol};
use crate::context::GatewayContext;
use crate::errors::{AppError, ErrorResponse};
use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::{header, HeaderMap, StatusCode};
use std::net::SocketAddr;

/// Derive the caller identity used to key rate-limit ledgers.
#[must_use]
pub fn derive_client_id(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    {
        if !value.is_empty() {
            return value.chars().take(limits::CLIENT_ID_PREFIX_CHARS).collect();
        }
    }
    peer.map_or_else(
        || protocol::UNKNOWN_CLIENT_ID.to_owned(),
        |address| address.ip().to_string(),
    )
}

/// Reject requests from callers over any rate-limit tier.
pub async fn enforce_rate_limit(
    State(context): State<GatewayContext>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let client_id = derive_client_id(request.headers(), peer);

    let decision = context.rate_limiter.is_allowed(&client_id);
    if decision.allowed {
        return next.run(request).await;
    }

    let message = decision
        .reason
        .unwrap_or_else(|| "Rate limit exceeded".to_owned());
    tracing::warn!("rate limited client {client_id}: {message}");
    rejection_response(&message)
}

/// The 429 response body for a rejected request.
#[must_use]
pub fn rejection_response(message: &str) -> Response {
    let body = ErrorResponse::from(AppError::rate_limit_exceeded(message));
    (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response()
}
