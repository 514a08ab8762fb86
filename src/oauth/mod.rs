// ABOUTME: OAuth credential maintenance - token exchange seam and background refresher
// ABOUTME: Defines the TokenExchange trait, exchange result/error types, and the expiry predicate
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Delegated OAuth Credential Maintenance
//!
//! The gateway holds a delegated OAuth credential for its upstream vendor.
//! Access tokens are short-lived; [`refresher::OAuthTokenRefresher`] renews
//! them in the background through a [`TokenExchange`] collaborator before
//! the request path ever sees an expired one.

pub mod client;
pub mod refresher;

pub use client::{HttpTokenExchange, TokenExchangeConfig};
pub use refresher::{OAuthTokenRefresher, RefresherConfig};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of a successful refresh exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The new access token.
    pub access_token: String,
    /// A rotated refresh token, when the provider rotates them.
    pub refresh_token: Option<String>,
    /// Expiry of the new access token, when the provider reports one.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Failures of the refresh exchange.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// The request never completed (network, DNS, timeout).
    #[error("token exchange request failed: {0}")]
    ExchangeFailed(String),
    /// The token endpoint answered with a non-success status.
    #[error("token endpoint returned {status}: {body}")]
    ExchangeRejected {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
    /// The endpoint answered 2xx but the body did not parse.
    #[error("malformed token response: {0}")]
    MalformedResponse(String),
}

/// External token-exchange collaborator.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// Exchange a refresh token for a fresh access token.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, OAuthError>;
}

/// Whether a credential expiring at `expires_at` needs refreshing now,
/// treating anything within `buffer_seconds` of expiry as already expired.
#[must_use]
pub fn is_expired(expires_at: DateTime<Utc>, buffer_seconds: i64) -> bool {
    is_expired_at(expires_at, buffer_seconds, Utc::now())
}

/// Deterministic variant of [`is_expired`] with an explicit clock.
#[must_use]
pub fn is_expired_at(expires_at: DateTime<Utc>, buffer_seconds: i64, now: DateTime<Utc>) -> bool {
    expires_at - Duration::seconds(buffer_seconds) <= now
}
