// ABOUTME: HTTP implementation of the token exchange against a provider's token endpoint
// ABOUTME: Posts a refresh_token grant form via reqwest and normalizes the response
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! reqwest-backed [`TokenExchange`] implementation.

use super::{OAuthError, TokenExchange, TokenResponse};
use crate::constants::time;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::time::Duration as StdDuration;

/// Token endpoint settings for the refresh exchange.
#[derive(Debug, Clone)]
pub struct TokenExchangeConfig {
    /// Provider token endpoint URL.
    pub token_url: String,
    /// OAuth client id registered with the provider.
    pub client_id: String,
}

/// Wire shape of the provider's token response.
#[derive(Debug, Deserialize)]
struct WireTokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    /// Lifetime in seconds, the common OAuth2 form.
    #[serde(default)]
    expires_in: Option<i64>,
    /// Absolute expiry, preferred when the provider sends one.
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

/// [`TokenExchange`] over HTTP with the standard `refresh_token` grant.
#[derive(Debug, Clone)]
pub struct HttpTokenExchange {
    http: reqwest::Client,
    config: TokenExchangeConfig,
}

impl HttpTokenExchange {
    /// Build a client for the given endpoint settings.
    pub fn new(config: TokenExchangeConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(time::TOKEN_EXCHANGE_TIMEOUT_SECS))
            .build()
            .context("building token exchange HTTP client")?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl TokenExchange for HttpTokenExchange {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, OAuthError> {
        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", &self.config.client_id),
            ])
            .send()
            .await
            .map_err(|error| OAuthError::ExchangeFailed(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OAuthError::ExchangeRejected {
                status: status.as_u16(),
                body,
            });
        }

        let wire: WireTokenResponse = response
            .json()
            .await
            .map_err(|error| OAuthError::MalformedResponse(error.to_string()))?;

        let expires_at = wire
            .expires_at
            .or_else(|| wire.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)));

        Ok(TokenResponse {
            access_token: wire.access_token,
            refresh_token: wire.refresh_token,
            expires_at,
        })
    }
}
