// ABOUTME: Process-wide dependency context wiring the auth manager, limiter, and refresher
// ABOUTME: Constructed once at startup and passed explicitly instead of global singletons
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Gateway Context
//!
//! One [`GatewayContext`] per process, constructed from [`GatewayConfig`]
//! at startup and handed to every consumer that needs the shared
//! components. Single-instance-per-process semantics without hidden
//! process-wide state.

use crate::auth::AuthManager;
use crate::config::GatewayConfig;
use crate::oauth::{HttpTokenExchange, OAuthTokenRefresher};
use crate::rate_limiting::RateLimiter;
use crate::storage::{SettingsStore, SigningSecretStore, UserStore};
use anyhow::{Context, Result};
use std::sync::Arc;

/// Shared components of the gateway core.
#[derive(Clone)]
pub struct GatewayContext {
    /// Administrator identities and session tokens.
    pub auth: Arc<AuthManager>,
    /// Per-caller admission control.
    pub rate_limiter: Arc<RateLimiter>,
    /// Background OAuth credential maintenance.
    pub refresher: Arc<OAuthTokenRefresher>,
}

impl GatewayContext {
    /// Wire up all components from configuration.
    ///
    /// Loads or creates the signing secret, so this touches the data
    /// directory. The refresher is returned stopped; call
    /// [`OAuthTokenRefresher::start`] from within the host runtime.
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let signing_secret = SigningSecretStore::new(config.signing_secret_path())
            .load_or_create()
            .context("initializing token signing secret")?;
        let auth = Arc::new(AuthManager::with_token_expiry(
            UserStore::new(config.users_path()),
            signing_secret,
            config.token_expiry_hours,
        ));

        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));

        let settings = Arc::new(SettingsStore::new(config.settings_path()));
        let exchange = Arc::new(
            HttpTokenExchange::new(config.token_exchange.clone())
                .context("initializing token exchange client")?,
        );
        let refresher = Arc::new(OAuthTokenRefresher::new(
            config.refresher.clone(),
            settings,
            exchange,
        ));

        Ok(Self {
            auth,
            rate_limiter,
            refresher,
        })
    }

    /// Assemble a context from pre-built components, for hosts and tests
    /// that wire their own collaborators.
    #[must_use]
    pub const fn from_parts(
        auth: Arc<AuthManager>,
        rate_limiter: Arc<RateLimiter>,
        refresher: Arc<OAuthTokenRefresher>,
    ) -> Self {
        Self {
            auth,
            rate_limiter,
            refresher,
        }
    }
}
