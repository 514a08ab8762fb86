// ABOUTME: Environment-based gateway configuration with sane defaults
// ABOUTME: Every knob has an env override; unparseable values warn and fall back to defaults
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Gateway Configuration
//!
//! Environment-only configuration: no config files, every setting comes from
//! an env var or its default. Invalid values never abort startup; they log a
//! warning and fall back.

use crate::constants::{env_config, files, limits, time};
use crate::oauth::{RefresherConfig, TokenExchangeConfig};
use crate::rate_limiting::RateLimitConfig;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Top-level configuration for the gateway core.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Directory holding all persisted state.
    pub data_dir: PathBuf,
    /// Session token lifetime in hours.
    pub token_expiry_hours: i64,
    /// Rate limiter settings.
    pub rate_limit: RateLimitConfig,
    /// Background refresher scheduling.
    pub refresher: RefresherConfig,
    /// Token endpoint for the refresh exchange.
    pub token_exchange: TokenExchangeConfig,
}

impl GatewayConfig {
    /// Build configuration from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        let data_dir = std::env::var(env_config::DATA_DIR).map_or_else(
            |_| default_data_dir(),
            PathBuf::from,
        );

        let rate_limit = RateLimitConfig {
            enabled: env_parsed(env_config::RATE_LIMIT_ENABLED, true),
            requests_per_minute: env_parsed(
                env_config::RATE_LIMIT_PER_MINUTE,
                limits::DEFAULT_REQUESTS_PER_MINUTE,
            ),
            requests_per_hour: env_parsed(
                env_config::RATE_LIMIT_PER_HOUR,
                limits::DEFAULT_REQUESTS_PER_HOUR,
            ),
            requests_per_day: env_parsed(
                env_config::RATE_LIMIT_PER_DAY,
                limits::DEFAULT_REQUESTS_PER_DAY,
            ),
        };

        let refresher = RefresherConfig {
            check_interval: Duration::from_secs(env_parsed(
                env_config::REFRESH_CHECK_INTERVAL_SECS,
                time::REFRESH_CHECK_INTERVAL_SECS,
            )),
            refresh_buffer_seconds: env_parsed(
                env_config::REFRESH_BUFFER_SECS,
                time::REFRESH_BUFFER_SECS,
            ),
            ..RefresherConfig::default()
        };

        let token_exchange = TokenExchangeConfig {
            token_url: std::env::var(env_config::OAUTH_TOKEN_URL).unwrap_or_default(),
            client_id: std::env::var(env_config::OAUTH_CLIENT_ID).unwrap_or_default(),
        };

        Self {
            data_dir,
            token_expiry_hours: env_parsed(
                env_config::TOKEN_EXPIRY_HOURS,
                limits::SESSION_TOKEN_EXPIRY_HOURS,
            ),
            rate_limit,
            refresher,
            token_exchange,
        }
    }

    /// Path of the admin user records file.
    #[must_use]
    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join(files::ADMIN_USERS)
    }

    /// Path of the signing secret file.
    #[must_use]
    pub fn signing_secret_path(&self) -> PathBuf {
        self.data_dir.join(files::SIGNING_SECRET)
    }

    /// Path of the gateway settings file.
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(files::SETTINGS)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir().map_or_else(
        || PathBuf::from(files::DATA_DIR_NAME),
        |home| home.join(files::DATA_DIR_NAME),
    )
}

/// Read and parse an env var, warning and falling back on invalid values.
fn env_parsed<T: FromStr + Copy>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("invalid value for {name}: {raw:?}, using default");
            default
        }),
        Err(_) => default,
    }
}
