// ABOUTME: Logging configuration and structured logging setup for observability and debugging
// ABOUTME: Configures tracing-subscriber with env-filter and selectable output formats
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Structured logging setup on `tracing` / `tracing-subscriber`.
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies.

use crate::constants::env_config;
use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Output format for log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Machine-readable JSON lines, for production log aggregation.
    Json,
    /// Multi-line human-readable output, for development.
    Pretty,
    /// Single-line human-readable output.
    Compact,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default level filter when `RUST_LOG` is unset, e.g. `"info"`.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Pretty,
        }
    }
}

impl LoggingConfig {
    /// Build logging configuration from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        let level = std::env::var(env_config::LOG_LEVEL).unwrap_or_else(|_| "info".to_owned());
        let format = match std::env::var(env_config::LOG_FORMAT).as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        };
        Self { level, format }
    }
}

/// Install the global tracing subscriber.
///
/// # Errors
/// Fails when a global subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    result.map_err(|error| anyhow!("failed to initialize logging: {error}"))
}
