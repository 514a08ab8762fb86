// ABOUTME: Library root for the localgate trust and traffic control core
// ABOUTME: Exposes admin auth, sliding-window rate limiting, and OAuth credential refresh
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # localgate
//!
//! The trust-and-traffic-control core of a locally-hosted API gateway.
//! Three components, each independently testable:
//!
//! - [`auth::AuthManager`] — administrator identities, password
//!   verification, and short-lived bearer session tokens.
//! - [`rate_limiting::RateLimiter`] — per-caller sliding-window admission
//!   across minute, hour, and day tiers.
//! - [`oauth::OAuthTokenRefresher`] — a background worker that renews the
//!   delegated upstream OAuth credential before it expires.
//!
//! [`context::GatewayContext`] wires the three together from
//! [`config::GatewayConfig`]; [`middleware`] provides the axum seams the
//! request layer mounts in front of its routes.

#![deny(unsafe_code)]

pub mod auth;
pub mod config;
pub mod constants;
pub mod context;
pub mod crypto;
pub mod errors;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod oauth;
pub mod rate_limiting;
pub mod storage;
