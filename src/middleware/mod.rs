// ABOUTME: Axum middleware seams between the request layer and the gateway core
// ABOUTME: Bearer-token admission for admin routes and per-caller rate limiting
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! HTTP middleware wiring the core components into the request path.

pub mod auth;
pub mod rate_limiting;

pub use auth::{require_admin_token, AdminIdentity};
pub use rate_limiting::{derive_client_id, enforce_rate_limit};
