// ABOUTME: Bearer-token admission middleware for admin routes
// ABOUTME: Resolves the Authorization header through the auth manager and injects the identity
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Session-token authentication middleware.
//!
//! Admin routes sit behind [`require_admin_token`]: a request must carry
//! `Authorization: Bearer <token>` naming a live session token, otherwise
//! it is answered with 401 and the standard error body. On success the
//! resolved [`AdminIdentity`] is attached as a request extension.

use crate::constants::protocol;
use crate::context::GatewayContext;
use crate::errors::{AppError, ErrorResponse};
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::{header, StatusCode};

/// The authenticated administrator, attached as a request extension.
#[derive(Debug, Clone)]
pub struct AdminIdentity(pub String);

/// Reject requests lacking a valid admin session token.
pub async fn require_admin_token(
    State(context): State<GatewayContext>,
    mut request: Request,
    next: Next,
) -> Response {
    let username = bearer_token(&request).and_then(|token| context.auth.verify_token(token));
    match username {
        Some(username) => {
            tracing::debug!("admin request authenticated as {username}");
            request.extensions_mut().insert(AdminIdentity(username));
            next.run(request).await
        }
        None => unauthorized_response(),
    }
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(protocol::BEARER_PREFIX)
}

fn unauthorized_response() -> Response {
    let body = ErrorResponse::from(AppError::auth_invalid(
        "Invalid or expired session token",
    ));
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
