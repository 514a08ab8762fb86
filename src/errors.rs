// ABOUTME: Unified error handling - error codes, the AppError type, and HTTP response bodies
// ABOUTME: Keeps error classification and wire formatting consistent across all modules
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Unified Error Handling
//!
//! Centralized error codes, the [`AppError`] type, and the JSON body shape
//! returned to HTTP callers. Every rejection the gateway produces goes
//! through [`ErrorResponse`] so clients see one consistent format:
//!
//! ```json
//! {"error": {"message": "...", "type": "rate_limit_error", "code": "rate_limit_exceeded"}}
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the gateway core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Authentication is required but was not supplied.
    #[serde(rename = "auth_required")]
    AuthRequired,
    /// Supplied credentials or token are invalid.
    #[serde(rename = "auth_invalid")]
    AuthInvalid,
    /// The session token has expired.
    #[serde(rename = "auth_expired")]
    AuthExpired,
    /// A rate-limit tier was exceeded.
    #[serde(rename = "rate_limit_exceeded")]
    RateLimitExceeded,
    /// The named resource does not exist.
    #[serde(rename = "resource_not_found")]
    ResourceNotFound,
    /// A resource with this identifier already exists.
    #[serde(rename = "resource_already_exists")]
    ResourceAlreadyExists,
    /// An upstream service returned an error.
    #[serde(rename = "external_service_error")]
    ExternalServiceError,
    /// Configuration is missing or invalid.
    #[serde(rename = "config_error")]
    ConfigError,
    /// A persistence operation failed.
    #[serde(rename = "storage_error")]
    StorageError,
    /// Unclassified internal failure.
    #[serde(rename = "internal_error")]
    InternalError,
}

impl ErrorCode {
    /// HTTP status code for this error.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::AuthRequired | Self::AuthInvalid | Self::AuthExpired => 401,
            Self::RateLimitExceeded => 429,
            Self::ResourceNotFound => 404,
            Self::ResourceAlreadyExists => 409,
            Self::ExternalServiceError => 502,
            Self::ConfigError | Self::StorageError | Self::InternalError => 500,
        }
    }

    /// Error category string used in the `type` field of wire responses.
    #[must_use]
    pub const fn error_type(self) -> &'static str {
        match self {
            Self::AuthRequired | Self::AuthInvalid | Self::AuthExpired => "auth_error",
            Self::RateLimitExceeded => "rate_limit_error",
            Self::ResourceNotFound | Self::ResourceAlreadyExists => "invalid_request_error",
            Self::ExternalServiceError => "external_service_error",
            Self::ConfigError | Self::StorageError | Self::InternalError => "api_error",
        }
    }

    /// Stable machine-readable code string, matching the serde rename.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthRequired => "auth_required",
            Self::AuthInvalid => "auth_invalid",
            Self::AuthExpired => "auth_expired",
            Self::RateLimitExceeded => "rate_limit_exceeded",
            Self::ResourceNotFound => "resource_not_found",
            Self::ResourceAlreadyExists => "resource_already_exists",
            Self::ExternalServiceError => "external_service_error",
            Self::ConfigError => "config_error",
            Self::StorageError => "storage_error",
            Self::InternalError => "internal_error",
        }
    }

    /// A user-friendly description of this error class.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::AuthRequired => "Authentication is required to access this resource",
            Self::AuthInvalid => "The provided authentication credentials are invalid",
            Self::AuthExpired => "The session token has expired",
            Self::RateLimitExceeded => "Rate limit exceeded. Please slow down your requests",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::ResourceAlreadyExists => "A resource with this identifier already exists",
            Self::ExternalServiceError => "An external service encountered an error",
            Self::ConfigError => "Configuration error encountered",
            Self::StorageError => "Storage operation failed",
            Self::InternalError => "An internal server error occurred",
        }
    }
}

/// The gateway's unified error type.
#[derive(Debug, Error)]
pub struct AppError {
    /// Classification code, drives HTTP status and wire fields.
    pub code: ErrorCode,
    /// Human-readable message for this specific occurrence.
    pub message: String,
    /// Underlying cause, when one exists.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl AppError {
    /// Create an error with the given code and message.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Attach an underlying cause.
    #[must_use]
    pub fn with_source(
        mut self,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Invalid or expired credentials.
    #[must_use]
    pub fn auth_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthInvalid, message)
    }

    /// Missing credentials.
    #[must_use]
    pub fn auth_required() -> Self {
        Self::new(ErrorCode::AuthRequired, ErrorCode::AuthRequired.description())
    }

    /// A rate-limit tier was exceeded; `message` carries the tier-scoped reason.
    #[must_use]
    pub fn rate_limit_exceeded(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RateLimitExceeded, message)
    }

    /// Unclassified internal failure.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

/// Convenience alias used across the crate.
pub type AppResult<T> = Result<T, AppError>;

/// JSON body returned to HTTP callers on rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// The error envelope.
    pub error: ErrorDetail,
}

/// Inner error envelope of [`ErrorResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Human-readable message.
    pub message: String,
    /// Error category, e.g. `rate_limit_error`.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Stable machine-readable code, e.g. `rate_limit_exceeded`.
    pub code: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        Self {
            error: ErrorDetail {
                message: error.message.clone(),
                error_type: error.code.error_type().to_owned(),
                code: error.code.as_str().to_owned(),
            },
        }
    }
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self::from(&error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping() {
        assert_eq!(ErrorCode::AuthInvalid.http_status(), 401);
        assert_eq!(ErrorCode::RateLimitExceeded.http_status(), 429);
        assert_eq!(ErrorCode::ResourceNotFound.http_status(), 404);
        assert_eq!(ErrorCode::ResourceAlreadyExists.http_status(), 409);
        assert_eq!(ErrorCode::ExternalServiceError.http_status(), 502);
        assert_eq!(ErrorCode::InternalError.http_status(), 500);
    }

    #[test]
    fn rate_limit_response_shape() {
        let response =
            ErrorResponse::from(AppError::rate_limit_exceeded("Rate limit exceeded: 60 requests per minute"));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json["error"]["message"],
            "Rate limit exceeded: 60 requests per minute"
        );
        assert_eq!(json["error"]["type"], "rate_limit_error");
        assert_eq!(json["error"]["code"], "rate_limit_exceeded");
    }

    #[test]
    fn display_includes_code_and_message() {
        let error = AppError::auth_invalid("bad token");
        assert_eq!(error.to_string(), "[auth_invalid] bad token");
    }
}
