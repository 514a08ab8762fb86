// ABOUTME: Core domain types - admin users, session token records, gateway settings
// ABOUTME: Serde-enabled structs shared between the auth manager, refresher, and storage
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Domain models persisted or held in memory by the gateway core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored administrator record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    /// Self-describing password hash, tagged `pbkdf2:<saltHex>:<hashHex>` or a
    /// legacy bare SHA-256 digest.
    pub password_hash: String,
    /// When the account was registered.
    pub created_at: DateTime<Utc>,
    /// Last successful login, if any.
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

impl AdminUser {
    /// A freshly registered user with the given stored hash.
    #[must_use]
    pub fn new(password_hash: String) -> Self {
        Self {
            password_hash,
            created_at: Utc::now(),
            last_login: None,
        }
    }
}

/// Public view of an administrator, safe to list: never exposes the hash.
#[derive(Debug, Clone, Serialize)]
pub struct AdminUserInfo {
    /// Account name.
    pub username: String,
    /// When the account was registered.
    pub created_at: DateTime<Utc>,
    /// Last successful login, if any.
    pub last_login: Option<DateTime<Utc>>,
}

/// In-memory record backing one issued session token.
///
/// Tokens are bearer credentials with a fixed lifetime from issuance.
/// Revocation (logout, password change, user deletion) removes the record;
/// expiry evicts it on the next lookup. Both are observably "not found".
#[derive(Debug, Clone)]
pub struct TokenRecord {
    /// The user this token was issued to.
    pub username: String,
    /// Issuance instant.
    pub issued_at: DateTime<Utc>,
    /// Fixed expiry instant, not sliding.
    pub expires_at: DateTime<Utc>,
}

/// Upstream authentication mode selected in gateway settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthType {
    /// Delegated third-party OAuth credential, maintained by the refresher.
    #[serde(rename = "oauth")]
    OAuth,
    /// Static API key; nothing to refresh.
    #[serde(rename = "api-key")]
    ApiKey,
    /// OpenAI-compatible upstream with its own key; nothing to refresh.
    #[serde(rename = "openai-compatible")]
    OpenAiCompatible,
}

/// Persisted gateway settings, including the delegated OAuth credential.
///
/// The on-disk copy is the single source of truth across restarts; the
/// refresher reads, mutates, and atomically rewrites it each cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// Upstream authentication mode.
    #[serde(default)]
    pub auth_type: Option<AuthType>,
    /// Current delegated access token.
    #[serde(default)]
    pub oauth_access_token: Option<String>,
    /// Refresh token used to renew the access token.
    #[serde(default)]
    pub oauth_refresh_token: Option<String>,
    /// Access token expiry instant.
    #[serde(default)]
    pub oauth_expires_at: Option<DateTime<Utc>>,
}

impl GatewaySettings {
    /// Returns the refresh token and expiry when this credential is eligible
    /// for background refresh: delegated OAuth mode with both fields present.
    #[must_use]
    pub fn delegated_refresh_ready(&self) -> Option<(&str, DateTime<Utc>)> {
        if self.auth_type != Some(AuthType::OAuth) {
            return None;
        }
        match (self.oauth_refresh_token.as_deref(), self.oauth_expires_at) {
            (Some(refresh_token), Some(expires_at)) => Some((refresh_token, expires_at)),
            _ => None,
        }
    }
}
