// ABOUTME: Administrator authentication and session management
// ABOUTME: Durable identity store plus in-memory bearer tokens with fixed 24h expiry
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Authentication and Session Management
//!
//! [`AuthManager`] owns two maps behind one mutex: administrator records
//! (mirrored to disk through a [`UserStore`]) and issued session tokens
//! (in-memory only, lost on restart by design). One exclusion domain covers
//! both so token revocation driven by user mutation cannot race a lookup.
//!
//! Tokens are bearer credentials of the form
//! `"{username}:{timestampMillis}:{randomHex}:{signatureHex}"`. Validation
//! is presence-in-memory: a token that re-signs correctly but was never
//! issued by this process (or was revoked) is rejected.
//!
//! Persistence failures on save are logged and swallowed; the in-memory
//! view stays authoritative for the life of the process.

use crate::constants::limits;
use crate::crypto;
use crate::models::{AdminUser, AdminUserInfo, TokenRecord};
use crate::storage::UserStore;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

struct AuthState {
    users: HashMap<String, AdminUser>,
    tokens: HashMap<String, TokenRecord>,
}

/// Administrator identity store and session-token issuer.
pub struct AuthManager {
    state: Mutex<AuthState>,
    store: UserStore,
    signing_secret: String,
    token_expiry: Duration,
}

impl AuthManager {
    /// Create a manager backed by `store`, loading any persisted users.
    ///
    /// A missing or unreadable user file starts the manager empty rather
    /// than failing; the distinction is logged.
    #[must_use]
    pub fn new(store: UserStore, signing_secret: String) -> Self {
        Self::with_token_expiry(store, signing_secret, limits::SESSION_TOKEN_EXPIRY_HOURS)
    }

    /// Like [`new`](Self::new) with an explicit token lifetime in hours.
    #[must_use]
    pub fn with_token_expiry(
        store: UserStore,
        signing_secret: String,
        token_expiry_hours: i64,
    ) -> Self {
        let users = store.load().into_state("admin users");
        tracing::info!("auth manager loaded {} admin user(s)", users.len());
        Self {
            state: Mutex::new(AuthState {
                users,
                tokens: HashMap::new(),
            }),
            store,
            signing_secret,
            token_expiry: Duration::hours(token_expiry_hours),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AuthState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Best-effort persistence; a failed save never rolls back memory.
    fn persist(&self, users: &HashMap<String, AdminUser>) {
        if let Err(error) = self.store.save(users) {
            tracing::warn!("failed to persist admin users: {error:#}");
        }
    }

    /// Register a new administrator. Returns false when the username is
    /// already taken.
    pub fn create_user(&self, username: &str, password: &str) -> bool {
        let mut state = self.lock();
        if state.users.contains_key(username) {
            tracing::warn!("refusing to create duplicate admin user {username}");
            return false;
        }
        let user = AdminUser::new(crypto::hash_password(password));
        state.users.insert(username.to_owned(), user);
        self.persist(&state.users);
        tracing::info!("created admin user {username}");
        true
    }

    /// Remove an administrator and revoke all of their tokens. Returns false
    /// when the user does not exist.
    pub fn delete_user(&self, username: &str) -> bool {
        let mut state = self.lock();
        if state.users.remove(username).is_none() {
            return false;
        }
        state.tokens.retain(|_, record| record.username != username);
        self.persist(&state.users);
        tracing::info!("deleted admin user {username}");
        true
    }

    /// Verify credentials and mint a session token on success.
    ///
    /// A successful login refreshes `last_login`, transparently upgrades a
    /// legacy password hash to the tagged format, and persists both changes.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<String> {
        let mut state = self.lock();
        let stored_hash = state.users.get(username)?.password_hash.clone();
        if !crypto::verify_password(password, &stored_hash) {
            tracing::warn!("failed login attempt for {username}");
            return None;
        }

        let now = Utc::now();
        if let Some(user) = state.users.get_mut(username) {
            if crypto::is_legacy_hash(&user.password_hash) {
                user.password_hash = crypto::hash_password(password);
                tracing::info!("upgraded legacy password hash for {username}");
            }
            user.last_login = Some(now);
        }
        self.persist(&state.users);

        let token = self.mint_token(username);
        state.tokens.insert(
            token.clone(),
            TokenRecord {
                username: username.to_owned(),
                issued_at: now,
                expires_at: now + self.token_expiry,
            },
        );
        tracing::info!("issued session token for {username}");
        Some(token)
    }

    /// Resolve a bearer token to its username.
    ///
    /// Absent, revoked, and expired tokens are all observably "not found";
    /// expired records are evicted here.
    pub fn verify_token(&self, token: &str) -> Option<String> {
        let mut state = self.lock();
        let record = state.tokens.get(token)?.clone();
        if Utc::now() > record.expires_at {
            state.tokens.remove(token);
            return None;
        }
        Some(record.username)
    }

    /// Change a password, revoking every outstanding token for the user.
    /// Returns false when the user is absent or `old_password` fails to
    /// verify; nothing changes in that case.
    pub fn change_password(&self, username: &str, old_password: &str, new_password: &str) -> bool {
        let mut state = self.lock();
        let Some(user) = state.users.get_mut(username) else {
            return false;
        };
        if !crypto::verify_password(old_password, &user.password_hash) {
            tracing::warn!("rejected password change for {username}: old password mismatch");
            return false;
        }
        user.password_hash = crypto::hash_password(new_password);
        state.tokens.retain(|_, record| record.username != username);
        self.persist(&state.users);
        tracing::info!("changed password for {username}, all sessions revoked");
        true
    }

    /// Revoke one token. Returns false when it was not active.
    pub fn logout(&self, token: &str) -> bool {
        self.lock().tokens.remove(token).is_some()
    }

    /// Whether any administrator exists; collaborators use this to force
    /// first-run registration.
    #[must_use]
    pub fn has_users(&self) -> bool {
        !self.lock().users.is_empty()
    }

    /// List administrators without exposing password hashes.
    #[must_use]
    pub fn list_users(&self) -> Vec<AdminUserInfo> {
        let state = self.lock();
        let mut users: Vec<AdminUserInfo> = state
            .users
            .iter()
            .map(|(username, user)| AdminUserInfo {
                username: username.clone(),
                created_at: user.created_at,
                last_login: user.last_login,
            })
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        users
    }

    /// Number of currently active (unexpired, unrevoked) token records.
    #[must_use]
    pub fn active_token_count(&self) -> usize {
        self.lock().tokens.len()
    }

    fn mint_token(&self, username: &str) -> String {
        let timestamp = Utc::now().timestamp_millis();
        let nonce = crypto::generate_token_nonce();
        let payload = format!("{username}:{timestamp}:{nonce}");
        let signature = crypto::sign_token_payload(&self.signing_secret, &payload);
        format!("{payload}:{signature}")
    }
}
