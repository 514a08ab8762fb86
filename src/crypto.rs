// ABOUTME: Password hashing, token signing, and signing-secret generation primitives
// ABOUTME: PBKDF2-HMAC-SHA256 with a legacy SHA-256 compatibility path, all compares constant-time
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Credential Cryptography
//!
//! Stored password hashes are self-describing strings. The current format is
//! `pbkdf2:<saltHex>:<hashHex>` (PBKDF2-HMAC-SHA256, 260,000 iterations,
//! 32-byte random salt). A legacy format, a bare hex SHA-256 digest with no
//! salt, still verifies for backward compatibility; the auth manager upgrades
//! it in place after a successful login.
//!
//! Session token signatures are HMAC-SHA256 over the token payload with the
//! process-wide signing secret, truncated to 32 hex characters.

use crate::constants::{limits, protocol};
use anyhow::{anyhow, Result};
use rand::RngCore;
use ring::rand::SecureRandom;
use ring::{hmac, pbkdf2};
use sha2::{Digest, Sha256};
use std::num::NonZeroU32;
use subtle::ConstantTimeEq;

fn pbkdf2_iterations() -> NonZeroU32 {
    NonZeroU32::new(limits::PBKDF2_ITERATIONS).unwrap_or(NonZeroU32::MIN)
}

/// A parsed stored password hash, dispatched on its format tag.
///
/// Closed set of variants so every call site handles both formats; an
/// unparseable stored value verifies as `false` rather than erroring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordHash {
    /// Tagged format: per-user salt plus PBKDF2-derived key.
    Pbkdf2 {
        /// Random salt bytes.
        salt: Vec<u8>,
        /// Derived key bytes.
        derived: Vec<u8>,
    },
    /// Legacy format: bare hex SHA-256 digest of the password, no salt.
    LegacySha256 {
        /// Hex digest as stored.
        digest: String,
    },
}

impl PasswordHash {
    /// Parse a stored hash string into its variant.
    ///
    /// Returns `None` when a tagged value is structurally invalid. Untagged
    /// values are always treated as legacy digests.
    #[must_use]
    pub fn parse(stored: &str) -> Option<Self> {
        if let Some(rest) = stored.strip_prefix(protocol::PBKDF2_HASH_TAG) {
            let (salt_hex, hash_hex) = rest.split_once(':')?;
            let salt = hex::decode(salt_hex).ok()?;
            let derived = hex::decode(hash_hex).ok()?;
            if derived.is_empty() {
                return None;
            }
            Some(Self::Pbkdf2 { salt, derived })
        } else {
            Some(Self::LegacySha256 {
                digest: stored.to_owned(),
            })
        }
    }

    /// Verify a candidate password against this hash in constant time.
    #[must_use]
    pub fn verify(&self, password: &str) -> bool {
        match self {
            Self::Pbkdf2 { salt, derived } => {
                let mut candidate = vec![0u8; derived.len()];
                pbkdf2::derive(
                    pbkdf2::PBKDF2_HMAC_SHA256,
                    pbkdf2_iterations(),
                    salt,
                    password.as_bytes(),
                    &mut candidate,
                );
                constant_time_eq(&candidate, derived)
            }
            Self::LegacySha256 { digest } => {
                let computed = hex::encode(Sha256::digest(password.as_bytes()));
                constant_time_eq(computed.as_bytes(), digest.as_bytes())
            }
        }
    }

    /// Whether this hash uses the legacy untagged format.
    #[must_use]
    pub const fn is_legacy(&self) -> bool {
        matches!(self, Self::LegacySha256 { .. })
    }
}

/// Derive a fresh tagged hash string for storage.
#[must_use]
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; limits::PASSWORD_SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let mut derived = [0u8; limits::DERIVED_KEY_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        pbkdf2_iterations(),
        &salt,
        password.as_bytes(),
        &mut derived,
    );
    format!(
        "{}{}:{}",
        protocol::PBKDF2_HASH_TAG,
        hex::encode(salt),
        hex::encode(derived)
    )
}

/// Verify a password against a stored hash string of either format.
///
/// Unparseable stored values verify as `false`.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::parse(stored).is_some_and(|hash| hash.verify(password))
}

/// Whether a stored hash string is in the legacy untagged format.
#[must_use]
pub fn is_legacy_hash(stored: &str) -> bool {
    !stored.starts_with(protocol::PBKDF2_HASH_TAG)
}

/// Sign a session token payload (`"{username}:{timestampMillis}:{randomHex}"`).
///
/// Returns the first 32 hex characters of `HMAC-SHA256(secret, payload)`.
#[must_use]
pub fn sign_token_payload(secret: &str, payload: &str) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    let tag = hmac::sign(&key, payload.as_bytes());
    let mut signature = hex::encode(tag.as_ref());
    signature.truncate(limits::TOKEN_SIGNATURE_HEX_CHARS);
    signature
}

/// Check the embedded signature of a bearer token string and return the
/// username it names. Structural validity only; issuance is not consulted,
/// so callers wanting authorization must still look the token up in the
/// auth manager.
#[must_use]
pub fn verify_token_signature(secret: &str, token: &str) -> Option<String> {
    let mut parts = token.rsplitn(2, ':');
    let signature = parts.next()?;
    let payload = parts.next()?;
    if payload.splitn(3, ':').count() != 3 {
        return None;
    }
    let expected = sign_token_payload(secret, payload);
    if constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
        payload.split(':').next().map(ToOwned::to_owned)
    } else {
        None
    }
}

/// Generate a fresh hex-encoded signing secret from the system CSPRNG.
pub fn generate_signing_secret() -> Result<String> {
    let rng = ring::rand::SystemRandom::new();
    let mut bytes = [0u8; limits::SIGNING_SECRET_LEN];
    rng.fill(&mut bytes)
        .map_err(|_| anyhow!("system random generator unavailable"))?;
    Ok(hex::encode(bytes))
}

/// Generate a hex-encoded random nonce for a session token.
#[must_use]
pub fn generate_token_nonce() -> String {
    let mut bytes = [0u8; limits::TOKEN_NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Constant-time byte comparison; unequal lengths compare unequal without
/// leaking where the difference is.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
