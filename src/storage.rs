// ABOUTME: JSON-file persistence for admin users, the signing secret, and gateway settings
// ABOUTME: Loads distinguish fresh-start from read-error; settings writes are atomic replacements
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # File-Backed Stores
//!
//! Three stores live under the gateway data directory (default
//! `~/.localgate/`):
//!
//! - [`UserStore`] — `admin_users.json`, administrator records keyed by
//!   username.
//! - [`SigningSecretStore`] — `.signing_secret`, the token signing secret in
//!   its own file with restrictive permissions, never co-located with user
//!   records.
//! - [`SettingsStore`] — `settings.json`, gateway settings including the
//!   delegated OAuth credential. Writes replace the file atomically so a
//!   concurrent reader never observes a partially written credential.
//!
//! Loads return [`LoadOutcome`] so callers (and tests) can tell a fresh
//! start apart from a read failure; both yield a safe empty default.

use crate::constants::limits;
use crate::crypto;
use crate::models::{AdminUser, GatewaySettings};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of loading persisted state from disk.
#[derive(Debug)]
pub enum LoadOutcome<T> {
    /// The file existed and parsed.
    Loaded(T),
    /// No file on disk; expected on first run.
    NoPriorState,
    /// The file exists but could not be read or parsed.
    ReadError(String),
}

impl<T: Default> LoadOutcome<T> {
    /// Collapse to the loaded value or the safe empty default, logging the
    /// distinction at an appropriate level.
    pub fn into_state(self, what: &str) -> T {
        match self {
            Self::Loaded(value) => value,
            Self::NoPriorState => {
                tracing::debug!("no persisted {what} found, starting empty");
                T::default()
            }
            Self::ReadError(error) => {
                tracing::warn!("failed to load persisted {what}: {error}; starting empty");
                T::default()
            }
        }
    }
}

fn load_json<T: for<'de> Deserialize<'de>>(path: &Path) -> LoadOutcome<T> {
    if !path.exists() {
        return LoadOutcome::NoPriorState;
    }
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(error) => return LoadOutcome::ReadError(error.to_string()),
    };
    match serde_json::from_str(&contents) {
        Ok(value) => LoadOutcome::Loaded(value),
        Err(error) => LoadOutcome::ReadError(error.to_string()),
    }
}

/// Write `contents` to `path` via a temp file in the same directory plus an
/// atomic rename, so readers see either the old file or the new one.
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, contents)
        .with_context(|| format!("writing {}", temp_path.display()))?;
    fs::rename(&temp_path, path)
        .with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

/// On-disk shape of `admin_users.json`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct UsersFile {
    users: HashMap<String, AdminUser>,
}

/// Administrator records, keyed by username.
#[derive(Debug, Clone)]
pub struct UserStore {
    path: PathBuf,
}

impl UserStore {
    /// A store backed by the given file path.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load all administrator records.
    #[must_use]
    pub fn load(&self) -> LoadOutcome<HashMap<String, AdminUser>> {
        match load_json::<UsersFile>(&self.path) {
            LoadOutcome::Loaded(file) => LoadOutcome::Loaded(file.users),
            LoadOutcome::NoPriorState => LoadOutcome::NoPriorState,
            LoadOutcome::ReadError(error) => LoadOutcome::ReadError(error),
        }
    }

    /// Persist all administrator records.
    pub fn save(&self, users: &HashMap<String, AdminUser>) -> Result<()> {
        let file = UsersFile {
            users: users.clone(),
        };
        let contents =
            serde_json::to_string_pretty(&file).context("serializing admin user records")?;
        write_atomic(&self.path, &contents)
    }
}

/// The token signing secret, persisted in its own file.
#[derive(Debug, Clone)]
pub struct SigningSecretStore {
    path: PathBuf,
}

impl SigningSecretStore {
    /// A store backed by the given file path.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load the secret, generating and persisting a new one when the file is
    /// missing or its contents are too short to trust.
    pub fn load_or_create(&self) -> Result<String> {
        if let Ok(existing) = fs::read_to_string(&self.path) {
            let trimmed = existing.trim();
            if trimmed.len() >= limits::MIN_SIGNING_SECRET_CHARS {
                return Ok(trimmed.to_owned());
            }
            tracing::warn!(
                "signing secret at {} is too short, regenerating",
                self.path.display()
            );
        }

        let secret = crypto::generate_signing_secret()?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating data directory {}", parent.display()))?;
        }
        fs::write(&self.path, &secret)
            .with_context(|| format!("writing signing secret {}", self.path.display()))?;
        restrict_permissions(&self.path);
        tracing::info!("generated new token signing secret");
        Ok(secret)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(error) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!(
            "failed to restrict permissions on {}: {error}",
            path.display()
        );
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}

/// Gateway settings, including the delegated OAuth credential.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// A store backed by the given file path.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load the current settings.
    #[must_use]
    pub fn load(&self) -> LoadOutcome<GatewaySettings> {
        load_json(&self.path)
    }

    /// Atomically replace the settings file.
    pub fn save(&self, settings: &GatewaySettings) -> Result<()> {
        let contents =
            serde_json::to_string_pretty(settings).context("serializing gateway settings")?;
        write_atomic(&self.path, &contents)
    }
}
