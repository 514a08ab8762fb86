// ABOUTME: Integration tests for the file-backed stores
// ABOUTME: Covers load outcome distinction, round-trips, secret permissions, and atomic writes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use chrono::{TimeZone, Utc};
use localgate::models::{AdminUser, AuthType, GatewaySettings};
use localgate::storage::{LoadOutcome, SettingsStore, SigningSecretStore, UserStore};
use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;

#[test]
fn missing_file_is_no_prior_state() {
    let dir = TempDir::new().unwrap();
    let store = UserStore::new(dir.path().join("admin_users.json"));
    assert!(matches!(store.load(), LoadOutcome::NoPriorState));

    let settings = SettingsStore::new(dir.path().join("settings.json"));
    assert!(matches!(settings.load(), LoadOutcome::NoPriorState));
}

#[test]
fn garbage_file_is_a_read_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("admin_users.json");
    fs::write(&path, "{not json").unwrap();
    let store = UserStore::new(path);
    assert!(matches!(store.load(), LoadOutcome::ReadError(_)));
}

#[test]
fn user_store_round_trips() {
    let dir = TempDir::new().unwrap();
    let store = UserStore::new(dir.path().join("admin_users.json"));

    let mut users = HashMap::new();
    let mut user = AdminUser::new("pbkdf2:aa:bb".to_owned());
    user.last_login = Some(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap());
    users.insert("alice".to_owned(), user);
    store.save(&users).unwrap();

    match store.load() {
        LoadOutcome::Loaded(loaded) => {
            assert_eq!(loaded.len(), 1);
            assert_eq!(loaded["alice"].password_hash, "pbkdf2:aa:bb");
            assert!(loaded["alice"].last_login.is_some());
        }
        other => panic!("expected loaded users, got {other:?}"),
    }
}

#[test]
fn user_file_wraps_records_under_users_key() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("admin_users.json");
    let store = UserStore::new(path.clone());
    let mut users = HashMap::new();
    users.insert("alice".to_owned(), AdminUser::new("pbkdf2:aa:bb".to_owned()));
    store.save(&users).unwrap();

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert!(raw["users"]["alice"]["password_hash"].is_string());
    assert!(raw["users"]["alice"]["created_at"].is_string());
}

#[test]
fn settings_store_round_trips_and_leaves_no_temp_file() {
    let dir = TempDir::new().unwrap();
    let store = SettingsStore::new(dir.path().join("settings.json"));

    let settings = GatewaySettings {
        auth_type: Some(AuthType::OAuth),
        oauth_access_token: Some("at".to_owned()),
        oauth_refresh_token: Some("rt".to_owned()),
        oauth_expires_at: Some(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()),
    };
    store.save(&settings).unwrap();
    store.save(&settings).unwrap();

    match store.load() {
        LoadOutcome::Loaded(loaded) => {
            assert_eq!(loaded.auth_type, Some(AuthType::OAuth));
            assert_eq!(loaded.oauth_refresh_token.as_deref(), Some("rt"));
        }
        other => panic!("expected loaded settings, got {other:?}"),
    }

    // The atomic write leaves only the final file behind.
    let entries: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec!["settings.json"]);
}

#[test]
fn partial_settings_files_deserialize_with_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, r#"{"auth_type": "api-key"}"#).unwrap();

    let store = SettingsStore::new(path);
    match store.load() {
        LoadOutcome::Loaded(loaded) => {
            assert_eq!(loaded.auth_type, Some(AuthType::ApiKey));
            assert!(loaded.oauth_refresh_token.is_none());
            assert!(loaded.delegated_refresh_ready().is_none());
        }
        other => panic!("expected loaded settings, got {other:?}"),
    }
}

#[test]
fn signing_secret_is_created_once_and_stable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(".signing_secret");
    let store = SigningSecretStore::new(path.clone());

    let first = store.load_or_create().unwrap();
    assert_eq!(first.len(), 64);
    assert!(first.chars().all(|c| c.is_ascii_hexdigit()));

    let second = store.load_or_create().unwrap();
    assert_eq!(first, second);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

#[test]
fn short_signing_secret_is_regenerated() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(".signing_secret");
    fs::write(&path, "tooshort").unwrap();

    let store = SigningSecretStore::new(path);
    let secret = store.load_or_create().unwrap();
    assert_ne!(secret, "tooshort");
    assert_eq!(secret.len(), 64);
}
