// ABOUTME: Centralized constants for limits, time windows, file names, and env var names
// ABOUTME: Single source of truth so tunable values are never scattered as magic numbers
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Gateway-wide constants.

/// Security and capacity limits.
pub mod limits {
    /// PBKDF2-HMAC-SHA256 iteration count for password hashing.
    pub const PBKDF2_ITERATIONS: u32 = 260_000;

    /// Random salt length in bytes, one per stored password hash.
    pub const PASSWORD_SALT_LEN: usize = 32;

    /// Derived key length in bytes for PBKDF2 output.
    pub const DERIVED_KEY_LEN: usize = 32;

    /// Signing secret length in raw bytes (persisted hex-encoded).
    pub const SIGNING_SECRET_LEN: usize = 32;

    /// Minimum acceptable length, in characters, of a persisted signing secret.
    pub const MIN_SIGNING_SECRET_CHARS: usize = 32;

    /// Random nonce length in bytes embedded in each session token.
    pub const TOKEN_NONCE_LEN: usize = 16;

    /// Session token signatures are truncated to this many hex characters.
    pub const TOKEN_SIGNATURE_HEX_CHARS: usize = 32;

    /// Session token lifetime in hours, fixed from issuance (not sliding).
    pub const SESSION_TOKEN_EXPIRY_HOURS: i64 = 24;

    /// Maximum number of distinct caller identities tracked by the rate limiter.
    pub const MAX_TRACKED_CLIENTS: usize = 10_000;

    /// Default per-minute request limit.
    pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;

    /// Default per-hour request limit.
    pub const DEFAULT_REQUESTS_PER_HOUR: u32 = 1_000;

    /// Default per-day request limit.
    pub const DEFAULT_REQUESTS_PER_DAY: u32 = 10_000;

    /// Caller identity uses at most this many leading characters of the
    /// Authorization header value.
    pub const CLIENT_ID_PREFIX_CHARS: usize = 20;
}

/// Time windows and scheduling periods.
pub mod time {
    /// One minute in milliseconds.
    pub const MINUTE_MS: i64 = 60 * 1_000;

    /// One hour in milliseconds.
    pub const HOUR_MS: i64 = 60 * MINUTE_MS;

    /// One day in milliseconds; the widest rate-limit window.
    pub const DAY_MS: i64 = 24 * HOUR_MS;

    /// Seconds between token refresher wakeups.
    pub const REFRESH_CHECK_INTERVAL_SECS: u64 = 3_600;

    /// Refresh proactively when expiry is within this many seconds.
    pub const REFRESH_BUFFER_SECS: i64 = 300;

    /// Bounded wait for a refresh handed off to the primary async runtime.
    pub const REFRESH_HANDOFF_TIMEOUT_SECS: u64 = 30;

    /// Bounded wait for the refresher thread to exit on stop.
    pub const REFRESHER_SHUTDOWN_TIMEOUT_SECS: u64 = 5;

    /// Timeout for the outbound token exchange request.
    pub const TOKEN_EXCHANGE_TIMEOUT_SECS: u64 = 30;
}

/// File names inside the gateway data directory.
pub mod files {
    /// Default data directory name under the user's home directory.
    pub const DATA_DIR_NAME: &str = ".localgate";

    /// Admin user records, keyed by username.
    pub const ADMIN_USERS: &str = "admin_users.json";

    /// Token signing secret; never co-located with user records.
    pub const SIGNING_SECRET: &str = ".signing_secret";

    /// Gateway settings including the delegated OAuth credential.
    pub const SETTINGS: &str = "settings.json";
}

/// Environment variable names recognized by `GatewayConfig::from_env`.
pub mod env_config {
    /// Override for the data directory path.
    pub const DATA_DIR: &str = "LOCALGATE_DATA_DIR";

    /// Session token lifetime in hours.
    pub const TOKEN_EXPIRY_HOURS: &str = "LOCALGATE_TOKEN_EXPIRY_HOURS";

    /// Enable/disable rate limiting ("true"/"false").
    pub const RATE_LIMIT_ENABLED: &str = "LOCALGATE_RATE_LIMIT_ENABLED";

    /// Per-minute request limit.
    pub const RATE_LIMIT_PER_MINUTE: &str = "LOCALGATE_RATE_LIMIT_PER_MINUTE";

    /// Per-hour request limit.
    pub const RATE_LIMIT_PER_HOUR: &str = "LOCALGATE_RATE_LIMIT_PER_HOUR";

    /// Per-day request limit.
    pub const RATE_LIMIT_PER_DAY: &str = "LOCALGATE_RATE_LIMIT_PER_DAY";

    /// Seconds between refresher wakeups.
    pub const REFRESH_CHECK_INTERVAL_SECS: &str = "LOCALGATE_REFRESH_CHECK_INTERVAL_SECS";

    /// Refresh buffer in seconds before expiry.
    pub const REFRESH_BUFFER_SECS: &str = "LOCALGATE_REFRESH_BUFFER_SECS";

    /// OAuth token endpoint URL for the refresh exchange.
    pub const OAUTH_TOKEN_URL: &str = "LOCALGATE_OAUTH_TOKEN_URL";

    /// OAuth client id sent with the refresh exchange.
    pub const OAUTH_CLIENT_ID: &str = "LOCALGATE_OAUTH_CLIENT_ID";

    /// Log level when RUST_LOG is unset.
    pub const LOG_LEVEL: &str = "LOCALGATE_LOG_LEVEL";

    /// Log output format: "json", "pretty", or "compact".
    pub const LOG_FORMAT: &str = "LOCALGATE_LOG_FORMAT";
}

/// Protocol-level literals.
pub mod protocol {
    /// Sentinel caller identity when neither header nor peer address is known.
    pub const UNKNOWN_CLIENT_ID: &str = "unknown";

    /// Bearer scheme prefix in Authorization headers.
    pub const BEARER_PREFIX: &str = "Bearer ";

    /// Tag prefix of the PBKDF2 stored-hash format.
    pub const PBKDF2_HASH_TAG: &str = "pbkdf2:";
}
