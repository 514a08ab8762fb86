// ABOUTME: Sliding-window rate limiting engine for per-caller request throttling
// ABOUTME: Three rolling tiers (minute/hour/day) over one LRU-bounded timestamp ledger per caller
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Sliding-Window Rate Limiter
//!
//! Each caller identity owns an ordered ledger of request timestamps
//! (Unix milliseconds). Admission counts the trailing 60s, 3600s, and 24h
//! windows against configured limits; a single prune pass at the widest
//! window (24h) keeps the ledger bounded and makes its length the day count,
//! avoiding the double-count hazard of pruning each tier independently.
//!
//! The ledger map is an `lru::LruCache` capped at a fixed number of distinct
//! identities, so an attacker rotating identities cannot grow memory without
//! bound. Prune, count, record, and eviction happen as one atomic unit under
//! a single mutex, so two concurrent requests cannot both slip past a limit.

use crate::constants::{limits, time};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Rate limiter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// When false, every request is admitted without recording.
    pub enabled: bool,
    /// Maximum admitted requests in any trailing 60 seconds.
    pub requests_per_minute: u32,
    /// Maximum admitted requests in any trailing hour.
    pub requests_per_hour: u32,
    /// Maximum admitted requests in any trailing 24 hours.
    pub requests_per_day: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_minute: limits::DEFAULT_REQUESTS_PER_MINUTE,
            requests_per_hour: limits::DEFAULT_REQUESTS_PER_HOUR,
            requests_per_day: limits::DEFAULT_REQUESTS_PER_DAY,
        }
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request was admitted.
    pub allowed: bool,
    /// Tier-scoped human-readable reason when rejected.
    pub reason: Option<String>,
}

impl RateLimitDecision {
    const fn admitted() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn rejected(limit: u32, tier: &str) -> Self {
        Self {
            allowed: false,
            reason: Some(format!("Rate limit exceeded: {limit} requests per {tier}")),
        }
    }
}

/// Configured tier limits, echoed alongside stats.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RateLimitWindows {
    /// Per-minute limit.
    pub per_minute: u32,
    /// Per-hour limit.
    pub per_hour: u32,
    /// Per-day limit.
    pub per_day: u32,
}

/// Current per-tier counts for one caller identity.
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitStats {
    /// Requests in the trailing 60 seconds.
    pub minute: usize,
    /// Requests in the trailing hour.
    pub hour: usize,
    /// Requests in the trailing 24 hours.
    pub day: usize,
    /// Configured limits for context.
    pub limits: RateLimitWindows,
}

/// Sliding-window rate limiter over LRU-bounded per-caller ledgers.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    ledgers: Mutex<LruCache<String, Vec<i64>>>,
}

impl RateLimiter {
    /// A limiter with the default identity cap.
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_capacity(config, limits::MAX_TRACKED_CLIENTS)
    }

    /// A limiter tracking at most `max_clients` distinct caller identities.
    #[must_use]
    pub fn with_capacity(config: RateLimitConfig, max_clients: usize) -> Self {
        let capacity = NonZeroUsize::new(max_clients).unwrap_or(NonZeroUsize::MIN);
        Self {
            config,
            ledgers: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Vec<i64>>> {
        self.ledgers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admission check against all three tiers; appends the request timestamp
    /// when admitted.
    #[must_use]
    pub fn is_allowed(&self, client_id: &str) -> RateLimitDecision {
        self.is_allowed_at(client_id, now_millis())
    }

    /// Deterministic variant of [`is_allowed`](Self::is_allowed) with an
    /// explicit clock.
    #[must_use]
    pub fn is_allowed_at(&self, client_id: &str, now_ms: i64) -> RateLimitDecision {
        if !self.config.enabled {
            return RateLimitDecision::admitted();
        }

        let mut ledgers = self.lock();
        let ledger = Self::pruned_ledger(&mut ledgers, client_id, now_ms);

        let minute_count = count_since(ledger, now_ms - time::MINUTE_MS);
        if minute_count >= self.config.requests_per_minute as usize {
            return RateLimitDecision::rejected(self.config.requests_per_minute, "minute");
        }
        let hour_count = count_since(ledger, now_ms - time::HOUR_MS);
        if hour_count >= self.config.requests_per_hour as usize {
            return RateLimitDecision::rejected(self.config.requests_per_hour, "hour");
        }
        // The ledger already excludes anything older than 24h, so its length
        // is the day count.
        if ledger.len() >= self.config.requests_per_day as usize {
            return RateLimitDecision::rejected(self.config.requests_per_day, "day");
        }

        ledger.push(now_ms);
        RateLimitDecision::admitted()
    }

    /// Record a request without an admission decision, for callers that
    /// decided admission externally.
    pub fn record_request(&self, client_id: &str) {
        self.record_request_at(client_id, now_millis());
    }

    /// Deterministic variant of [`record_request`](Self::record_request).
    pub fn record_request_at(&self, client_id: &str, now_ms: i64) {
        if !self.config.enabled {
            return;
        }
        let mut ledgers = self.lock();
        let ledger = Self::pruned_ledger(&mut ledgers, client_id, now_ms);
        ledger.push(now_ms);
    }

    /// Current per-tier counts for one caller, without mutating any ledger
    /// or LRU ordering.
    #[must_use]
    pub fn get_stats(&self, client_id: &str) -> RateLimitStats {
        self.get_stats_at(client_id, now_millis())
    }

    /// Deterministic variant of [`get_stats`](Self::get_stats).
    #[must_use]
    pub fn get_stats_at(&self, client_id: &str, now_ms: i64) -> RateLimitStats {
        let ledgers = self.lock();
        let (minute, hour, day) = ledgers.peek(client_id).map_or((0, 0, 0), |ledger| {
            (
                count_since(ledger, now_ms - time::MINUTE_MS),
                count_since(ledger, now_ms - time::HOUR_MS),
                count_since(ledger, now_ms - time::DAY_MS),
            )
        });
        RateLimitStats {
            minute,
            hour,
            day,
            limits: RateLimitWindows {
                per_minute: self.config.requests_per_minute,
                per_hour: self.config.requests_per_hour,
                per_day: self.config.requests_per_day,
            },
        }
    }

    /// Clear history for one caller identity.
    pub fn reset(&self, client_id: &str) {
        self.lock().pop(client_id);
    }

    /// Clear history for every caller identity.
    pub fn reset_all(&self) {
        self.lock().clear();
    }

    /// Number of distinct caller identities currently tracked.
    #[must_use]
    pub fn tracked_clients(&self) -> usize {
        self.lock().len()
    }

    /// Fetch the caller's ledger, creating it if absent (evicting the
    /// least-recently-used identity when at capacity), prune entries older
    /// than the widest window, and mark the caller most-recently-used.
    fn pruned_ledger<'a>(
        ledgers: &'a mut LruCache<String, Vec<i64>>,
        client_id: &str,
        now_ms: i64,
    ) -> &'a mut Vec<i64> {
        if !ledgers.contains(client_id) && ledgers.len() == usize::from(ledgers.cap()) {
            if let Some((evicted, _)) = ledgers.pop_lru() {
                tracing::debug!("evicted rate-limit ledger for client {evicted}");
            }
        }
        let ledger = ledgers.get_or_insert_mut(client_id.to_owned(), Vec::new);
        let day_cutoff = now_ms - time::DAY_MS;
        ledger.retain(|&timestamp| timestamp > day_cutoff);
        ledger
    }
}

fn count_since(ledger: &[i64], cutoff_ms: i64) -> usize {
    ledger
        .iter()
        .filter(|&&timestamp| timestamp > cutoff_ms)
        .count()
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(per_minute: u32, per_hour: u32, per_day: u32) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            enabled: true,
            requests_per_minute: per_minute,
            requests_per_hour: per_hour,
            requests_per_day: per_day,
        })
    }

    #[test]
    fn first_exceeded_tier_names_the_reason() {
        let limiter = limiter(1, 1, 1);
        let now = 1_700_000_000_000;
        assert!(limiter.is_allowed_at("c", now).allowed);
        // Minute and hour are both over; the minute tier is reported.
        let decision = limiter.is_allowed_at("c", now + 1);
        assert_eq!(
            decision.reason.as_deref(),
            Some("Rate limit exceeded: 1 requests per minute")
        );
    }

    #[test]
    fn rejected_requests_are_not_recorded() {
        let limiter = limiter(1, 10, 10);
        let now = 1_700_000_000_000;
        assert!(limiter.is_allowed_at("c", now).allowed);
        assert!(!limiter.is_allowed_at("c", now + 1).allowed);
        assert!(!limiter.is_allowed_at("c", now + 2).allowed);
        assert_eq!(limiter.get_stats_at("c", now + 3).day, 1);
    }

    #[test]
    fn disabled_config_bypasses_everything() {
        let limiter = RateLimiter::new(RateLimitConfig {
            enabled: false,
            requests_per_minute: 0,
            requests_per_hour: 0,
            requests_per_day: 0,
        });
        let now = 1_700_000_000_000;
        assert!(limiter.is_allowed_at("c", now).allowed);
        assert!(limiter.is_allowed_at("c", now).allowed);
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn stats_do_not_promote_or_create_ledgers() {
        let limiter = limiter(10, 10, 10);
        let stats = limiter.get_stats_at("ghost", 1_700_000_000_000);
        assert_eq!((stats.minute, stats.hour, stats.day), (0, 0, 0));
        assert_eq!(limiter.tracked_clients(), 0);
    }
}
