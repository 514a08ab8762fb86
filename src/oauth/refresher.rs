// ABOUTME: Background worker that renews the delegated OAuth credential before expiry
// ABOUTME: Dedicated thread with interruptible waits, handing refresh work to the host runtime
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # OAuth Token Refresher
//!
//! A single background OS thread wakes on a fixed period (default hourly),
//! reads the persisted credential, and when the expiry is within the refresh
//! buffer (default 5 minutes) performs the exchange and atomically rewrites
//! the credential.
//!
//! Runtime coordination: at [`start`](OAuthTokenRefresher::start) the worker
//! captures the ambient tokio runtime handle, if any. Each refresh future is
//! handed to that runtime and awaited through a result channel with a
//! bounded wait, so a stalled runtime cannot hang the worker; on timeout the
//! cycle is abandoned and retried next period. Without a reachable runtime
//! the worker builds a single-use current-thread runtime scoped to the one
//! exchange. Cycles never overlap: the dispatch blocks until the exchange
//! returns or is abandoned.
//!
//! Every cycle failure (read error, network failure, malformed response,
//! persistence error) is logged and swallowed; the worker only exits on
//! [`stop`](OAuthTokenRefresher::stop).

use super::{is_expired, TokenExchange, TokenResponse};
use crate::constants::time;
use crate::models::GatewaySettings;
use crate::storage::{LoadOutcome, SettingsStore};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Scheduling knobs for the refresher.
#[derive(Debug, Clone)]
pub struct RefresherConfig {
    /// Period between credential checks.
    pub check_interval: Duration,
    /// Refresh when expiry is within this many seconds.
    pub refresh_buffer_seconds: i64,
    /// Bounded wait for a refresh handed to the host runtime.
    pub handoff_timeout: Duration,
    /// Bounded wait for the worker thread to exit on stop.
    pub shutdown_timeout: Duration,
}

impl Default for RefresherConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(time::REFRESH_CHECK_INTERVAL_SECS),
            refresh_buffer_seconds: time::REFRESH_BUFFER_SECS,
            handoff_timeout: Duration::from_secs(time::REFRESH_HANDOFF_TIMEOUT_SECS),
            shutdown_timeout: Duration::from_secs(time::REFRESHER_SHUTDOWN_TIMEOUT_SECS),
        }
    }
}

/// Observer invoked with the raw exchange result after a successful persist.
pub type RefreshCallback = Box<dyn Fn(&TokenResponse) + Send + Sync>;

struct Shared {
    config: RefresherConfig,
    settings: Arc<SettingsStore>,
    exchange: Arc<dyn TokenExchange>,
    callback: Mutex<Option<RefreshCallback>>,
}

struct Worker {
    thread: JoinHandle<()>,
    stop_tx: mpsc::Sender<()>,
}

/// Background worker keeping the delegated OAuth credential fresh.
pub struct OAuthTokenRefresher {
    shared: Arc<Shared>,
    worker: Mutex<Option<Worker>>,
}

impl OAuthTokenRefresher {
    /// Create a stopped refresher over the given settings store and
    /// exchange collaborator.
    #[must_use]
    pub fn new(
        config: RefresherConfig,
        settings: Arc<SettingsStore>,
        exchange: Arc<dyn TokenExchange>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                settings,
                exchange,
                callback: Mutex::new(None),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Register the observer invoked after each successful refresh.
    pub fn set_refresh_callback(&self, callback: impl Fn(&TokenResponse) + Send + Sync + 'static) {
        *lock(&self.shared.callback) = Some(Box::new(callback));
    }

    /// Start the background worker. Idempotent: a second call while running
    /// is a no-op.
    ///
    /// The ambient tokio runtime, when one is reachable from the calling
    /// context, becomes the scheduler for all refresh exchanges.
    pub fn start(&self) {
        let mut worker = lock(&self.worker);
        if worker.is_some() {
            tracing::debug!("token refresher already running");
            return;
        }

        let runtime = tokio::runtime::Handle::try_current().ok();
        let (stop_tx, stop_rx) = mpsc::channel();
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("oauth-token-refresher".to_owned())
            .spawn(move || run_loop(&shared, runtime.as_ref(), &stop_rx));
        match spawned {
            Ok(thread) => {
                *worker = Some(Worker { thread, stop_tx });
                tracing::info!("oauth token refresher started");
            }
            Err(error) => {
                tracing::error!("failed to spawn token refresher thread: {error}");
            }
        }
    }

    /// Stop the background worker, waiting up to the configured shutdown
    /// timeout for it to exit. Idempotent: stopping a stopped refresher is
    /// a no-op.
    pub fn stop(&self) {
        let Some(worker) = lock(&self.worker).take() else {
            return;
        };
        // Wake the interruptible wait; the thread may already have exited.
        let _ = worker.stop_tx.send(());

        let deadline = Instant::now() + self.shared.config.shutdown_timeout;
        while !worker.thread.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
        }
        if worker.thread.is_finished() {
            let _ = worker.thread.join();
            tracing::info!("oauth token refresher stopped");
        } else {
            tracing::warn!(
                "token refresher did not exit within {:?}, detaching",
                self.shared.config.shutdown_timeout
            );
        }
    }

    /// Whether the background worker is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        lock(&self.worker)
            .as_ref()
            .is_some_and(|worker| !worker.thread.is_finished())
    }

    /// Read-only diagnostic: does the persisted credential need refreshing
    /// right now? Independent of the running worker.
    #[must_use]
    pub fn should_refresh_now(&self) -> bool {
        match self.shared.settings.load() {
            LoadOutcome::Loaded(settings) => settings
                .delegated_refresh_ready()
                .is_some_and(|(_, expires_at)| {
                    is_expired(expires_at, self.shared.config.refresh_buffer_seconds)
                }),
            LoadOutcome::NoPriorState | LoadOutcome::ReadError(_) => false,
        }
    }
}

impl Drop for OAuthTokenRefresher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn run_loop(shared: &Arc<Shared>, runtime: Option<&tokio::runtime::Handle>, stop_rx: &mpsc::Receiver<()>) {
    loop {
        run_cycle(shared, runtime);
        match stop_rx.recv_timeout(shared.config.check_interval) {
            Err(RecvTimeoutError::Timeout) => {}
            // Stop signal, or the refresher itself was dropped.
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    tracing::debug!("token refresher loop exited");
}

/// One refresh cycle: read, decide, exchange, persist. Never panics or
/// propagates; a failed cycle waits for the next period.
fn run_cycle(shared: &Arc<Shared>, runtime: Option<&tokio::runtime::Handle>) {
    let settings = match shared.settings.load() {
        LoadOutcome::Loaded(settings) => settings,
        LoadOutcome::NoPriorState => {
            tracing::debug!("no gateway settings yet, skipping refresh cycle");
            return;
        }
        LoadOutcome::ReadError(error) => {
            tracing::warn!("cannot read gateway settings: {error}; skipping refresh cycle");
            return;
        }
    };

    let needs_refresh = settings
        .delegated_refresh_ready()
        .is_some_and(|(_, expires_at)| is_expired(expires_at, shared.config.refresh_buffer_seconds));
    if !needs_refresh {
        return;
    }

    tracing::info!("oauth access token is expiring, refreshing");
    dispatch_refresh(shared, runtime, settings);
}

/// Run the refresh future on the host runtime with a bounded wait, or on a
/// single-use fallback runtime when no host runtime is reachable.
fn dispatch_refresh(
    shared: &Arc<Shared>,
    runtime: Option<&tokio::runtime::Handle>,
    settings: GatewaySettings,
) {
    let task_shared = Arc::clone(shared);
    let refresh = async move { refresh_credential(&task_shared, settings).await };

    if let Some(handle) = runtime {
        let (done_tx, done_rx) = mpsc::channel();
        handle.spawn(async move {
            refresh.await;
            let _ = done_tx.send(());
        });
        if done_rx.recv_timeout(shared.config.handoff_timeout).is_err() {
            tracing::warn!(
                "refresh handed to host runtime did not finish within {:?}, abandoning cycle",
                shared.config.handoff_timeout
            );
        }
    } else {
        match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(fallback) => fallback.block_on(refresh),
            Err(error) => {
                tracing::warn!("failed to build fallback runtime for token refresh: {error}");
            }
        }
    }
}

async fn refresh_credential(shared: &Arc<Shared>, mut settings: GatewaySettings) {
    let Some(refresh_token) = settings.oauth_refresh_token.clone() else {
        return;
    };

    match shared.exchange.refresh(&refresh_token).await {
        Ok(response) => {
            settings.oauth_access_token = Some(response.access_token.clone());
            if let Some(rotated) = &response.refresh_token {
                settings.oauth_refresh_token = Some(rotated.clone());
            }
            if let Some(expires_at) = response.expires_at {
                settings.oauth_expires_at = Some(expires_at);
            }
            if let Err(error) = shared.settings.save(&settings) {
                tracing::warn!("failed to persist refreshed credential: {error:#}");
                return;
            }
            tracing::info!(
                "oauth access token refreshed, new expiry {:?}",
                settings.oauth_expires_at
            );
            if let Some(callback) = lock(&shared.callback).as_ref() {
                callback(&response);
            }
        }
        Err(error) => {
            tracing::warn!("token refresh failed: {error}");
        }
    }
}
