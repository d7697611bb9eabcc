// ABOUTME: Fixed-window per-client rate limiting for the analyze endpoint
// ABOUTME: Tracks request counts in a sharded map and evicts stale windows in the background
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Analyze Rate Limiter
//!
//! A fixed-window counter keyed by client identity. State is in memory only
//! and resets on restart.
//!
//! The check-then-update for one key runs under the `DashMap` entry guard, so
//! concurrent requests for the same client never over-admit.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::environment::RateLimitConfig;

/// Outcome of a rate limit check
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimitStatus {
    /// Whether the request was rejected
    pub is_limited: bool,
    /// Requests allowed per window
    pub limit: u32,
    /// Requests left in the current window
    pub remaining: u32,
    /// When the current window ends
    pub reset_at: DateTime<Utc>,
    /// Seconds to wait before retrying (only when limited)
    pub retry_after_seconds: Option<u64>,
    /// Window length in seconds
    pub window_seconds: u64,
}

/// Per-client fixed-window limiter shared across request tasks
#[derive(Debug, Clone)]
pub struct AnalyzeRateLimiter {
    /// client key -> (`request_count`, `window_start`)
    state: Arc<DashMap<String, (u32, Instant)>>,
    config: RateLimitConfig,
}

impl AnalyzeRateLimiter {
    /// Create a limiter with the given configuration
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            state: Arc::new(DashMap::new()),
            config,
        }
    }

    /// Limiter configuration
    #[must_use]
    pub const fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Number of tracked clients
    #[must_use]
    pub fn tracked_clients(&self) -> usize {
        self.state.len()
    }

    /// Check and record a request for `client_key` at the current instant
    #[must_use]
    pub fn check(&self, client_key: &str) -> RateLimitStatus {
        self.check_at(client_key, Instant::now())
    }

    /// Check and record a request for `client_key` as of `now`
    ///
    /// - no entry: start a window with count 1, allow
    /// - window expired (`now - start > window`): restart it with count 1, allow
    /// - count at the limit: deny without incrementing
    /// - otherwise: increment, allow
    #[must_use]
    pub fn check_at(&self, client_key: &str, now: Instant) -> RateLimitStatus {
        let limit = self.config.max_requests;
        let window = self.config.window;

        let mut entry = self
            .state
            .entry(client_key.to_owned())
            .or_insert((0, now));
        let (count, window_start) = entry.value_mut();

        if now.saturating_duration_since(*window_start) > window {
            *count = 0;
            *window_start = now;
        }

        let is_limited = *count >= limit;
        if !is_limited {
            *count += 1;
        }

        let remaining = limit.saturating_sub(*count);
        let elapsed = now.saturating_duration_since(*window_start);
        drop(entry);

        if self.state.len() > self.config.cleanup_threshold {
            self.sweep_stale(now);
        }

        let until_reset = window.saturating_sub(elapsed);
        let reset_at =
            Utc::now() + TimeDelta::from_std(until_reset).unwrap_or_else(|_| TimeDelta::zero());

        RateLimitStatus {
            is_limited,
            limit,
            remaining,
            reset_at,
            retry_after_seconds: is_limited.then(|| ceil_secs(until_reset).max(1)),
            window_seconds: window.as_secs(),
        }
    }

    /// Remove entries whose window started more than the stale timeout before `now`
    ///
    /// Returns the number of evicted entries.
    pub fn sweep_stale(&self, now: Instant) -> usize {
        let timeout = self.config.stale_entry_timeout;
        let before = self.state.len();
        self.state
            .retain(|_key, (_count, start)| now.saturating_duration_since(*start) <= timeout);
        let removed = before.saturating_sub(self.state.len());
        if removed > 0 {
            debug!(removed, remaining = self.state.len(), "Swept stale rate limit entries");
        }
        removed
    }

    /// Spawn a background task that sweeps stale entries on the configured interval
    ///
    /// The task runs until aborted through the returned handle or the runtime shuts down.
    #[must_use]
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let limiter = self.clone();
        let period = self.config.sweep_interval;
        info!(
            interval_secs = period.as_secs(),
            "Starting rate limit sweeper"
        );

        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                limiter.sweep_stale(Instant::now());
            }
        })
    }
}

impl Default for AnalyzeRateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}
