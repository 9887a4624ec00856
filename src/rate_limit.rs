//! Fixed-window, per-key rate limiter.
//!
//! Every API key gets its own [`RateWindow`] behind its own mutex. The
//! [`DashMap`] only hands out record handles; it is never held while a record
//! is being updated by [`RateLimiter::check`], so requests for unrelated keys
//! do not contend.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::error::AuthError;
use crate::fingerprint::key_fingerprint;
use crate::metrics::{RATE_LIMIT_DECISIONS, RATE_WINDOWS, RATE_WINDOWS_EVICTED};
use crate::registry::TierResolver;
use crate::tier::Tier;

pub const WINDOW: Duration = Duration::from_secs(60);
const WINDOW_MS: u64 = 60_000;

// Rate limit entry - tracks requests for one API key
#[derive(Debug, Default)]
pub struct RateWindow {
    window_start_ms: Option<u64>,
    count: u64,
    last_seen_ms: u64,
    // set by the sweeper once the record has left the map
    evicted: bool,
}

impl RateWindow {
    // Move to the window containing `now_ms`, clearing the count if it changed
    fn roll(&mut self, now_ms: u64) -> u64 {
        let start = window_start(now_ms);
        if self.window_start_ms != Some(start) {
            self.window_start_ms = Some(start);
            self.count = 0;
        }
        start
    }

    fn count_at(&self, now_ms: u64) -> u64 {
        if self.evicted || self.window_start_ms != Some(window_start(now_ms)) {
            0
        } else {
            self.count
        }
    }
}

fn window_start(now_ms: u64) -> u64 {
    now_ms - now_ms % WINDOW_MS
}

// Unix second at which the window containing `now_ms` ends
fn reset_at(now_ms: u64) -> u64 {
    (window_start(now_ms) + WINDOW_MS) / 1000
}

/// Whole seconds left in the current window, rounded down. Always `< 60`.
pub fn retry_after_seconds(now_ms: u64) -> u64 {
    ((WINDOW_MS - now_ms % WINDOW_MS) / 1000).min(WINDOW.as_secs() - 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grant {
    pub tier: Tier,
    pub limit: u64,
    pub remaining: u64,
    /// Unix timestamp (seconds) when the current window ends
    pub reset_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    UnknownKey,
    RateExceeded { retry_after_seconds: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow(Grant),
    Deny(Denial),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    Ok,
    UnknownKey,
    RateExceeded,
}

impl Reason {
    pub fn as_str(self) -> &'static str {
        match self {
            Reason::Ok => "ok",
            Reason::UnknownKey => "unknown_key",
            Reason::RateExceeded => "rate_exceeded",
        }
    }
}

/// Flat, serializable view of a [`Decision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    pub allowed: bool,
    pub retry_after_seconds: Option<u64>,
    pub reason: Reason,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }

    pub fn retry_after_seconds(&self) -> Option<u64> {
        match self {
            Decision::Deny(Denial::RateExceeded {
                retry_after_seconds,
            }) => Some(*retry_after_seconds),
            _ => None,
        }
    }

    pub fn reason(&self) -> Reason {
        match self {
            Decision::Allow(_) => Reason::Ok,
            Decision::Deny(Denial::UnknownKey) => Reason::UnknownKey,
            Decision::Deny(Denial::RateExceeded { .. }) => Reason::RateExceeded,
        }
    }

    pub fn outcome(&self) -> CheckOutcome {
        CheckOutcome {
            allowed: self.is_allowed(),
            retry_after_seconds: self.retry_after_seconds(),
            reason: self.reason(),
        }
    }
}

impl From<Denial> for AuthError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::UnknownKey => AuthError::UnknownKey,
            Denial::RateExceeded {
                retry_after_seconds,
            } => AuthError::RateExceeded {
                retry_after_seconds,
            },
        }
    }
}

/// Current-window usage for a key, read without counting a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Usage {
    pub tier: Tier,
    pub limit: u64,
    pub used: u64,
    pub remaining: u64,
    pub reset_at: u64,
}

fn lock(record: &Mutex<RateWindow>) -> MutexGuard<'_, RateWindow> {
    // counters stay meaningful even if a holder panicked
    record.lock().unwrap_or_else(PoisonError::into_inner)
}

fn try_lock(record: &Mutex<RateWindow>) -> Option<MutexGuard<'_, RateWindow>> {
    match record.try_lock() {
        Ok(guard) => Some(guard),
        Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
        Err(TryLockError::WouldBlock) => None,
    }
}

pub struct RateLimiter {
    resolver: Arc<dyn TierResolver>,
    clock: Arc<dyn Clock>,
    windows: DashMap<String, Arc<Mutex<RateWindow>>>,
}

impl RateLimiter {
    pub fn new(resolver: Arc<dyn TierResolver>) -> Self {
        Self::with_clock(resolver, Arc::new(SystemClock))
    }

    pub fn with_clock(resolver: Arc<dyn TierResolver>, clock: Arc<dyn Clock>) -> Self {
        Self {
            resolver,
            clock,
            windows: DashMap::new(),
        }
    }

    fn resolve(&self, api_key: &str) -> Option<Tier> {
        if api_key.is_empty() {
            return None;
        }
        self.resolver.resolve_tier(api_key)
    }

    // Handle to the key's record, creating it on first use
    fn window_for(&self, api_key: &str) -> Arc<Mutex<RateWindow>> {
        if let Some(record) = self.windows.get(api_key) {
            return Arc::clone(record.value());
        }

        let record = Arc::clone(self.windows.entry(api_key.to_string()).or_default().value());
        RATE_WINDOWS.set(self.windows.len() as i64);
        record
    }

    /// Count one request for `api_key` and decide whether it may proceed.
    pub fn check(&self, api_key: &str) -> Decision {
        let Some(tier) = self.resolve(api_key) else {
            tracing::info!(key = %key_fingerprint(api_key), "Unknown API key");
            RATE_LIMIT_DECISIONS
                .with_label_values(&[Reason::UnknownKey.as_str()])
                .inc();
            return Decision::Deny(Denial::UnknownKey);
        };
        let limit = tier.requests_per_minute();

        let decision = loop {
            let record = self.window_for(api_key);
            let mut window = lock(&record);

            // lost a race with the sweeper, this record is no longer in the map
            if window.evicted {
                continue;
            }

            let now = self.clock.now_millis();
            let start = window.roll(now);
            window.count = window.count.saturating_add(1);
            window.last_seen_ms = now;

            if window.count > limit {
                break Decision::Deny(Denial::RateExceeded {
                    retry_after_seconds: retry_after_seconds(now),
                });
            }

            break Decision::Allow(Grant {
                tier,
                limit,
                remaining: limit - window.count,
                reset_at: (start + WINDOW_MS) / 1000,
            });
        };

        if let Decision::Deny(Denial::RateExceeded {
            retry_after_seconds,
        }) = decision
        {
            tracing::warn!(
                key = %key_fingerprint(api_key),
                tier = %tier,
                limit = limit,
                retry_after_seconds = retry_after_seconds,
                "Rate limit exceeded"
            );
        }

        RATE_LIMIT_DECISIONS
            .with_label_values(&[decision.reason().as_str()])
            .inc();
        decision
    }

    /// Usage in the current window. `None` for keys the registry does not know.
    pub fn usage(&self, api_key: &str) -> Option<Usage> {
        let tier = self.resolve(api_key)?;
        let limit = tier.requests_per_minute();
        let now = self.clock.now_millis();

        let record = self.windows.get(api_key).map(|r| Arc::clone(r.value()));
        let used = record.map_or(0, |record| lock(&record).count_at(now));

        Some(Usage {
            tier,
            limit,
            used,
            remaining: limit.saturating_sub(used),
            reset_at: reset_at(now),
        })
    }

    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }

    /// Remove records that have not seen a request for `idle_after`.
    /// Records locked by an in-flight check are in use and are kept, and so
    /// are records still counting the current window, whatever `idle_after` is.
    pub fn evict_idle(&self, idle_after: Duration) -> usize {
        let now = self.clock.now_millis();
        let current = window_start(now);
        let idle_ms = u64::try_from(idle_after.as_millis()).unwrap_or(u64::MAX);
        let mut evicted = 0;

        self.windows.retain(|_, record| match try_lock(record) {
            Some(mut window) => {
                let idle = now.saturating_sub(window.last_seen_ms) >= idle_ms;
                if idle && window.window_start_ms != Some(current) {
                    window.evicted = true;
                    evicted += 1;
                    false
                } else {
                    true
                }
            }
            None => true,
        });

        RATE_WINDOWS.set(self.windows.len() as i64);
        RATE_WINDOWS_EVICTED.inc_by(evicted as u64);
        evicted
    }
}
