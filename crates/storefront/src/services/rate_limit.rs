//! Fixed-window attempt limiting for authentication actions.
//!
//! Each identifier gets a window that opens on its first attempt. Attempts
//! inside the window count up to the configured maximum; further attempts are
//! refused until the window's reset time passes, after which the next attempt
//! opens a fresh window.
//!
//! Counters live behind [`RateLimitStore`]. The default store is an
//! in-process concurrent map swept periodically; a shared backend can be
//! swapped in when running several instances.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::task::JoinHandle;

/// How often expired counters are removed from the in-memory store.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Attempt budget for one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_attempts: u32,
    pub window: TimeDelta,
}

impl RateLimitConfig {
    #[must_use]
    pub const fn new(max_attempts: u32, window: TimeDelta) -> Self {
        Self {
            max_attempts,
            window,
        }
    }

    /// 5 login attempts per 15 minutes.
    #[must_use]
    pub fn login() -> Self {
        Self::new(5, TimeDelta::minutes(15))
    }

    /// 3 signup attempts per hour.
    #[must_use]
    pub fn signup() -> Self {
        Self::new(3, TimeDelta::hours(1))
    }

    /// 10 verification attempts per hour.
    #[must_use]
    pub fn verify() -> Self {
        Self::new(10, TimeDelta::hours(1))
    }
}

/// Limited actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitAction {
    Login,
    Signup,
    Verify,
}

impl RateLimitAction {
    /// Label used in counter keys and user-facing messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Signup => "signup",
            Self::Verify => "verification",
        }
    }
}

/// Budgets for every limited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicies {
    pub login: RateLimitConfig,
    pub signup: RateLimitConfig,
    pub verify: RateLimitConfig,
}

impl RateLimitPolicies {
    #[must_use]
    pub const fn for_action(&self, action: RateLimitAction) -> RateLimitConfig {
        match action {
            RateLimitAction::Login => self.login,
            RateLimitAction::Signup => self.signup,
            RateLimitAction::Verify => self.verify,
        }
    }
}

impl Default for RateLimitPolicies {
    fn default() -> Self {
        Self {
            login: RateLimitConfig::login(),
            signup: RateLimitConfig::signup(),
            verify: RateLimitConfig::verify(),
        }
    }
}

/// Counter state for one identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitEntry {
    /// A window opened by a first attempt at `now`.
    #[must_use]
    pub fn open(now: DateTime<Utc>, window: TimeDelta) -> Self {
        Self {
            count: 1,
            reset_at: now + window,
        }
    }

    /// Whether the window has passed. The reset instant itself still counts
    /// as inside the window.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.reset_at < now
    }
}

/// Outcome of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResult {
    pub success: bool,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitResult {
    /// Whole minutes until the window resets, rounded up.
    #[must_use]
    pub fn retry_after_minutes(&self, now: DateTime<Utc>) -> i64 {
        let millis = (self.reset_at - now).num_milliseconds().max(0);
        (millis + 59_999) / 60_000
    }
}

/// Storage for rate-limit counters.
pub trait RateLimitStore: Send + Sync {
    /// Current counter for `key`, expired or not.
    fn get(&self, key: &str) -> Option<RateLimitEntry>;

    /// Replace the counter for `key` with `apply(current)` atomically,
    /// returning the stored value.
    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<&RateLimitEntry>) -> RateLimitEntry,
    ) -> RateLimitEntry;

    /// Drop the counter for `key`.
    fn remove(&self, key: &str) -> Option<RateLimitEntry>;

    /// Drop every counter whose window passed before `now`, returning how
    /// many were removed.
    fn sweep(&self, now: DateTime<Utc>) -> usize;
}

/// In-process counter store.
#[derive(Debug, Default)]
pub struct InMemoryRateLimitStore {
    entries: DashMap<String, RateLimitEntry>,
}

impl InMemoryRateLimitStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    fn get(&self, key: &str) -> Option<RateLimitEntry> {
        self.entries.get(key).map(|entry| *entry)
    }

    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<&RateLimitEntry>) -> RateLimitEntry,
    ) -> RateLimitEntry {
        match self.entries.entry(key.to_owned()) {
            Entry::Occupied(mut occupied) => {
                let next = apply(Some(occupied.get()));
                occupied.insert(next);
                next
            }
            Entry::Vacant(vacant) => {
                let next = apply(None);
                vacant.insert(next);
                next
            }
        }
    }

    fn remove(&self, key: &str) -> Option<RateLimitEntry> {
        self.entries.remove(key).map(|(_, entry)| entry)
    }

    fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = !entry.is_expired(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }
}

/// Record one attempt by `identifier` against `config` at `now`.
pub fn check_rate_limit(
    store: &dyn RateLimitStore,
    identifier: &str,
    config: RateLimitConfig,
    now: DateTime<Utc>,
) -> RateLimitResult {
    let mut allowed = true;

    let entry = store.update(identifier, &mut |current| match current {
        Some(entry) if !entry.is_expired(now) => {
            if entry.count >= config.max_attempts {
                allowed = false;
                *entry
            } else {
                allowed = true;
                RateLimitEntry {
                    count: entry.count + 1,
                    reset_at: entry.reset_at,
                }
            }
        }
        _ => {
            allowed = true;
            RateLimitEntry::open(now, config.window)
        }
    });

    RateLimitResult {
        success: allowed,
        remaining: if allowed {
            config.max_attempts.saturating_sub(entry.count)
        } else {
            0
        },
        reset_at: entry.reset_at,
    }
}

/// Per-action attempt limiter shared across requests.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    policies: RateLimitPolicies,
}

impl RateLimiter {
    /// Create a limiter backed by an in-memory store.
    #[must_use]
    pub fn new(policies: RateLimitPolicies) -> Self {
        Self::with_store(Arc::new(InMemoryRateLimitStore::new()), policies)
    }

    /// Create a limiter backed by `store`.
    #[must_use]
    pub fn with_store(store: Arc<dyn RateLimitStore>, policies: RateLimitPolicies) -> Self {
        Self { store, policies }
    }

    #[must_use]
    pub const fn policies(&self) -> &RateLimitPolicies {
        &self.policies
    }

    /// Record an attempt at `action` by `identifier`.
    ///
    /// Counters are kept per action, so failed logins never use up a
    /// client's signup budget.
    #[must_use]
    pub fn check(&self, action: RateLimitAction, identifier: &str) -> RateLimitResult {
        self.check_at(action, identifier, Utc::now())
    }

    /// [`check`](Self::check) with an explicit clock.
    #[must_use]
    pub fn check_at(
        &self,
        action: RateLimitAction,
        identifier: &str,
        now: DateTime<Utc>,
    ) -> RateLimitResult {
        let key = format!("{}:{identifier}", action.label());
        let result = check_rate_limit(
            self.store.as_ref(),
            &key,
            self.policies.for_action(action),
            now,
        );

        if !result.success {
            tracing::warn!(action = action.label(), identifier, "rate limit exceeded");
        }

        result
    }

    /// Remove expired counters now.
    pub fn sweep(&self) -> usize {
        self.store.sweep(Utc::now())
    }

    /// Sweep expired counters every `period` in a background task.
    #[must_use]
    pub fn spawn_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                let removed = store.sweep(Utc::now());
                if removed > 0 {
                    tracing::debug!(removed, "swept expired rate limit entries");
                }
            }
        })
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("policies", &self.policies)
            .finish_non_exhaustive()
    }
}
