//! Sliding-window rate limiting per (command, actor).
//!
//! Every key owns an entry with the timestamps of its admitted invocations.
//! The outer map lock is held only to fetch or create an entry; the
//! check-and-record itself runs under the entry's own lock, so unrelated keys
//! never contend and one key's check is atomic.
//!
//! ```text
//! entries: Mutex<HashMap<(command, actor), Arc<Mutex<Entry>>>>
//!                                            │
//!                                            └─ VecDeque<Instant> (oldest first)
//! ```

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};

use herald_core::UserId;

use crate::error::RegistrationError;
use crate::resolver::{format_shorthand, parse_shorthand};

/// Checks between automatic sweeps.
pub const DEFAULT_SWEEP_INTERVAL: u64 = 1024;

/// At most `max` invocations per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    pub fn new(max: u32, window: Duration) -> Self {
        Self { max, window }
    }
}

impl FromStr for RateLimitPolicy {
    type Err = RegistrationError;

    /// Parses `"<count>/<duration>"`, e.g. `"2/10s"` or `"5/1m30s"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RegistrationError::InvalidRateLimit(s.to_string());
        let (max, window) = s.split_once('/').ok_or_else(invalid)?;
        let max: u32 = max.trim().parse().map_err(|_| invalid())?;
        let window = parse_shorthand(window).ok_or_else(invalid)?;
        if max == 0 {
            return Err(invalid());
        }
        Ok(Self { max, window })
    }
}

impl fmt::Display for RateLimitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.max, format_shorthand(self.window))
    }
}

/// Result of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admit,
    Deny { retry_after: Duration },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admit)
    }
}

#[derive(Debug, Default)]
struct Entry {
    stamps: VecDeque<Instant>,
    /// Window of the policy that recorded the stamps.
    window: Duration,
}

impl Entry {
    /// Drops every timestamp that has left the window.
    fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.stamps.front() {
            if oldest + self.window <= now {
                self.stamps.pop_front();
            } else {
                break;
            }
        }
    }
}

type Key = (String, UserId);

/// In-memory rate limiter shared by all invocations.
pub struct RateLimiter {
    entries: Mutex<HashMap<Key, Arc<Mutex<Entry>>>>,
    checks: AtomicU64,
    sweep_interval: u64,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_sweep_interval(DEFAULT_SWEEP_INTERVAL)
    }

    /// A limiter that sweeps after every `interval` checks; `0` disables
    /// automatic sweeping.
    pub fn with_sweep_interval(interval: u64) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            checks: AtomicU64::new(0),
            sweep_interval: interval,
        }
    }

    /// Admits and records the invocation, or denies it with the time until
    /// the oldest recorded invocation leaves the window.
    ///
    /// Without a policy every call is admitted and no state is touched.
    pub fn check_and_record(
        &self,
        command: &str,
        actor: &UserId,
        policy: Option<&RateLimitPolicy>,
    ) -> Admission {
        let Some(policy) = policy else {
            return Admission::Admit;
        };

        let entry = {
            let mut entries = self.entries.lock();
            entries
                .entry((command.to_string(), actor.clone()))
                .or_default()
                .clone()
        };

        let admission = {
            let mut entry = entry.lock();
            let now = Instant::now();
            entry.window = policy.window;
            entry.prune(now);

            if entry.stamps.len() >= policy.max as usize {
                let retry_after = entry
                    .stamps
                    .front()
                    .map(|&oldest| (oldest + policy.window).saturating_duration_since(now))
                    .unwrap_or(policy.window);
                Admission::Deny { retry_after }
            } else {
                entry.stamps.push_back(now);
                Admission::Admit
            }
        };
        drop(entry);

        trace!(command, actor = %actor, ?admission, "Rate limit check");
        self.maybe_sweep();
        admission
    }

    fn maybe_sweep(&self) {
        if self.sweep_interval == 0 {
            return;
        }
        let count = self.checks.fetch_add(1, Ordering::Relaxed) + 1;
        if count % self.sweep_interval == 0 {
            self.sweep();
        }
    }

    /// Evicts entries whose timestamps have all left their window and that
    /// no in-flight check holds. Returns the number of evicted entries.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| {
            // the map itself holds one reference
            if Arc::strong_count(entry) > 1 {
                return true;
            }
            let mut entry = entry.lock();
            entry.prune(now);
            !entry.stamps.is_empty()
        });
        let evicted = before - entries.len();
        if evicted > 0 {
            debug!(evicted, remaining = entries.len(), "Swept rate limit entries");
        }
        evicted
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Forgets every recorded invocation of `actor` for `command`.
    ///
    /// The entry stays in place so a concurrent check keeps recording into
    /// it; [`sweep`](Self::sweep) evicts it later.
    pub fn reset(&self, command: &str, actor: &UserId) {
        let entry = self
            .entries
            .lock()
            .get(&(command.to_string(), actor.clone()))
            .cloned();
        if let Some(entry) = entry {
            entry.lock().stamps.clear();
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("entries", &self.len())
            .field("sweep_interval", &self.sweep_interval)
            .finish()
    }
}
