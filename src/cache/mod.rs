//! Single-slot freshness cache for an upstream payload.
//!
//! Holds the last successfully fetched body together with the instant it was
//! fetched. Staleness only tells the caller a refresh is due; a stale payload
//! is never evicted, so it stays available as a fallback when the refresh
//! fails.
//!
//! The slot is an immutable [`CachedPayload`] snapshot behind an
//! `Arc`, swapped wholesale under a [`RwLock`]. Readers clone the `Arc` and
//! release the lock immediately, so no lock is ever held across an `.await`
//! or while a response is written.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;

/// How long a cached top-coins listing is served without a refresh attempt.
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(5 * 60);

/// One successful upstream response body and when it was fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPayload {
    body: Bytes,
    fetched_at: Instant,
}

impl CachedPayload {
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn fetched_at(&self) -> Instant {
        self.fetched_at
    }

    /// Time elapsed between the fetch and `now`.
    pub fn age_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.fetched_at)
    }

    /// `true` iff `now < fetched_at + window`.
    pub fn is_fresh_at(&self, now: Instant, window: Duration) -> bool {
        now < self.fetched_at + window
    }
}

/// A concurrency-safe, single-slot cache.
///
/// # Examples
///
/// ```
/// use coinproxy::cache::{FreshnessCache, FRESHNESS_WINDOW};
/// use tokio::time::Instant;
///
/// let cache = FreshnessCache::new(FRESHNESS_WINDOW);
/// assert!(cache.read().is_none());
///
/// cache.store("[1,2,3]".into(), Instant::now());
/// assert!(cache.is_fresh());
/// assert_eq!(&cache.read().unwrap().body()[..], b"[1,2,3]");
/// ```
#[derive(Debug)]
pub struct FreshnessCache {
    window: Duration,
    slot: RwLock<Option<Arc<CachedPayload>>>,
}

impl Default for FreshnessCache {
    fn default() -> Self {
        Self::new(FRESHNESS_WINDOW)
    }
}

impl FreshnessCache {
    /// Creates an empty cache with the given freshness window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            slot: RwLock::new(None),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns the current payload, fresh or stale, or `None` if nothing has
    /// ever been stored.
    pub fn read(&self) -> Option<Arc<CachedPayload>> {
        // The slot only ever holds a complete snapshot, so a poisoned lock
        // still guards a consistent value.
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `true` iff a payload exists and is younger than the window right now.
    pub fn is_fresh(&self) -> bool {
        self.fresh().is_some()
    }

    /// Returns the payload only if it is fresh at this instant.
    ///
    /// Presence and freshness are judged on one snapshot.
    pub fn fresh(&self) -> Option<Arc<CachedPayload>> {
        self.fresh_at(Instant::now())
    }

    /// Returns the payload only if it is fresh at `now`.
    pub fn fresh_at(&self, now: Instant) -> Option<Arc<CachedPayload>> {
        self.read()
            .filter(|payload| payload.is_fresh_at(now, self.window))
    }

    /// Replaces the payload with `body` fetched at `at`.
    pub fn store(&self, body: Bytes, at: Instant) {
        let payload = Arc::new(CachedPayload {
            body,
            fetched_at: at,
        });
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(payload);
    }
}
