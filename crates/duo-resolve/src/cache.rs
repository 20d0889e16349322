//! Bounded, time-expiring account store
//!
//! Username-keyed cache of the last resolved account status. Entries expire a
//! fixed interval after the write, never after reads, so a hot username still
//! re-resolves on schedule. The store is owned here outright and reached only
//! through `get`/`put`.

use std::time::Duration;

use duo_api::UserAccount;
use moka::future::Cache;

/// Entries are considered live for this long after a write.
///
/// Short on purpose: it collapses per-authentication bursts into one provider
/// round-trip without letting a revoked or newly-enrolled user linger.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5);

/// Upper bound on live entries.
pub const DEFAULT_CACHE_CAPACITY: u64 = 100_000_000;

/// Pre-sized for a small working set; the cache grows toward capacity on
/// demand.
const CACHE_INITIAL_SIZE: usize = 50;

/// Concurrent-safe cache mapping username to the last resolved account.
pub struct AccountCache {
    inner: Cache<String, UserAccount>,
}

impl AccountCache {
    /// Build a cache bounded by `capacity` entries whose entries expire `ttl`
    /// after each write.
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let inner = Cache::builder()
            .initial_capacity(CACHE_INITIAL_SIZE)
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();
        Self { inner }
    }

    /// Cache with the default capacity and TTL.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL)
    }

    /// Look up a live entry. Expired entries are never returned.
    pub async fn get(&self, username: &str) -> Option<UserAccount> {
        self.inner.get(username).await
    }

    /// Store an account keyed by its username, replacing any previous entry.
    pub async fn put(&self, account: UserAccount) {
        self.inner.insert(account.username.clone(), account).await;
    }

    /// Number of entries currently tracked. May briefly overcount until
    /// pending housekeeping runs.
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    /// Drive expiration and eviction housekeeping to completion.
    pub async fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks().await;
    }
}

impl Default for AccountCache {
    fn default() -> Self {
        Self::with_defaults()
    }
}
