//! Account status resolution behind a bounded, short-lived cache
//!
//! Shields the authentication pipeline from provider latency and transient
//! failures. Resolution lifecycle:
//!
//! 1. `resolve(username)` consults the cache; a live entry answers immediately
//! 2. on a miss the provider is queried once (signed pre-authentication)
//! 3. the classified outcome is written back, failures included, so an outage
//!    is re-probed at most once per TTL per username
//! 4. entries expire a few seconds after the write; the next resolve
//!    re-queries
//! 5. `ping()` probes provider liveness independently of the cache
//!
//! Neither operation can fail from the caller's point of view: `resolve`
//! always yields a `UserAccount` (worst case `Unavailable`) and `ping` a
//! bool. Concurrent misses for one username are not deduplicated; each goes
//! to the provider and the last write wins inside the TTL window.

pub mod cache;
pub mod resolver;

pub use cache::{AccountCache, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL};
pub use resolver::StatusResolver;
