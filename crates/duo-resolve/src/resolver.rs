//! Status resolution service
//!
//! Orchestrates cache lookup, provider inquiry, classification, and
//! write-back. The hard contract here is the boundary: `resolve` and `ping`
//! always return a value. Every failure mode (signing, transport, malformed
//! or server-side failure answers) terminates in an `Unavailable` account,
//! or `false` for ping, inside this module.

use duo_api::{DuoClient, UserAccount, classify_preauth, ping_ok};
use tracing::{debug, warn};

use crate::cache::AccountCache;

/// Cache-fronted account status resolver.
pub struct StatusResolver {
    client: DuoClient,
    cache: AccountCache,
}

impl StatusResolver {
    pub fn new(client: DuoClient, cache: AccountCache) -> Self {
        Self { client, cache }
    }

    /// The cache, for observability surfaces.
    pub fn cache(&self) -> &AccountCache {
        &self.cache
    }

    /// Probe provider liveness. Never errors; an unreachable provider or a
    /// malformed answer is simply `false`.
    pub async fn ping(&self) -> bool {
        match self.client.ping().await {
            Ok(raw) => ping_ok(&raw),
            Err(e) => {
                warn!(error = %e, "liveness probe failed to reach the provider");
                false
            }
        }
    }

    /// Resolve the account status for `username`.
    ///
    /// Cache hits return without touching the provider. A miss issues exactly
    /// one provider call and caches whatever comes of it, unavailability
    /// included, so a downed provider is asked about each username at most
    /// once per TTL. Concurrent misses for the same username race freely;
    /// the last write wins.
    pub async fn resolve(&self, username: &str) -> UserAccount {
        if let Some(account) = self.cache.get(username).await {
            debug!(
                username,
                status = account.status.label(),
                "account status served from cache"
            );
            metrics::counter!("preauth_cache_hits_total").increment(1);
            return account;
        }
        metrics::counter!("preauth_cache_misses_total").increment(1);

        let account = match self.fetch(username).await {
            Ok(account) => account,
            Err(e) => {
                warn!(
                    username,
                    error = %e,
                    "resolution failed; reporting the provider unavailable for this user"
                );
                metrics::counter!("preauth_provider_unavailable_total").increment(1);
                UserAccount::unavailable(username)
            }
        };

        self.cache.put(account.clone()).await;
        debug!(
            username,
            status = account.status.label(),
            "account status resolved and cached"
        );
        account
    }

    async fn fetch(&self, username: &str) -> duo_api::Result<UserAccount> {
        let raw = self.client.pre_auth(username).await?;
        classify_preauth(username, &raw)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use common::Secret;
    use duo_api::{AccountStatus, SignedRequest, Transport};

    use super::*;
    use crate::cache::DEFAULT_CACHE_CAPACITY;

    /// Transport double that replays a script of canned outcomes and counts
    /// every provider call.
    struct ScriptedTransport {
        script: Mutex<VecDeque<duo_api::Result<String>>>,
        calls: AtomicUsize,
    }

    impl ScriptedTransport {
        fn new(script: Vec<duo_api::Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn replying(body: &str) -> Arc<Self> {
            Self::new(vec![Ok(body.to_string()), Ok(body.to_string())])
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn next(&self) -> duo_api::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(duo_api::Error::Transport("script exhausted".into())))
        }
    }

    impl Transport for ScriptedTransport {
        fn send_get(
            &self,
            _url: &str,
        ) -> Pin<Box<dyn Future<Output = duo_api::Result<String>> + Send + '_>> {
            let outcome = self.next();
            Box::pin(async move { outcome })
        }

        fn send_signed(
            &self,
            _request: SignedRequest,
        ) -> Pin<Box<dyn Future<Output = duo_api::Result<String>> + Send + '_>> {
            let outcome = self.next();
            Box::pin(async move { outcome })
        }
    }

    fn resolver_with(transport: Arc<dyn Transport>, ttl: Duration) -> StatusResolver {
        let client = DuoClient::new(
            "api-test.duosecurity.test",
            "DIXXXXXXXXXXXXXXXXXX",
            Secret::new("test-secret".to_string()),
            transport,
        );
        StatusResolver::new(client, AccountCache::new(DEFAULT_CACHE_CAPACITY, ttl))
    }

    const ALLOW_BODY: &str = r#"{"stat":"OK","response":{"result":"allow","status_msg":"ok"}}"#;

    #[tokio::test]
    async fn resolve_maps_an_allow_answer() {
        let transport = ScriptedTransport::replying(ALLOW_BODY);
        let resolver = resolver_with(transport, Duration::from_secs(5));

        let account = resolver.resolve("alice").await;
        assert_eq!(account.status, AccountStatus::Allow);
        assert_eq!(account.message, "ok");
        assert_eq!(account.username, "alice");
    }

    #[tokio::test]
    async fn resolve_maps_an_enroll_answer_with_portal() {
        let body = r#"{"stat":"OK","response":{"result":"enroll","status_msg":"need enroll","enroll_portal_url":"https://x/enroll"}}"#;
        let transport = ScriptedTransport::replying(body);
        let resolver = resolver_with(transport, Duration::from_secs(5));

        let account = resolver.resolve("carol").await;
        assert_eq!(account.status, AccountStatus::Enroll);
        assert_eq!(account.enroll_portal_url.as_deref(), Some("https://x/enroll"));
    }

    #[tokio::test]
    async fn a_second_resolve_within_the_ttl_is_served_from_cache() {
        let transport = ScriptedTransport::replying(ALLOW_BODY);
        let resolver = resolver_with(transport.clone(), Duration::from_secs(5));

        let first = resolver.resolve("alice").await;
        let second = resolver.resolve("alice").await;

        assert_eq!(first, second);
        assert_eq!(transport.calls(), 1, "cache hit must not contact the provider");
    }

    #[tokio::test]
    async fn an_expired_entry_triggers_exactly_one_more_provider_call() {
        let transport = ScriptedTransport::replying(ALLOW_BODY);
        let resolver = resolver_with(transport.clone(), Duration::from_millis(50));

        resolver.resolve("alice").await;
        tokio::time::sleep(Duration::from_millis(120)).await;
        resolver.resolve("alice").await;

        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn distinct_usernames_each_query_the_provider() {
        let transport = ScriptedTransport::replying(ALLOW_BODY);
        let resolver = resolver_with(transport.clone(), Duration::from_secs(5));

        resolver.resolve("alice").await;
        resolver.resolve("bob").await;

        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn transport_failure_resolves_to_unavailable() {
        let transport =
            ScriptedTransport::new(vec![Err(duo_api::Error::Transport("refused".into()))]);
        let resolver = resolver_with(transport, Duration::from_secs(5));

        let account = resolver.resolve("alice").await;
        assert_eq!(account.status, AccountStatus::Unavailable);
    }

    #[tokio::test]
    async fn failures_are_cached_to_bound_provider_load() {
        let transport =
            ScriptedTransport::new(vec![Err(duo_api::Error::Transport("refused".into()))]);
        let resolver = resolver_with(transport.clone(), Duration::from_secs(5));

        let first = resolver.resolve("alice").await;
        let second = resolver.resolve("alice").await;

        assert_eq!(first.status, AccountStatus::Unavailable);
        assert_eq!(second.status, AccountStatus::Unavailable);
        assert_eq!(
            transport.calls(),
            1,
            "an unavailable outcome must be served from cache within the TTL"
        );
    }

    #[tokio::test]
    async fn server_error_code_resolves_to_unavailable() {
        let body = r#"{"stat":"FAIL","code":50000,"message":"boom"}"#;
        let transport = ScriptedTransport::replying(body);
        let resolver = resolver_with(transport, Duration::from_secs(5));

        let account = resolver.resolve("alice").await;
        assert_eq!(account.status, AccountStatus::Unavailable);
    }

    #[tokio::test]
    async fn config_failure_keeps_the_default_status() {
        let body = r#"{"stat":"FAIL","code":1000,"message":"bad field"}"#;
        let transport = ScriptedTransport::replying(body);
        let resolver = resolver_with(transport, Duration::from_secs(5));

        let account = resolver.resolve("alice").await;
        assert_eq!(account.status, AccountStatus::Auth);
    }

    #[tokio::test]
    async fn missing_stat_resolves_to_unavailable() {
        let transport = ScriptedTransport::replying(r#"{"response":"?"}"#);
        let resolver = resolver_with(transport, Duration::from_secs(5));

        let account = resolver.resolve("alice").await;
        assert_eq!(account.status, AccountStatus::Unavailable);
    }

    #[tokio::test]
    async fn unknown_result_resolves_to_unavailable() {
        let body = r#"{"stat":"OK","response":{"result":"bypass","status_msg":"?"}}"#;
        let transport = ScriptedTransport::replying(body);
        let resolver = resolver_with(transport, Duration::from_secs(5));

        let account = resolver.resolve("alice").await;
        assert_eq!(account.status, AccountStatus::Unavailable);
    }

    #[tokio::test]
    async fn ping_is_true_for_a_pong_answer() {
        let transport = ScriptedTransport::replying(r#"{"stat":"OK","response":"pong"}"#);
        let resolver = resolver_with(transport, Duration::from_secs(5));
        assert!(resolver.ping().await);
    }

    #[tokio::test]
    async fn ping_is_false_for_anything_else() {
        let transport = ScriptedTransport::replying(r#"{"stat":"FAIL"}"#);
        let resolver = resolver_with(transport, Duration::from_secs(5));
        assert!(!resolver.ping().await);
    }

    #[tokio::test]
    async fn ping_is_false_when_the_provider_is_unreachable() {
        let transport =
            ScriptedTransport::new(vec![Err(duo_api::Error::Transport("refused".into()))]);
        let resolver = resolver_with(transport, Duration::from_secs(5));
        assert!(!resolver.ping().await);
    }

    /// Transport that parks every call on a barrier, proving that two
    /// concurrent misses for one username are both allowed through.
    struct GatedTransport {
        barrier: tokio::sync::Barrier,
        calls: AtomicUsize,
    }

    impl Transport for GatedTransport {
        fn send_get(
            &self,
            _url: &str,
        ) -> Pin<Box<dyn Future<Output = duo_api::Result<String>> + Send + '_>> {
            Box::pin(async { Err(duo_api::Error::Transport("unused".into())) })
        }

        fn send_signed(
            &self,
            _request: SignedRequest,
        ) -> Pin<Box<dyn Future<Output = duo_api::Result<String>> + Send + '_>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async {
                self.barrier.wait().await;
                Ok(ALLOW_BODY.to_string())
            })
        }
    }

    #[tokio::test]
    async fn concurrent_misses_for_one_username_are_not_deduplicated() {
        let transport = Arc::new(GatedTransport {
            barrier: tokio::sync::Barrier::new(2),
            calls: AtomicUsize::new(0),
        });
        let resolver = Arc::new(resolver_with(transport.clone(), Duration::from_secs(5)));

        let (first, second) =
            tokio::join!(resolver.resolve("alice"), resolver.resolve("alice"));

        assert_eq!(first.status, AccountStatus::Allow);
        assert_eq!(second.status, AccountStatus::Allow);
        assert_eq!(
            transport.calls.load(Ordering::SeqCst),
            2,
            "both misses must issue their own provider call"
        );
        assert!(resolver.cache().get("alice").await.is_some());
    }
}
