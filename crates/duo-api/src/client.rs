//! Provider client
//!
//! Builds the two outbound request shapes and executes them through the
//! injected transport. Exactly one attempt per call: the resolution layer
//! owns availability policy, and it applies none.

use std::sync::Arc;

use chrono::Utc;
use common::Secret;
use tracing::debug;

use crate::constants::{PING_PATH, PREAUTH_PATH};
use crate::error::Result;
use crate::signing::sign_request;
use crate::transport::Transport;

/// Client for the provider's admin API.
///
/// Key material is read-only shared configuration; the client never mutates
/// it after construction.
pub struct DuoClient {
    api_host: String,
    integration_key: String,
    secret_key: Secret<String>,
    transport: Arc<dyn Transport>,
}

impl DuoClient {
    pub fn new(
        api_host: impl Into<String>,
        integration_key: impl Into<String>,
        secret_key: Secret<String>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            api_host: api_host.into(),
            integration_key: integration_key.into(),
            secret_key,
            transport,
        }
    }

    /// The configured API host, as given.
    pub fn api_host(&self) -> &str {
        &self.api_host
    }

    /// Full base URL; bare hosts get `https://` prepended.
    fn base_url(&self) -> String {
        if self.api_host.starts_with("http") {
            self.api_host.clone()
        } else {
            format!("https://{}", self.api_host)
        }
    }

    /// Host without scheme, as the canonical signing string requires.
    fn bare_host(&self) -> &str {
        self.api_host
            .trim_start_matches("https://")
            .trim_start_matches("http://")
    }

    /// Issue the unauthenticated liveness request and return the raw body.
    pub async fn ping(&self) -> Result<String> {
        let url = format!("{}{}", self.base_url(), PING_PATH);
        debug!(url = %url, "contacting provider liveness endpoint");
        self.transport.send_get(&url).await
    }

    /// Issue the signed pre-authentication request for `username` and return
    /// the raw body.
    pub async fn pre_auth(&self, username: &str) -> Result<String> {
        let date = Utc::now().to_rfc2822();
        let request = sign_request(
            "POST",
            self.bare_host(),
            PREAUTH_PATH,
            &[("username", username)],
            &self.integration_key,
            &self.secret_key,
            &date,
        )?;
        debug!(username, url = %request.url, "inquiring about username");
        self.transport.send_signed(request).await
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    use super::*;
    use crate::signing::SignedRequest;

    /// Transport double that records what the client hands it.
    #[derive(Default)]
    struct RecordingTransport {
        get_urls: Mutex<Vec<String>>,
        signed: Mutex<Vec<SignedRequest>>,
        response: String,
    }

    impl RecordingTransport {
        fn replying(response: &str) -> Self {
            Self {
                response: response.to_string(),
                ..Self::default()
            }
        }
    }

    impl Transport for RecordingTransport {
        fn send_get(
            &self,
            url: &str,
        ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
            self.get_urls.lock().unwrap().push(url.to_string());
            let body = self.response.clone();
            Box::pin(async move { Ok(body) })
        }

        fn send_signed(
            &self,
            request: SignedRequest,
        ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
            self.signed.lock().unwrap().push(request);
            let body = self.response.clone();
            Box::pin(async move { Ok(body) })
        }
    }

    fn client(api_host: &str, transport: Arc<RecordingTransport>) -> DuoClient {
        DuoClient::new(
            api_host,
            "DIXXXXXXXXXXXXXXXXXX",
            Secret::new("test-secret".to_string()),
            transport,
        )
    }

    #[tokio::test]
    async fn ping_targets_the_health_path_with_https() {
        let transport = Arc::new(RecordingTransport::replying("{}"));
        let client = client("api-test.duosecurity.test", transport.clone());

        client.ping().await.unwrap();

        let urls = transport.get_urls.lock().unwrap();
        assert_eq!(
            urls.as_slice(),
            ["https://api-test.duosecurity.test/rest/v1/ping"]
        );
    }

    #[tokio::test]
    async fn ping_keeps_an_explicit_scheme() {
        let transport = Arc::new(RecordingTransport::replying("{}"));
        let client = client("http://localhost:4443", transport.clone());

        client.ping().await.unwrap();

        let urls = transport.get_urls.lock().unwrap();
        assert_eq!(urls.as_slice(), ["http://localhost:4443/rest/v1/ping"]);
    }

    #[tokio::test]
    async fn pre_auth_sends_a_signed_form_post() {
        let transport = Arc::new(RecordingTransport::replying("{}"));
        let client = client("api-test.duosecurity.test", transport.clone());

        client.pre_auth("jsmith").await.unwrap();

        let signed = transport.signed.lock().unwrap();
        assert_eq!(signed.len(), 1);
        let request = &signed[0];
        assert_eq!(
            request.url,
            "https://api-test.duosecurity.test/auth/v2/preauth"
        );
        assert_eq!(request.body, "username=jsmith");
        assert!(request.authorization.starts_with("Basic "));
        assert!(!request.date.is_empty());
    }

    #[tokio::test]
    async fn pre_auth_signs_with_the_bare_host() {
        // A scheme-qualified host must not leak the scheme into the signed URL.
        let transport = Arc::new(RecordingTransport::replying("{}"));
        let client = client("https://api-test.duosecurity.test", transport.clone());

        client.pre_auth("jsmith").await.unwrap();

        let signed = transport.signed.lock().unwrap();
        assert_eq!(
            signed[0].url,
            "https://api-test.duosecurity.test/auth/v2/preauth"
        );
    }

    #[tokio::test]
    async fn pre_auth_returns_the_transport_body() {
        let transport = Arc::new(RecordingTransport::replying(r#"{"stat":"OK"}"#));
        let client = client("api-test.duosecurity.test", transport);

        let body = client.pre_auth("jsmith").await.unwrap();
        assert_eq!(body, r#"{"stat":"OK"}"#);
    }
}
