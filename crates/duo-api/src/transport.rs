//! Transport capability
//!
//! The client executes requests through this narrow seam so tests can swap in
//! a programmable double. Both operations return the raw response body for
//! every HTTP status, since the provider carries classifiable JSON in its
//! failure bodies; only connection-level problems are transport errors. One
//! attempt per call; retry policy belongs to whoever owns the call.
//!
//! Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
//! (`Arc<dyn Transport>`).

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::debug;

use crate::error::{Error, Result};
use crate::signing::SignedRequest;

/// Abstraction over request execution.
pub trait Transport: Send + Sync {
    /// Issue an unauthenticated GET and return the body text.
    fn send_get(&self, url: &str) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>>;

    /// Transmit a signed form POST and return the body text.
    fn send_signed(
        &self,
        request: SignedRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>>;
}

/// Production transport backed by a shared reqwest client.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(format!("building http client: {e}")))?;
        Ok(Self { client })
    }

    /// Reuse an existing reqwest client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn send_get(&self, url: &str) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        let url = url.to_owned();
        Box::pin(async move {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| Error::Transport(format!("GET {url} failed: {e}")))?;
            let status = response.status();
            debug!(url = %url, status = status.as_u16(), "provider GET completed");
            response
                .text()
                .await
                .map_err(|e| Error::Transport(format!("reading response body: {e}")))
        })
    }

    fn send_signed(
        &self,
        request: SignedRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        Box::pin(async move {
            let response = self
                .client
                .post(&request.url)
                .header(reqwest::header::DATE, &request.date)
                .header(reqwest::header::AUTHORIZATION, &request.authorization)
                .header(
                    reqwest::header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded",
                )
                .body(request.body.clone())
                .send()
                .await
                .map_err(|e| Error::Transport(format!("POST {} failed: {e}", request.url)))?;
            let status = response.status();
            debug!(url = %request.url, status = status.as_u16(), "provider POST completed");
            response
                .text()
                .await
                .map_err(|e| Error::Transport(format!("reading response body: {e}")))
        })
    }
}
