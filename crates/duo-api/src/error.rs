//! Error taxonomy for provider exchanges
//!
//! These variants are the classification outcomes the resolver branches on.
//! All of them collapse to an unavailable account at the resolution boundary;
//! none of them ever crosses it. The non-fatal "configuration warning" answer
//! from the provider is not represented here: the classifier resolves it
//! locally to a default-status account.

/// Errors from building, sending, or classifying a provider exchange.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("request signing failed: {0}")]
    Signing(String),

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("provider server error {code}: {message}")]
    Server { code: i64, message: String },
}

/// Result alias for provider operations.
pub type Result<T> = std::result::Result<T, Error>;
