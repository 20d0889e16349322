//! Duo Security admin API client
//!
//! Builds, signs, and classifies the two provider exchanges used by the
//! authentication pipeline: the unauthenticated liveness ping and the signed
//! user pre-authentication lookup. This crate is a standalone library with no
//! dependency on the gateway binary; it can be tested and used independently.
//!
//! Request flow:
//! 1. `DuoClient::ping()` / `DuoClient::pre_auth()` build the outbound request
//! 2. `sign_request()` attaches the HMAC authorization for pre-auth
//! 3. The injected [`Transport`] executes it and returns the raw body
//! 4. `classify::ping_ok()` / `classify::classify_preauth()` map the body
//!    onto the account status model
//!
//! Classification never panics; every degraded provider answer comes back as
//! either a [`UserAccount`] or a typed [`Error`] for the caller to absorb.

pub mod account;
pub mod classify;
pub mod client;
pub mod constants;
pub mod error;
pub mod signing;
pub mod transport;

pub use account::{AccountStatus, UserAccount};
pub use classify::{classify_preauth, ping_ok};
pub use client::DuoClient;
pub use constants::*;
pub use error::{Error, Result};
pub use signing::{SignedRequest, sign_request};
pub use transport::{HttpTransport, Transport};
