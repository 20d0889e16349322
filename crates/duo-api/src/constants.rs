//! Provider API constants
//!
//! Endpoint paths and the failure-code threshold are fixed by the provider's
//! admin API contract. The integration key identifies the calling integration
//! and is not a secret; the secret key is supplied separately at construction.

/// Unauthenticated liveness endpoint, relative to the API host.
pub const PING_PATH: &str = "/rest/v1/ping";

/// Signed pre-authentication endpoint (auth API v2), relative to the API host.
pub const PREAUTH_PATH: &str = "/auth/v2/preauth";

/// Failure codes above this threshold indicate the provider itself is failing.
/// Codes at or below it are request/configuration problems on an otherwise
/// reachable provider.
pub const SERVER_ERROR_CODE_THRESHOLD: i64 = 49999;
