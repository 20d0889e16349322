//! User account status model
//!
//! A [`UserAccount`] is the immutable outcome of one status resolution. Every
//! resolution produces a fresh instance; cached copies are never mutated in
//! place.

use serde::Serialize;

/// MFA eligibility status of a user account.
///
/// `Auth` is the starting point of every resolution: no decision yet, the
/// user proceeds to a factor challenge. `Unavailable` means the provider
/// could not be reached or returned an unrecoverable answer; the consuming
/// pipeline decides whether that fails open or closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    #[default]
    Auth,
    Allow,
    Deny,
    Enroll,
    Unavailable,
}

impl AccountStatus {
    /// Map the wire `result` value onto a status.
    ///
    /// The match is by exact variant name after uppercasing, the full closed
    /// set and nothing else. An unknown value is a contract violation and
    /// returns `None` so the caller can reject the response instead of
    /// silently defaulting.
    pub fn from_result(result: &str) -> Option<Self> {
        match result.to_uppercase().as_str() {
            "AUTH" => Some(Self::Auth),
            "ALLOW" => Some(Self::Allow),
            "DENY" => Some(Self::Deny),
            "ENROLL" => Some(Self::Enroll),
            "UNAVAILABLE" => Some(Self::Unavailable),
            _ => None,
        }
    }

    /// Status label for logging and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Allow => "allow",
            Self::Deny => "deny",
            Self::Enroll => "enroll",
            Self::Unavailable => "unavailable",
        }
    }
}

/// Resolved account state for one username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAccount {
    /// Cache key; non-empty.
    pub username: String,
    pub status: AccountStatus,
    /// Human-readable status message from the provider, possibly empty.
    pub message: String,
    /// Enrollment portal, present only when `status` is `Enroll`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enroll_portal_url: Option<String>,
}

impl UserAccount {
    /// A fresh account with the default `Auth` status and no message.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            status: AccountStatus::default(),
            message: String::new(),
            enroll_portal_url: None,
        }
    }

    /// An account marking the provider as unreachable for this resolution.
    pub fn unavailable(username: impl Into<String>) -> Self {
        Self {
            status: AccountStatus::Unavailable,
            ..Self::new(username)
        }
    }
}
