//! Secret wrapper for key material
//!
//! Integration and secret keys are read-only configuration: loaded once at
//! startup, shared by reference afterwards, and never logged. The wrapper
//! redacts Debug/Display output and zeroizes the inner value on drop.

use std::fmt;

use serde::{Deserialize, Deserializer};
use zeroize::Zeroize;

/// Sensitive value, redacted in Debug/Display and zeroized on drop.
pub struct Secret<T: Zeroize>(T);

impl<T: Zeroize> Secret<T> {
    /// Wrap a sensitive value.
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the inner value. Call sites should be few and deliberate.
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> Drop for Secret<T> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl<T: Zeroize + Clone> Clone for Secret<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<'de, T: Zeroize + Deserialize<'de>> Deserialize<'de> for Secret<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_is_redacted() {
        let secret = Secret::new(String::from("skey-material"));
        let debug = format!("{secret:?}");
        assert_eq!(debug, "[REDACTED]");
        assert!(!debug.contains("skey-material"));
    }

    #[test]
    fn display_is_redacted() {
        let secret = Secret::new(String::from("skey-material"));
        assert_eq!(format!("{secret}"), "[REDACTED]");
    }

    #[test]
    fn expose_returns_inner() {
        let secret = Secret::new(String::from("ikey-value"));
        assert_eq!(secret.expose(), "ikey-value");
    }

    #[test]
    fn clone_preserves_value() {
        let secret = Secret::new(String::from("dup"));
        let copy = secret.clone();
        assert_eq!(copy.expose(), "dup");
    }

    #[test]
    fn deserializes_from_plain_string() {
        let secret: Secret<String> = serde_json::from_str("\"from-config\"").unwrap();
        assert_eq!(secret.expose(), "from-config");
    }
}
