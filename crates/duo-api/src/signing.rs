//! Canonical request signing
//!
//! Pre-authentication calls are authenticated with an HMAC-SHA512 over a
//! canonical representation of the request: the RFC 2822 date, the method,
//! the lowercased host, the path, and the sorted, percent-encoded parameter
//! string. The hex signature travels as the password half of a Basic
//! authorization header, paired with the integration key.
//!
//! The date is an explicit input, so signing is deterministic for a fixed
//! date: callers stamp the current time, tests pin one.

use std::fmt::Write as _;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use common::Secret;
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha2::Sha512;

use crate::error::{Error, Result};

type HmacSha512 = Hmac<Sha512>;

/// Percent-encoding set for canonical parameters: RFC 3986 unreserved
/// characters stay literal, everything else is escaped.
const PARAM_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// A signed, ready-to-transmit form POST.
///
/// `body` is the canonical parameter string and doubles as the
/// `application/x-www-form-urlencoded` payload; `date` and `authorization`
/// are the matching header values. The struct is immutable once built;
/// mutating any field would desynchronize body and signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub url: String,
    pub date: String,
    pub authorization: String,
    pub body: String,
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, PARAM_ENCODE_SET).to_string()
}

/// Build the canonical parameter string: pairs percent-encoded, sorted, and
/// joined with `&`. Both the signature and the POST body use this form, so
/// the provider verifies exactly the bytes it receives.
pub fn canon_params(params: &[(&str, &str)]) -> String {
    let mut pairs: Vec<String> = params
        .iter()
        .map(|(key, value)| format!("{}={}", encode(key), encode(value)))
        .collect();
    pairs.sort();
    pairs.join("&")
}

/// Sign a request against the provider's canonical scheme.
///
/// `host` must be the bare API host (no scheme); it is lowercased for the
/// canonical string. Identical inputs, including `date`, produce an
/// identical [`SignedRequest`]. A rejected secret key surfaces as
/// [`Error::Signing`]; an unsigned request is never returned.
pub fn sign_request(
    method: &str,
    host: &str,
    path: &str,
    params: &[(&str, &str)],
    integration_key: &str,
    secret_key: &Secret<String>,
    date: &str,
) -> Result<SignedRequest> {
    let host = host.to_lowercase();
    let body = canon_params(params);
    let canon = [date, method, host.as_str(), path, body.as_str()].join("\n");

    let mut mac = HmacSha512::new_from_slice(secret_key.expose().as_bytes())
        .map_err(|e| Error::Signing(format!("secret key rejected: {e}")))?;
    mac.update(canon.as_bytes());
    let digest = mac.finalize().into_bytes();
    let signature = digest.iter().fold(String::new(), |mut hex, byte| {
        let _ = write!(hex, "{byte:02x}");
        hex
    });

    let authorization = format!(
        "Basic {}",
        BASE64.encode(format!("{integration_key}:{signature}"))
    );

    Ok(SignedRequest {
        url: format!("https://{host}{path}"),
        date: date.to_owned(),
        authorization,
        body,
    })
}
