//! Response classification
//!
//! Maps raw provider bodies onto the account status model. Bodies arrive
//! form-urlencoded; they are decoded and JSON-parsed here, then classified:
//!
//! - liveness: `true` iff `stat` is `OK` and `response` is `pong`, both
//!   case-insensitive; any other shape is `false`
//! - pre-authentication: `stat == OK` carries a result payload; otherwise the
//!   failure `code` splits provider-side failures (above the threshold, the
//!   provider is treated as unavailable) from request/configuration mistakes
//!   (logged, account keeps its default status, the provider is still up)
//!
//! Classification is a pure function of the body text. Outcomes are values:
//! a [`UserAccount`] or a typed [`Error`]; nothing here panics on provider
//! input.

use serde::Deserialize;
use tracing::warn;

use crate::account::{AccountStatus, UserAccount};
use crate::constants::SERVER_ERROR_CODE_THRESHOLD;
use crate::error::{Error, Result};

/// Envelope common to every provider answer. Fields are optional so that
/// classification, not deserialization, decides what a missing field means.
#[derive(Debug, Deserialize)]
struct Envelope {
    stat: Option<String>,
    #[serde(default)]
    response: serde_json::Value,
    code: Option<i64>,
    message: Option<String>,
    message_detail: Option<String>,
}

/// Success payload of a pre-authentication answer. `result` and `status_msg`
/// are required by the wire contract; their absence is a malformed response.
#[derive(Debug, Deserialize)]
struct PreauthPayload {
    result: String,
    status_msg: String,
    enroll_portal_url: Option<String>,
}

/// Decode a form-urlencoded body: `+` is a space, `%XX` a percent-escaped
/// byte. Invalid UTF-8 is replaced rather than rejected; the JSON parse
/// decides whether the result is usable.
fn decode_body(raw: &str) -> String {
    let unplussed = raw.replace('+', " ");
    percent_encoding::percent_decode_str(&unplussed)
        .decode_utf8_lossy()
        .into_owned()
}

fn parse(raw: &str) -> Result<Envelope> {
    let body = decode_body(raw);
    serde_json::from_str(&body)
        .map_err(|e| Error::MalformedResponse(format!("unparseable response: {e}")))
}

/// Liveness predicate over a raw ping body.
pub fn ping_ok(raw: &str) -> bool {
    let envelope = match parse(raw) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(error = %e, "liveness response did not parse");
            return false;
        }
    };

    let stat_ok = envelope
        .stat
        .as_deref()
        .is_some_and(|stat| stat.eq_ignore_ascii_case("OK"));
    let pong = envelope
        .response
        .as_str()
        .is_some_and(|response| response.eq_ignore_ascii_case("pong"));

    if stat_ok && pong {
        true
    } else {
        warn!(
            stat = envelope.stat.as_deref().unwrap_or_default(),
            "provider did not answer the liveness probe with pong"
        );
        false
    }
}

/// Classify a raw pre-authentication body into an account for `username`.
///
/// `Err` variants all mean the provider answer is unusable and the account
/// must be treated as unavailable. The sub-threshold failure path is not an
/// error: it resolves to an account with the default status, because the
/// provider itself answered.
pub fn classify_preauth(username: &str, raw: &str) -> Result<UserAccount> {
    let envelope = parse(raw)?;

    let Some(stat) = envelope.stat else {
        warn!(username, "pre-authentication response carries no stat field");
        return Err(Error::MalformedResponse(
            "response is missing the stat field".into(),
        ));
    };

    if stat.eq_ignore_ascii_case("OK") {
        let payload: PreauthPayload = serde_json::from_value(envelope.response)
            .map_err(|e| Error::MalformedResponse(format!("unexpected success payload: {e}")))?;
        let status = AccountStatus::from_result(&payload.result).ok_or_else(|| {
            Error::MalformedResponse(format!("unknown result value: {}", payload.result))
        })?;
        let enroll_portal_url = if status == AccountStatus::Enroll {
            let url = payload.enroll_portal_url.ok_or_else(|| {
                Error::MalformedResponse("enroll result without enroll_portal_url".into())
            })?;
            Some(url)
        } else {
            None
        };
        return Ok(UserAccount {
            username: username.to_owned(),
            status,
            message: payload.status_msg,
            enroll_portal_url,
        });
    }

    let code = envelope.code.unwrap_or(0);
    let message = envelope.message.unwrap_or_default();
    if code > SERVER_ERROR_CODE_THRESHOLD {
        warn!(
            username,
            code,
            message = %message,
            "provider reported a server-side failure and will be considered unavailable"
        );
        return Err(Error::Server { code, message });
    }

    let message_detail = envelope.message_detail.unwrap_or_default();
    warn!(
        username,
        code,
        message = %message,
        message_detail = %message_detail,
        "provider rejected the inquiry; likely a misconfigured request, provider still considered available"
    );
    Ok(UserAccount::new(username))
}
