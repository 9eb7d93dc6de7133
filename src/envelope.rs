//! The domain envelope the API wraps around failures.
//!
//! A failed call answers with a JSON body carrying an `error_code` and a
//! message under `msg` (or `message`). The message is either a plain string or
//! a keyed mapping of messages, e.g. one entry per invalid form field.

use http::{Method, StatusCode};
use serde_json::Value;
use std::fmt;
use url::Url;

/// The server rejected the access token.
pub const INVALID_TOKEN: i64 = 10000;

/// The server could not refresh the access token.
pub const REFRESH_TOKEN_FAILED: i64 = 10100;

/// Returns `true` for error codes that force the user to sign in again.
pub fn is_auth_sentinel(code: i64) -> bool {
    code == INVALID_TOKEN || code == REFRESH_TOKEN_FAILED
}

/// A non-2xx response whose domain payload is handed back to the caller.
///
/// `payload` is the response body exactly as the server sent it. The
/// accessors read fields out of it without modifying it.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiFailure {
    /// The HTTP status code of the response.
    pub status: StatusCode,
    /// The method of the request that failed.
    pub method: Method,
    /// The resolved URL of the request that failed.
    pub url: Url,
    /// The raw domain payload.
    pub payload: Value,
}

impl ApiFailure {
    /// Creates a new `ApiFailure`.
    pub fn new(status: StatusCode, method: Method, url: Url, payload: Value) -> Self {
        Self {
            status,
            method,
            url,
            payload,
        }
    }

    /// Returns the payload's `error_code`, if it is an integer.
    pub fn error_code(&self) -> Option<i64> {
        self.payload.get("error_code")?.as_i64()
    }

    /// Returns the message to show the user.
    ///
    /// See [`display_message`].
    pub fn message(&self) -> Option<String> {
        display_message(&self.payload)
    }

    /// Returns `true` if the error code is one of the auth sentinels.
    pub fn requires_reauth(&self) -> bool {
        self.error_code().is_some_and(is_auth_sentinel)
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API error {} on {} {}", self.status, self.method, self.url)?;
        if let Some(code) = self.error_code() {
            write!(f, " (error_code {})", code)?;
        }
        if let Some(message) = self.message() {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

/// Extracts the display message from a domain payload.
///
/// `msg` is preferred over `message`. A keyed mapping yields its first entry in
/// enumeration order and discards the rest; an array yields its first element.
///
/// # Examples
///
/// ```
/// use todolist_client::envelope::display_message;
/// use serde_json::json;
///
/// let payload = json!({ "msg": { "a": "first", "b": "second" } });
/// assert_eq!(display_message(&payload).as_deref(), Some("first"));
///
/// let payload = json!({ "message": "plain" });
/// assert_eq!(display_message(&payload).as_deref(), Some("plain"));
/// ```
pub fn display_message(payload: &Value) -> Option<String> {
    let raw = payload.get("msg").or_else(|| payload.get("message"))?;
    first_message(raw)
}

fn first_message(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.values().next().and_then(first_message),
        Value::Array(items) => items.first().and_then(first_message),
        other => Some(other.to_string()),
    }
}
