//! Error types for calls made through the [`Client`](crate::Client).
//!
//! Failures fall into four groups: a precondition failure raised before
//! anything is sent ([`Error::MissingUrl`]), transport failures that never
//! produced an acceptable response ([`Error::Network`], [`Error::Timeout`],
//! [`Error::HttpError`]), application failures where the server answered with
//! a non-2xx domain payload ([`Error::Rejected`]), and local encoding or
//! configuration problems.

use crate::envelope::ApiFailure;
use http::{HeaderMap, StatusCode};
use serde_json::Value;

/// The main error type for calls made through the client.
///
/// # Examples
///
/// ```no_run
/// use todolist_client::{Client, Error, Fields};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::new()?;
///
/// match client.get("v1/todoList", Fields::new()).await {
///     Ok(response) => println!("Payload: {}", response.data),
///     Err(Error::Rejected(failure)) => {
///         eprintln!(
///             "API error {:?}: {:?}",
///             failure.error_code(),
///             failure.message()
///         );
///     }
///     Err(e) if e.is_timeout() => eprintln!("Timed out: {}", e),
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The request had no URL. Raised before any network activity.
    #[error("Request is missing a URL")]
    MissingUrl,

    /// A network-level error occurred and no response was received.
    ///
    /// The underlying `reqwest::Error` is preserved unchanged.
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The request exceeded the configured timeout.
    ///
    /// The underlying `reqwest::Error` is preserved unchanged; its
    /// `is_timeout()` is always `true`.
    #[error("Request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    /// The server answered with a status the success predicate rejects.
    ///
    /// With the default predicate this means a 5xx response.
    #[error("HTTP error {status}: {raw_response}")]
    HttpError {
        /// The HTTP status code
        status: StatusCode,
        /// The raw response body
        raw_response: String,
        /// The response headers
        headers: HeaderMap,
    },

    /// The server answered with a non-2xx status that the success predicate
    /// accepted. The raw domain payload is carried untransformed.
    #[error("{0}")]
    Rejected(Box<ApiFailure>),

    /// A payload could not be deserialized into the requested type.
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// A query parameter or body field could not be encoded.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// Invalid configuration was provided, such as a bad header or method,
    /// or a cross-origin URL while cross-origin requests are disabled.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// An invalid URL was provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Error::Timeout(error)
        } else {
            Error::Network(error)
        }
    }
}

impl Error {
    /// Returns `true` if the transport gave up waiting for the server.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }

    /// Returns `true` if the failure happened without any response arriving.
    pub fn has_response(&self) -> bool {
        matches!(
            self,
            Error::HttpError { .. } | Error::Rejected(_) | Error::DeserializationFailed { .. }
        )
    }

    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::HttpError { status, .. } => Some(*status),
            Error::Rejected(failure) => Some(failure.status),
            Error::DeserializationFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body for transport-level failures that carry one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::HttpError { raw_response, .. } => Some(raw_response),
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }

    /// Returns the rejected domain payload, if this is an application failure.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Error::Rejected(failure) => Some(&failure.payload),
            _ => None,
        }
    }

    /// Returns the `error_code` embedded in a rejected domain payload.
    pub fn error_code(&self) -> Option<i64> {
        match self {
            Error::Rejected(failure) => failure.error_code(),
            _ => None,
        }
    }

    /// Returns `true` if the server signalled an invalid or expired token.
    ///
    /// # Examples
    ///
    /// ```
    /// use todolist_client::{ApiFailure, Error};
    /// use http::{Method, StatusCode};
    /// use serde_json::json;
    ///
    /// let failure = ApiFailure::new(
    ///     StatusCode::UNAUTHORIZED,
    ///     Method::GET,
    ///     "http://localhost:5000/v1/todoList".parse().unwrap(),
    ///     json!({ "error_code": 10000, "msg": "token invalid" }),
    /// );
    /// let err = Error::Rejected(Box::new(failure));
    ///
    /// assert!(err.requires_reauth());
    /// assert_eq!(err.error_code(), Some(10000));
    /// ```
    pub fn requires_reauth(&self) -> bool {
        match self {
            Error::Rejected(failure) => failure.requires_reauth(),
            _ => false,
        }
    }
}

/// A specialized `Result` type for client calls.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use serde_json::json;

    fn rejected(payload: Value) -> Error {
        Error::Rejected(Box::new(ApiFailure::new(
            StatusCode::BAD_REQUEST,
            Method::POST,
            "http://localhost:5000/v1/todoList".parse().unwrap(),
            payload,
        )))
    }

    #[test]
    fn test_rejected_exposes_payload() {
        let payload = json!({ "error_code": 10030, "msg": "title required" });
        let err = rejected(payload.clone());

        assert_eq!(err.payload(), Some(&payload));
        assert_eq!(err.error_code(), Some(10030));
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
        assert!(err.has_response());
        assert!(!err.requires_reauth());
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_http_error_accessors() {
        let err = Error::HttpError {
            status: StatusCode::BAD_GATEWAY,
            raw_response: "upstream down".to_string(),
            headers: HeaderMap::new(),
        };

        assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
        assert_eq!(err.raw_response(), Some("upstream down"));
        assert_eq!(err.payload(), None);
        assert_eq!(err.error_code(), None);
    }

    #[test]
    fn test_missing_url_has_no_response() {
        let err = Error::MissingUrl;
        assert!(!err.has_response());
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "Request is missing a URL");
    }
}
