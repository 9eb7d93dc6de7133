//! Client configuration.
//!
//! The defaults describe the API this crate was written for. They can only be
//! changed through the [`ClientBuilder`](crate::ClientBuilder) when the
//! client is constructed; a built client's configuration never changes.

use http::StatusCode;
use std::time::Duration;
use url::Url;

/// The base URL every relative request URL is joined to.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/";

/// The per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Delay between an auth sentinel response and the forced navigation.
pub const REAUTH_DELAY: Duration = Duration::from_millis(1500);

/// Decides which statuses the transport treats as responses rather than errors.
pub type StatusPredicate = fn(StatusCode) -> bool;

/// Accepts every status in `[200, 500)`.
///
/// 4xx responses are therefore handed to the response interceptors, which
/// inspect the domain payload; only 5xx and lower statuses are transport errors.
///
/// # Examples
///
/// ```
/// use todolist_client::config::default_validate_status;
/// use http::StatusCode;
///
/// assert!(default_validate_status(StatusCode::OK));
/// assert!(default_validate_status(StatusCode::NOT_FOUND));
/// assert!(!default_validate_status(StatusCode::INTERNAL_SERVER_ERROR));
/// ```
pub fn default_validate_status(status: StatusCode) -> bool {
    (200..500).contains(&status.as_u16())
}

/// The immutable configuration of a built [`Client`](crate::Client).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// The base URL for relative request URLs.
    pub base_url: Url,

    /// The per-call timeout enforced by the transport.
    pub timeout: Duration,

    /// Whether absolute URLs on another origin than `base_url` may be called.
    pub cross_origin: bool,

    /// Which statuses count as responses rather than transport errors.
    pub validate_status: StatusPredicate,

    /// Delay before navigating away after an auth sentinel.
    pub reauth_delay: Duration,
}

impl ClientConfig {
    /// Returns `true` if `url` may be called under this configuration.
    pub fn allows(&self, url: &Url) -> bool {
        self.cross_origin || url.origin() == self.base_url.origin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(cross_origin: bool) -> ClientConfig {
        ClientConfig {
            base_url: Url::parse(DEFAULT_BASE_URL).unwrap(),
            timeout: DEFAULT_TIMEOUT,
            cross_origin,
            validate_status: default_validate_status,
            reauth_delay: REAUTH_DELAY,
        }
    }

    #[test]
    fn test_status_band() {
        assert!(!default_validate_status(StatusCode::from_u16(199).unwrap()));
        assert!(default_validate_status(StatusCode::from_u16(200).unwrap()));
        assert!(default_validate_status(StatusCode::from_u16(302).unwrap()));
        assert!(default_validate_status(StatusCode::from_u16(499).unwrap()));
        assert!(!default_validate_status(StatusCode::from_u16(500).unwrap()));
        assert!(!default_validate_status(StatusCode::from_u16(503).unwrap()));
    }

    #[test]
    fn test_cross_origin_check() {
        let other = Url::parse("https://example.com/v1/todoList").unwrap();
        let same = Url::parse("http://localhost:5000/v1/todoList").unwrap();

        assert!(config(true).allows(&other));
        assert!(!config(false).allows(&other));
        assert!(config(false).allows(&same));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(DEFAULT_TIMEOUT.as_millis(), 5000);
        assert_eq!(REAUTH_DELAY.as_millis(), 1500);
        assert_eq!(Url::parse(DEFAULT_BASE_URL).unwrap().port(), Some(5000));
    }
}
