//! Response wrapper that preserves both the domain payload and the HTTP details.
//!
//! The [`Response`] type carries the payload the server sent along with the
//! status, headers, latency and the request it answers, so callers can log or
//! inspect the exchange without keeping the transport response around.

use crate::{Error, Result};
use http::{HeaderMap, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// A response that made it through the interceptor pipeline.
///
/// # Examples
///
/// ```no_run
/// use todolist_client::{Client, Fields};
///
/// # async fn example() -> Result<(), todolist_client::Error> {
/// let client = Client::new()?;
/// let response = client.get("v1/todoList", Fields::new()).await?;
///
/// println!("Payload: {}", response.data);
/// println!("Status: {}", response.status);
/// println!("Took {:?}", response.latency);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The domain payload.
    pub data: T,

    /// The raw response body as a string.
    pub raw_body: String,

    /// The HTTP status code of the response.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// Time from sending the request to reading the full body.
    pub latency: Duration,

    /// The method of the request this response answers.
    pub method: Method,

    /// The resolved URL of the request this response answers.
    pub url: Url,
}

impl<T> Response<T> {
    /// Creates a new `Response`.
    pub fn new(
        data: T,
        raw_body: String,
        status: StatusCode,
        headers: HeaderMap,
        latency: Duration,
        method: Method,
        url: Url,
    ) -> Self {
        Self {
            data,
            raw_body,
            status,
            headers,
            latency,
            method,
            url,
        }
    }

    /// Maps the response data to a different type using the provided function.
    ///
    /// # Examples
    ///
    /// ```
    /// # use todolist_client::Response;
    /// # use http::{HeaderMap, Method, StatusCode};
    /// # use std::time::Duration;
    /// let response = Response::new(
    ///     42,
    ///     "42".to_string(),
    ///     StatusCode::OK,
    ///     HeaderMap::new(),
    ///     Duration::from_millis(100),
    ///     Method::GET,
    ///     "http://localhost:5000/answer".parse().unwrap(),
    /// );
    ///
    /// let string_response = response.map(|n| n.to_string());
    /// assert_eq!(string_response.data, "42");
    /// ```
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            data: f(self.data),
            raw_body: self.raw_body,
            status: self.status,
            headers: self.headers,
            latency: self.latency,
            method: self.method,
            url: self.url,
        }
    }

    /// Returns a reference to a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

impl Response<Value> {
    /// Deserializes the payload into a typed value, keeping the metadata.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeserializationFailed`] with the raw body if the
    /// payload does not match `U`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use todolist_client::Response;
    /// # use http::{HeaderMap, Method, StatusCode};
    /// # use std::time::Duration;
    /// # use serde_json::json;
    /// #[derive(serde::Deserialize)]
    /// struct Todo { title: String }
    ///
    /// let response = Response::new(
    ///     json!({ "title": "milk" }),
    ///     r#"{"title":"milk"}"#.to_string(),
    ///     StatusCode::OK,
    ///     HeaderMap::new(),
    ///     Duration::from_millis(3),
    ///     Method::GET,
    ///     "http://localhost:5000/v1/todoList/1".parse().unwrap(),
    /// );
    ///
    /// let todo = response.deserialize::<Todo>().unwrap();
    /// assert_eq!(todo.data.title, "milk");
    /// ```
    pub fn deserialize<U: DeserializeOwned>(self) -> Result<Response<U>> {
        match serde_json::from_value::<U>(self.data.clone()) {
            Ok(data) => Ok(self.map(|_| data)),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    raw_response = %self.raw_body,
                    "Failed to deserialize payload"
                );

                Err(Error::DeserializationFailed {
                    raw_response: self.raw_body,
                    serde_error: e.to_string(),
                    status: self.status,
                })
            }
        }
    }
}

impl<T> AsRef<T> for Response<T> {
    fn as_ref(&self) -> &T {
        &self.data
    }
}

impl<T> std::ops::Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

/// Parses a response body leniently: empty is `null`, JSON is parsed,
/// anything else is kept as a string.
pub(crate) fn parse_payload(raw_body: &str) -> Value {
    if raw_body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(raw_body).unwrap_or_else(|_| Value::String(raw_body.to_string()))
}
