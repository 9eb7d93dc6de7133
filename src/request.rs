//! The per-call request descriptor that flows through the request interceptors.

use crate::form::{Fields, MultipartForm};
use http::{HeaderMap, HeaderName, HeaderValue};

/// The body of a request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Structured fields, sent as a JSON object.
    Fields(Fields),
    /// A multipart form, sent as `multipart/form-data`.
    Multipart(MultipartForm),
}

impl RequestBody {
    /// Returns the structured fields, if the body has not been turned into a form.
    pub fn fields(&self) -> Option<&Fields> {
        match self {
            RequestBody::Fields(fields) => Some(fields),
            RequestBody::Multipart(_) => None,
        }
    }

    /// Returns the multipart form, if the body is one.
    pub fn multipart(&self) -> Option<&MultipartForm> {
        match self {
            RequestBody::Multipart(form) => Some(form),
            RequestBody::Fields(_) => None,
        }
    }
}

impl From<Fields> for RequestBody {
    fn from(fields: Fields) -> Self {
        RequestBody::Fields(fields)
    }
}

impl From<MultipartForm> for RequestBody {
    fn from(form: MultipartForm) -> Self {
        RequestBody::Multipart(form)
    }
}

/// Everything needed to make a single call.
///
/// Fields are optional because callers do not always supply them; the
/// [`NormalizeRequest`](crate::interceptor::NormalizeRequest) interceptor
/// fills in the method and reconciles `params` and `data` before the request
/// is sent.
///
/// # Examples
///
/// ```
/// use todolist_client::{Fields, RequestConfig};
///
/// let config = RequestConfig::new("v1/todoList")
///     .method("GET")
///     .params(Fields::new().with("page", 1));
///
/// assert_eq!(config.url.as_deref(), Some("v1/todoList"));
/// assert_eq!(config.method.as_deref(), Some("GET"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestConfig {
    /// The HTTP method. Case-insensitive; defaults to `get`.
    pub method: Option<String>,

    /// The request URL, relative to the base URL or absolute.
    pub url: Option<String>,

    /// Query parameters.
    pub params: Option<Fields>,

    /// The request body.
    pub data: Option<RequestBody>,

    /// Additional headers for this request.
    pub headers: HeaderMap,
}

impl RequestConfig {
    /// Creates a config for the given URL with nothing else set.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Sets the method.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Sets the query parameters.
    pub fn params(mut self, params: Fields) -> Self {
        self.params = Some(params);
        self
    }

    /// Sets the body.
    pub fn data(mut self, data: impl Into<RequestBody>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Adds a header to the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn with_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self, crate::Error> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| crate::Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| crate::Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Returns the body fields, if the body is still structured.
    pub fn data_fields(&self) -> Option<&Fields> {
        self.data.as_ref().and_then(RequestBody::fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        let config = RequestConfig::default();
        assert!(config.url.is_none());
        assert!(config.method.is_none());
        assert!(config.params.is_none());
        assert!(config.data.is_none());
    }

    #[test]
    fn test_with_header() {
        let config = RequestConfig::new("v1/todoList")
            .with_header("authorization", "Bearer abc")
            .unwrap();
        assert_eq!(config.headers.get("authorization").unwrap(), "Bearer abc");

        assert!(matches!(
            RequestConfig::new("x").with_header("bad header", "v"),
            Err(crate::Error::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_data_fields() {
        let config = RequestConfig::new("x").data(Fields::new().with("a", 1));
        assert_eq!(config.data_fields().map(Fields::len), Some(1));

        let config = RequestConfig::new("x").data(MultipartForm::new());
        assert!(config.data_fields().is_none());
    }
}
