//! HTTP client with an explicit interceptor pipeline.
//!
//! The [`Client`] type is the main entry point for making HTTP requests.
//! Use [`ClientBuilder`] to configure and create clients, or [`Client::new`]
//! for the default configuration.

use crate::{
    config::{
        default_validate_status, ClientConfig, StatusPredicate, DEFAULT_BASE_URL,
        DEFAULT_TIMEOUT, REAUTH_DELAY,
    },
    form::Fields,
    interceptor::{
        self, Navigator, NormalizeRequest, RequestInterceptor, ResponseInterceptor,
        TracingNavigator, UnwrapEnvelope,
    },
    request::{RequestBody, RequestConfig},
    response::parse_payload,
    Error, Response, Result,
};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// A pre-configured HTTP client that runs every call through the interceptor
/// pipeline.
///
/// The client is cheap to clone and designed to be constructed once by the
/// host application and passed to whatever needs it.
///
/// # Examples
///
/// ```no_run
/// use todolist_client::{Client, Fields};
///
/// # async fn example() -> Result<(), todolist_client::Error> {
/// let client = Client::new()?;
///
/// // GET http://localhost:5000/v1/todoList?page=1
/// let lists = client
///     .get("v1/todoList", Fields::new().with("page", 1))
///     .await?;
/// println!("Lists: {}", lists.data);
///
/// // POST a JSON body
/// let created = client
///     .post("v1/todoList", Fields::new().with("title", "groceries"), Fields::new())
///     .await?;
/// println!("Created: {}", created.data);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    config: ClientConfig,
    default_headers: HeaderMap,
    request_interceptors: Vec<Box<dyn RequestInterceptor>>,
    response_interceptors: Vec<Box<dyn ResponseInterceptor>>,
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Creates a client with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        ClientBuilder::new().build()
    }

    /// Returns the configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Makes a call described by `request`.
    ///
    /// The request passes through the request interceptors, is sent, and the
    /// outcome passes through the response interceptors. A failure in the
    /// request stage skips transmission but still reaches the response
    /// interceptors' `on_error`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use todolist_client::{Client, Fields, RequestConfig};
    ///
    /// # async fn example() -> Result<(), todolist_client::Error> {
    /// let client = Client::new()?;
    ///
    /// let request = RequestConfig::new("v1/todoList")
    ///     .method("POST")
    ///     .data(Fields::new().with("title", "chores"));
    ///
    /// let response = client.request(request).await?;
    /// println!("Created: {}", response.data);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn request(&self, request: RequestConfig) -> Result<Response<Value>> {
        let outcome = match interceptor::run_request(&self.inner.request_interceptors, request) {
            Ok(request) => self.execute_request(request).await,
            Err(e) => Err(e),
        };

        interceptor::run_response(&self.inner.response_interceptors, outcome)
    }

    /// Sends a normalized request and reads the response.
    async fn execute_request(&self, request: RequestConfig) -> Result<Response<Value>> {
        let method = parse_method(request.method.as_deref())?;
        let target = request.url.as_deref().ok_or(Error::MissingUrl)?;
        let mut url = resolve_url(&self.inner.config.base_url, target)?;

        if !self.inner.config.allows(&url) {
            return Err(Error::ConfigurationError(format!(
                "Cross-origin request to {} is not allowed",
                url
            )));
        }

        if let Some(params) = &request.params {
            let pairs = params.to_query_pairs()?;
            if !pairs.is_empty() {
                url.query_pairs_mut().extend_pairs(pairs);
            }
        }

        tracing::debug!(
            method = %method,
            url = %url,
            "Executing HTTP request"
        );

        let mut builder = self
            .inner
            .http_client
            .request(method.clone(), url.clone())
            .timeout(self.inner.config.timeout);

        for (name, value) in &self.inner.default_headers {
            builder = builder.header(name, value);
        }

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        if method != Method::GET {
            builder = match request.data {
                Some(RequestBody::Fields(fields)) => builder.json(&fields.to_json()?),
                Some(RequestBody::Multipart(form)) => builder.multipart(form.into_reqwest()?),
                None => builder,
            };
        }

        let start_time = Instant::now();
        let response = builder.send().await?;

        self.parse_response(response, start_time, method, url).await
    }

    /// Reads the body and applies the success predicate.
    async fn parse_response(
        &self,
        response: reqwest::Response,
        start_time: Instant,
        method: Method,
        url: Url,
    ) -> Result<Response<Value>> {
        let status = response.status();
        let headers = response.headers().clone();
        let raw_body = response.text().await?;
        let latency = start_time.elapsed();

        tracing::info!(
            status = status.as_u16(),
            latency_ms = latency.as_millis(),
            method = %method,
            url = %url,
            "Received HTTP response"
        );

        if !(self.inner.config.validate_status)(status) {
            if status.is_server_error() {
                tracing::warn!(
                    status = status.as_u16(),
                    response = %raw_body,
                    "Server error (5xx)"
                );
            } else {
                tracing::warn!(
                    status = status.as_u16(),
                    response = %raw_body,
                    "Status rejected by the success predicate"
                );
            }

            return Err(Error::HttpError {
                status,
                raw_response: raw_body,
                headers,
            });
        }

        let data = parse_payload(&raw_body);
        Ok(Response::new(
            data, raw_body, status, headers, latency, method, url,
        ))
    }

    /// Makes a GET request with the given query parameters.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use todolist_client::{Client, Fields};
    ///
    /// # async fn example() -> Result<(), todolist_client::Error> {
    /// let client = Client::new()?;
    /// let list = client.get("v1/todoList/7", Fields::new()).await?;
    /// println!("List: {}", list.data);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get(&self, url: impl Into<String>, params: Fields) -> Result<Response<Value>> {
        let request = RequestConfig::new(url).method("get").params(params);
        self.request(request).await
    }

    /// Makes a POST request with a body and query parameters.
    ///
    /// A body containing a file-like field is sent as `multipart/form-data`;
    /// otherwise it is sent as JSON.
    pub async fn post(
        &self,
        url: impl Into<String>,
        data: Fields,
        params: Fields,
    ) -> Result<Response<Value>> {
        let request = RequestConfig::new(url)
            .method("post")
            .data(data)
            .params(params);
        self.request(request).await
    }

    /// Makes a PUT request with a JSON body and query parameters.
    pub async fn put(
        &self,
        url: impl Into<String>,
        data: Fields,
        params: Fields,
    ) -> Result<Response<Value>> {
        let request = RequestConfig::new(url)
            .method("put")
            .params(params)
            .data(data);
        self.request(request).await
    }

    /// Makes a DELETE request with the given query parameters.
    pub async fn delete(&self, url: impl Into<String>, params: Fields) -> Result<Response<Value>> {
        let request = RequestConfig::new(url).method("delete").params(params);
        self.request(request).await
    }
}

/// Parses a lower- or mixed-case method name. No method means GET.
fn parse_method(method: Option<&str>) -> Result<Method> {
    let Some(method) = method else {
        return Ok(Method::GET);
    };
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|e| Error::ConfigurationError(format!("Invalid method {}: {}", method, e)))
}

/// Resolves a request URL against the base URL.
///
/// Absolute URLs are used as they are. Relative ones are appended to the base
/// with exactly one `/` between them.
fn resolve_url(base: &Url, target: &str) -> Result<Url> {
    if let Ok(url) = Url::parse(target) {
        if !url.cannot_be_a_base() {
            return Ok(url);
        }
    }

    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        target.trim_start_matches('/')
    );
    Ok(Url::parse(&joined)?)
}

/// Builder for configuring and creating a [`Client`].
///
/// Every setting starts at the default described in [`crate::config`].
///
/// # Examples
///
/// ```no_run
/// use todolist_client::ClientBuilder;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), todolist_client::Error> {
/// let client = ClientBuilder::new()
///     .base_url("https://api.example.com/")?
///     .timeout(Duration::from_secs(10))
///     .cross_origin(false)
///     .default_header("User-Agent", "todo-app/1.0")?
///     .navigator(Arc::new(|| println!("please sign in again")))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    base_url: Option<Url>,
    default_headers: HeaderMap,
    timeout: Duration,
    cross_origin: bool,
    validate_status: StatusPredicate,
    reauth_delay: Duration,
    navigator: Arc<dyn Navigator>,
    request_interceptors: Vec<Box<dyn RequestInterceptor>>,
    response_interceptors: Vec<Box<dyn ResponseInterceptor>>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            base_url: None,
            default_headers: HeaderMap::new(),
            timeout: DEFAULT_TIMEOUT,
            cross_origin: true,
            validate_status: default_validate_status,
            reauth_delay: REAUTH_DELAY,
            navigator: Arc::new(TracingNavigator),
            request_interceptors: Vec::new(),
            response_interceptors: Vec::new(),
        }
    }

    /// Sets the base URL for relative request URLs.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.base_url = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Adds a default header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the per-call timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Allows or refuses absolute URLs on another origin than the base URL.
    pub fn cross_origin(mut self, allowed: bool) -> Self {
        self.cross_origin = allowed;
        self
    }

    /// Sets which statuses count as responses rather than transport errors.
    pub fn validate_status(mut self, predicate: StatusPredicate) -> Self {
        self.validate_status = predicate;
        self
    }

    /// Sets the delay between an auth sentinel response and navigation.
    pub fn reauth_delay(mut self, delay: Duration) -> Self {
        self.reauth_delay = delay;
        self
    }

    /// Sets what happens when the server reports an invalid session.
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    /// Appends a request interceptor. It runs after [`NormalizeRequest`].
    pub fn request_interceptor(mut self, interceptor: Box<dyn RequestInterceptor>) -> Self {
        self.request_interceptors.push(interceptor);
        self
    }

    /// Appends a response interceptor. It runs after [`UnwrapEnvelope`].
    pub fn response_interceptor(mut self, interceptor: Box<dyn ResponseInterceptor>) -> Self {
        self.response_interceptors.push(interceptor);
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn build(self) -> Result<Client> {
        let base_url = match self.base_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_BASE_URL)?,
        };

        let http_client = reqwest::Client::builder().build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;

        let mut request_interceptors: Vec<Box<dyn RequestInterceptor>> =
            vec![Box::new(NormalizeRequest)];
        request_interceptors.extend(self.request_interceptors);

        let mut response_interceptors: Vec<Box<dyn ResponseInterceptor>> = vec![Box::new(
            UnwrapEnvelope::new(self.navigator).with_delay(self.reauth_delay),
        )];
        response_interceptors.extend(self.response_interceptors);

        tracing::debug!(
            base_url = %base_url,
            timeout_ms = self.timeout.as_millis(),
            cross_origin = self.cross_origin,
            "Built HTTP client"
        );

        Ok(Client {
            inner: Arc::new(ClientInner {
                http_client,
                config: ClientConfig {
                    base_url,
                    timeout: self.timeout,
                    cross_origin: self.cross_origin,
                    validate_status: self.validate_status,
                    reauth_delay: self.reauth_delay,
                },
                default_headers: self.default_headers,
                request_interceptors,
                response_interceptors,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse(DEFAULT_BASE_URL).unwrap()
    }

    #[test]
    fn test_resolve_relative_url() {
        assert_eq!(
            resolve_url(&base(), "v1/todoList").unwrap().as_str(),
            "http://localhost:5000/v1/todoList"
        );
        assert_eq!(
            resolve_url(&base(), "/v1/todoList/3").unwrap().as_str(),
            "http://localhost:5000/v1/todoList/3"
        );
    }

    #[test]
    fn test_resolve_keeps_base_path() {
        let base = Url::parse("http://api.test/prefix").unwrap();
        assert_eq!(
            resolve_url(&base, "v1/todoList").unwrap().as_str(),
            "http://api.test/prefix/v1/todoList"
        );
    }

    #[test]
    fn test_resolve_absolute_url() {
        assert_eq!(
            resolve_url(&base(), "https://other.test/x").unwrap().as_str(),
            "https://other.test/x"
        );
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method(None).unwrap(), Method::GET);
        assert_eq!(parse_method(Some("delete")).unwrap(), Method::DELETE);
        assert_eq!(parse_method(Some("Put")).unwrap(), Method::PUT);
        assert!(matches!(
            parse_method(Some("not a method")),
            Err(Error::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_default_config() {
        let client = Client::new().unwrap();
        let config = client.config();

        assert_eq!(config.base_url.as_str(), DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_millis(5000));
        assert!(config.cross_origin);
        assert_eq!(config.reauth_delay, Duration::from_millis(1500));
        assert!((config.validate_status)(http::StatusCode::NOT_FOUND));
        assert!(!(config.validate_status)(http::StatusCode::SERVICE_UNAVAILABLE));
    }
}
