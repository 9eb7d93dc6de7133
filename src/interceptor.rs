//! Request and response interceptors.
//!
//! Every call passes through an explicit pipeline: each [`RequestInterceptor`]
//! transforms the [`RequestConfig`] in turn before it is sent, and each
//! [`ResponseInterceptor`] sees the outcome afterwards. The client installs
//! [`NormalizeRequest`] and [`UnwrapEnvelope`] first; interceptors added
//! through the builder run after them, in registration order.

use crate::config::REAUTH_DELAY;
use crate::envelope::ApiFailure;
use crate::form::{FieldValue, MultipartForm};
use crate::request::{RequestBody, RequestConfig};
use crate::{Error, Response, Result};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// A step applied to every outgoing request.
///
/// # Examples
///
/// ```
/// use todolist_client::{RequestConfig, RequestInterceptor, Result};
///
/// struct BearerToken(String);
///
/// impl RequestInterceptor for BearerToken {
///     fn on_request(&self, request: RequestConfig) -> Result<RequestConfig> {
///         request.with_header("authorization", format!("Bearer {}", self.0))
///     }
/// }
/// ```
pub trait RequestInterceptor: Send + Sync {
    /// Transforms the request, or fails the call before it is sent.
    fn on_request(&self, request: RequestConfig) -> Result<RequestConfig>;
}

/// A step applied to the outcome of every call.
pub trait ResponseInterceptor: Send + Sync {
    /// Inspects a response the success predicate accepted. Returning an error
    /// rejects the call.
    fn on_response(&self, response: Response<Value>) -> Result<Response<Value>>;

    /// Inspects a failure. The returned error is what the caller receives.
    fn on_error(&self, error: Error) -> Error {
        error
    }
}

/// Where the client sends the user when their session is no longer valid.
///
/// A browser host would reload its own origin here; closures implement this
/// trait so hosts can plug in whatever navigation they have.
pub trait Navigator: Send + Sync {
    /// Navigates to the application's own origin.
    fn navigate_to_origin(&self);
}

impl<F> Navigator for F
where
    F: Fn() + Send + Sync,
{
    fn navigate_to_origin(&self) {
        self()
    }
}

/// A navigator for hosts without a page to reload. It only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate_to_origin(&self) {
        tracing::warn!("Session is no longer valid; navigating to origin");
    }
}

/// Normalizes the shape of every outgoing request.
///
/// - A missing URL fails the call with [`Error::MissingUrl`].
/// - The method defaults to `get` and is lower-cased.
/// - `get` without `params` uses the body fields as `params`.
/// - `post` without `data` uses `params` as the body. Object fields are
///   stringified to JSON, and if any field is file-like the whole body becomes
///   a multipart form.
/// - Other methods are passed through with a warning.
///
/// # Examples
///
/// ```
/// use todolist_client::{Fields, NormalizeRequest, RequestConfig, RequestInterceptor};
///
/// let request = RequestConfig::new("v1/todoList")
///     .data(Fields::new().with("page", 2));
///
/// let request = NormalizeRequest.on_request(request).unwrap();
///
/// assert_eq!(request.method.as_deref(), Some("get"));
/// assert_eq!(request.params, Some(Fields::new().with("page", 2)));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeRequest;

impl RequestInterceptor for NormalizeRequest {
    fn on_request(&self, mut request: RequestConfig) -> Result<RequestConfig> {
        if request.url.as_deref().map_or(true, str::is_empty) {
            tracing::error!("Request is missing a URL");
            return Err(Error::MissingUrl);
        }

        let method = request
            .method
            .as_deref()
            .unwrap_or("get")
            .to_ascii_lowercase();

        match method.as_str() {
            "get" => {
                if request.params.is_none() {
                    request.params = Some(request.data_fields().cloned().unwrap_or_default());
                }
            }
            "post" => {
                let data = match request.data.take() {
                    Some(data) => data,
                    None => RequestBody::Fields(request.params.clone().unwrap_or_default()),
                };
                request.data = Some(encode_post_body(data));
            }
            other => {
                tracing::warn!(
                    method = other,
                    "No automatic parameter handling for this method"
                );
            }
        }

        request.method = Some(method);
        Ok(request)
    }
}

/// Stringifies object fields and switches to multipart when a file is present.
fn encode_post_body(data: RequestBody) -> RequestBody {
    let mut fields = match data {
        RequestBody::Fields(fields) => fields,
        form @ RequestBody::Multipart(_) => return form,
    };

    let mut has_file = false;
    for value in fields.values_mut() {
        let stringified = match value {
            FieldValue::File(_) => {
                has_file = true;
                None
            }
            FieldValue::Object(map) => Some(Value::Object(std::mem::take(map)).to_string()),
            FieldValue::Primitive(_) => None,
        };
        if let Some(json) = stringified {
            *value = FieldValue::Primitive(Value::String(json));
        }
    }

    if has_file {
        tracing::debug!(fields = fields.len(), "Encoding request body as multipart");
        RequestBody::Multipart(MultipartForm::from_fields(fields))
    } else {
        RequestBody::Fields(fields)
    }
}

/// Unwraps the API envelope from every response.
///
/// 2xx responses pass through untouched. Any other accepted response rejects
/// the call with [`Error::Rejected`] carrying the raw payload; if its
/// `error_code` is an auth sentinel, the [`Navigator`] is invoked after the
/// configured delay. Transport failures are logged and passed on unchanged.
pub struct UnwrapEnvelope {
    navigator: Arc<dyn Navigator>,
    delay: Duration,
}

impl UnwrapEnvelope {
    /// Creates the interceptor with the given navigator and the default delay.
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self {
            navigator,
            delay: REAUTH_DELAY,
        }
    }

    /// Overrides the delay before navigating.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn schedule_navigation(&self) {
        let navigator = Arc::clone(&self.navigator);
        let delay = self.delay;

        tracing::warn!(
            delay_ms = delay.as_millis(),
            "Session is no longer valid; scheduling navigation to origin"
        );

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    navigator.navigate_to_origin();
                });
            }
            Err(_) => {
                std::thread::spawn(move || {
                    std::thread::sleep(delay);
                    navigator.navigate_to_origin();
                });
            }
        }
    }
}

impl Default for UnwrapEnvelope {
    fn default() -> Self {
        Self::new(Arc::new(TracingNavigator))
    }
}

impl ResponseInterceptor for UnwrapEnvelope {
    fn on_response(&self, response: Response<Value>) -> Result<Response<Value>> {
        if response.status.as_u16() / 100 == 2 {
            return Ok(response);
        }

        let failure = ApiFailure::new(
            response.status,
            response.method,
            response.url,
            response.data,
        );

        tracing::error!(
            status = failure.status.as_u16(),
            error_code = ?failure.error_code(),
            message = ?failure.message(),
            "Request rejected by the API"
        );

        if failure.requires_reauth() {
            self.schedule_navigation();
        }

        Err(Error::Rejected(Box::new(failure)))
    }

    fn on_error(&self, error: Error) -> Error {
        if !error.has_response() {
            tracing::error!(error = %error, "Request failed without a response");
        }

        if error.is_timeout() {
            tracing::warn!(error = %error, "Request timed out");
        }

        error
    }
}

/// Runs the request pipeline in order.
pub(crate) fn run_request(
    interceptors: &[Box<dyn RequestInterceptor>],
    request: RequestConfig,
) -> Result<RequestConfig> {
    interceptors
        .iter()
        .try_fold(request, |request, interceptor| interceptor.on_request(request))
}

/// Runs the response pipeline in order. A rejection from one interceptor is
/// handed to the `on_error` of every later one.
pub(crate) fn run_response(
    interceptors: &[Box<dyn ResponseInterceptor>],
    outcome: Result<Response<Value>>,
) -> Result<Response<Value>> {
    interceptors
        .iter()
        .fold(outcome, |outcome, interceptor| match outcome {
            Ok(response) => interceptor.on_response(response),
            Err(error) => Err(interceptor.on_error(error)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{Blob, Fields, FilePart, FormPart};
    use http::{HeaderMap, Method, StatusCode};
    use serde_json::json;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Runs `f` with a subscriber that writes into a buffer, then returns the output.
    fn logs_of(f: impl FnOnce()) -> String {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buffer.0.lock().unwrap();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    fn response(status: u16, data: Value) -> Response<Value> {
        Response::new(
            data.clone(),
            data.to_string(),
            StatusCode::from_u16(status).unwrap(),
            HeaderMap::new(),
            Duration::ZERO,
            Method::POST,
            "http://localhost:5000/v1/todoList".parse().unwrap(),
        )
    }

    fn counting_envelope(delay: Duration) -> (UnwrapEnvelope, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let navigator = move || {
            counter.fetch_add(1, Ordering::SeqCst);
        };
        (
            UnwrapEnvelope::new(Arc::new(navigator)).with_delay(delay),
            count,
        )
    }

    #[test]
    fn test_missing_url_fails() {
        let result = NormalizeRequest.on_request(RequestConfig::default());
        assert!(matches!(result, Err(Error::MissingUrl)));

        let result = NormalizeRequest.on_request(RequestConfig::new(""));
        assert!(matches!(result, Err(Error::MissingUrl)));
    }

    #[test]
    fn test_method_defaults_and_lowercases() {
        let request = NormalizeRequest.on_request(RequestConfig::new("x")).unwrap();
        assert_eq!(request.method.as_deref(), Some("get"));

        let request = NormalizeRequest
            .on_request(RequestConfig::new("x").method("POST"))
            .unwrap();
        assert_eq!(request.method.as_deref(), Some("post"));
    }

    #[test]
    fn test_get_falls_back_to_data() {
        let data = Fields::new().with("page", 1).with("size", 20);
        let request = NormalizeRequest
            .on_request(RequestConfig::new("x").method("get").data(data.clone()))
            .unwrap();
        assert_eq!(request.params, Some(data));
    }

    #[test]
    fn test_get_keeps_explicit_params() {
        let params = Fields::new().with("page", 1);
        let request = NormalizeRequest
            .on_request(
                RequestConfig::new("x")
                    .params(params.clone())
                    .data(Fields::new().with("page", 9)),
            )
            .unwrap();
        assert_eq!(request.params, Some(params));
    }

    #[test]
    fn test_get_without_anything_gets_empty_params() {
        let request = NormalizeRequest.on_request(RequestConfig::new("x")).unwrap();
        assert_eq!(request.params, Some(Fields::new()));
    }

    #[test]
    fn test_post_falls_back_to_params() {
        let params = Fields::new().with("title", "x");
        let request = NormalizeRequest
            .on_request(RequestConfig::new("x").method("post").params(params.clone()))
            .unwrap();
        assert_eq!(request.data, Some(RequestBody::Fields(params.clone())));
        assert_eq!(request.params, Some(params));
    }

    #[test]
    fn test_post_stringifies_objects() {
        let data = Fields::new()
            .with("title", "x")
            .with("meta", json!({ "color": "red" }))
            .with("tags", json!(["a"]));
        let request = NormalizeRequest
            .on_request(RequestConfig::new("x").method("post").data(data))
            .unwrap();

        let fields = request.data_fields().unwrap();
        assert_eq!(fields.get("title"), Some(&FieldValue::from("x")));
        assert_eq!(
            fields.get("meta"),
            Some(&FieldValue::from(r#"{"color":"red"}"#))
        );
        assert_eq!(fields.get("tags"), Some(&FieldValue::from(json!(["a"]))));
    }

    #[test]
    fn test_post_with_file_becomes_multipart() {
        let data = Fields::new()
            .with("title", "x")
            .with("meta", json!({ "k": 1 }))
            .with("avatar", FilePart::new("me.png", vec![1, 2]).with_mime("image/png"))
            .with("raw", Blob::new(vec![7]));
        let request = NormalizeRequest
            .on_request(RequestConfig::new("x").method("post").data(data))
            .unwrap();

        let form = request.data.as_ref().and_then(RequestBody::multipart).unwrap();
        assert_eq!(form.len(), 4);
        assert_eq!(form.get("title"), Some(&FormPart::Text("x".to_string())));
        assert_eq!(
            form.get("meta"),
            Some(&FormPart::Text(r#"{"k":1}"#.to_string()))
        );
        assert_eq!(
            form.get("avatar"),
            Some(&FormPart::Binary {
                file_name: "me.png".to_string(),
                mime: Some("image/png".to_string()),
                bytes: vec![1, 2],
            })
        );
        assert!(matches!(form.get("raw"), Some(FormPart::Binary { .. })));
    }

    #[test]
    fn test_other_methods_pass_through() {
        let data = Fields::new().with("meta", json!({ "k": 1 }));
        let original = RequestConfig::new("x").method("PUT").data(data);
        let request = NormalizeRequest.on_request(original.clone()).unwrap();

        assert_eq!(request.method.as_deref(), Some("put"));
        assert_eq!(request.data, original.data);
        assert_eq!(request.params, None);
    }

    #[test]
    fn test_success_passes_through() {
        let (envelope, _) = counting_envelope(Duration::from_millis(1));
        let result = envelope.on_response(response(201, json!({ "id": 1 })));
        assert_eq!(result.unwrap().data, json!({ "id": 1 }));
    }

    #[test]
    fn test_redirects_are_rejected() {
        let (envelope, _) = counting_envelope(Duration::from_millis(1));
        let result = envelope.on_response(response(302, json!(null)));
        assert!(matches!(result, Err(Error::Rejected(_))));
    }

    #[tokio::test]
    async fn test_client_error_rejects_with_payload() {
        let (envelope, count) = counting_envelope(Duration::from_millis(10));
        let payload = json!({ "error_code": 10030, "msg": { "title": "required" } });

        match envelope.on_response(response(400, payload.clone())) {
            Err(Error::Rejected(failure)) => {
                assert_eq!(failure.payload, payload);
                assert_eq!(failure.message().as_deref(), Some("required"));
            }
            other => panic!("Expected Rejected, got {:?}", other),
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_auth_sentinel_navigates_after_delay() {
        let (envelope, count) = counting_envelope(Duration::from_millis(100));

        for code in [10000, 10100] {
            let result = envelope.on_response(response(
                401,
                json!({ "error_code": code, "msg": "bad token" }),
            ));
            assert!(matches!(result, Err(ref e) if e.requires_reauth()));
        }

        assert_eq!(count.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_errors_pass_through_unchanged() {
        let envelope = UnwrapEnvelope::default();
        let error = envelope.on_error(Error::HttpError {
            status: StatusCode::BAD_GATEWAY,
            raw_response: "down".to_string(),
            headers: HeaderMap::new(),
        });
        assert!(matches!(error, Error::HttpError { status, .. } if status == StatusCode::BAD_GATEWAY));

        let error = envelope.on_error(Error::MissingUrl);
        assert!(matches!(error, Error::MissingUrl));
    }

    #[test]
    fn test_missing_url_logs_an_error() {
        let logs = logs_of(|| {
            let _ = NormalizeRequest.on_request(RequestConfig::default());
        });
        assert!(logs.contains("ERROR"), "logs: {}", logs);
        assert!(logs.contains("Request is missing a URL"), "logs: {}", logs);
    }

    #[test]
    fn test_other_methods_log_a_warning() {
        let logs = logs_of(|| {
            let _ = NormalizeRequest.on_request(RequestConfig::new("x").method("PUT"));
        });
        assert!(logs.contains("WARN"), "logs: {}", logs);
        assert!(
            logs.contains("No automatic parameter handling for this method"),
            "logs: {}",
            logs
        );
        assert!(logs.contains("put"), "logs: {}", logs);
    }

    #[test]
    fn test_failures_without_response_are_logged() {
        let envelope = UnwrapEnvelope::default();

        let logs = logs_of(|| {
            envelope.on_error(Error::MissingUrl);
        });
        assert!(logs.contains("Request failed without a response"), "logs: {}", logs);
        assert!(!logs.contains("Request timed out"), "logs: {}", logs);

        let logs = logs_of(|| {
            envelope.on_error(Error::HttpError {
                status: StatusCode::BAD_GATEWAY,
                raw_response: "down".to_string(),
                headers: HeaderMap::new(),
            });
        });
        assert!(!logs.contains("Request failed without a response"), "logs: {}", logs);
    }

    #[test]
    fn test_navigation_without_runtime_still_waits() {
        let (envelope, count) = counting_envelope(Duration::from_millis(50));

        let result = envelope.on_response(response(401, json!({ "error_code": 10000 })));
        assert!(matches!(result, Err(ref e) if e.requires_reauth()));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        std::thread::sleep(Duration::from_millis(400));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_pipeline_runs_in_order() {
        struct Tag(&'static str);

        impl RequestInterceptor for Tag {
            fn on_request(&self, mut request: RequestConfig) -> Result<RequestConfig> {
                let url = request.url.take().unwrap_or_default();
                request.url = Some(format!("{}/{}", url, self.0));
                Ok(request)
            }
        }

        let interceptors: Vec<Box<dyn RequestInterceptor>> =
            vec![Box::new(Tag("a")), Box::new(Tag("b"))];
        let request = run_request(&interceptors, RequestConfig::new("root")).unwrap();
        assert_eq!(request.url.as_deref(), Some("root/a/b"));
    }

    #[test]
    fn test_rejection_reaches_later_on_error() {
        struct CountErrors(Arc<AtomicUsize>);

        impl ResponseInterceptor for CountErrors {
            fn on_response(&self, response: Response<Value>) -> Result<Response<Value>> {
                Ok(response)
            }

            fn on_error(&self, error: Error) -> Error {
                self.0.fetch_add(1, Ordering::SeqCst);
                error
            }
        }

        let seen = Arc::new(AtomicUsize::new(0));
        let (envelope, _) = counting_envelope(Duration::from_millis(1));
        let interceptors: Vec<Box<dyn ResponseInterceptor>> =
            vec![Box::new(envelope), Box::new(CountErrors(Arc::clone(&seen)))];

        let result = run_response(&interceptors, Ok(response(404, json!({ "msg": "gone" }))));
        assert!(matches!(result, Err(Error::Rejected(_))));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
