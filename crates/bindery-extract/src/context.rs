//! Buffered request representation.
//!
//! [`RequestParts`] holds a fully buffered request and implements
//! [`RequestSource`]. Sections are decoded on first access and reused by
//! every parser bound to the same request, including dependency parsers.

use std::sync::OnceLock;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use serde_json::Value;

use crate::error::ExtractionError;
use crate::request::{parse_form_body, parse_json_body, MultiMap, RequestSource, DEFAULT_MAX_BODY_SIZE};

/// A buffered HTTP request.
///
/// # Example
///
/// ```rust
/// use bindery_extract::{RequestParts, RequestSource};
/// use http::Method;
///
/// let req = RequestParts::builder()
///     .method(Method::GET)
///     .uri("/users/123?tag=a&tag=b")
///     .path_param("id", "123")
///     .build();
///
/// assert_eq!(req.method(), &Method::GET);
/// assert_eq!(req.path_params().get("id"), Some("123"));
/// assert_eq!(req.query().get_all("tag"), vec!["a", "b"]);
/// ```
#[derive(Debug)]
pub struct RequestParts {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    path_params: MultiMap,
    max_body_size: usize,
    query: OnceLock<MultiMap>,
    header_map: OnceLock<MultiMap>,
    cookies: OnceLock<MultiMap>,
    form: OnceLock<Result<MultiMap, ExtractionError>>,
    json: OnceLock<Result<Option<Value>, ExtractionError>>,
}

impl RequestParts {
    /// Creates a request from its parts.
    #[must_use]
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes, path_params: MultiMap) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
            path_params,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            query: OnceLock::new(),
            header_map: OnceLock::new(),
            cookies: OnceLock::new(),
            form: OnceLock::new(),
            json: OnceLock::new(),
        }
    }

    /// Creates a builder.
    #[must_use]
    pub fn builder() -> RequestPartsBuilder {
        RequestPartsBuilder::new()
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the path portion of the URI.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the raw request headers.
    #[must_use]
    pub fn raw_headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the request body as bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Query string parameters.
    pub fn query(&self) -> &MultiMap {
        self.query.get_or_init(|| {
            let raw = self.uri.query().unwrap_or_default();
            MultiMap::parse_urlencoded(raw.as_bytes()).unwrap_or_else(|e| {
                tracing::debug!(error = %e, "ignoring undecodable query string");
                MultiMap::new()
            })
        })
    }

    /// Urlencoded form fields.
    pub fn form(&self) -> Result<&MultiMap, ExtractionError> {
        self.form
            .get_or_init(|| parse_form_body(&self.body, self.content_type(), self.max_body_size))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// JSON body.
    pub fn json(&self) -> Result<Option<&Value>, ExtractionError> {
        self.json
            .get_or_init(|| parse_json_body(&self.body, self.content_type(), self.max_body_size))
            .as_ref()
            .map(Option::as_ref)
            .map_err(Clone::clone)
    }

    /// Headers with lowercase names.
    pub fn headers(&self) -> &MultiMap {
        self.header_map.get_or_init(|| MultiMap::from_headers(&self.headers))
    }

    /// Cookies.
    pub fn cookies(&self) -> &MultiMap {
        self.cookies
            .get_or_init(|| MultiMap::from_cookie_headers(&self.headers))
    }

    /// Path parameters.
    pub fn path_params(&self) -> &MultiMap {
        &self.path_params
    }
}

impl RequestSource for RequestParts {
    fn query(&self) -> &MultiMap {
        Self::query(self)
    }

    fn form(&self) -> Result<&MultiMap, ExtractionError> {
        Self::form(self)
    }

    fn json(&self) -> Result<Option<&Value>, ExtractionError> {
        Self::json(self)
    }

    fn headers(&self) -> &MultiMap {
        Self::headers(self)
    }

    fn cookies(&self) -> &MultiMap {
        Self::cookies(self)
    }

    fn path_params(&self) -> &MultiMap {
        Self::path_params(self)
    }
}

/// Builder for [`RequestParts`], mainly for tests and adapters.
#[derive(Debug)]
pub struct RequestPartsBuilder {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    path_params: MultiMap,
    max_body_size: usize,
}

impl RequestPartsBuilder {
    /// Creates a builder for `GET /`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            method: Method::GET,
            uri: Uri::from_static("/"),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            path_params: MultiMap::new(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the URI. An unparseable URI leaves the previous one in place.
    #[must_use]
    pub fn uri(mut self, uri: &str) -> Self {
        match uri.parse() {
            Ok(uri) => self.uri = uri,
            Err(e) => tracing::warn!(uri, error = %e, "ignoring invalid uri"),
        }
        self
    }

    /// Adds a header. Invalid names or values are skipped.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            self.headers.append(name, value);
        }
        self
    }

    /// Sets a JSON body and content type.
    #[must_use]
    pub fn json(self, value: &Value) -> Self {
        self.header("content-type", "application/json")
            .body(value.to_string())
    }

    /// Sets a urlencoded form body and content type.
    #[must_use]
    pub fn form(self, body: &str) -> Self {
        self.header("content-type", "application/x-www-form-urlencoded")
            .body(body.to_owned())
    }

    /// Sets the raw body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Adds a path parameter.
    #[must_use]
    pub fn path_param(mut self, name: &str, value: &str) -> Self {
        self.path_params.push(name, value);
        self
    }

    /// Sets the body size limit.
    #[must_use]
    pub fn max_body_size(mut self, limit: usize) -> Self {
        self.max_body_size = limit;
        self
    }

    /// Builds the request.
    #[must_use]
    pub fn build(self) -> RequestParts {
        let mut parts = RequestParts::new(self.method, self.uri, self.headers, self.body, self.path_params);
        parts.max_body_size = self.max_body_size;
        parts
    }
}

impl Default for RequestPartsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
