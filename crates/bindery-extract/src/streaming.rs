//! Request representation with a lazily read body.
//!
//! [`StreamingRequest`] implements [`AsyncRequestSource`]. The body stream is
//! consumed once, on the first form or JSON access, and every later access
//! (from sibling parsers or dependency parsers) reuses the buffered bytes.

use std::fmt;
use std::sync::{Mutex, OnceLock};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::stream::{self, BoxStream, StreamExt};
use http::{HeaderMap, Method, Uri};
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::error::ExtractionError;
use crate::request::{
    parse_form_body, parse_json_body, AsyncRequestSource, MultiMap, DEFAULT_MAX_BODY_SIZE,
};

/// Boxed body stream.
pub type BodyStream = BoxStream<'static, Result<Bytes, std::io::Error>>;

/// A request whose body is read on demand.
pub struct StreamingRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    path_params: MultiMap,
    max_body_size: usize,
    stream: Mutex<Option<BodyStream>>,
    body: OnceCell<Result<Bytes, ExtractionError>>,
    query: OnceLock<MultiMap>,
    header_map: OnceLock<MultiMap>,
    cookies: OnceLock<MultiMap>,
    form: OnceLock<Result<MultiMap, ExtractionError>>,
    json: OnceLock<Result<Option<Value>, ExtractionError>>,
}

impl StreamingRequest {
    /// Creates a request from its head and body stream.
    #[must_use]
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: BodyStream) -> Self {
        Self {
            method,
            uri,
            headers,
            path_params: MultiMap::new(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            stream: Mutex::new(Some(body)),
            body: OnceCell::new(),
            query: OnceLock::new(),
            header_map: OnceLock::new(),
            cookies: OnceLock::new(),
            form: OnceLock::new(),
            json: OnceLock::new(),
        }
    }

    /// Creates a request whose body arrives as the given chunks.
    #[must_use]
    pub fn from_chunks(method: Method, uri: Uri, headers: HeaderMap, chunks: Vec<Bytes>) -> Self {
        let body = stream::iter(chunks.into_iter().map(Ok)).boxed();
        Self::new(method, uri, headers, body)
    }

    /// Sets the path parameters captured by the router.
    #[must_use]
    pub fn with_path_params(mut self, params: MultiMap) -> Self {
        self.path_params = params;
        self
    }

    /// Sets the body size limit.
    #[must_use]
    pub fn with_max_body_size(mut self, limit: usize) -> Self {
        self.max_body_size = limit;
        self
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

    /// Returns `true` once the body stream has been consumed.
    #[must_use]
    pub fn is_body_read(&self) -> bool {
        self.body.initialized()
    }

    fn content_type(&self) -> Option<&str> {
        self.headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Reads the whole body, once.
    pub async fn body(&self) -> Result<&Bytes, ExtractionError> {
        self.body
            .get_or_init(|| async {
                let taken = self.stream.lock().ok().and_then(|mut guard| guard.take());
                let Some(mut stream) = taken else {
                    return Ok(Bytes::new());
                };
                let mut buf = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    let chunk = chunk.map_err(ExtractionError::io)?;
                    let size = buf.len() + chunk.len();
                    if size > self.max_body_size {
                        return Err(ExtractionError::payload_too_large(self.max_body_size, size));
                    }
                    buf.extend_from_slice(&chunk);
                }
                tracing::trace!(bytes = buf.len(), "request body buffered");
                Ok(buf.freeze())
            })
            .await
            .as_ref()
            .map_err(Clone::clone)
    }
}

impl fmt::Debug for StreamingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingRequest")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("headers", &self.headers)
            .field("path_params", &self.path_params)
            .field("body_read", &self.is_body_read())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AsyncRequestSource for StreamingRequest {
    fn query(&self) -> &MultiMap {
        self.query.get_or_init(|| {
            let raw = self.uri.query().unwrap_or_default();
            MultiMap::parse_urlencoded(raw.as_bytes()).unwrap_or_default()
        })
    }

    fn headers(&self) -> &MultiMap {
        self.header_map
            .get_or_init(|| MultiMap::from_headers(&self.headers))
    }

    fn cookies(&self) -> &MultiMap {
        self.cookies
            .get_or_init(|| MultiMap::from_cookie_headers(&self.headers))
    }

    fn path_params(&self) -> &MultiMap {
        &self.path_params
    }

    async fn form(&self) -> Result<&MultiMap, ExtractionError> {
        if self.form.get().is_none() {
            let parsed = match self.body().await {
                Ok(body) => parse_form_body(body, self.content_type(), self.max_body_size),
                Err(e) => Err(e),
            };
            let _ = self.form.set(parsed);
        }
        match self.form.get() {
            Some(result) => result.as_ref().map_err(Clone::clone),
            None => Err(ExtractionError::io("form state unavailable")),
        }
    }

    async fn json(&self) -> Result<Option<&Value>, ExtractionError> {
        if self.json.get().is_none() {
            let parsed = match self.body().await {
                Ok(body) => parse_json_body(body, self.content_type(), self.max_body_size),
                Err(e) => Err(e),
            };
            let _ = self.json.set(parsed);
        }
        match self.json.get() {
            Some(result) => result.as_ref().map(Option::as_ref).map_err(Clone::clone),
            None => Err(ExtractionError::io("json state unavailable")),
        }
    }
}
