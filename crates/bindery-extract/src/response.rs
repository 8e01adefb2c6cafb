//! Response builders used by views and the documentation endpoints.
//!
//! ```rust
//! use bindery_extract::response::{HtmlResponse, JsonResponse};
//! use serde_json::json;
//!
//! let json = JsonResponse::new(json!({"id": 1})).into_response();
//! assert_eq!(json.status(), http::StatusCode::OK);
//!
//! let html = HtmlResponse::new("<h1>Docs</h1>").into_response();
//! assert_eq!(html.headers()["content-type"], "text/html; charset=utf-8");
//! ```

use bytes::Bytes;
use http::{header, HeaderName, HeaderValue, Response, StatusCode};
use serde::Serialize;

const JSON: &str = "application/json";
const HTML: &str = "text/html; charset=utf-8";

/// Status and extra headers shared by the builders.
#[derive(Debug, Clone)]
struct Head {
    status: StatusCode,
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl Head {
    fn ok() -> Self {
        Self {
            status: StatusCode::OK,
            headers: Vec::new(),
        }
    }

    fn finish(self, content_type: &'static str, body: Bytes) -> Response<Bytes> {
        let mut response = Response::new(body);
        *response.status_mut() = self.status;
        let headers = response.headers_mut();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        for (name, value) in self.headers {
            headers.append(name, value);
        }
        response
    }
}

/// Serializes a value as an `application/json` response.
#[derive(Debug)]
pub struct JsonResponse<T> {
    value: T,
    head: Head,
}

impl<T: Serialize> JsonResponse<T> {
    /// `200 OK` with `value` as the body.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            value,
            head: Head::ok(),
        }
    }

    /// Replaces the status.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.head.status = status;
        self
    }

    /// Appends a header. `Content-Type` is always `application/json`.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.head.headers.push((name, value));
        self
    }

    /// Serializes the value. A value that cannot be serialized yields an
    /// empty 500.
    #[must_use]
    pub fn into_response(self) -> Response<Bytes> {
        match serde_json::to_vec(&self.value) {
            Ok(body) => self.head.finish(JSON, body.into()),
            Err(error) => {
                tracing::error!(%error, "cannot serialize JSON response");
                let mut response = Response::new(Bytes::new());
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                response
            }
        }
    }
}

/// A `text/html` response.
#[derive(Debug, Clone)]
pub struct HtmlResponse {
    page: String,
    head: Head,
}

impl HtmlResponse {
    /// `200 OK` with `page` as the body.
    #[must_use]
    pub fn new(page: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            head: Head::ok(),
        }
    }

    /// Replaces the status.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.head.status = status;
        self
    }

    /// The page text.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.page
    }

    /// Builds the response.
    #[must_use]
    pub fn into_response(self) -> Response<Bytes> {
        self.head.finish(HTML, self.page.into())
    }
}
