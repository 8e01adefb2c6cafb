//! Matching request paths against registered path templates.
//!
//! A template such as `/items/{item_id}` matches a concrete path segment by
//! segment. A `{name}` segment matches any non-empty segment and captures it
//! under `name`; every other segment must be equal. Captured segments are
//! kept as they appear in the path.
//!
//! A matched request is wrapped in a [`RoutedRequest`] so the captures reach
//! the `path` source parser. Blocking views bind against a
//! [`BufferedRequest`], which reads the body before binding starts.

use async_trait::async_trait;
use bindery_core::Values;
use bindery_extract::{AsyncRequestSource, ExtractionError, MultiMap, RequestSource};
use bytes::Bytes;
use http::Response;
use serde_json::Value;

use crate::registry::RegisteredView;

/// Matches `path` against `template`. Returns the captured segments.
///
/// ```rust
/// use bindery_router::match_path;
///
/// let captured = match_path("/items/{item_id}/tags/{tag}", "/items/7/tags/new").unwrap();
/// assert_eq!(captured.get("item_id"), Some("7"));
/// assert_eq!(captured.get("tag"), Some("new"));
/// assert!(match_path("/items/{item_id}", "/items/").is_none());
/// ```
#[must_use]
pub fn match_path(template: &str, path: &str) -> Option<MultiMap> {
    let mut captured = MultiMap::new();
    let mut expected = template.split('/');
    let mut actual = path.split('/');
    loop {
        match (expected.next(), actual.next()) {
            (None, None) => return Some(captured),
            (Some(want), Some(got)) => match placeholder(want) {
                Some(_) if got.is_empty() => return None,
                Some(name) => captured.push(name, got),
                None if want == got => {}
                None => return None,
            },
            _ => return None,
        }
    }
}

fn placeholder(segment: &str) -> Option<&str> {
    segment
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .filter(|name| !name.is_empty())
}

/// A view matched for a request, with the captured path parameters.
#[derive(Debug)]
pub struct Route<'a> {
    /// The matched view.
    pub view: &'a RegisteredView,
    /// Segments captured by the view's path template.
    pub path_params: MultiMap,
}

impl Route<'_> {
    /// Binds and handles `request` with the matched view.
    ///
    /// The captures replace same-named path parameters the request already
    /// carries. A blocking view gets the body read up front.
    pub async fn respond(self, request: &dyn AsyncRequestSource, args: Values) -> Response<Bytes> {
        let routed = RoutedRequest::new(request, self.path_params);
        match self.view {
            RegisteredView::Async(view) => view.call(&routed, args).await,
            RegisteredView::Sync(view) => {
                let buffered = BufferedRequest::read(&routed).await;
                view.call(&buffered, args)
            }
        }
    }
}

/// A request with router-captured path parameters layered over its own.
pub struct RoutedRequest<'a> {
    inner: &'a dyn AsyncRequestSource,
    path_params: MultiMap,
}

impl<'a> RoutedRequest<'a> {
    /// Wraps `inner`. `captured` wins over parameters of the same name.
    #[must_use]
    pub fn new(inner: &'a dyn AsyncRequestSource, captured: MultiMap) -> Self {
        let mut path_params = captured;
        for (name, value) in inner.path_params().iter() {
            if !path_params.contains(name) {
                path_params.push(name, value);
            }
        }
        Self { inner, path_params }
    }
}

impl std::fmt::Debug for RoutedRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutedRequest")
            .field("path_params", &self.path_params)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AsyncRequestSource for RoutedRequest<'_> {
    fn query(&self) -> &MultiMap {
        self.inner.query()
    }

    fn headers(&self) -> &MultiMap {
        self.inner.headers()
    }

    fn cookies(&self) -> &MultiMap {
        self.inner.cookies()
    }

    fn path_params(&self) -> &MultiMap {
        &self.path_params
    }

    async fn form(&self) -> Result<&MultiMap, ExtractionError> {
        self.inner.form().await
    }

    async fn json(&self) -> Result<Option<&Value>, ExtractionError> {
        self.inner.json().await
    }
}

/// A blocking view of a cooperative request whose body is already read.
///
/// Body errors are kept and returned by the matching accessor, so a view
/// that never reads the body never sees them.
#[derive(Debug)]
pub struct BufferedRequest<'a> {
    query: &'a MultiMap,
    headers: &'a MultiMap,
    cookies: &'a MultiMap,
    path_params: &'a MultiMap,
    form: Result<&'a MultiMap, ExtractionError>,
    json: Result<Option<&'a Value>, ExtractionError>,
}

impl<'a> BufferedRequest<'a> {
    /// Reads the form and JSON views of the body of `request`.
    pub async fn read(request: &'a dyn AsyncRequestSource) -> BufferedRequest<'a> {
        let form = request.form().await;
        let json = request.json().await;
        Self {
            query: request.query(),
            headers: request.headers(),
            cookies: request.cookies(),
            path_params: request.path_params(),
            form,
            json,
        }
    }
}

impl RequestSource for BufferedRequest<'_> {
    fn query(&self) -> &MultiMap {
        self.query
    }

    fn form(&self) -> Result<&MultiMap, ExtractionError> {
        self.form.clone()
    }

    fn json(&self) -> Result<Option<&Value>, ExtractionError> {
        self.json.clone()
    }

    fn headers(&self) -> &MultiMap {
        self.headers
    }

    fn cookies(&self) -> &MultiMap {
        self.cookies
    }

    fn path_params(&self) -> &MultiMap {
        self.path_params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_extract::{RequestParts, StreamingRequest};
    use http::{header, HeaderMap, HeaderValue, Method, Uri};
    use serde_json::json;

    #[test]
    fn test_match_path() {
        assert_eq!(match_path("/items", "/items"), Some(MultiMap::new()));
        assert_eq!(
            match_path("/items/{item_id}", "/items/7"),
            Some(MultiMap::from_pairs([("item_id", "7")]))
        );
        assert!(match_path("/items/{item_id}", "/items").is_none());
        assert!(match_path("/items/{item_id}", "/items/7/tags").is_none());
        assert!(match_path("/items/{item_id}", "/users/7").is_none());
        assert!(match_path("/items", "/items/").is_none());
        // An empty placeholder name is a literal segment.
        assert!(match_path("/items/{}", "/items/7").is_none());
        assert!(match_path("/items/{}", "/items/{}").is_some());
    }

    #[test]
    fn test_captures_win_over_request_params() {
        let req = RequestParts::builder()
            .path_param("item_id", "stale")
            .path_param("tenant", "acme")
            .build();
        let routed = RoutedRequest::new(&req, MultiMap::from_pairs([("item_id", "7")]));
        let params = AsyncRequestSource::path_params(&routed);
        assert_eq!(params.get("item_id"), Some("7"));
        assert_eq!(params.get_all("item_id"), vec!["7"]);
        assert_eq!(params.get("tenant"), Some("acme"));
    }

    #[tokio::test]
    async fn test_buffered_request_reads_streamed_body() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let req = StreamingRequest::from_chunks(
            Method::POST,
            Uri::from_static("/items?page=2"),
            headers,
            vec![Bytes::from_static(br#"{"name":"#), Bytes::from_static(br#""widget"}"#)],
        );
        assert!(!req.is_body_read());

        let buffered = BufferedRequest::read(&req).await;
        assert!(req.is_body_read());
        assert_eq!(RequestSource::json(&buffered), Ok(Some(&json!({"name": "widget"}))));
        assert_eq!(RequestSource::query(&buffered).get("page"), Some("2"));
    }

    #[tokio::test]
    async fn test_buffered_body_error_kept_for_accessor() {
        let req = StreamingRequest::from_chunks(
            Method::POST,
            Uri::from_static("/items"),
            HeaderMap::new(),
            vec![Bytes::from(vec![b'x'; 64])],
        )
        .with_max_body_size(8);

        let buffered = BufferedRequest::read(&req).await;
        assert!(RequestSource::json(&buffered).is_err());
        assert!(RequestSource::headers(&buffered).is_empty());
    }
}
