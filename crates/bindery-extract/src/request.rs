//! Request representation seen by source parsers.
//!
//! Framework adapters expose a request through [`RequestSource`] (blocking) or
//! [`AsyncRequestSource`] (cooperative). Every request section is a
//! [`MultiMap`] except the JSON body, which is an optional [`Value`].

use async_trait::async_trait;
use http::HeaderMap;
use serde_json::Value;

use bindery_core::ParamKind;

use crate::error::ExtractionError;

/// Default maximum body size for form and JSON parsing (1 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Ordered multi-valued string mapping.
///
/// Used for query strings, form bodies, headers, cookies and path params.
/// Lookups return the first value; [`get_all`](Self::get_all) returns every
/// value in order of appearance.
///
/// ```
/// use bindery_extract::MultiMap;
///
/// let map = MultiMap::from_pairs([("tag", "a"), ("tag", "b"), ("q", "x")]);
/// assert_eq!(map.get("tag"), Some("a"));
/// assert_eq!(map.get_all("tag"), vec!["a", "b"]);
/// assert!(!map.contains("missing"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiMap {
    pairs: Vec<(String, String)>,
}

impl MultiMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from key/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Appends a value.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Returns `true` if at least one value exists for `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// First value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `key`, in order.
    #[must_use]
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterates pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parses a urlencoded string (`a=1&b=2`). `+` decodes to a space.
    pub fn parse_urlencoded(input: &[u8]) -> Result<Self, serde_urlencoded::de::Error> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(input)?;
        Ok(Self { pairs })
    }

    /// Collects headers with lowercase names. Non-UTF-8 values are skipped.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            pairs: headers
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_owned(), v.to_owned()))
                })
                .collect(),
        }
    }

    /// Parses every `Cookie` header into name/value pairs.
    #[must_use]
    pub fn from_cookie_headers(headers: &HeaderMap) -> Self {
        let mut map = Self::new();
        for value in headers.get_all(http::header::COOKIE) {
            let Ok(value) = value.to_str() else { continue };
            for cookie in value.split(';') {
                if let Some((name, value)) = cookie.trim().split_once('=') {
                    map.push(name.trim(), value.trim().trim_matches('"'));
                }
            }
        }
        map
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MultiMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

/// Blocking access to request sections.
///
/// Body accessors report malformed or oversized content as an
/// [`ExtractionError`]; an absent body is not an error.
pub trait RequestSource {
    /// Query string parameters.
    fn query(&self) -> &MultiMap;

    /// Urlencoded form fields. Empty unless the body is a form.
    fn form(&self) -> Result<&MultiMap, ExtractionError>;

    /// JSON body, or `None` if there is no JSON body.
    fn json(&self) -> Result<Option<&Value>, ExtractionError>;

    /// Headers with lowercase names.
    fn headers(&self) -> &MultiMap;

    /// Cookies.
    fn cookies(&self) -> &MultiMap;

    /// Path parameters captured by the router.
    fn path_params(&self) -> &MultiMap;
}

/// Cooperative access to request sections. Body accessors may suspend while
/// the body is read.
///
/// Every blocking [`RequestSource`] that is `Sync` is also an
/// `AsyncRequestSource` whose accessors complete immediately.
#[async_trait]
pub trait AsyncRequestSource: Send + Sync {
    /// Query string parameters.
    fn query(&self) -> &MultiMap;

    /// Headers with lowercase names.
    fn headers(&self) -> &MultiMap;

    /// Cookies.
    fn cookies(&self) -> &MultiMap;

    /// Path parameters captured by the router.
    fn path_params(&self) -> &MultiMap;

    /// Urlencoded form fields, reading the body if needed.
    async fn form(&self) -> Result<&MultiMap, ExtractionError>;

    /// JSON body, reading the body if needed.
    async fn json(&self) -> Result<Option<&Value>, ExtractionError>;
}

#[async_trait]
impl<T> AsyncRequestSource for T
where
    T: RequestSource + Send + Sync,
{
    fn query(&self) -> &MultiMap {
        RequestSource::query(self)
    }

    fn headers(&self) -> &MultiMap {
        RequestSource::headers(self)
    }

    fn cookies(&self) -> &MultiMap {
        RequestSource::cookies(self)
    }

    fn path_params(&self) -> &MultiMap {
        RequestSource::path_params(self)
    }

    async fn form(&self) -> Result<&MultiMap, ExtractionError> {
        RequestSource::form(self)
    }

    async fn json(&self) -> Result<Option<&Value>, ExtractionError> {
        RequestSource::json(self)
    }
}

/// Returns `true` if `content_type` names a urlencoded form.
pub(crate) fn is_form_content_type(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| {
        ct.split(';')
            .next()
            .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/x-www-form-urlencoded"))
    })
}

/// Returns `true` unless `content_type` names a non-JSON media type.
pub(crate) fn accepts_json(content_type: Option<&str>) -> bool {
    content_type.map_or(true, |ct| {
        let mime = ct.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        mime == "application/json" || mime.ends_with("+json")
    })
}

/// Parses a buffered body as a form, honoring the size limit.
pub(crate) fn parse_form_body(
    body: &[u8],
    content_type: Option<&str>,
    max_size: usize,
) -> Result<MultiMap, ExtractionError> {
    if !is_form_content_type(content_type) || body.is_empty() {
        return Ok(MultiMap::new());
    }
    if body.len() > max_size {
        return Err(ExtractionError::payload_too_large(max_size, body.len()).in_section(ParamKind::Form));
    }
    MultiMap::parse_urlencoded(body).map_err(|e| ExtractionError::malformed(ParamKind::Form, e))
}

/// Parses a buffered body as JSON, honoring the size limit.
pub(crate) fn parse_json_body(
    body: &[u8],
    content_type: Option<&str>,
    max_size: usize,
) -> Result<Option<Value>, ExtractionError> {
    if !accepts_json(content_type) || body.is_empty() {
        return Ok(None);
    }
    if body.len() > max_size {
        return Err(ExtractionError::payload_too_large(max_size, body.len()));
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| ExtractionError::malformed(ParamKind::Body, e))
}
