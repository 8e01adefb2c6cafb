//! Swagger UI page for the served OpenAPI document.
//!
//! The page pulls Swagger UI from a CDN. Its `SwaggerUIBundle` options are
//! built as a JSON object, so any option Swagger UI understands can be set
//! with [`SwaggerUi::option`].
//!
//! ```rust
//! use bindery_docs::SwaggerUi;
//!
//! let page = SwaggerUi::new("/openapi.json")
//!     .title("Shop - Swagger UI")
//!     .option("tryItOutEnabled", true);
//! let html = page.html();
//! assert!(html.contains(r#""url":"/openapi.json""#));
//! assert!(html.contains(r#""tryItOutEnabled":true"#));
//! ```

use bindery_extract::response::HtmlResponse;
use bytes::Bytes;
use http::Response;
use serde_json::{Map, Value};

/// Where the Swagger UI assets are loaded from by default.
pub const DEFAULT_SWAGGER_CDN: &str = "https://cdn.jsdelivr.net/npm/swagger-ui-dist@5";

/// How far operations are expanded when the page opens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocExpansion {
    /// Tags collapsed.
    None,
    /// Tags open, operations collapsed.
    #[default]
    List,
    /// Everything open.
    Full,
}

impl DocExpansion {
    const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::List => "list",
            Self::Full => "full",
        }
    }
}

/// The HTML page.
#[derive(Debug, Clone)]
pub struct SwaggerUi {
    openapi_url: String,
    title: String,
    cdn: String,
    options: Map<String, Value>,
}

impl SwaggerUi {
    /// Page for the document served at `openapi_url`.
    #[must_use]
    pub fn new(openapi_url: impl Into<String>) -> Self {
        let page = Self {
            openapi_url: openapi_url.into(),
            title: "Swagger UI".to_owned(),
            cdn: DEFAULT_SWAGGER_CDN.to_owned(),
            options: Map::new(),
        };
        page.option("deepLinking", true)
            .option("displayRequestDuration", true)
            .doc_expansion(DocExpansion::List)
    }

    /// Page title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Base URL of a `swagger-ui-dist` release, without a trailing slash.
    #[must_use]
    pub fn cdn(mut self, base: impl Into<String>) -> Self {
        self.cdn = base.into().trim_end_matches('/').to_owned();
        self
    }

    /// Sets one `SwaggerUIBundle` option. `url` and `dom_id` are always
    /// taken from the page itself.
    #[must_use]
    pub fn option(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    /// Initial expansion of the operation list.
    #[must_use]
    pub fn doc_expansion(self, expansion: DocExpansion) -> Self {
        self.option("docExpansion", expansion.as_str())
    }

    /// URL of the OpenAPI document.
    #[must_use]
    pub fn openapi_url(&self) -> &str {
        &self.openapi_url
    }

    fn bundle_config(&self) -> String {
        let mut config = self.options.clone();
        config.insert("url".to_owned(), Value::from(self.openapi_url.as_str()));
        config.insert("dom_id".to_owned(), Value::from("#swagger-ui"));
        // A string value must not end the surrounding <script> element.
        Value::Object(config).to_string().replace("</", "<\\/")
    }

    /// Renders the page.
    #[must_use]
    pub fn html(&self) -> String {
        let cdn = html_escape(&self.cdn);
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<link rel="stylesheet" href="{cdn}/swagger-ui.css">
</head>
<body>
<div id="swagger-ui"></div>
<script src="{cdn}/swagger-ui-bundle.js"></script>
<script>
const config = {config};
config.presets = [SwaggerUIBundle.presets.apis, SwaggerUIBundle.SwaggerUIStandalonePreset];
config.layout = "BaseLayout";
window.ui = SwaggerUIBundle(config);
</script>
</body>
</html>
"#,
            title = html_escape(&self.title),
            config = self.bundle_config(),
        )
    }

    /// The page as a `200 OK` HTML response.
    #[must_use]
    pub fn response(&self) -> Response<Bytes> {
        HtmlResponse::new(self.html()).into_response()
    }
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{header, StatusCode};

    #[test]
    fn test_default_options() {
        let html = SwaggerUi::new("/openapi.json").html();
        assert!(html.contains(r#""deepLinking":true"#));
        assert!(html.contains(r#""docExpansion":"list""#));
        assert!(html.contains(r##""dom_id":"#swagger-ui""##));
        assert!(html.contains(&format!("{DEFAULT_SWAGGER_CDN}/swagger-ui-bundle.js")));
    }

    #[test]
    fn test_overrides() {
        let html = SwaggerUi::new("/api/schema.json")
            .title("Inventory")
            .cdn("https://assets.example.com/swagger/")
            .doc_expansion(DocExpansion::Full)
            .option("deepLinking", false)
            .option("url", "/ignored.json")
            .html();

        assert!(html.contains("<title>Inventory</title>"));
        assert!(html.contains(r#"href="https://assets.example.com/swagger/swagger-ui.css""#));
        assert!(html.contains(r#""docExpansion":"full""#));
        assert!(html.contains(r#""deepLinking":false"#));
        assert!(html.contains(r#""url":"/api/schema.json""#));
        assert!(!html.contains("/ignored.json"));
    }

    #[test]
    fn test_untrusted_text_is_escaped() {
        let html = SwaggerUi::new("/x</script><script>alert(1)//")
            .title("<b>API</b> & co")
            .html();
        assert!(html.contains("<title>&lt;b&gt;API&lt;/b&gt; &amp; co</title>"));
        assert!(html.contains(r#""url":"/x<\/script><script>alert(1)//""#));
        assert_eq!(html.matches("</script>").count(), 2);
    }

    #[test]
    fn test_response() {
        let response = SwaggerUi::new("/openapi.json").response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        assert!(response.body().starts_with(b"<!DOCTYPE html>"));
    }
}
