//! The application context.

use std::future::Future;
use std::sync::{Arc, OnceLock};

use bindery_config::{BinderyConfig, ConfigError, Setup};
use bindery_core::{RegistrationError, RegistrationResult, Signature, Values};
use bindery_docs::{DocsResult, OpenApi, OpenApiGenerator, SwaggerUi};
use bindery_extract::AsyncRequestSource;
use bindery_router::{AsyncView, RegisteredView, View, ViewMeta, ViewOptions, ViewRegistry};
use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Response, StatusCode};

/// Setup, registered views and the OpenAPI document built from them.
///
/// Views are registered through `&mut self` while the application is being
/// assembled. Afterwards the context is shared read-only, typically in an
/// `Arc`, to dispatch requests and serve documentation.
///
/// ```rust
/// use bindery::prelude::*;
///
/// let mut app = Bindery::setup("http").unwrap();
/// let sig = Signature::new("list_items").param("q", FieldType::String, Query::required());
/// app.view(ViewOptions::new().path("/items").method("GET"), &sig, |args: Values| {
///     JsonResponse::new(args.into_json()).into_response()
/// })
/// .unwrap();
///
/// let doc = app.openapi();
/// assert_eq!(doc.paths["/items"].get.as_ref().unwrap().parameters[0].name, "q");
/// ```
pub struct Bindery {
    setup: Setup,
    registry: ViewRegistry,
    generator: OpenApiGenerator,
    openapi_json: OnceLock<String>,
}

impl Bindery {
    /// Installs the parsers of a named mode with default error handlers.
    pub fn setup(mode: &str) -> RegistrationResult<Self> {
        Self::with_setup(Setup::from_mode(mode)?)
    }

    /// Validates `config` and builds the context it describes.
    pub fn from_config(config: &BinderyConfig) -> Result<Self, ConfigError> {
        Ok(Self::with_setup(Setup::from_config(config)?)?)
    }

    /// Uses a prepared setup. Fails if the setup is incomplete.
    pub fn with_setup(setup: Setup) -> RegistrationResult<Self> {
        setup.check()?;
        let openapi = setup.openapi();
        let mut generator = OpenApiGenerator::new()
            .title(&openapi.title)
            .version(&openapi.version);
        if let Some(description) = &openapi.description {
            generator = generator.description(description);
        }
        Ok(Self {
            setup,
            registry: ViewRegistry::new(),
            generator,
            openapi_json: OnceLock::new(),
        })
    }

    /// Replaces the OpenAPI generator, e.g. to add servers or a license.
    #[must_use]
    pub fn with_generator(mut self, generator: OpenApiGenerator) -> Self {
        self.generator = generator;
        self.openapi_json = OnceLock::new();
        self
    }

    /// Builds and registers a blocking view.
    ///
    /// Fails if the signature is invalid, a dependency is async-only, or the
    /// route is taken.
    pub fn view<F>(
        &mut self,
        options: ViewOptions,
        signature: &Signature,
        handler: F,
    ) -> RegistrationResult<Arc<View>>
    where
        F: Fn(Values) -> Response<Bytes> + Send + Sync + 'static,
    {
        let meta = self.meta(options, signature)?;
        let view = Arc::new(View::with_error_handler(
            meta,
            handler,
            self.setup.error_handler()?,
        )?);
        self.register(Arc::clone(&view))?;
        Ok(view)
    }

    /// Builds and registers a cooperative view.
    pub fn async_view<F, Fut>(
        &mut self,
        options: ViewOptions,
        signature: &Signature,
        handler: F,
    ) -> RegistrationResult<Arc<AsyncView>>
    where
        F: Fn(Values) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response<Bytes>> + Send + 'static,
    {
        let meta = self.meta(options, signature)?;
        let view = Arc::new(AsyncView::with_error_handler(
            meta,
            handler,
            self.setup.async_error_handler()?,
        ));
        self.register(Arc::clone(&view))?;
        Ok(view)
    }

    fn meta(&self, options: ViewOptions, signature: &Signature) -> RegistrationResult<ViewMeta> {
        ViewMeta::build(options, signature, self.setup.factory()?)
    }

    fn register(&mut self, view: impl Into<RegisteredView>) -> RegistrationResult<()> {
        let view = view.into();
        let meta = view.meta();
        if let Some(path) = meta.path() {
            let reserved = [self.openapi_url(), self.docs_url()];
            if meta.methods().iter().any(|m| m == "GET") && reserved.contains(&Some(path)) {
                return Err(RegistrationError::duplicate_route("GET", path));
            }
        }
        self.registry.register(view)?;
        self.openapi_json = OnceLock::new();
        Ok(())
    }

    /// The registered views.
    pub fn registry(&self) -> &ViewRegistry {
        &self.registry
    }

    /// Where the OpenAPI document is served, unless disabled.
    pub fn openapi_url(&self) -> Option<&str> {
        self.setup.openapi().openapi_url()
    }

    /// Where the Swagger UI page is served, unless disabled.
    pub fn docs_url(&self) -> Option<&str> {
        self.setup.openapi().docs_url()
    }

    /// Assembles the OpenAPI document from the registered views.
    pub fn openapi(&self) -> OpenApi {
        self.generator.generate(&self.registry)
    }

    /// The OpenAPI document as JSON. Rendered once and cached until the next
    /// registration.
    pub fn openapi_json(&self) -> DocsResult<&str> {
        if let Some(json) = self.openapi_json.get() {
            return Ok(json);
        }
        let json = self.generator.generate_json(&self.registry)?;
        Ok(self.openapi_json.get_or_init(|| json))
    }

    /// The Swagger UI page, unless docs are disabled.
    pub fn docs_html(&self) -> Option<String> {
        self.swagger().map(|page| page.html())
    }

    fn swagger(&self) -> Option<SwaggerUi> {
        let openapi_url = self.openapi_url()?;
        self.docs_url()?;
        Some(SwaggerUi::new(openapi_url).title(format!("{} - Swagger UI", self.setup.openapi().title)))
    }

    /// Routes one request by method and path: the documentation endpoints
    /// first, then the registered views. Returns `None` when nothing
    /// matches.
    ///
    /// `path` is the concrete request path. Segments matched by `{name}`
    /// placeholders of the view's template become path parameters. Any
    /// cooperative request works, including a [`StreamingRequest`]; a
    /// blocking view gets the body read before binding.
    ///
    /// `args` are framework-supplied arguments passed through to the handler.
    ///
    /// [`StreamingRequest`]: bindery_extract::StreamingRequest
    pub async fn dispatch<R>(
        &self,
        method: &str,
        path: &str,
        request: &R,
        args: Values,
    ) -> Option<Response<Bytes>>
    where
        R: AsyncRequestSource,
    {
        if method.eq_ignore_ascii_case("GET") {
            if self.openapi_url() == Some(path) {
                return Some(self.openapi_response());
            }
            if self.docs_url() == Some(path) {
                return self.swagger().map(|page| page.response());
            }
        }

        let route = self.registry.route(method, path)?;
        tracing::debug!(view = %route.view.meta().name(), method, path, "request routed");
        Some(route.respond(request, args).await)
    }

    fn openapi_response(&self) -> Response<Bytes> {
        match self.openapi_json() {
            Ok(json) => {
                let mut response = Response::new(Bytes::copy_from_slice(json.as_bytes()));
                response
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                response
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to render OpenAPI document");
                let mut response = Response::new(Bytes::new());
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                response
            }
        }
    }
}

impl std::fmt::Debug for Bindery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bindery")
            .field("setup", &self.setup)
            .field("views", &self.registry.len())
            .finish_non_exhaustive()
    }
}
