//! Request-binding views.
//!
//! A view wraps a handler with the parser manager built for its signature.
//! Per request it:
//!
//! 1. parses and validates against a fresh [`DependencyCache`],
//! 2. on any error, returns the error handler's response without calling
//!    the handler,
//! 3. otherwise merges the bound values over the framework-supplied
//!    arguments and calls the handler.
//!
//! [`View`] runs on the calling thread. [`AsyncView`] may suspend while
//! the body is read or an async dependency runs; both report the same values
//! and errors for the same request.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use bindery_core::{DependencyCache, FieldError, RegistrationError, RegistrationResult, Values};
use bindery_extract::{AsyncRequestSource, Parsed, RequestSource};
use bindery_telemetry::metrics::{record_bind, record_bind_error, BindOutcome};
use bytes::Bytes;
use http::Response;
use tracing::Instrument;

use crate::handler::{async_handler, AsyncHandler, ErrorHandler, JsonErrorHandler, SyncHandler};
use crate::meta::ViewMeta;

fn bind_span(meta: &ViewMeta) -> tracing::Span {
    tracing::debug_span!("bind", view = %meta.name(), path = meta.path().unwrap_or(""))
}

/// Logs and counts one bind. Returns `true` if binding succeeded.
fn finish_bind(meta: &ViewMeta, parsed: &Parsed, started: Instant) -> bool {
    let elapsed = started.elapsed();
    if parsed.errors.is_empty() {
        tracing::debug!(fields = parsed.values.len(), "request bound");
        record_bind(meta.name(), BindOutcome::Ok, elapsed);
        return true;
    }
    tracing::info!(errors = parsed.errors.len(), "request failed validation");
    for err in &parsed.errors {
        record_bind_error(meta.name(), err.source().unwrap_or("unknown"));
    }
    record_bind(meta.name(), BindOutcome::Invalid, elapsed);
    false
}

/// A blocking request-binding view.
#[derive(Clone)]
pub struct View {
    meta: Arc<ViewMeta>,
    handler: SyncHandler,
    error_handler: Arc<dyn ErrorHandler>,
}

impl View {
    /// Creates a view with the default [`JsonErrorHandler`].
    ///
    /// Fails if any dependency reached from the view is async-only.
    pub fn new<F>(meta: ViewMeta, handler: F) -> RegistrationResult<Self>
    where
        F: Fn(Values) -> Response<Bytes> + Send + Sync + 'static,
    {
        Self::with_error_handler(meta, handler, Arc::new(JsonErrorHandler))
    }

    /// Creates a view with an explicit error handler.
    pub fn with_error_handler<F>(
        meta: ViewMeta,
        handler: F,
        error_handler: Arc<dyn ErrorHandler>,
    ) -> RegistrationResult<Self>
    where
        F: Fn(Values) -> Response<Bytes> + Send + Sync + 'static,
    {
        if let Some(dependency) = meta.manager().async_only_dependency() {
            return Err(RegistrationError::AsyncDependency {
                view: meta.name().to_owned(),
                dependency: dependency.to_owned(),
            });
        }
        Ok(Self {
            meta: Arc::new(meta),
            handler: Arc::new(handler),
            error_handler,
        })
    }

    /// View metadata.
    #[must_use]
    pub fn meta(&self) -> &Arc<ViewMeta> {
        &self.meta
    }

    /// Parses and validates without invoking anything but dependencies.
    pub fn bind(&self, request: &dyn RequestSource) -> Result<Values, Vec<FieldError>> {
        let span = bind_span(&self.meta);
        let _enter = span.enter();
        let started = Instant::now();
        let parsed = self.meta.manager().parse(request, &mut DependencyCache::new());
        if finish_bind(&self.meta, &parsed, started) {
            Ok(parsed.values)
        } else {
            Err(parsed.errors)
        }
    }

    /// Handles one request. `args` are framework-supplied arguments such as
    /// path parameters; bound values win on name collisions.
    pub fn call(&self, request: &dyn RequestSource, mut args: Values) -> Response<Bytes> {
        match self.bind(request) {
            Ok(values) => {
                args.merge(values);
                (self.handler)(args)
            }
            Err(errors) => self.error_handler.handle(&self.meta, errors),
        }
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

/// A cooperative request-binding view.
#[derive(Clone)]
pub struct AsyncView {
    meta: Arc<ViewMeta>,
    handler: AsyncHandler,
    error_handler: Arc<dyn ErrorHandler>,
}

impl AsyncView {
    /// Creates a view with the default [`JsonErrorHandler`].
    pub fn new<F, Fut>(meta: ViewMeta, handler: F) -> Self
    where
        F: Fn(Values) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response<Bytes>> + Send + 'static,
    {
        Self::with_error_handler(meta, handler, Arc::new(JsonErrorHandler))
    }

    /// Creates a view with an explicit error handler.
    pub fn with_error_handler<F, Fut>(
        meta: ViewMeta,
        handler: F,
        error_handler: Arc<dyn ErrorHandler>,
    ) -> Self
    where
        F: Fn(Values) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response<Bytes>> + Send + 'static,
    {
        Self {
            meta: Arc::new(meta),
            handler: async_handler(handler),
            error_handler,
        }
    }

    /// View metadata.
    #[must_use]
    pub fn meta(&self) -> &Arc<ViewMeta> {
        &self.meta
    }

    /// Parses and validates, suspending where the request or a dependency
    /// does.
    pub async fn bind(&self, request: &dyn AsyncRequestSource) -> Result<Values, Vec<FieldError>> {
        let span = bind_span(&self.meta);
        let started = Instant::now();
        let mut cache = DependencyCache::new();
        let parsed = self
            .meta
            .manager()
            .parse_async(request, &mut cache)
            .instrument(span.clone())
            .await;
        if span.in_scope(|| finish_bind(&self.meta, &parsed, started)) {
            Ok(parsed.values)
        } else {
            Err(parsed.errors)
        }
    }

    /// Handles one request. Same contract as [`View::call`].
    pub async fn call(&self, request: &dyn AsyncRequestSource, mut args: Values) -> Response<Bytes> {
        match self.bind(request).await {
            Ok(values) => {
                args.merge(values);
                (self.handler)(args).await
            }
            Err(errors) => self.error_handler.handle(&self.meta, errors),
        }
    }
}

impl fmt::Debug for AsyncView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncView")
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bindery_core::{
        async_dependency_fn, Body, Depends, FieldType, Path, Query, Signature,
    };
    use bindery_extract::response::JsonResponse;
    use bindery_extract::{ParserFactory, RequestParts};
    use http::StatusCode;
    use serde_json::{json, Value};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::registry::LookupSpan;
    use tracing_subscriber::Layer;

    use crate::meta::ViewOptions;

    fn meta(sig: &Signature) -> ViewMeta {
        ViewMeta::build(
            ViewOptions::new().path("/items/{id}").method("POST"),
            sig,
            &ParserFactory::http(),
        )
        .unwrap()
    }

    fn echo(args: Values) -> Response<Bytes> {
        JsonResponse::new(args.into_json()).into_response()
    }

    fn body_json(response: &Response<Bytes>) -> Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    #[test]
    fn test_handler_gets_bound_values_over_args() {
        let sig = Signature::new("update")
            .param("id", FieldType::Integer, Path::required())
            .param("name", FieldType::String, Body::required())
            .untyped("request");
        let view = View::new(meta(&sig), echo).unwrap();

        let req = RequestParts::builder()
            .uri("/items/7")
            .path_param("id", "7")
            .json(&json!({"name": "widget"}))
            .build();
        let args: Values = [("id", json!("7")), ("request", json!("raw"))]
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .collect();

        let response = view.call(&req, args);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(&response), json!({"id": 7, "request": "raw", "name": "widget"}));
    }

    #[test]
    fn test_errors_short_circuit_handler() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let sig = Signature::new("list").param("q", FieldType::String, Query::required());
        let view = View::new(meta(&sig), |args: Values| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            echo(args)
        })
        .unwrap();

        let response = view.call(&RequestParts::builder().build(), Values::new());
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(&response)[0]["loc"], json!(["query", "q"]));
        assert_eq!(CALLS.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_blocking_view_rejects_async_only_dependency() {
        let dep = async_dependency_fn("remote", Signature::new("remote"), |_| async { Ok(json!(1)) });
        let sig = Signature::new("v").depends("remote", Depends::new(dep));
        let err = View::new(meta(&sig), echo).unwrap_err();
        assert!(matches!(err, RegistrationError::AsyncDependency { .. }));
    }

    #[tokio::test]
    async fn test_async_view_runs_async_dependency() {
        let dep = async_dependency_fn(
            "remote",
            Signature::new("remote").param("q", FieldType::Integer, Query::required()),
            |args| async move { Ok(json!(args.get::<i64>("q").unwrap_or_default() * 2)) },
        );
        let sig = Signature::new("v").depends("doubled", Depends::new(dep));
        let view = AsyncView::new(meta(&sig), |args: Values| async move { echo(args) });

        let req = RequestParts::builder().uri("/items/1?q=21").build();
        let response = view.call(&req, Values::new()).await;
        assert_eq!(body_json(&response), json!({"doubled": 42}));

        let response = view.call(&RequestParts::builder().build(), Values::new()).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    /// Records the span each event was emitted in.
    #[derive(Clone, Default)]
    struct EventSpans(Arc<std::sync::Mutex<Vec<(String, Option<String>)>>>);

    impl<S> Layer<S> for EventSpans
    where
        S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    {
        fn on_event(&self, event: &tracing::Event<'_>, ctx: Context<'_, S>) {
            let span = ctx.event_span(event).map(|span| span.name().to_owned());
            let level = event.metadata().level().to_string();
            self.0.lock().unwrap().push((level, span));
        }
    }

    impl EventSpans {
        fn take(&self) -> Vec<(String, Option<String>)> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    #[tokio::test]
    async fn test_bind_outcome_logged_inside_bind_span() {
        let sig = Signature::new("v").param("q", FieldType::Integer, Query::required());
        let sync_view = View::new(meta(&sig), echo).unwrap();
        let async_view = AsyncView::new(meta(&sig), |args: Values| async move { echo(args) });

        let events = EventSpans::default();
        let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(events.clone()));

        for uri in ["/?q=1", "/?q=x"] {
            let req = RequestParts::builder().uri(uri).build();
            let _ = sync_view.bind(&req);
            let sync_events = events.take();
            let _ = async_view.bind(&req).await;
            let async_events = events.take();

            assert!(!sync_events.is_empty(), "{uri}");
            assert!(!async_events.is_empty(), "{uri}");
            for (level, span) in sync_events.into_iter().chain(async_events) {
                assert_eq!(span.as_deref(), Some("bind"), "{level} event for {uri}");
            }
        }
    }

    #[tokio::test]
    async fn test_sync_and_async_bind_agree() {
        let sig = Signature::new("v")
            .param("id", FieldType::Integer, Path::required().ge(1.0))
            .param("tags", FieldType::set(FieldType::String), Query::default_value(json!([])));
        let sync_view = View::new(meta(&sig), echo).unwrap();
        let async_view = AsyncView::new(meta(&sig), |args: Values| async move { echo(args) });

        for (id, uri) in [("3", "/?tags=a&tags=a&tags=b"), ("0", "/"), ("x", "/?tags=1")] {
            let req = RequestParts::builder().uri(uri).path_param("id", id).build();
            assert_eq!(sync_view.bind(&req), async_view.bind(&req).await, "{id} {uri}");
        }
    }
}
