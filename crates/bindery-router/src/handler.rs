//! Handler and error-handler types.
//!
//! The error handler is a strategy chosen when a view is built. It receives
//! every field error of the failed request and returns the response; the
//! view's handler is never called on that path.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use bindery_core::{BindError, FieldError, Values};
use bindery_extract::response::JsonResponse;
use bytes::Bytes;
use futures_util::future::BoxFuture;
use http::Response;

use crate::meta::ViewMeta;

/// Blocking view handler: bound arguments in, response out.
pub type SyncHandler = Arc<dyn Fn(Values) -> Response<Bytes> + Send + Sync>;

/// Cooperative view handler.
pub type AsyncHandler = Arc<dyn Fn(Values) -> BoxFuture<'static, Response<Bytes>> + Send + Sync>;

/// Boxes an async closure as an [`AsyncHandler`].
pub fn async_handler<F, Fut>(handler: F) -> AsyncHandler
where
    F: Fn(Values) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response<Bytes>> + Send + 'static,
{
    Arc::new(move |args| -> BoxFuture<'static, Response<Bytes>> { Box::pin(handler(args)) })
}

/// Turns binding errors into a response.
pub trait ErrorHandler: Send + Sync {
    /// Builds the response for a request whose binding failed.
    fn handle(&self, view: &ViewMeta, errors: Vec<FieldError>) -> Response<Bytes>;
}

/// Default error handler: `422 Unprocessable Entity` with the error list as
/// a JSON array.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonErrorHandler;

impl ErrorHandler for JsonErrorHandler {
    fn handle(&self, _view: &ViewMeta, errors: Vec<FieldError>) -> Response<Bytes> {
        let err = BindError::new(errors);
        JsonResponse::new(err.to_json())
            .with_status(err.status_code())
            .into_response()
    }
}

/// Error handler backed by a closure.
pub struct FnErrorHandler<F> {
    func: F,
}

impl<F> fmt::Debug for FnErrorHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnErrorHandler").finish_non_exhaustive()
    }
}

impl<F> ErrorHandler for FnErrorHandler<F>
where
    F: Fn(&ViewMeta, Vec<FieldError>) -> Response<Bytes> + Send + Sync,
{
    fn handle(&self, view: &ViewMeta, errors: Vec<FieldError>) -> Response<Bytes> {
        (self.func)(view, errors)
    }
}

/// Wraps a closure as an [`ErrorHandler`].
pub fn error_handler_fn<F>(func: F) -> FnErrorHandler<F>
where
    F: Fn(&ViewMeta, Vec<FieldError>) -> Response<Bytes> + Send + Sync,
{
    FnErrorHandler { func }
}
