//! Dependency declarations and the per-request dependency cache.
//!
//! A dependency is a callable with its own [`Signature`]. Its arguments are
//! bound from the same request as the view that declares it, it is invoked
//! with the bound values, and its result is injected into the view's
//! arguments under the declaring parameter's name.
//!
//! Results are cached per request by [`DependencyId`] when the declaring
//! [`Depends`] allows it. The id is the identity of the wrapped instance, so
//! siblings share a slot only when they share one handle through
//! [`Depends::from_arc`]. Two instances of one type, such as two closures
//! from the same factory function, are resolved separately.
//!
//! # Example
//!
//! ```
//! use bindery_core::di::{dependency_fn, Depends};
//! use bindery_core::params::{FieldType, Header};
//! use bindery_core::signature::Signature;
//! use serde_json::json;
//!
//! let current_user = dependency_fn(
//!     "current_user",
//!     Signature::new("current_user").param("token", FieldType::String, Header::required()),
//!     |args| Ok(json!({ "token": args.raw("token") })),
//! );
//!
//! let sig = Signature::new("profile").depends("user", Depends::new(current_user));
//! assert_eq!(sig.params().len(), 1);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

use crate::signature::Signature;
use crate::values::Values;

/// Failure reported by a dependency callable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DependencyError {
    message: String,
}

impl DependencyError {
    /// Creates a dependency error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result of invoking a dependency.
pub type DependencyResult = Result<Value, DependencyError>;

/// Identity of one dependency instance, used as the cache key and for cycle
/// detection.
///
/// Two ids are equal only for the same allocation. The id stays unique for
/// as long as a [`Depends`] holding the instance is alive, which covers every
/// registered view.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DependencyId(usize);

impl DependencyId {
    /// Identity of the instance behind `dependency`.
    pub fn of(dependency: &Arc<dyn Dependency>) -> Self {
        Self(Arc::as_ptr(dependency).cast::<()>() as usize)
    }
}

impl fmt::Debug for DependencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DependencyId({:#x})", self.0)
    }
}

/// A callable whose result can be injected into a view.
///
/// Implementors provide their own signature; the binding layer resolves it
/// against the request before calling [`call`](Self::call) or
/// [`call_async`](Self::call_async).
pub trait Dependency: Send + Sync + 'static {
    /// Name used in schema names, logs and error locations.
    fn name(&self) -> &str;

    /// Declared parameters.
    fn signature(&self) -> Signature;

    /// Invokes the dependency on the blocking path.
    fn call(&self, args: &Values) -> DependencyResult;

    /// Invokes the dependency on the cooperative path.
    fn call_async<'a>(&'a self, args: &'a Values) -> BoxFuture<'a, DependencyResult> {
        Box::pin(async move { self.call(args) })
    }

    /// Returns `true` if the dependency cannot run on the blocking path.
    fn is_async_only(&self) -> bool {
        false
    }
}

/// Closure-backed [`Dependency`]. Created by [`dependency_fn`].
pub struct FnDependency<F> {
    name: String,
    signature: Signature,
    func: F,
}

impl<F> Dependency for FnDependency<F>
where
    F: Fn(&Values) -> DependencyResult + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> Signature {
        self.signature.clone()
    }

    fn call(&self, args: &Values) -> DependencyResult {
        (self.func)(args)
    }
}

/// Wraps a closure as a dependency.
pub fn dependency_fn<F>(name: impl Into<String>, signature: Signature, func: F) -> FnDependency<F>
where
    F: Fn(&Values) -> DependencyResult + Send + Sync + 'static,
{
    FnDependency {
        name: name.into(),
        signature,
        func,
    }
}

/// Closure-backed async-only [`Dependency`]. Created by [`async_dependency_fn`].
pub struct AsyncFnDependency<F> {
    name: String,
    signature: Signature,
    func: F,
}

impl<F, Fut> Dependency for AsyncFnDependency<F>
where
    F: Fn(Values) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = DependencyResult> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> Signature {
        self.signature.clone()
    }

    fn call(&self, _args: &Values) -> DependencyResult {
        Err(DependencyError::new(format!(
            "dependency `{}` can only be awaited",
            self.name
        )))
    }

    fn call_async<'a>(&'a self, args: &'a Values) -> BoxFuture<'a, DependencyResult> {
        Box::pin((self.func)(args.clone()))
    }

    fn is_async_only(&self) -> bool {
        true
    }
}

/// Wraps an async closure as a dependency usable only from async views.
pub fn async_dependency_fn<F, Fut>(
    name: impl Into<String>,
    signature: Signature,
    func: F,
) -> AsyncFnDependency<F>
where
    F: Fn(Values) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = DependencyResult> + Send + 'static,
{
    AsyncFnDependency {
        name: name.into(),
        signature,
        func,
    }
}

/// Dependency marker placed as a parameter's default.
#[derive(Clone)]
pub struct Depends {
    dependency: Arc<dyn Dependency>,
    use_cache: bool,
}

impl Depends {
    /// Declares a cache-eligible dependency.
    pub fn new(dependency: impl Dependency) -> Self {
        Self::from_arc(Arc::new(dependency))
    }

    /// Declares a cache-eligible dependency from a shared handle. Every
    /// `Depends` made from clones of one handle shares a cache slot.
    pub fn from_arc(dependency: Arc<dyn Dependency>) -> Self {
        Self {
            dependency,
            use_cache: true,
        }
    }

    /// Sets whether results may be served from the per-request cache.
    #[must_use]
    pub fn use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    /// The wrapped dependency.
    pub fn dependency(&self) -> &Arc<dyn Dependency> {
        &self.dependency
    }

    /// Whether the result is cache-eligible.
    pub fn is_cached(&self) -> bool {
        self.use_cache
    }

    /// Identity of the wrapped instance.
    pub fn id(&self) -> DependencyId {
        DependencyId::of(&self.dependency)
    }
}

impl fmt::Debug for Depends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.use_cache {
            write!(f, "Depends({})", self.dependency.name())
        } else {
            write!(f, "Depends({}, use_cache=false)", self.dependency.name())
        }
    }
}

/// A cached resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEntry {
    /// The dependency ran and returned this value.
    Resolved(Value),
    /// The dependency's arguments were invalid or it returned an error. The
    /// errors were reported by the resolution that stored this entry.
    Failed,
}

/// Per-request store of dependency resolutions.
///
/// Created fresh for every request and dropped with it. Failures are stored
/// too, so a shared dependency reports its errors once per request.
#[derive(Debug, Default)]
pub struct DependencyCache {
    entries: HashMap<DependencyId, CacheEntry>,
}

impl DependencyCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached resolution for `id`.
    pub fn get(&self, id: &DependencyId) -> Option<&CacheEntry> {
        self.entries.get(id)
    }

    /// Stores a result.
    pub fn insert(&mut self, id: DependencyId, value: Value) {
        self.entries.insert(id, CacheEntry::Resolved(value));
    }

    /// Records that `id` failed in this request.
    pub fn insert_failure(&mut self, id: DependencyId) {
        self.entries.insert(id, CacheEntry::Failed);
    }

    /// Returns `true` if `id` has a cached resolution.
    pub fn contains(&self, id: &DependencyId) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of cached resolutions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
