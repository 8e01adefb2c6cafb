//! The view registry.
//!
//! Populated through `&mut` while views are registered, then shared read-only
//! (typically behind an `Arc`) by request dispatch and the OpenAPI generator.

use std::collections::HashSet;
use std::sync::Arc;

use bindery_core::{RegistrationError, RegistrationResult};
use bindery_extract::MultiMap;

use crate::meta::ViewMeta;
use crate::route::{match_path, Route};
use crate::view::{AsyncView, View};

/// A registered view of either flavor.
#[derive(Debug, Clone)]
pub enum RegisteredView {
    /// Blocking view.
    Sync(Arc<View>),
    /// Cooperative view.
    Async(Arc<AsyncView>),
}

impl RegisteredView {
    /// The view's metadata.
    #[must_use]
    pub fn meta(&self) -> &ViewMeta {
        match self {
            Self::Sync(view) => view.meta(),
            Self::Async(view) => view.meta(),
        }
    }

    /// Returns `true` for a cooperative view.
    #[must_use]
    pub fn is_async(&self) -> bool {
        matches!(self, Self::Async(_))
    }
}

impl From<Arc<View>> for RegisteredView {
    fn from(view: Arc<View>) -> Self {
        Self::Sync(view)
    }
}

impl From<Arc<AsyncView>> for RegisteredView {
    fn from(view: Arc<AsyncView>) -> Self {
        Self::Async(view)
    }
}

/// Registered views with a path, in registration order.
///
/// A `(path, method)` pair may be registered once.
#[derive(Debug, Default)]
pub struct ViewRegistry {
    views: Vec<RegisteredView>,
    routes: HashSet<(String, String)>,
}

impl ViewRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a view. Views without a path are accepted and not stored.
    ///
    /// Fails without storing anything if any of the view's methods is already
    /// registered for its path.
    pub fn register(&mut self, view: impl Into<RegisteredView>) -> RegistrationResult<()> {
        let view = view.into();
        let meta = view.meta();
        let Some(path) = meta.path() else {
            tracing::debug!(view = %meta.name(), "view has no path, not registered");
            return Ok(());
        };

        if let Some(method) = meta
            .methods()
            .iter()
            .find(|m| self.routes.contains(&(path.to_owned(), (*m).clone())))
        {
            return Err(RegistrationError::duplicate_route(method.as_str(), path));
        }

        for method in meta.methods() {
            self.routes.insert((path.to_owned(), method.clone()));
        }
        tracing::info!(
            view = %meta.name(),
            path,
            methods = ?meta.methods(),
            "view registered"
        );
        self.views.push(view);
        Ok(())
    }

    /// Finds the view registered for `method` on the path template `path`.
    #[must_use]
    pub fn find(&self, method: &str, path: &str) -> Option<&RegisteredView> {
        self.views.iter().find(|view| {
            let meta = view.meta();
            meta.path() == Some(path) && meta.methods().iter().any(|m| m.eq_ignore_ascii_case(method))
        })
    }

    /// Finds the view for `method` on the concrete request `path`.
    ///
    /// A template equal to `path` wins. Otherwise the first view, in
    /// registration order, whose template matches `path` segment by segment
    /// is returned with the captured segments.
    #[must_use]
    pub fn route(&self, method: &str, path: &str) -> Option<Route<'_>> {
        if let Some(view) = self.find(method, path) {
            return Some(Route {
                view,
                path_params: MultiMap::new(),
            });
        }
        self.views
            .iter()
            .filter(|view| view.meta().methods().iter().any(|m| m.eq_ignore_ascii_case(method)))
            .find_map(|view| {
                let path_params = match_path(view.meta().path()?, path)?;
                Some(Route { view, path_params })
            })
    }

    /// Views in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredView> {
        self.views.iter()
    }

    /// Number of registered views.
    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Returns `true` if no view is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

impl<'a> IntoIterator for &'a ViewRegistry {
    type Item = &'a RegisteredView;
    type IntoIter = std::slice::Iter<'a, RegisteredView>;

    fn into_iter(self) -> Self::IntoIter {
        self.views.iter()
    }
}
