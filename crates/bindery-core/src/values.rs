//! Bound argument values.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Raw values keyed by alias, as extracted from the request before validation.
pub type RawValues = IndexMap<String, Value>;

/// Error returned by [`Values::get`].
#[derive(Debug, Error)]
pub enum ValueError {
    /// No value under this name.
    #[error("no value named `{0}`")]
    Missing(String),

    /// The value does not deserialize into the requested type.
    #[error("value `{name}` has unexpected shape: {source}")]
    Type {
        /// Argument name.
        name: String,
        /// Deserialization error.
        #[source]
        source: serde_json::Error,
    },
}

/// Ordered mapping from parameter name to bound value.
///
/// Handlers and dependencies receive their arguments as `Values`; typed
/// access goes through serde.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(IndexMap<String, Value>);

impl Values {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a value, keeping the original position on replace.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(name.into(), value)
    }

    /// Deserializes the named value.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, ValueError> {
        let raw = self
            .0
            .get(name)
            .ok_or_else(|| ValueError::Missing(name.to_owned()))?;
        T::deserialize(raw).map_err(|source| ValueError::Type {
            name: name.to_owned(),
            source,
        })
    }

    /// The named value as JSON.
    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Returns `true` if a value is bound under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Copies every entry of `other` into `self`; `other` wins on collision.
    pub fn merge(&mut self, other: Values) {
        self.0.extend(other.0);
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Converts into a JSON object.
    pub fn into_json(self) -> Value {
        Value::Object(self.0.into_iter().collect())
    }
}

impl FromIterator<(String, Value)> for Values {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Values {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_typed_get() {
        let mut v = Values::new();
        v.insert("a", json!(150));
        v.insert("tags", json!(["x", "y"]));

        assert_eq!(v.get::<i64>("a").unwrap(), 150);
        assert_eq!(v.get::<Vec<String>>("tags").unwrap(), vec!["x", "y"]);
        assert!(matches!(v.get::<i64>("b"), Err(ValueError::Missing(_))));
        assert!(matches!(v.get::<String>("a"), Err(ValueError::Type { .. })));
    }

    #[test]
    fn test_merge_overrides() {
        let mut args: Values = [("id".to_owned(), json!("7")), ("x".to_owned(), json!(1))]
            .into_iter()
            .collect();
        let mut resolved = Values::new();
        resolved.insert("id", json!(7));
        args.merge(resolved);

        assert_eq!(args.raw("id"), Some(&json!(7)));
        assert_eq!(args.len(), 2);
        assert_eq!(args.into_json(), json!({"id": 7, "x": 1}));
    }
}
