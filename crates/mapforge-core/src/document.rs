//! Ordered key/value configuration documents
//!
//! A [`Document`] wraps one YAML mapping and is the structural foundation
//! for the open-ended parts of a definition: tagged extension blocks keep
//! their raw form here until a registered variant parses them into a typed
//! configuration struct.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};

/// An ordered mapping from string keys to arbitrary YAML values.
///
/// Keys are unique and iteration preserves document order. Lookups through [`Document::require`] fail with a
/// [`Error::MissingKey`] rather than returning a default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    map: Mapping,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing mapping
    pub fn from_mapping(map: Mapping) -> Self {
        Self { map }
    }

    /// Parse a document from YAML text
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Look up a key, returning `None` when absent
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.map.get(&Value::String(key.to_string()))
    }

    /// Look up a key, failing when absent
    pub fn require(&self, key: &str) -> Result<&Value> {
        self.get(key).ok_or_else(|| Error::MissingKey {
            key: key.to_string(),
        })
    }

    /// Look up a key that must hold a string
    pub fn require_str(&self, key: &str) -> Result<&str> {
        self.require(key)?.as_str().ok_or_else(|| Error::Invalid {
            message: format!("key '{}' must be a string", key),
        })
    }

    /// The `type` discriminant of a tagged block
    pub fn tag(&self) -> Result<&str> {
        self.require_str("type")
    }

    /// Insert or replace a key
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.map.insert(Value::String(key.into()), value);
    }

    /// Remove a key, returning its value if present
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.map.remove(&Value::String(key.to_string()))
    }

    /// Whether the document contains a key
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the document has no entries
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate entries in document order
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.map.iter()
    }

    /// Deserialize the whole document into a typed configuration struct.
    ///
    /// This is how a registered extension variant reads its own fields out
    /// of a raw tagged block.
    pub fn typed<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_yaml::from_value(Value::Mapping(self.map.clone()))?)
    }

    /// The underlying mapping
    pub fn as_mapping(&self) -> &Mapping {
        &self.map
    }
}
