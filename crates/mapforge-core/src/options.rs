//! Option structures and argument flattening
//!
//! Renderer options are written in a definition either as a mapping
//! (`--flag: value` pairs, with null/boolean values meaning "flag only")
//! or as a plain sequence of tokens. [`flatten`] turns one such structure
//! into the ordered argument tokens appended to the renderer command line.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};

/// One option structure from a definition: `defaultoptions` or a task entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionSet {
    /// Ordered key/value pairs
    Map(Mapping),

    /// Pre-tokenized argument list
    List(Vec<Value>),
}

impl Default for OptionSet {
    fn default() -> Self {
        OptionSet::Map(Mapping::new())
    }
}

impl OptionSet {
    /// Whether the structure contributes no tokens
    pub fn is_empty(&self) -> bool {
        match self {
            OptionSet::Map(map) => map.is_empty(),
            OptionSet::List(list) => list.is_empty(),
        }
    }
}

/// Flatten one option structure into command-line tokens.
///
/// Mapping entries emit their key, then their value — except null and
/// boolean values (either polarity), which emit the key alone: flag
/// presence is the signal, never a "true"/"false" argument. Sequence
/// entries emit one token each, in order. Order is significant and
/// preserved exactly.
pub fn flatten(options: &OptionSet) -> Result<Vec<String>> {
    match options {
        OptionSet::Map(map) => {
            let mut tokens = Vec::new();
            for (key, value) in map {
                tokens.push(scalar_token(key)?);
                match value {
                    Value::Null | Value::Bool(_) => {}
                    other => tokens.push(scalar_token(other)?),
                }
            }
            Ok(tokens)
        }
        OptionSet::List(list) => list.iter().map(scalar_token).collect(),
    }
}

/// String form of a single scalar token.
///
/// Nested collections have no argument form; rejecting them here surfaces
/// a malformed option structure before any subprocess starts.
fn scalar_token(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Err(Error::InvalidOptions {
            message: "null has no argument form".to_string(),
        }),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => Err(Error::InvalidOptions {
            message: "nested collections have no argument form".to_string(),
        }),
    }
}
