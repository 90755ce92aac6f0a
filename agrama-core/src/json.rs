//! Heterogeneous JSON values used for metadata, primitive arguments, and
//! primitive results.
//!
//! Design Note: "Heterogeneous JSON Values" — arguments are a tagged union
//! `{null, bool, int, float, string, array, object}`. Rather than hand-roll
//! the union, this newtype wraps [`serde_json::Value`] (the idiomatic choice
//! given the rest of the stack already depends on `serde_json`) and adds the
//! depth/size validation the engine needs at the boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut};

/// A JSON-shaped value: the argument/result payload type for primitives and
/// the metadata sidecar's object type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Json(pub serde_json::Value);

impl Json {
    pub fn null() -> Self {
        Json(serde_json::Value::Null)
    }

    pub fn object() -> Self {
        Json(serde_json::Value::Object(serde_json::Map::new()))
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }

    pub fn as_object(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.0.as_object()
    }

    /// Nesting depth of this value (a scalar has depth 1).
    pub fn depth(&self) -> usize {
        fn go(v: &serde_json::Value) -> usize {
            match v {
                serde_json::Value::Array(items) => {
                    1 + items.iter().map(go).max().unwrap_or(0)
                }
                serde_json::Value::Object(map) => {
                    1 + map.values().map(go).max().unwrap_or(0)
                }
                _ => 1,
            }
        }
        go(&self.0)
    }
}

impl Deref for Json {
    type Target = serde_json::Value;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Json {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl fmt::Display for Json {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<serde_json::Value> for Json {
    fn from(v: serde_json::Value) -> Self {
        Json(v)
    }
}

impl From<Json> for serde_json::Value {
    fn from(v: Json) -> Self {
        v.0
    }
}
