//! Canonical fingerprint over `(primitive, arguments)`, used as the response
//! cache key. `serde_json::Map` is backed by a `BTreeMap` (this workspace
//! never enables the `preserve_order` feature), so field order in the
//! serialized output is already canonical — no manual key-sorting needed.

use agrama_core::Json;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn compute(primitive: &str, arguments: &Json) -> Self {
        let serialized = serde_json::to_string(arguments).unwrap_or_default();
        Fingerprint(format!("{primitive}:{serialized}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_arguments_fingerprint_identically() {
        let a = Fingerprint::compute("retrieve", &Json(serde_json::json!({"key": "k"})));
        let b = Fingerprint::compute("retrieve", &Json(serde_json::json!({"key": "k"})));
        assert_eq!(a, b);
    }

    #[test]
    fn key_order_does_not_affect_fingerprint() {
        let a = Fingerprint::compute("store", &Json(serde_json::json!({"key": "k", "value": "v"})));
        let b = Fingerprint::compute("store", &Json(serde_json::json!({"value": "v", "key": "k"})));
        assert_eq!(a, b);
    }

    #[test]
    fn different_primitives_fingerprint_differently() {
        let args = Json(serde_json::json!({"key": "k"}));
        let a = Fingerprint::compute("retrieve", &args);
        let b = Fingerprint::compute("delete", &args);
        assert_ne!(a, b);
    }
}
