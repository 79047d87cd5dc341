//! Canonical JSON utilities for Aqua Protocol revisions.
//!
//! Canonical JSON rules enforced here (see spec §4.A, §9):
//! - Object keys keep **insertion order** — NOT sorted. Key order is part of
//!   the hash; two payloads built with the same fields in a different order
//!   hash differently.
//! - Arrays preserve order.
//! - No whitespace.
//! - Strings are UTF-8 with JSON-standard escapes.
//! - Numbers are preserved exactly (callers must avoid non-deterministic
//!   floats).
//!
//! This deliberately diverges from a generic "canonicalize by sorting keys"
//! helper: aqua revisions are hashed over their *build* order, so sorting
//! would silently change every verification hash.

use serde_json::Value;

/// Serialize a JSON value to its canonical byte representation: insertion-order
/// keys, no whitespace. Relies on `serde_json`'s `preserve_order` feature to
/// keep `Value::Object` in insertion order end to end.
pub fn to_canonical_bytes(value: &Value) -> Vec<u8> {
    // serde_json's compact Display/to_vec already emits no extraneous
    // whitespace and preserves Map insertion order when the crate feature
    // `preserve_order` is enabled; there is no reordering to undo here,
    // unlike a hypothetical sorted-keys canonicalizer.
    serde_json::to_vec(value).expect("Value serialization is infallible")
}

/// Same as [`to_canonical_bytes`] but returns a `String`.
pub fn to_canonical_string(value: &Value) -> String {
    String::from_utf8(to_canonical_bytes(value)).expect("canonical JSON is valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order_not_sorted() {
        let v = serde_json::json!({"b": 1, "a": 2});
        let s = to_canonical_string(&v);
        assert_eq!(s, r#"{"b":1,"a":2}"#);
    }

    #[test]
    fn no_whitespace() {
        let v = serde_json::json!({"x": [1, 2, 3], "y": "z"});
        let s = to_canonical_string(&v);
        assert!(!s.contains(' '));
        assert!(!s.contains('\n'));
    }

    #[test]
    fn reordering_keys_changes_bytes() {
        let a = serde_json::json!({"k1": "v1", "k2": "v2"});
        let b = serde_json::json!({"k2": "v2", "k1": "v1"});
        assert_ne!(to_canonical_bytes(&a), to_canonical_bytes(&b));
    }
}
