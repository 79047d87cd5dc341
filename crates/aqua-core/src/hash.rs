//! The Hasher (component A).
//!
//! SHA3-512 over byte strings, plus deterministic key-ordered leaf production
//! from attribute maps used by the Merkle revision mode and the witness
//! coordinator's tip tree.

use serde_json::{Map, Value};
use sha3::{Digest, Sha3_512};

/// SHA3-512 of `bytes`, lowercase hex, unprefixed.
///
/// By convention an empty input yields an empty output — used only as a
/// sentinel by the legacy (v1.2) decoder, never produced by new revisions.
pub fn sha3_512_hex(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return String::new();
    }
    let mut hasher = Sha3_512::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// SHA3-512 of raw file bytes. Alias of [`sha3_512_hex`] kept for call-site
/// clarity at file-hashing call sites.
pub fn file_hash_hex(bytes: &[u8]) -> String {
    sha3_512_hex(bytes)
}

/// Deterministically stringify a JSON value for leaf hashing.
///
/// - strings: as-is
/// - numbers: decimal, shortest round-tripping form
/// - booleans: `"true"` / `"false"`
/// - null: `"null"`
/// - arrays/objects: canonical JSON (insertion-ordered keys, no whitespace)
pub fn stringify_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(_) | Value::Object(_) => {
            crate::canonical_json::to_canonical_string(value)
        }
    }
}

/// Produce the ordered sequence of leaf hashes for an attribute map, in the
/// map's insertion order: `sha3_512(k_i || stringify(v_i))`.
pub fn leaf_hashes(map: &Map<String, Value>) -> Vec<String> {
    map.iter()
        .map(|(k, v)| {
            let mut preimage = String::with_capacity(k.len() + 16);
            preimage.push_str(k);
            preimage.push_str(&stringify_value(v));
            sha3_512_hex(preimage.as_bytes())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_sentinel_empty() {
        assert_eq!(sha3_512_hex(b""), "");
    }

    #[test]
    fn hello_digest_is_stable() {
        let a = sha3_512_hex(b"hello\n");
        let b = sha3_512_hex(b"hello\n");
        assert_eq!(a, b);
        assert_eq!(a.len(), 128);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn stringify_matches_primitive_rules() {
        assert_eq!(stringify_value(&Value::Bool(true)), "true");
        assert_eq!(stringify_value(&Value::Bool(false)), "false");
        assert_eq!(stringify_value(&Value::Null), "null");
        assert_eq!(stringify_value(&serde_json::json!(42)), "42");
        assert_eq!(stringify_value(&Value::String("x".into())), "x");
    }

    #[test]
    fn leaf_hashes_preserve_insertion_order() {
        let mut m1: Map<String, Value> = Map::new();
        m1.insert("a".to_string(), serde_json::json!(1));
        m1.insert("b".to_string(), serde_json::json!(2));

        let mut m2: Map<String, Value> = Map::new();
        m2.insert("b".to_string(), serde_json::json!(2));
        m2.insert("a".to_string(), serde_json::json!(1));

        assert_ne!(leaf_hashes(&m1), leaf_hashes(&m2));
    }
}
