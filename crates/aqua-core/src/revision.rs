//! The revision model (part of component B).
//!
//! A [`Revision`] wraps the exact, insertion-ordered field map it was built
//! with (`serde_json::Map` preserves insertion order via the `preserve_order`
//! feature). This is intentionally "permissive and JSON-friendly" — wire
//! compatibility across the five kinds and the two schema generations (§9)
//! matters more here than a deep typed hierarchy; dispatch on `revision_type`
//! stays a flat match, never a class hierarchy (§9 "Polymorphism over
//! revision kinds").

use serde_json::{Map, Value};

use crate::errors::{AquaError, AquaResult};

/// The five revision kinds (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionKind {
    File,
    Form,
    Signature,
    Witness,
    Link,
}

impl RevisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Form => "form",
            Self::Signature => "signature",
            Self::Witness => "witness",
            Self::Link => "link",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "file" => Some(Self::File),
            "form" => Some(Self::Form),
            "signature" => Some(Self::Signature),
            "witness" => Some(Self::Witness),
            "link" => Some(Self::Link),
            _ => None,
        }
    }

    /// Merkle mode is required for `form`, opt-in for everything else (§4.B).
    pub fn requires_merkle_mode(&self) -> bool {
        matches!(self, Self::Form)
    }
}

/// One immutable revision. `fields` is the exact payload that was (or will
/// be) hashed — see [`crate::builder`] for how it's assembled, and
/// [`crate::canonical_json`] for how it's turned into bytes.
#[derive(Debug, Clone)]
pub struct Revision {
    fields: Map<String, Value>,
}

impl Revision {
    /// Wrap an already-assembled, insertion-ordered field map.
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// The exact field map, in build order. This is what gets hashed.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn previous_verification_hash(&self) -> &str {
        self.get_str("previous_verification_hash").unwrap_or("")
    }

    pub fn local_timestamp(&self) -> &str {
        self.get_str("local_timestamp").unwrap_or("")
    }

    pub fn revision_type(&self) -> &str {
        self.get_str("revision_type").unwrap_or("")
    }

    pub fn kind(&self) -> Option<RevisionKind> {
        RevisionKind::parse(self.revision_type())
    }

    /// Merkle mode is inferred from the presence of a persisted `leaves`
    /// array (§4.E.3).
    pub fn is_merkle_mode(&self) -> bool {
        self.fields.get("leaves").is_some()
    }

    pub fn leaves(&self) -> Option<Vec<String>> {
        self.fields.get("leaves").and_then(Value::as_array).map(|arr| {
            arr.iter().filter_map(Value::as_str).map(str::to_string).collect()
        })
    }

    pub fn file_hash(&self) -> Option<&str> {
        self.get_str("file_hash")
    }

    pub fn file_nonce(&self) -> Option<&str> {
        self.get_str("file_nonce")
    }

    /// Inline content, base64url-encoded as stored on the wire. Decode with
    /// `crate::builder::decode_inline_content`.
    pub fn content_b64(&self) -> Option<&str> {
        self.get_str("content")
    }

    /// Form fields: every `forms_k` key, in insertion order, with the `forms_`
    /// prefix stripped (§3).
    pub fn form_fields(&self) -> Vec<(&str, &Value)> {
        self.fields
            .iter()
            .filter_map(|(k, v)| k.strip_prefix("forms_").map(|stripped| (stripped, v)))
            .collect()
    }

    pub fn signature(&self) -> Option<&str> {
        self.get_str("signature")
    }

    pub fn signature_public_key(&self) -> Option<&str> {
        self.get_str("signature_public_key")
    }

    pub fn signature_wallet_address(&self) -> Option<&str> {
        self.get_str("signature_wallet_address")
    }

    pub fn signature_type(&self) -> Option<&str> {
        self.get_str("signature_type")
    }

    pub fn witness_merkle_root(&self) -> Option<&str> {
        self.get_str("witness_merkle_root")
    }

    pub fn witness_timestamp(&self) -> Option<i64> {
        self.fields.get("witness_timestamp").and_then(Value::as_i64)
    }

    pub fn witness_network(&self) -> Option<&str> {
        self.get_str("witness_network")
    }

    pub fn witness_smart_contract_address(&self) -> Option<&str> {
        self.get_str("witness_smart_contract_address")
    }

    pub fn witness_transaction_hash(&self) -> Option<&str> {
        self.get_str("witness_transaction_hash")
    }

    pub fn witness_sender_account_address(&self) -> Option<&str> {
        self.get_str("witness_sender_account_address")
    }

    /// Raw `witness_merkle_proof` value: either a bare list of hash strings
    /// (the single-chain degenerate case, §4.D) or a list of intermediate-node
    /// records (§4.E.5.c). Parsing the shape is the verifier's job.
    pub fn witness_merkle_proof(&self) -> Option<&Value> {
        self.fields.get("witness_merkle_proof")
    }

    pub fn link_type(&self) -> Option<&str> {
        self.get_str("link_type")
    }

    pub fn link_require_indepth_verification(&self) -> Option<bool> {
        self.fields.get("link_require_indepth_verification").and_then(Value::as_bool)
    }

    pub fn link_verification_hashes(&self) -> Vec<String> {
        self.fields
            .get("link_verification_hashes")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn link_file_hashes(&self) -> Vec<String> {
        self.fields
            .get("link_file_hashes")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default()
    }
}

/// Normalize a hash/verification-hash for comparison: strip a leading `0x`
/// (case-insensitively) and lowercase. Per spec §9 "Open question: `0x`
/// prefix", all comparisons normalize this way.
pub fn normalize_hash(h: &str) -> String {
    let stripped = h.strip_prefix("0x").or_else(|| h.strip_prefix("0X")).unwrap_or(h);
    stripped.to_ascii_lowercase()
}

/// Case-insensitive, prefix-insensitive hash equality.
pub fn hashes_equal(a: &str, b: &str) -> bool {
    normalize_hash(a) == normalize_hash(b)
}

pub fn require_str<'a>(fields: &'a Map<String, Value>, key: &str) -> AquaResult<&'a str> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| AquaError::invalid_argument(format!("missing or non-string field: {key}")))
}
