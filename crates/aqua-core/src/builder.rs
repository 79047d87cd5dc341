//! The Revision Builder (component B).
//!
//! Assembles a revision's field map in the exact order it will be hashed
//! (§4.B "Assembly"), then computes its verification hash in scalar mode
//! (default) or Merkle mode (required for `form`, opt-in otherwise).
//!
//! Builder functions here are pure: they never see chain state. Chain-aware
//! checks (`DUPLICATE_CONTENT`, the file-index half of `INVALID_LINK`) live on
//! [`crate::chain::AquaObject`], which calls into this module and only
//! commits the result once every check has passed — a failed `append_*`
//! leaves the object untouched (§7).

use base64::Engine;
use rand::RngCore;
use serde_json::{Map, Value};

use crate::errors::{AquaError, AquaResult};
use crate::hash::{self, sha3_512_hex};
use crate::merkle;
use crate::revision::{Revision, RevisionKind};

const TIMESTAMP_LEN: usize = 14;

/// Validate the `YYYYMMDDHHMMSS` timestamp shape (§3).
pub fn validate_timestamp(ts: &str) -> AquaResult<()> {
    if ts.len() != TIMESTAMP_LEN || !ts.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AquaError::invalid_argument(format!(
            "local_timestamp must be {TIMESTAMP_LEN} decimal digits (YYYYMMDDHHMMSS), got {ts:?}"
        )));
    }
    Ok(())
}

/// Generate a fresh 32-byte file nonce, base64url-encoded without padding.
pub fn generate_file_nonce() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn skeleton(previous_verification_hash: &str, local_timestamp: &str, kind: RevisionKind) -> AquaResult<Map<String, Value>> {
    validate_timestamp(local_timestamp)?;
    let mut fields = Map::new();
    fields.insert("previous_verification_hash".to_string(), Value::String(previous_verification_hash.to_string()));
    fields.insert("local_timestamp".to_string(), Value::String(local_timestamp.to_string()));
    fields.insert("revision_type".to_string(), Value::String(kind.as_str().to_string()));
    Ok(fields)
}

/// Finish assembly: compute the verification hash in scalar or Merkle mode
/// and return the built [`Revision`] alongside it.
fn finish(mut fields: Map<String, Value>, merkle_mode: bool) -> AquaResult<(Revision, String)> {
    if merkle_mode {
        let leaves = hash::leaf_hashes(&fields);
        let root = merkle::build_root(&leaves)?;
        fields.insert(
            "leaves".to_string(),
            Value::Array(leaves.into_iter().map(Value::String).collect()),
        );
        Ok((Revision::from_fields(fields), root))
    } else {
        let bytes = crate::canonical_json::to_canonical_bytes(&Value::Object(fields.clone()));
        let vhash = format!("0x{}", sha3_512_hex(&bytes));
        Ok((Revision::from_fields(fields), vhash))
    }
}

/// Inputs shared by `file` and `form` revisions.
#[derive(Debug, Clone)]
pub struct FileMaterial<'a> {
    pub file_hash: &'a str,
    pub file_nonce: &'a str,
    pub content: Option<&'a [u8]>,
}

fn push_file_fields(fields: &mut Map<String, Value>, material: &FileMaterial<'_>) {
    fields.insert("file_hash".to_string(), Value::String(material.file_hash.to_string()));
    fields.insert("file_nonce".to_string(), Value::String(material.file_nonce.to_string()));
    if let Some(content) = material.content {
        let encoded = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(content);
        fields.insert("content".to_string(), Value::String(encoded));
    }
}

/// Decode a revision's inline `content` field, if present.
pub fn decode_inline_content(content_b64: &str) -> AquaResult<Vec<u8>> {
    base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(content_b64)
        .map_err(|e| AquaError::invalid_argument(format!("invalid base64url content: {e}")))
}

/// Build a `file` revision (scalar mode, per §4.B).
pub fn build_file(
    previous_verification_hash: &str,
    local_timestamp: &str,
    material: &FileMaterial<'_>,
) -> AquaResult<(Revision, String)> {
    let mut fields = skeleton(previous_verification_hash, local_timestamp, RevisionKind::File)?;
    push_file_fields(&mut fields, material);
    finish(fields, false)
}

/// Build a `form` revision (Merkle mode is mandatory, per §4.B). `form_fields`
/// are inserted in the caller's order, each promoted to a top-level
/// `forms_<key>` field (§3).
pub fn build_form(
    previous_verification_hash: &str,
    local_timestamp: &str,
    material: &FileMaterial<'_>,
    form_fields: &[(String, Value)],
) -> AquaResult<(Revision, String)> {
    let mut fields = skeleton(previous_verification_hash, local_timestamp, RevisionKind::Form)?;
    push_file_fields(&mut fields, material);
    for (k, v) in form_fields {
        fields.insert(format!("forms_{k}"), v.clone());
    }
    finish(fields, true)
}

/// Build a `signature` revision (scalar mode).
pub fn build_signature(
    previous_verification_hash: &str,
    local_timestamp: &str,
    signature: &str,
    public_key: &str,
    wallet_address: &str,
    signature_type: &str,
) -> AquaResult<(Revision, String)> {
    let mut fields = skeleton(previous_verification_hash, local_timestamp, RevisionKind::Signature)?;
    fields.insert("signature".to_string(), Value::String(signature.to_string()));
    fields.insert("signature_public_key".to_string(), Value::String(public_key.to_string()));
    fields.insert("signature_wallet_address".to_string(), Value::String(wallet_address.to_string()));
    fields.insert("signature_type".to_string(), Value::String(signature_type.to_string()));
    finish(fields, false)
}

/// Inputs for a `witness` revision, parented at a single chain's tip. See
/// `aqua-witness` for the coordinator that fills these in across N chains.
#[derive(Debug, Clone)]
pub struct WitnessMaterial<'a> {
    pub witness_merkle_root: &'a str,
    pub witness_timestamp: i64,
    pub witness_network: &'a str,
    pub witness_smart_contract_address: Option<&'a str>,
    pub witness_transaction_hash: &'a str,
    pub witness_sender_account_address: Option<&'a str>,
    pub witness_merkle_proof: Value,
}

/// Build a `witness` revision (scalar mode).
pub fn build_witness(
    previous_verification_hash: &str,
    local_timestamp: &str,
    material: &WitnessMaterial<'_>,
) -> AquaResult<(Revision, String)> {
    let mut fields = skeleton(previous_verification_hash, local_timestamp, RevisionKind::Witness)?;
    fields.insert("witness_merkle_root".to_string(), Value::String(material.witness_merkle_root.to_string()));
    fields.insert("witness_timestamp".to_string(), Value::from(material.witness_timestamp));
    fields.insert("witness_network".to_string(), Value::String(material.witness_network.to_string()));
    if let Some(addr) = material.witness_smart_contract_address {
        fields.insert("witness_smart_contract_address".to_string(), Value::String(addr.to_string()));
    }
    fields.insert("witness_transaction_hash".to_string(), Value::String(material.witness_transaction_hash.to_string()));
    if let Some(addr) = material.witness_sender_account_address {
        fields.insert("witness_sender_account_address".to_string(), Value::String(addr.to_string()));
    }
    fields.insert("witness_merkle_proof".to_string(), material.witness_merkle_proof.clone());
    finish(fields, false)
}

/// One file referenced by a `link` revision.
#[derive(Debug, Clone)]
pub struct LinkTarget {
    /// Tip verification hash of the linked chain.
    pub verification_hash: String,
    /// SHA3-512 of the linked aqua file's raw bytes.
    pub file_hash: String,
    /// External name under which `file_hash` should be indexed. Must not end
    /// in `.aqua.json` — linking aqua files directly is forbidden (§4.B).
    pub external_name: String,
}

/// Build a `link` revision (scalar mode). Only checks that don't require
/// chain state are performed here; [`crate::chain::AquaObject::append_link`]
/// additionally rejects targets whose `file_hash` is already indexed.
pub fn build_link(
    previous_verification_hash: &str,
    local_timestamp: &str,
    targets: &[LinkTarget],
    require_indepth_verification: bool,
) -> AquaResult<(Revision, String)> {
    if targets.is_empty() {
        return Err(AquaError::invalid_link("a link revision must reference at least one chain"));
    }
    for t in targets {
        if t.external_name.ends_with(".aqua.json") {
            return Err(AquaError::invalid_link(format!(
                "linking aqua files directly is forbidden: {:?}",
                t.external_name
            )));
        }
    }

    let mut fields = skeleton(previous_verification_hash, local_timestamp, RevisionKind::Link)?;
    fields.insert("link_type".to_string(), Value::String("aqua".to_string()));
    fields.insert("link_require_indepth_verification".to_string(), Value::Bool(require_indepth_verification));
    fields.insert(
        "link_verification_hashes".to_string(),
        Value::Array(targets.iter().map(|t| Value::String(t.verification_hash.clone())).collect()),
    );
    fields.insert(
        "link_file_hashes".to_string(),
        Value::Array(targets.iter().map(|t| Value::String(t.file_hash.clone())).collect()),
    );
    finish(fields, false)
}
