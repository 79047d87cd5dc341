//! Decode-only support for the v1.2 schema (§9 "Two schema versions").
//!
//! The legacy schema computes a `metadata_hash` instead of today's flat
//! scalar/Merkle verification hash, and signs a different message. Both are
//! part of the wire contract for chains built before the current scheme;
//! this module exists so `AquaObject::open` can ingest such a chain, not so
//! new revisions can produce one — `aqua_core::builder` only ever emits the
//! current shape.

use crate::hash::sha3_512_hex;

/// `metadata_hash = sha3_512(domain_id || time_stamp || previous_verification_hash || merge_hash)`.
pub fn legacy_metadata_hash(domain_id: &str, time_stamp: &str, previous_verification_hash: &str, merge_hash: &str) -> String {
    let mut preimage = String::with_capacity(
        domain_id.len() + time_stamp.len() + previous_verification_hash.len() + merge_hash.len(),
    );
    preimage.push_str(domain_id);
    preimage.push_str(time_stamp);
    preimage.push_str(previous_verification_hash);
    preimage.push_str(merge_hash);
    sha3_512_hex(preimage.as_bytes())
}

/// `actual_root = sha3_512(domain_genesis_hash || merkle_root)` (§4.E.5.a),
/// the v1.2 witness root formula. Current-schema witnesses use
/// `witness_merkle_root` directly and never call this.
pub fn legacy_witness_root(domain_genesis_hash: &str, merkle_root: &str) -> String {
    let mut preimage = String::with_capacity(domain_genesis_hash.len() + merkle_root.len());
    preimage.push_str(domain_genesis_hash);
    preimage.push_str(merkle_root);
    sha3_512_hex(preimage.as_bytes())
}

/// The exact message a v1.2 signature revision signs over a verification hash.
pub fn legacy_signature_message(verification_hash: &str) -> String {
    format!("I sign the following page verification_hash: [0x{verification_hash}]")
}

/// The exact message a current-schema signature revision signs over a
/// verification hash.
pub fn current_signature_message(verification_hash: &str) -> String {
    format!("I sign this revision: [{verification_hash}]")
}
