//! The Revision Verifier (component E, §4.E).
//!
//! Verifies one revision in isolation against the tip hash threaded in from
//! the Chain Verifier, producing five independent sub-results rather than a
//! single pass/fail — so a caller can tell a valid signature with a failed
//! witness apart from a wholly broken revision (§7 "Propagation").

use aqua_core::legacy;
use aqua_core::merkle::{self, MerkleProofStep};
use aqua_core::revision::{hashes_equal, Revision};
use aqua_witness::backend::decode_ethereum_calldata;

use crate::config::VerifierConfig;
use crate::signature::{verify_did_key_ed25519, verify_eip191};
use crate::transaction_oracle::{TransactionOracle, TransactionRecord};

/// A revision's resolved content bytes, for file-integrity checking.
/// Resolves either the revision's inline `content` or an externally stored
/// file by name (§6 "File bytes provider").
pub trait FileBytesProvider {
    fn read(&self, external_name: &str) -> Option<Vec<u8>>;
}

/// A `FileBytesProvider` that never resolves anything external — adequate
/// for chains that always embed `content` inline.
pub struct NoExternalFiles;

impl FileBytesProvider for NoExternalFiles {
    fn read(&self, _external_name: &str) -> Option<Vec<u8>> {
        None
    }
}

/// One of the five independent checks in §4.E.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubResult {
    Missing,
    Pass,
    Fail(String),
}

impl SubResult {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail(_))
    }
}

/// The five sub-results for one revision, plus the aggregate.
#[derive(Debug, Clone)]
pub struct RevisionResult {
    pub linkage: SubResult,
    pub file_integrity: SubResult,
    pub content_integrity: SubResult,
    pub signature: SubResult,
    pub witness: SubResult,
}

impl RevisionResult {
    /// PASS iff every non-MISSING sub-result is PASS (§4.E "Aggregate"), or,
    /// in `strict` mode, iff every sub-result is PASS (MISSING demotes).
    pub fn aggregate(&self, strict: bool) -> bool {
        [&self.linkage, &self.file_integrity, &self.content_integrity, &self.signature, &self.witness]
            .into_iter()
            .all(|r| if strict { r.is_pass() } else { !r.is_fail() })
    }
}

fn check_linkage(revision: &Revision, threaded_previous_hash: &str) -> SubResult {
    if hashes_equal(revision.previous_verification_hash(), threaded_previous_hash) {
        SubResult::Pass
    } else {
        SubResult::Fail(format!(
            "previous_verification_hash {} does not match threaded tip {}",
            revision.previous_verification_hash(),
            threaded_previous_hash
        ))
    }
}

fn check_file_integrity(revision: &Revision, files: &dyn FileBytesProvider, external_name: Option<&str>) -> SubResult {
    let Some(expected) = revision.file_hash() else {
        return SubResult::Missing;
    };

    let bytes = if let Some(content_b64) = revision.content_b64() {
        match aqua_core::builder::decode_inline_content(content_b64) {
            Ok(b) => Some(b),
            Err(e) => return SubResult::Fail(format!("invalid inline content: {e}")),
        }
    } else {
        external_name.and_then(|name| files.read(name))
    };

    let Some(bytes) = bytes else {
        return SubResult::Fail("content unavailable to recompute file_hash".to_string());
    };

    let actual = aqua_core::hash::file_hash_hex(&bytes);
    if hashes_equal(&actual, expected) {
        SubResult::Pass
    } else {
        SubResult::Fail(format!("recomputed file_hash {actual} != declared {expected}"))
    }
}

fn check_content_integrity(revision: &Revision, stored_verification_hash: &str, schema: aqua_core::chain::SchemaVersion) -> SubResult {
    use aqua_core::chain::SchemaVersion;

    let recomputed = if revision.is_merkle_mode() {
        let Some(leaves) = revision.leaves() else {
            return SubResult::Fail("merkle-mode revision missing leaves".to_string());
        };
        match merkle::build_root(&leaves) {
            Ok(root) => root,
            Err(e) => return SubResult::Fail(format!("failed to recompute merkle root: {e}")),
        }
    } else {
        match schema {
            SchemaVersion::Current => {
                let bytes = aqua_core::canonical_json::to_canonical_bytes(&serde_json::Value::Object(revision.fields().clone()));
                format!("0x{}", aqua_core::hash::sha3_512_hex(&bytes))
            }
            SchemaVersion::V1_2 => {
                // v1.2's metadata_hash needs domain_id/merge_hash, which are not part
                // of the current flat field set; chains actually on this schema carry
                // them as extra fields on `revision`.
                let domain_id = revision.fields().get("domain_id").and_then(|v| v.as_str()).unwrap_or("");
                let merge_hash = revision.fields().get("merge_hash").and_then(|v| v.as_str()).unwrap_or("");
                legacy::legacy_metadata_hash(domain_id, revision.local_timestamp(), revision.previous_verification_hash(), merge_hash)
            }
        }
    };

    if hashes_equal(&recomputed, stored_verification_hash) {
        SubResult::Pass
    } else {
        SubResult::Fail(format!("recomputed verification hash {recomputed} != stored {stored_verification_hash}"))
    }
}

fn check_signature(revision: &Revision, schema: aqua_core::chain::SchemaVersion) -> SubResult {
    use aqua_core::chain::SchemaVersion;

    let Some(signature_b64) = revision.signature() else {
        return SubResult::Missing;
    };
    let Some(wallet_address) = revision.signature_wallet_address() else {
        return SubResult::Fail("signature present without signature_wallet_address".to_string());
    };
    let scheme = revision.signature_type().unwrap_or("");

    let message = match schema {
        SchemaVersion::Current => legacy::current_signature_message(revision.previous_verification_hash()),
        SchemaVersion::V1_2 => legacy::legacy_signature_message(revision.previous_verification_hash()),
    };

    match scheme {
        "ethereum:eip-191" => {
            let Ok(sig_bytes) = decode_signature_bytes(signature_b64) else {
                return SubResult::Fail("signature is not valid hex/base64".to_string());
            };
            if verify_eip191(&message, &sig_bytes, wallet_address) {
                SubResult::Pass
            } else {
                SubResult::Fail("recovered signer does not match signature_wallet_address".to_string())
            }
        }
        "did:key" => {
            let Ok(sig_bytes) = decode_signature_bytes(signature_b64) else {
                return SubResult::Fail("signature is not valid hex/base64".to_string());
            };
            let did = revision.signature_public_key().unwrap_or(wallet_address);
            if verify_did_key_ed25519(did, message.as_bytes(), &sig_bytes) {
                SubResult::Pass
            } else {
                SubResult::Fail("did:key Ed25519 signature verification failed".to_string())
            }
        }
        other => SubResult::Fail(format!("unsupported signature_type: {other}")),
    }
}

fn decode_signature_bytes(s: &str) -> Result<Vec<u8>, ()> {
    if let Some(stripped) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return hex::decode(stripped).map_err(|_| ());
    }
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(s)
        .or_else(|_| base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(s))
        .map_err(|_| ())
}

fn check_witness(
    revision: &Revision,
    config: &VerifierConfig,
    schema: aqua_core::chain::SchemaVersion,
    oracle: &dyn TransactionOracle,
) -> SubResult {
    use aqua_core::chain::SchemaVersion;

    let Some(merkle_root) = revision.witness_merkle_root() else {
        return SubResult::Missing;
    };
    let network = revision.witness_network().unwrap_or("");
    let tx_hash = revision.witness_transaction_hash().unwrap_or("");

    // §4.E.5.a: legacy chains witness a domain-hashed root, not the bare
    // merkle root; current-schema witnesses use `merkle_root` directly.
    let actual_root = match schema {
        SchemaVersion::Current => merkle_root.to_string(),
        SchemaVersion::V1_2 => {
            let domain_genesis_hash =
                revision.fields().get("domain_genesis_hash").and_then(|v| v.as_str()).unwrap_or("");
            legacy::legacy_witness_root(domain_genesis_hash, merkle_root)
        }
    };

    // §6/§7: Ethereum witness verification requires an RPC key (CONFIG_MISSING).
    if aqua_witness::backend::WitnessNetwork::from_str(network).is_some_and(|n| n.is_ethereum()) {
        if let Err(e) = config.require_rpc_key() {
            return SubResult::Fail(e.to_string());
        }
    }

    let Some(record) = oracle.get_transaction(network, tx_hash) else {
        return SubResult::Fail("transaction oracle returned no record (WITNESS_UNAVAILABLE)".to_string());
    };

    let root_matches = match record {
        TransactionRecord::Ethereum { input_data } => match decode_ethereum_calldata(&input_data) {
            Some(on_chain_root) => hashes_equal(&on_chain_root, &actual_root),
            None => false,
        },
        TransactionRecord::Nostr { event_content } => hashes_equal(&event_content, &actual_root),
        TransactionRecord::Tsa { timestamped_digest } => hashes_equal(&timestamped_digest, &actual_root),
    };

    if !root_matches {
        return SubResult::Fail("on-chain payload does not match expected root (WITNESS_MISMATCH)".to_string());
    }

    if config.verify_merkle_proof {
        if let Some(proof_value) = revision.witness_merkle_proof() {
            if let Some(arr) = proof_value.as_array() {
                if arr.len() > 1 {
                    let steps: Option<Vec<MerkleProofStep>> = arr
                        .iter()
                        .map(|v| {
                            Some(MerkleProofStep {
                                left_leaf: v.get("left_leaf").and_then(|x| x.as_str()).map(str::to_string),
                                right_leaf: v.get("right_leaf").and_then(|x| x.as_str()).map(str::to_string),
                                successor: v.get("successor")?.as_str()?.to_string(),
                            })
                        })
                        .collect();
                    let Some(steps) = steps else {
                        return SubResult::Fail("malformed witness_merkle_proof (MERKLE_PROOF_INVALID)".to_string());
                    };
                    let own_tip = revision.previous_verification_hash();
                    if !merkle::verify_proof(own_tip, &steps, merkle_root) {
                        return SubResult::Fail("merkle proof traversal failed (MERKLE_PROOF_INVALID)".to_string());
                    }
                }
            }
        }
    }

    SubResult::Pass
}

/// Verify one revision. `stored_verification_hash` is the key this revision
/// is stored under (the value the Chain Verifier threads forward);
/// `threaded_previous_hash` is the previous revision's stored verification
/// hash (or `""` at genesis).
pub fn verify_revision(
    revision: &Revision,
    stored_verification_hash: &str,
    threaded_previous_hash: &str,
    config: &VerifierConfig,
    files: &dyn FileBytesProvider,
    external_name: Option<&str>,
    oracle: &dyn TransactionOracle,
) -> RevisionResult {
    RevisionResult {
        linkage: check_linkage(revision, threaded_previous_hash),
        file_integrity: check_file_integrity(revision, files, external_name),
        content_integrity: check_content_integrity(revision, stored_verification_hash, config.schema_version),
        signature: check_signature(revision, config.schema_version),
        witness: check_witness(revision, config, config.schema_version, oracle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction_oracle::{FixedTransactionOracle, TransactionRecord};
    use aqua_core::builder::{self, FileMaterial, WitnessMaterial};
    use aqua_core::chain::{AquaObject, SchemaVersion};
    use aqua_core::hash::sha3_512_hex;
    use aqua_witness::backend::encode_ethereum_calldata;
    use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, SigningKey};

    const TS: &str = "20240101000000";

    #[test]
    fn genesis_file_linkage_and_content_pass() {
        let file_hash = sha3_512_hex(b"hello\n");
        let obj = AquaObject::genesis_file(TS, &file_hash, "nonce", Some(b"hello\n"), "hello.txt").unwrap();
        let entry = obj.genesis();
        let config = VerifierConfig::default();
        let oracle = FixedTransactionOracle::new();

        let result = verify_revision(&entry.revision, &entry.verification_hash, "", &config, &NoExternalFiles, None, &oracle);
        assert_eq!(result.linkage, SubResult::Pass);
        assert_eq!(result.file_integrity, SubResult::Pass);
        assert_eq!(result.content_integrity, SubResult::Pass);
        assert_eq!(result.signature, SubResult::Missing);
        assert_eq!(result.witness, SubResult::Missing);
        assert!(result.aggregate(false));
    }

    #[test]
    fn tampered_file_hash_fails_file_integrity() {
        let file_hash = sha3_512_hex(b"hello\n");
        let material = FileMaterial { file_hash: &file_hash, file_nonce: "nonce", content: Some(b"goodbye\n") };
        let (revision, vhash) = builder::build_file("", TS, &material).unwrap();
        let config = VerifierConfig::default();
        let oracle = FixedTransactionOracle::new();

        let result = verify_revision(&revision, &vhash, "", &config, &NoExternalFiles, None, &oracle);
        assert!(result.file_integrity.is_fail());
        assert!(!result.aggregate(false));
    }

    #[test]
    fn ethereum_witness_without_rpc_key_fails_config_missing() {
        let merkle_root = sha3_512_hex(b"shared root");
        let material = WitnessMaterial {
            witness_merkle_root: &merkle_root,
            witness_timestamp: 0,
            witness_network: "sepolia",
            witness_smart_contract_address: None,
            witness_transaction_hash: "0xtx",
            witness_sender_account_address: None,
            witness_merkle_proof: serde_json::json!([merkle_root]),
        };
        let (revision, vhash) = builder::build_witness("tip-hash", TS, &material).unwrap();

        let mut oracle = FixedTransactionOracle::new();
        oracle.insert(
            "sepolia",
            "0xtx",
            TransactionRecord::Ethereum { input_data: encode_ethereum_calldata(&merkle_root).unwrap() },
        );

        // No alchemy_or_rpc_key configured: an Ethereum-network witness must
        // fail closed even though the oracle holds a matching record.
        let config = VerifierConfig::default();
        let result = verify_revision(&revision, &vhash, "tip-hash", &config, &NoExternalFiles, None, &oracle);
        assert!(result.witness.is_fail());

        let mut config_with_key = VerifierConfig::default();
        config_with_key.alchemy_or_rpc_key = Some("test-key".to_string());
        let result = verify_revision(&revision, &vhash, "tip-hash", &config_with_key, &NoExternalFiles, None, &oracle);
        assert_eq!(result.witness, SubResult::Pass);
    }

    #[test]
    fn v1_2_witness_recomputes_domain_hashed_root() {
        let domain_genesis_hash = sha3_512_hex(b"domain genesis");
        let merkle_root = sha3_512_hex(b"tip merkle root");
        let actual_root = aqua_core::legacy::legacy_witness_root(&domain_genesis_hash, &merkle_root);

        let material = WitnessMaterial {
            witness_merkle_root: &merkle_root,
            witness_timestamp: 0,
            witness_network: "nostr",
            witness_smart_contract_address: None,
            witness_transaction_hash: "event-id",
            witness_sender_account_address: None,
            witness_merkle_proof: serde_json::json!([merkle_root]),
        };
        let (revision, vhash) = builder::build_witness("tip-hash", TS, &material).unwrap();
        let mut fields = revision.into_fields();
        fields.insert("domain_genesis_hash".to_string(), serde_json::Value::String(domain_genesis_hash));
        let revision = aqua_core::revision::Revision::from_fields(fields);

        let mut oracle = FixedTransactionOracle::new();
        oracle.insert("nostr", "event-id", TransactionRecord::Nostr { event_content: actual_root });

        let mut config = VerifierConfig::default();
        config.schema_version = SchemaVersion::V1_2;
        let result = verify_revision(&revision, &vhash, "tip-hash", &config, &NoExternalFiles, None, &oracle);
        assert_eq!(result.witness, SubResult::Pass);
    }

    #[test]
    fn eip191_signature_round_trips_through_verifier() {
        let signing_key = SigningKey::from_bytes(&[0x11u8; 32].into()).unwrap();
        let message = aqua_core::legacy::current_signature_message("tip-hash");
        let signature_bytes = sign(&signing_key, &message);
        let address = crate::signature::recover_eip191_address(&message, &signature_bytes).unwrap();

        let (revision, vhash) = builder::build_signature(
            "tip-hash",
            TS,
            &hex::encode(&signature_bytes),
            "unused",
            &address,
            "ethereum:eip-191",
        )
        .unwrap();

        let config = VerifierConfig::default();
        let oracle = FixedTransactionOracle::new();
        let result = verify_revision(&revision, &vhash, "tip-hash", &config, &NoExternalFiles, None, &oracle);
        assert_eq!(result.signature, SubResult::Pass);
    }

    fn sign(signing_key: &SigningKey, message: &str) -> Vec<u8> {
        let digest = {
            use sha3::{Digest, Keccak256};
            let prefix = format!("\x19Ethereum Signed Message:\n{}", message.len());
            let mut hasher = Keccak256::new();
            hasher.update(prefix.as_bytes());
            hasher.update(message.as_bytes());
            let out: [u8; 32] = hasher.finalize().into();
            out
        };
        let (sig, recid): (EcdsaSignature, RecoveryId) = signing_key.sign_prehash_recoverable(&digest).unwrap();
        let mut out = sig.to_bytes().to_vec();
        out.push(recid.to_byte());
        out
    }
}
