//! The Witness Coordinator (component D, §4.D).
//!
//! Aggregates the tip hashes of N chains into a Merkle tree, publishes the
//! root through a [`crate::backend::WitnessBackend`], and appends a
//! `witness` revision to each participating chain carrying that chain's own
//! inclusion proof.

use aqua_core::builder::WitnessMaterial;
use aqua_core::chain::{AquaObject, ChainEntry};
use aqua_core::merkle::{self, MerkleProofStep};

use crate::backend::{WitnessBackend, WitnessNetwork};
use crate::errors::{WitnessError, WitnessResult};

fn proof_step_to_json(step: &MerkleProofStep) -> serde_json::Value {
    serde_json::json!({
        "left_leaf": step.left_leaf,
        "right_leaf": step.right_leaf,
        "successor": step.successor,
    })
}

fn network_label(network: WitnessNetwork) -> &'static str {
    network.as_str()
}

/// Witness N ≥ 1 chains together at a single point in time. `chains` and
/// `local_timestamp` are the same length; each chain gets a `witness`
/// revision parented at its own current tip.
///
/// Single-chain witnessing (n=1) is the degenerate case: the root equals the
/// sole tip and its proof is the bare one-element list `[tip_hash]` (§4.D).
pub fn witness_chains(
    chains: &mut [&mut AquaObject],
    local_timestamp: &str,
    backend: &dyn WitnessBackend,
) -> WitnessResult<Vec<ChainEntry>> {
    if chains.is_empty() {
        return Err(WitnessError::Core(aqua_core::AquaError::invalid_argument(
            "witness_chains requires at least one chain",
        )));
    }

    let tips: Vec<String> = chains.iter().map(|c| c.tip().verification_hash.clone()).collect();
    let root = merkle::build_root(&tips)?;
    let receipt = backend.publish(&root)?;

    let mut appended = Vec::with_capacity(chains.len());
    for (i, chain) in chains.iter_mut().enumerate() {
        let proof_json = if tips.len() == 1 {
            serde_json::Value::Array(vec![serde_json::Value::String(tips[0].clone())])
        } else {
            let steps = merkle::build_proof(&tips, i)?;
            serde_json::Value::Array(steps.iter().map(proof_step_to_json).collect())
        };

        let material = WitnessMaterial {
            witness_merkle_root: &root,
            witness_timestamp: receipt.timestamp,
            witness_network: network_label(receipt.network),
            witness_smart_contract_address: receipt.smart_contract_address.as_deref(),
            witness_transaction_hash: &receipt.transaction_hash,
            witness_sender_account_address: Some(receipt.publisher.as_str()),
            witness_merkle_proof: proof_json,
        };

        let entry = chain.append_witness(local_timestamp, &material)?.clone();
        appended.push(entry);
    }

    Ok(appended)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryWitnessBackend;
    use aqua_core::hash::sha3_512_hex;

    const TS: &str = "20240101000000";

    fn chain(seed: &str) -> AquaObject {
        let file_hash = sha3_512_hex(seed.as_bytes());
        AquaObject::genesis_file(TS, &file_hash, "nonce", None, "doc.txt").unwrap()
    }

    #[test]
    fn single_chain_witness_proof_is_bare_tip() {
        let mut a = chain("a");
        let backend = InMemoryWitnessBackend::ethereum_sepolia("0xcontract");
        let tip_before = a.tip().verification_hash.clone();

        let mut chains: Vec<&mut AquaObject> = vec![&mut a];
        let appended = witness_chains(&mut chains, TS, &backend).unwrap();

        assert_eq!(appended.len(), 1);
        let witness_revision = &appended[0].revision;
        assert_eq!(witness_revision.witness_merkle_root(), Some(tip_before.as_str()));
        let proof = witness_revision.witness_merkle_proof().unwrap().as_array().unwrap();
        assert_eq!(proof.len(), 1);
        assert_eq!(proof[0].as_str(), Some(tip_before.as_str()));
    }

    #[test]
    fn two_chain_witness_both_verify_against_shared_root() {
        let mut a = chain("a");
        let mut b = chain("b");
        let tip_a = a.tip().verification_hash.clone();
        let tip_b = b.tip().verification_hash.clone();
        let expected_root = merkle::build_root(&[tip_a.clone(), tip_b.clone()]).unwrap();

        let backend = InMemoryWitnessBackend::ethereum_sepolia("0xcontract");
        let mut chains: Vec<&mut AquaObject> = vec![&mut a, &mut b];
        let appended = witness_chains(&mut chains, TS, &backend).unwrap();

        assert_eq!(appended.len(), 2);
        for entry in &appended {
            assert_eq!(entry.revision.witness_merkle_root(), Some(expected_root.as_str()));
        }

        let proof_a: Vec<MerkleProofStep> = appended[0]
            .revision
            .witness_merkle_proof()
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|v| MerkleProofStep {
                left_leaf: v["left_leaf"].as_str().map(str::to_string),
                right_leaf: v["right_leaf"].as_str().map(str::to_string),
                successor: v["successor"].as_str().unwrap().to_string(),
            })
            .collect();
        assert_eq!(proof_a.len(), 1);
        assert!(merkle::verify_proof(&tip_a, &proof_a, &expected_root));
    }
}
