//! Integration coverage for multi-chain witnessing against an in-memory
//! backend fake (§8 property 5, scenario S4).

use aqua_core::chain::AquaObject;
use aqua_core::hash::sha3_512_hex;
use aqua_core::merkle;
use aqua_witness::backend::InMemoryWitnessBackend;
use aqua_witness::coordinator::witness_chains;

const TS: &str = "20240101000000";

fn genesis(seed: &str) -> AquaObject {
    let file_hash = sha3_512_hex(seed.as_bytes());
    AquaObject::genesis_file(TS, &file_hash, "nonce", None, &format!("{seed}.txt")).unwrap()
}

#[test]
fn three_chain_witness_each_proof_is_independently_sound() {
    let mut a = genesis("a");
    let mut b = genesis("b");
    let mut c = genesis("c");
    let tips: Vec<String> =
        [&a, &b, &c].iter().map(|chain| chain.tip().verification_hash.clone()).collect();
    let expected_root = merkle::build_root(&tips).unwrap();

    let backend = InMemoryWitnessBackend::ethereum_sepolia("0xcontract");
    let mut chains: Vec<&mut AquaObject> = vec![&mut a, &mut b, &mut c];
    let appended = witness_chains(&mut chains, TS, &backend).unwrap();

    assert_eq!(appended.len(), 3);
    for entry in &appended {
        assert_eq!(entry.revision.witness_merkle_root(), Some(expected_root.as_str()));
    }

    // §8 property 5: each chain's own proof verifies against the shared root,
    // and a hash that never participated in the witness does not.
    let proof_a = merkle::build_proof(&tips, 0).unwrap();
    assert!(merkle::verify_proof(&tips[0], &proof_a, &expected_root));
    let non_participant = sha3_512_hex(b"not-in-this-witness");
    assert!(!merkle::verify_proof(&non_participant, &proof_a, &expected_root));
}
