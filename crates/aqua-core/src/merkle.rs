//! Deterministic Merkle tree over SHA3-512 leaf hashes.
//!
//! Used both for Merkle-mode revisions (§4.B) and for the multi-chain witness
//! tip tree (§4.D). Odd-leaf handling follows the Open Question resolved in
//! spec §9: an odd leaf at any level is **promoted unchanged** to the next
//! level, never duplicated. Proof traversal (§4.E.5.c) mirrors this: a sibling
//! slot that is empty means the running hash carries forward unchanged.

use crate::errors::{AquaError, AquaResult};
use crate::hash::sha3_512_hex;

/// One step of a Merkle inclusion proof, from leaf toward root.
///
/// `left`/`right` mirror the wire shape in §3 (`witness_merkle_proof` as a
/// list of intermediate-node records): exactly one of them is the hash being
/// proven (or `None` when this leaf was promoted unchanged at this level),
/// and `successor` is the hash of this step's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProofStep {
    pub left_leaf: Option<String>,
    pub right_leaf: Option<String>,
    pub successor: String,
}

/// Build the Merkle root over `leaves` (hex-encoded SHA3-512 hashes), in
/// insertion order. Returns `AquaError::Hashing` for an empty leaf set.
pub fn build_root(leaves: &[String]) -> AquaResult<String> {
    if leaves.is_empty() {
        return Err(AquaError::hashing("cannot compute Merkle root of empty leaf set"));
    }
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        level = parent_level(&level);
    }
    Ok(level.into_iter().next().expect("non-empty level"))
}

/// Build the inclusion proof for `leaves[index]`: the sequence of steps from
/// the leaf to the root, usable with [`verify_proof`].
pub fn build_proof(leaves: &[String], index: usize) -> AquaResult<Vec<MerkleProofStep>> {
    if leaves.is_empty() {
        return Err(AquaError::hashing("cannot build a Merkle proof over an empty leaf set"));
    }
    if index >= leaves.len() {
        return Err(AquaError::invalid_argument(format!(
            "leaf index {index} out of range for {} leaves",
            leaves.len()
        )));
    }

    let mut level = leaves.to_vec();
    let mut idx = index;
    let mut steps = Vec::new();

    while level.len() > 1 {
        let mut i = 0;
        while i < level.len() {
            let left = level[i].clone();
            let right = if i + 1 < level.len() { Some(level[i + 1].clone()) } else { None };

            if i == idx || i + 1 == idx {
                steps.push(MerkleProofStep {
                    left_leaf: Some(left.clone()),
                    right_leaf: right.clone(),
                    successor: successor_of(&left, right.as_deref()),
                });
            }
            i += 2;
        }

        level = parent_level(&level);
        idx /= 2;
    }

    Ok(steps)
}

/// Verify that `leaf` traverses `proof` to `expected_root`, per §4.E.5.c:
/// at each step, the running successor (the leaf itself at step 0) must
/// appear as either `left_leaf` or `right_leaf`; an absent sibling means the
/// running hash carries forward unchanged.
pub fn verify_proof(leaf: &str, proof: &[MerkleProofStep], expected_root: &str) -> bool {
    let mut current = leaf.to_string();

    for step in proof {
        let matches_left = step.left_leaf.as_deref() == Some(current.as_str());
        let matches_right = step.right_leaf.as_deref() == Some(current.as_str());
        if !matches_left && !matches_right {
            return false;
        }

        let recomputed = successor_of(
            step.left_leaf.as_deref().unwrap_or(&current),
            step.right_leaf.as_deref(),
        );
        if recomputed != step.successor {
            return false;
        }
        current = step.successor.clone();
    }

    current.eq_ignore_ascii_case(expected_root)
}

fn parent_level(level: &[String]) -> Vec<String> {
    let mut next = Vec::with_capacity((level.len() + 1) / 2);
    let mut i = 0;
    while i < level.len() {
        let left = &level[i];
        let right = level.get(i + 1);
        next.push(successor_of(left, right.map(String::as_str)));
        i += 2;
    }
    next
}

/// `sha3_512(left || right)`, or `left` unchanged when `right` is absent
/// (odd-leaf promotion, per spec §9).
fn successor_of(left: &str, right: Option<&str>) -> String {
    match right {
        Some(r) => {
            let mut preimage = String::with_capacity(left.len() + r.len());
            preimage.push_str(left);
            preimage.push_str(r);
            sha3_512_hex(preimage.as_bytes())
        }
        None => left.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(n: usize) -> Vec<String> {
        (0..n).map(|i| sha3_512_hex(format!("leaf-{i}").as_bytes())).collect()
    }

    #[test]
    fn single_leaf_root_is_the_leaf() {
        let ls = leaves(1);
        assert_eq!(build_root(&ls).unwrap(), ls[0]);
    }

    #[test]
    fn two_leaves_root_is_hash_of_concat() {
        let ls = leaves(2);
        let expected = successor_of(&ls[0], Some(&ls[1]));
        assert_eq!(build_root(&ls).unwrap(), expected);
    }

    #[test]
    fn odd_leaf_count_promotes_without_duplication() {
        let ls = leaves(3);
        // level 0: [l0, l1, l2] -> level 1: [h(l0,l1), l2] -> root: h(h(l0,l1), l2)
        let h01 = successor_of(&ls[0], Some(&ls[1]));
        let expected = successor_of(&h01, Some(&ls[2]));
        assert_eq!(build_root(&ls).unwrap(), expected);
    }

    #[test]
    fn determinism() {
        let ls = leaves(5);
        assert_eq!(build_root(&ls).unwrap(), build_root(&ls).unwrap());
    }

    #[test]
    fn proof_roundtrips_for_every_leaf() {
        let ls = leaves(5);
        let root = build_root(&ls).unwrap();
        for (i, leaf) in ls.iter().enumerate() {
            let proof = build_proof(&ls, i).unwrap();
            assert!(verify_proof(leaf, &proof, &root), "leaf {i} failed to verify");
        }
    }

    #[test]
    fn proof_fails_for_wrong_leaf() {
        let ls = leaves(4);
        let root = build_root(&ls).unwrap();
        let proof = build_proof(&ls, 0).unwrap();
        assert!(!verify_proof(&ls[1], &proof, &root));
    }

    #[test]
    fn empty_leaves_is_an_error() {
        assert!(build_root(&[]).is_err());
        assert!(build_proof(&[], 0).is_err());
    }

    #[test]
    fn two_chain_witness_proof_is_single_sibling() {
        // S4: root = sha3_512(tA || tB), each chain's proof is [sibling].
        let t_a = sha3_512_hex(b"chain-a-tip");
        let t_b = sha3_512_hex(b"chain-b-tip");
        let leaves = vec![t_a.clone(), t_b.clone()];
        let root = build_root(&leaves).unwrap();
        assert_eq!(root, successor_of(&t_a, Some(&t_b)));

        let proof_a = build_proof(&leaves, 0).unwrap();
        assert_eq!(proof_a.len(), 1);
        assert!(verify_proof(&t_a, &proof_a, &root));

        let proof_b = build_proof(&leaves, 1).unwrap();
        assert_eq!(proof_b.len(), 1);
        assert!(verify_proof(&t_b, &proof_b, &root));
    }
}
