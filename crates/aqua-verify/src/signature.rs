//! Signature verification for the two supported schemes (§3, §4.E.4):
//! `ethereum:eip-191` (ECDSA secp256k1 recovery) and `did:key` (detached JWS
//! over Ed25519).

use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, VerifyingKey};
use sha3::{Digest, Keccak256};

/// `keccak256("\x19Ethereum Signed Message:\n" || len(message) || message)`,
/// the EIP-191 personal-sign digest.
fn eip191_digest(message: &str) -> [u8; 32] {
    let prefix = format!("\x19Ethereum Signed Message:\n{}", message.len());
    let mut hasher = Keccak256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(message.as_bytes());
    hasher.finalize().into()
}

/// The last 20 bytes of `keccak256(uncompressed_pubkey[1..])`, hex-encoded
/// with a `0x` prefix — the canonical Ethereum address derivation.
fn address_from_verifying_key(key: &VerifyingKey) -> String {
    let encoded = key.to_encoded_point(false);
    let pubkey_bytes = &encoded.as_bytes()[1..];
    let mut hasher = Keccak256::new();
    hasher.update(pubkey_bytes);
    let digest = hasher.finalize();
    format!("0x{}", hex::encode(&digest[12..]))
}

/// Recover the Ethereum address that produced `signature_bytes` over
/// `message`, per EIP-191. `signature_bytes` is 65 bytes: `r || s || v`,
/// with `v` either `{0,1}` or `{27,28}`.
pub fn recover_eip191_address(message: &str, signature_bytes: &[u8]) -> Option<String> {
    if signature_bytes.len() != 65 {
        return None;
    }
    let (rs, v_byte) = signature_bytes.split_at(64);
    let recovery_byte = match v_byte[0] {
        0 | 1 => v_byte[0],
        27 | 28 => v_byte[0] - 27,
        _ => return None,
    };
    let recovery_id = RecoveryId::from_byte(recovery_byte)?;
    let signature = EcdsaSignature::from_slice(rs).ok()?;
    let digest = eip191_digest(message);
    let key = VerifyingKey::recover_from_prehash(&digest, &signature, recovery_id).ok()?;
    Some(address_from_verifying_key(&key))
}

/// Verify an EIP-191 signature PASSes iff the recovered address matches
/// `expected_wallet_address` (case-insensitive, §4.E.4).
pub fn verify_eip191(message: &str, signature_bytes: &[u8], expected_wallet_address: &str) -> bool {
    match recover_eip191_address(message, signature_bytes) {
        Some(recovered) => recovered.eq_ignore_ascii_case(expected_wallet_address),
        None => false,
    }
}

/// Decode a `did:key` identifier into its raw Ed25519 public key bytes.
/// `did:key` multibase-encodes a multicodec-prefixed key: `z` (base58btc)
/// followed by the varint prefix `0xed01` for Ed25519, then 32 key bytes.
pub fn decode_did_key_ed25519(did: &str) -> Option<[u8; 32]> {
    let multibase = did.strip_prefix("did:key:")?;
    let encoded = multibase.strip_prefix('z')?;
    let decoded = bs58::decode(encoded).into_vec().ok()?;
    if decoded.len() != 34 || decoded[0] != 0xed || decoded[1] != 0x01 {
        return None;
    }
    let mut key = [0u8; 32];
    key.copy_from_slice(&decoded[2..]);
    Some(key)
}

/// Verify a detached-payload Ed25519 signature against a `did:key` public
/// key, per §4.E.4 "For `did:key` signatures, verify the JWS against the
/// embedded public key instead." `signature_bytes` is the raw 64-byte
/// Ed25519 signature over `message`.
pub fn verify_did_key_ed25519(did: &str, message: &[u8], signature_bytes: &[u8]) -> bool {
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};

    let Some(key_bytes) = decode_did_key_ed25519(did) else { return false };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&key_bytes) else { return false };
    let Ok(sig_bytes): Result<[u8; 64], _> = signature_bytes.try_into() else { return false };
    let signature = Signature::from_bytes(&sig_bytes);
    verifying_key.verify(message, &signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;

    fn sign_eip191(signing_key: &SigningKey, message: &str) -> Vec<u8> {
        let digest = eip191_digest(message);
        let (sig, recid): (EcdsaSignature, RecoveryId) =
            signing_key.sign_prehash_recoverable(&digest).unwrap();
        let mut out = sig.to_bytes().to_vec();
        out.push(recid.to_byte());
        out
    }

    #[test]
    fn eip191_roundtrip_recovers_signer_address() {
        let signing_key = SigningKey::from_bytes(&[0x11u8; 32].into()).unwrap();
        let verifying_key = VerifyingKey::from(&signing_key);
        let address = address_from_verifying_key(&verifying_key);

        let message = "I sign this revision: [deadbeef]";
        let signature = sign_eip191(&signing_key, message);

        assert!(verify_eip191(message, &signature, &address));
        assert!(verify_eip191(message, &signature, &address.to_uppercase().replace("0X", "0x")));
    }

    #[test]
    fn eip191_rejects_tampered_address() {
        let signing_key = SigningKey::from_bytes(&[0x22u8; 32].into()).unwrap();
        let message = "I sign this revision: [deadbeef]";
        let signature = sign_eip191(&signing_key, message);
        assert!(!verify_eip191(message, &signature, "0x0000000000000000000000000000000000dEaD"));
    }

    #[test]
    fn did_key_ed25519_roundtrip() {
        use ed25519_dalek::{Signer, SigningKey};

        let signing_key = SigningKey::from_bytes(&[0x33u8; 32]);
        let verifying_key = signing_key.verifying_key();

        let mut multicodec = vec![0xedu8, 0x01];
        multicodec.extend_from_slice(verifying_key.as_bytes());
        let did = format!("did:key:z{}", bs58::encode(&multicodec).into_string());

        let message = b"I sign this revision: [deadbeef]";
        let signature = signing_key.sign(message);

        assert!(verify_did_key_ed25519(&did, message, &signature.to_bytes()));
        assert!(!verify_did_key_ed25519(&did, b"tampered", &signature.to_bytes()));
    }
}
