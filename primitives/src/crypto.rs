//! Hashing and signature helpers.
//!
//! - SHA-256 for block header hashing
//! - BLAKE3 for transaction hashes and the transaction root
//! - Ed25519 for transaction signatures
//!
//! All operations are deterministic with no randomization.

use crate::types::Hash;

/// Compute BLAKE3 hash of the input data.
pub fn hash_blake3(data: &[u8]) -> Hash {
    *blake3::hash(data).as_bytes()
}

/// Compute SHA-256 hash of the input data.
pub fn hash_sha256(data: &[u8]) -> Hash {
    use sha2::Digest;
    let result = sha2::Sha256::digest(data);
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Verify an Ed25519 signature.
///
/// Returns `true` if the signature is valid for the given message and
/// public key, `false` otherwise (including malformed keys).
pub fn verify_ed25519(message: &[u8], signature: &[u8; 64], public_key: &[u8; 32]) -> bool {
    use ed25519_dalek::{Signature, VerifyingKey, Verifier};

    let Ok(verifying_key) = VerifyingKey::from_bytes(public_key) else {
        return false;
    };
    let sig = Signature::from_bytes(signature);
    verifying_key.verify(message, &sig).is_ok()
}

/// Sign a message with an Ed25519 private key.
///
/// Used by wallets and tests; the engine only ever verifies.
#[cfg(feature = "std")]
pub fn sign_ed25519(message: &[u8], secret_key: &ed25519_dalek::SigningKey) -> [u8; 64] {
    use ed25519_dalek::Signer;
    let sig = secret_key.sign(message);
    sig.to_bytes()
}
