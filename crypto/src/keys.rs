//! Key generation and derivation helpers.

use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::RngCore;

use crate::CryptoError;

/// Generate a fresh Ed25519 keypair from the OS RNG.
pub fn generate_ed25519_keypair() -> (SigningKey, VerifyingKey) {
    let mut seed = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut seed);
    ed25519_keypair_from_seed(&seed)
}

/// Derive a deterministic Ed25519 keypair from a 32-byte seed.
pub fn ed25519_keypair_from_seed(seed: &[u8; 32]) -> (SigningKey, VerifyingKey) {
    let signing = SigningKey::from_bytes(seed);
    let verifying = signing.verifying_key();
    (signing, verifying)
}

/// Generate a fresh BLS12-381 keypair from the OS RNG.
pub fn generate_bls_keypair() -> (blst::min_pk::SecretKey, blst::min_pk::PublicKey) {
    let mut ikm = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut ikm);
    bls_keypair_from_seed(&ikm).expect("32 bytes of IKM always produce a key")
}

/// Derive a deterministic BLS12-381 keypair from 32 bytes of input key
/// material.
pub fn bls_keypair_from_seed(
    ikm: &[u8; 32],
) -> Result<(blst::min_pk::SecretKey, blst::min_pk::PublicKey), CryptoError> {
    let secret = blst::min_pk::SecretKey::key_gen(ikm, &[])
        .map_err(|e| CryptoError::InvalidKey(format!("BLS key_gen: {e:?}")))?;
    let public = secret.sk_to_pk();
    Ok((secret, public))
}

/// Parse an Ed25519 verifying key from 32 hex-encoded bytes.
pub fn ed25519_public_from_hex(hex_str: &str) -> Result<VerifyingKey, CryptoError> {
    let bytes = hex::decode(hex_str)
        .map_err(|e| CryptoError::InvalidEncoding(format!("Ed25519 public key: {e}")))?;
    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidKey("Ed25519 public key must be 32 bytes".into()))?;
    VerifyingKey::from_bytes(&bytes)
        .map_err(|e| CryptoError::InvalidKey(format!("Ed25519 public key: {e}")))
}

/// Parse a BLS12-381 public key from its 48-byte compressed hex encoding.
pub fn bls_public_from_hex(hex_str: &str) -> Result<blst::min_pk::PublicKey, CryptoError> {
    let bytes = hex::decode(hex_str)
        .map_err(|e| CryptoError::InvalidEncoding(format!("BLS public key: {e}")))?;
    blst::min_pk::PublicKey::from_bytes(&bytes)
        .map_err(|e| CryptoError::InvalidKey(format!("BLS public key: {e:?}")))
}
