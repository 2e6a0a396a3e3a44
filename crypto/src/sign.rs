//! Ed25519 signing and verification for single-authority claims.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};

/// Sign a message, returning the signature hex-encoded for the wire.
pub fn sign_message(message: &[u8], signing_key: &SigningKey) -> String {
    hex::encode(signing_key.sign(message).to_bytes())
}

/// Verify a hex-encoded signature against a message and public key.
///
/// Returns `true` only for a well-formed, valid signature.
pub fn verify_signature(message: &[u8], signature_hex: &str, public_key: &VerifyingKey) -> bool {
    let Ok(bytes) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(bytes) = <[u8; 64]>::try_from(bytes) else {
        return false;
    };
    let sig = ed25519_dalek::Signature::from_bytes(&bytes);
    public_key.verify(message, &sig).is_ok()
}
