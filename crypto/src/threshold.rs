//! BLS12-381 threshold-share signing and aggregation (min_pk: public keys on
//! G1, signatures on G2).

use blst::min_pk::{AggregatePublicKey, AggregateSignature, PublicKey, SecretKey, Signature};
use blst::BLST_ERROR;

use crate::CryptoError;

/// Domain separation tag for BLS signatures on G2 with SHA-256 hash-to-curve.
const BLS_DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_NUL_";

/// Produce one signer's share over `message`, hex-encoded.
pub fn sign_share(message: &[u8], secret: &SecretKey) -> String {
    hex::encode(secret.sign(message, BLS_DST, &[]).to_bytes())
}

/// Verify a single hex-encoded share against its signer's public key.
pub fn verify_share(
    message: &[u8],
    share_hex: &str,
    public_key: &PublicKey,
) -> Result<(), CryptoError> {
    let sig = decode_signature(share_hex)?;
    match sig.verify(true, message, BLS_DST, &[], public_key, true) {
        BLST_ERROR::BLST_SUCCESS => Ok(()),
        err => Err(CryptoError::InvalidSignature(format!(
            "BLS share verification: {err:?}"
        ))),
    }
}

/// Aggregate hex-encoded shares into a single threshold signature.
///
/// The caller is responsible for verifying each share individually first and
/// for enforcing the quorum size.
pub fn aggregate_shares(share_hexes: &[String]) -> Result<String, CryptoError> {
    if share_hexes.is_empty() {
        return Err(CryptoError::InsufficientShares { have: 0, need: 1 });
    }
    let sigs: Vec<Signature> = share_hexes
        .iter()
        .map(|s| decode_signature(s))
        .collect::<Result<_, _>>()?;
    let refs: Vec<&Signature> = sigs.iter().collect();
    let agg = AggregateSignature::aggregate(&refs, true)
        .map_err(|e| CryptoError::InvalidSignature(format!("BLS aggregation: {e:?}")))?;
    Ok(hex::encode(agg.to_signature().to_bytes()))
}

/// Verify an aggregated threshold signature over `message` against the
/// public keys of every contributing signer.
pub fn verify_aggregate(
    message: &[u8],
    aggregate_hex: &str,
    public_keys: &[&PublicKey],
) -> Result<(), CryptoError> {
    if public_keys.is_empty() {
        return Err(CryptoError::InsufficientShares { have: 0, need: 1 });
    }
    let sig = decode_signature(aggregate_hex)?;
    let agg_pk = AggregatePublicKey::aggregate(public_keys, true)
        .map_err(|e| CryptoError::InvalidKey(format!("G1 aggregation: {e:?}")))?;
    match sig.verify(true, message, BLS_DST, &[], &agg_pk.to_public_key(), false) {
        BLST_ERROR::BLST_SUCCESS => Ok(()),
        err => Err(CryptoError::InvalidSignature(format!(
            "BLS aggregate verification: {err:?}"
        ))),
    }
}

fn decode_signature(sig_hex: &str) -> Result<Signature, CryptoError> {
    let bytes =
        hex::decode(sig_hex).map_err(|e| CryptoError::InvalidEncoding(format!("hex: {e}")))?;
    Signature::from_bytes(&bytes)
        .map_err(|e| CryptoError::InvalidEncoding(format!("G2 point: {e:?}")))
}
