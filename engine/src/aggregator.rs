//! Construction of derived objects: signature shares, threshold aggregates,
//! and conflict evidence.

use ctgossip_crypto::CryptoService;
use ctgossip_types::{GossipObject, Phase, SignatureScheme, WireType};

use crate::error::EngineError;
use crate::unix_now_secs;

/// Produce this node's FRAG over an accepted INIT claim: a threshold share
/// over the claim's canonical message, carrying the claim's payload so the
/// fragment is self-contained.
pub fn sign_fragment(
    crypto: &dyn CryptoService,
    init: &GossipObject,
) -> Result<GossipObject, EngineError> {
    if init.wire_type.phase() != Phase::Init {
        return Err(EngineError::NoThresholdPhase(init.wire_type));
    }
    let frag_type = init
        .wire_type
        .frag_variant()
        .ok_or(EngineError::NoThresholdPhase(init.wire_type))?;
    let share = crypto.sign_share(&init.signed_message())?;
    Ok(GossipObject {
        app: init.app.clone(),
        period: init.period.clone(),
        wire_type: frag_type,
        signer: crypto.self_id().to_string(),
        co_signers: Vec::new(),
        signature: share,
        second_signature: None,
        timestamp: unix_now_secs(),
        scheme: SignatureScheme::Bls,
        payload: init.payload.clone(),
    })
}

/// Combine a quorum of fragments into the FULL object.
///
/// All fragments are expected to cover the same identity and message (the
/// store keys them that way). The crypto service re-verifies every share, so
/// a corrupt fragment fails the whole aggregation rather than poisoning it.
pub fn aggregate_fragments(
    crypto: &dyn CryptoService,
    frags: &[GossipObject],
) -> Result<GossipObject, EngineError> {
    let first = frags.first().ok_or(EngineError::NoFragments)?;
    let full_type = first
        .wire_type
        .full_variant()
        .ok_or(EngineError::NoThresholdPhase(first.wire_type))?;
    let message = first.signed_message();
    let shares: Vec<(String, String)> = frags
        .iter()
        .map(|f| (f.signer.clone(), f.signature.clone()))
        .collect();
    let aggregate = crypto.aggregate(&message, &shares)?;
    let mut co_signers: Vec<String> = frags.iter().map(|f| f.signer.clone()).collect();
    co_signers.sort_unstable();
    Ok(GossipObject {
        app: first.app.clone(),
        period: first.period.clone(),
        wire_type: full_type,
        signer: crypto.self_id().to_string(),
        co_signers,
        signature: aggregate,
        second_signature: None,
        timestamp: unix_now_secs(),
        scheme: SignatureScheme::Bls,
        payload: first.payload.clone(),
    })
}

/// Synthesize conflict evidence from two contradictory claims by the same
/// signer for the same identity.
///
/// The evidence carries both complete signed messages and both signatures, so
/// any receiver can check it against the accused signer's public key alone.
pub fn build_conflict(
    first: &GossipObject,
    second: &GossipObject,
) -> Result<GossipObject, EngineError> {
    if first.wire_type != second.wire_type
        || first.wire_type.phase() != Phase::Init
        || first.wire_type == WireType::ConInit
    {
        return Err(EngineError::InvalidEvidence(
            "evidence must pair two plain claims of the same type",
        ));
    }
    if first.object_id() != second.object_id() {
        return Err(EngineError::InvalidEvidence(
            "claims describe different identities",
        ));
    }
    if first.signer != second.signer {
        return Err(EngineError::InvalidEvidence(
            "claims come from different signers",
        ));
    }
    if first.signature == second.signature {
        return Err(EngineError::InvalidEvidence(
            "claims carry the same signature",
        ));
    }
    Ok(GossipObject {
        app: first.app.clone(),
        period: first.period.clone(),
        wire_type: WireType::ConInit,
        signer: first.signer.clone(),
        co_signers: Vec::new(),
        signature: first.signature.clone(),
        second_signature: Some(second.signature.clone()),
        timestamp: unix_now_secs(),
        scheme: first.scheme,
        payload: [
            first.signer.clone(),
            first.payload.join("\0"),
            second.payload.join("\0"),
        ],
    })
}
