//! The opaque crypto collaborator consumed by the gossip core.

use std::collections::{BTreeSet, HashMap};

use blst::min_pk::{PublicKey, SecretKey};
use ed25519_dalek::VerifyingKey;

use ctgossip_types::{GossipObject, Phase, SignatureScheme, ThresholdParams, WireType};

use crate::error::CryptoError;
use crate::sign::verify_signature;
use crate::threshold::{aggregate_shares, sign_share, verify_aggregate, verify_share};

/// Crypto operations the gossip core depends on. The core never inspects key
/// material directly; it hands objects and messages to this service.
pub trait CryptoService: Send + Sync {
    /// This node's signer identity (its gossiper URL).
    fn self_id(&self) -> &str;

    /// Verify an object's signature(s) against its declared signer,
    /// dispatching on the object's crypto-scheme tag.
    fn verify(&self, obj: &GossipObject) -> Result<(), CryptoError>;

    /// Produce this node's threshold-signature share over `message`.
    fn sign_share(&self, message: &[u8]) -> Result<String, CryptoError>;

    /// Verify `(signer, share)` pairs individually and aggregate them into a
    /// threshold signature over `message`. Fails without producing a partial
    /// result if any share is invalid or the quorum is short.
    fn aggregate(
        &self,
        message: &[u8],
        shares: &[(String, String)],
    ) -> Result<String, CryptoError>;
}

/// Key material for one gossiper: its own BLS secret, the Ed25519 keys of the
/// authorities whose claims it accepts, and the BLS public keys of every
/// gossiper in the deployment.
///
/// Read-only after construction; requires no locking.
pub struct Keyring {
    self_url: String,
    params: ThresholdParams,
    bls_secret: SecretKey,
    authority_keys: HashMap<String, VerifyingKey>,
    gossiper_keys: HashMap<String, PublicKey>,
}

impl Keyring {
    pub fn new(self_url: impl Into<String>, params: ThresholdParams, bls_secret: SecretKey) -> Self {
        Self {
            self_url: self_url.into(),
            params,
            bls_secret,
            authority_keys: HashMap::new(),
            gossiper_keys: HashMap::new(),
        }
    }

    /// Register an authority's (CA or log server) Ed25519 verifying key.
    pub fn with_authority(mut self, url: impl Into<String>, key: VerifyingKey) -> Self {
        self.authority_keys.insert(url.into(), key);
        self
    }

    /// Register a gossiper's BLS public key (including this node's own).
    pub fn with_gossiper(mut self, url: impl Into<String>, key: PublicKey) -> Self {
        self.gossiper_keys.insert(url.into(), key);
        self
    }

    pub fn params(&self) -> ThresholdParams {
        self.params
    }

    fn authority_key(&self, signer: &str) -> Result<&VerifyingKey, CryptoError> {
        self.authority_keys
            .get(signer)
            .ok_or_else(|| CryptoError::UnknownSigner(signer.to_string()))
    }

    fn gossiper_key(&self, signer: &str) -> Result<&PublicKey, CryptoError> {
        self.gossiper_keys
            .get(signer)
            .ok_or_else(|| CryptoError::UnknownSigner(signer.to_string()))
    }

    /// Verify conflict evidence: both signatures must come from the accused
    /// signer's key, each over its own payload slot, and must differ.
    fn verify_conflict(&self, obj: &GossipObject) -> Result<(), CryptoError> {
        let key = self.authority_key(&obj.signer)?;
        let second = obj
            .second_signature
            .as_deref()
            .ok_or_else(|| CryptoError::IncompleteEvidence("missing second signature".into()))?;
        if obj.signature == second {
            return Err(CryptoError::IncompleteEvidence(
                "conflicting signatures are identical".into(),
            ));
        }
        if !verify_signature(obj.payload[1].as_bytes(), &obj.signature, key) {
            return Err(CryptoError::InvalidSignature(
                "first conflicting signature".into(),
            ));
        }
        if !verify_signature(obj.payload[2].as_bytes(), second, key) {
            return Err(CryptoError::InvalidSignature(
                "second conflicting signature".into(),
            ));
        }
        Ok(())
    }
}

impl CryptoService for Keyring {
    fn self_id(&self) -> &str {
        &self.self_url
    }

    fn verify(&self, obj: &GossipObject) -> Result<(), CryptoError> {
        match obj.scheme {
            SignatureScheme::Ed25519 if obj.wire_type == WireType::ConInit => {
                self.verify_conflict(obj)
            }
            SignatureScheme::Ed25519 => {
                let key = self.authority_key(&obj.signer)?;
                if verify_signature(&obj.signed_message(), &obj.signature, key) {
                    Ok(())
                } else {
                    Err(CryptoError::InvalidSignature(format!(
                        "{} claim from {}",
                        obj.wire_type, obj.signer
                    )))
                }
            }
            SignatureScheme::Bls => match obj.wire_type.phase() {
                Phase::Frag => {
                    let key = self.gossiper_key(&obj.signer)?;
                    verify_share(&obj.signed_message(), &obj.signature, key)
                }
                Phase::Full => {
                    let distinct: BTreeSet<&String> = obj.co_signers.iter().collect();
                    if distinct.len() < self.params.threshold {
                        return Err(CryptoError::InsufficientShares {
                            have: distinct.len(),
                            need: self.params.threshold,
                        });
                    }
                    let keys: Vec<&PublicKey> = distinct
                        .into_iter()
                        .map(|s| self.gossiper_key(s))
                        .collect::<Result<_, _>>()?;
                    verify_aggregate(&obj.signed_message(), &obj.signature, &keys)
                }
                Phase::Init => Err(CryptoError::InvalidSignature(
                    "BLS scheme is not valid for INIT objects".into(),
                )),
            },
        }
    }

    fn sign_share(&self, message: &[u8]) -> Result<String, CryptoError> {
        Ok(sign_share(message, &self.bls_secret))
    }

    fn aggregate(
        &self,
        message: &[u8],
        shares: &[(String, String)],
    ) -> Result<String, CryptoError> {
        let mut seen = BTreeSet::new();
        let mut unique = Vec::new();
        for (signer, share) in shares {
            if seen.insert(signer.as_str()) {
                unique.push((signer, share));
            }
        }
        if unique.len() < self.params.threshold {
            return Err(CryptoError::InsufficientShares {
                have: unique.len(),
                need: self.params.threshold,
            });
        }
        for (signer, share) in &unique {
            verify_share(message, share, self.gossiper_key(signer)?)?;
        }
        let hexes: Vec<String> = unique.iter().map(|(_, s)| (*s).clone()).collect();
        aggregate_shares(&hexes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{bls_keypair_from_seed, ed25519_keypair_from_seed};
    use crate::sign::sign_message;

    const LOG: &str = "https://log.example";
    const G1: &str = "https://gossiper-1.example";
    const G2: &str = "https://gossiper-2.example";

    fn keyring() -> (Keyring, ed25519_dalek::SigningKey, SecretKey, SecretKey) {
        let (log_sk, log_pk) = ed25519_keypair_from_seed(&[1u8; 32]);
        let (g1_sk, g1_pk) = bls_keypair_from_seed(&[2u8; 32]).unwrap();
        let (g2_sk, g2_pk) = bls_keypair_from_seed(&[3u8; 32]).unwrap();
        let params = ThresholdParams::new(2, 2).unwrap();
        let ring_sk = bls_keypair_from_seed(&[2u8; 32]).unwrap().0;
        let ring = Keyring::new(G1, params, ring_sk)
            .with_authority(LOG, log_pk)
            .with_gossiper(G1, g1_pk)
            .with_gossiper(G2, g2_pk);
        (ring, log_sk, g1_sk, g2_sk)
    }

    fn init_obj(log_sk: &ed25519_dalek::SigningKey, content: &str) -> GossipObject {
        let mut obj = GossipObject {
            app: "ct".into(),
            period: "p1".into(),
            wire_type: WireType::SthInit,
            signer: LOG.into(),
            co_signers: Vec::new(),
            signature: String::new(),
            second_signature: None,
            timestamp: 1,
            scheme: SignatureScheme::Ed25519,
            payload: [LOG.into(), content.into(), String::new()],
        };
        obj.signature = sign_message(&obj.signed_message(), log_sk);
        obj
    }

    #[test]
    fn verifies_valid_init_claim() {
        let (ring, log_sk, _, _) = keyring();
        let obj = init_obj(&log_sk, "head-1");
        assert!(ring.verify(&obj).is_ok());
    }

    #[test]
    fn rejects_tampered_init_claim() {
        let (ring, log_sk, _, _) = keyring();
        let mut obj = init_obj(&log_sk, "head-1");
        obj.payload[1] = "head-tampered".into();
        assert!(ring.verify(&obj).is_err());
    }

    #[test]
    fn rejects_unknown_authority() {
        let (ring, log_sk, _, _) = keyring();
        let mut obj = init_obj(&log_sk, "head-1");
        obj.signer = "https://stranger.example".into();
        assert!(matches!(
            ring.verify(&obj),
            Err(CryptoError::UnknownSigner(_))
        ));
    }

    #[test]
    fn verifies_share_and_aggregate_round() {
        let (ring, log_sk, g1_sk, g2_sk) = keyring();
        let init = init_obj(&log_sk, "head-1");
        let msg = init.signed_message();

        let share1 = sign_share(&msg, &g1_sk);
        let share2 = sign_share(&msg, &g2_sk);

        let mut frag = init.clone();
        frag.wire_type = WireType::SthFrag;
        frag.signer = G1.into();
        frag.scheme = SignatureScheme::Bls;
        frag.signature = share1.clone();
        assert!(ring.verify(&frag).is_ok());

        let agg = ring
            .aggregate(&msg, &[(G1.into(), share1), (G2.into(), share2)])
            .unwrap();

        let mut full = init.clone();
        full.wire_type = WireType::SthFull;
        full.scheme = SignatureScheme::Bls;
        full.signature = agg;
        full.co_signers = vec![G1.into(), G2.into()];
        assert!(ring.verify(&full).is_ok());
    }

    #[test]
    fn aggregate_requires_quorum_of_distinct_signers() {
        let (ring, log_sk, g1_sk, _) = keyring();
        let msg = init_obj(&log_sk, "head-1").signed_message();
        let share1 = sign_share(&msg, &g1_sk);

        // One signer repeated does not meet T = 2.
        let err = ring
            .aggregate(
                &msg,
                &[(G1.into(), share1.clone()), (G1.into(), share1)],
            )
            .unwrap_err();
        assert!(matches!(err, CryptoError::InsufficientShares { have: 1, need: 2 }));
    }

    #[test]
    fn aggregate_rejects_bad_share_without_partial_result() {
        let (ring, log_sk, g1_sk, _) = keyring();
        let msg = init_obj(&log_sk, "head-1").signed_message();
        let good = sign_share(&msg, &g1_sk);
        let bad = sign_share(b"some other message", &g1_sk);
        assert!(ring
            .aggregate(&msg, &[(G1.into(), good), (G2.into(), bad)])
            .is_err());
    }

    #[test]
    fn full_with_short_signer_list_is_rejected() {
        let (ring, log_sk, g1_sk, _) = keyring();
        let init = init_obj(&log_sk, "head-1");
        let mut full = init.clone();
        full.wire_type = WireType::SthFull;
        full.scheme = SignatureScheme::Bls;
        full.signature = sign_share(&init.signed_message(), &g1_sk);
        full.co_signers = vec![G1.into()];
        assert!(matches!(
            ring.verify(&full),
            Err(CryptoError::InsufficientShares { .. })
        ));
    }

    #[test]
    fn conflict_evidence_verifies_both_signatures() {
        let (ring, log_sk, _, _) = keyring();
        let msg_a = "u\0head-a\0";
        let msg_b = "u\0head-b\0";
        let con = GossipObject {
            app: "ct".into(),
            period: "p1".into(),
            wire_type: WireType::ConInit,
            signer: LOG.into(),
            co_signers: Vec::new(),
            signature: sign_message(msg_a.as_bytes(), &log_sk),
            second_signature: Some(sign_message(msg_b.as_bytes(), &log_sk)),
            timestamp: 1,
            scheme: SignatureScheme::Ed25519,
            payload: [LOG.into(), msg_a.into(), msg_b.into()],
        };
        assert!(ring.verify(&con).is_ok());

        let mut identical = con.clone();
        identical.second_signature = Some(identical.signature.clone());
        identical.payload[2] = msg_a.into();
        assert!(ring.verify(&identical).is_err());

        let mut missing = con;
        missing.second_signature = None;
        assert!(matches!(
            ring.verify(&missing),
            Err(CryptoError::IncompleteEvidence(_))
        ));
    }
}
