//! The gossip object — the unit of exchange between peers.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::wire::WireType;

/// Which signature scheme produced the object's signature(s).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureScheme {
    /// Single-authority claims (INIT, CON evidence signatures).
    Ed25519,
    /// Threshold-signature shares and aggregates (FRAG, FULL).
    Bls,
}

/// Logical identity of a gossip object, derived deterministically from
/// (period, wire type, origin entity URL). Two objects with the same identity
/// and phase describe the same logical item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 32]);

impl ObjectId {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// A single attestation as exchanged over the wire.
///
/// Immutable once constructed — the store never mutates an accepted object.
/// The three payload slots are, in order: origin entity URL, primary content,
/// optional secondary content. Their semantics depend on the wire type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GossipObject {
    /// Application tag (distinguishes deployments sharing a transport).
    pub app: String,
    /// Period (epoch) identifier.
    pub period: String,
    /// Concrete wire type of this object.
    #[serde(rename = "type")]
    pub wire_type: WireType,
    /// Identity (URL) of the signer. For CON objects this is the accused
    /// entity, whose key produced both conflicting signatures.
    pub signer: String,
    /// Contributing signer identities — populated only on FULL objects.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub co_signers: Vec<String>,
    /// Primary signature, hex-encoded.
    pub signature: String,
    /// Second signature slot — used only by CON objects, holding the second
    /// conflicting signature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_signature: Option<String>,
    /// Creation timestamp, seconds since the Unix epoch.
    pub timestamp: u64,
    /// Signature scheme tag.
    pub scheme: SignatureScheme,
    /// Fixed three-slot payload: [entity URL, primary, secondary].
    pub payload: [String; 3],
}

/// Derive the logical identity for (period, wire type, origin entity URL).
pub fn derive_object_id(period: &str, wire_type: WireType, entity_url: &str) -> ObjectId {
    let mut hasher = Sha256::new();
    hasher.update(period.as_bytes());
    hasher.update([0u8]);
    hasher.update(wire_type.path_suffix().as_bytes());
    hasher.update([0u8]);
    hasher.update(entity_url.as_bytes());
    ObjectId(hasher.finalize().into())
}

impl GossipObject {
    /// Derive this object's logical identity from (period, wire type,
    /// payload slot 0).
    pub fn object_id(&self) -> ObjectId {
        derive_object_id(&self.period, self.wire_type, &self.payload[0])
    }

    /// The origin entity URL (payload slot 0).
    pub fn entity_url(&self) -> &str {
        &self.payload[0]
    }

    /// Canonical byte string covered by INIT/FRAG/FULL signatures: the three
    /// payload slots joined with NUL separators.
    pub fn signed_message(&self) -> Vec<u8> {
        let mut msg = Vec::with_capacity(
            self.payload.iter().map(String::len).sum::<usize>() + 2,
        );
        for (i, slot) in self.payload.iter().enumerate() {
            if i > 0 {
                msg.push(0);
            }
            msg.extend_from_slice(slot.as_bytes());
        }
        msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(period: &str, wire_type: WireType, url: &str, content: &str) -> GossipObject {
        GossipObject {
            app: "ct".into(),
            period: period.into(),
            wire_type,
            signer: url.into(),
            co_signers: Vec::new(),
            signature: "aa".into(),
            second_signature: None,
            timestamp: 1,
            scheme: SignatureScheme::Ed25519,
            payload: [url.into(), content.into(), String::new()],
        }
    }

    #[test]
    fn identity_ignores_content_slots() {
        let a = obj("p1", WireType::SthInit, "https://log.example", "head-1");
        let b = obj("p1", WireType::SthInit, "https://log.example", "head-2");
        assert_eq!(a.object_id(), b.object_id());
    }

    #[test]
    fn identity_varies_with_period_type_and_entity() {
        let base = obj("p1", WireType::SthInit, "https://log.example", "head");
        assert_ne!(
            base.object_id(),
            obj("p2", WireType::SthInit, "https://log.example", "head").object_id()
        );
        assert_ne!(
            base.object_id(),
            obj("p1", WireType::RevInit, "https://log.example", "head").object_id()
        );
        assert_ne!(
            base.object_id(),
            obj("p1", WireType::SthInit, "https://other.example", "head").object_id()
        );
    }

    #[test]
    fn signed_message_separates_slots() {
        let mut a = obj("p1", WireType::SthInit, "u", "xy");
        let mut b = obj("p1", WireType::SthInit, "u", "x");
        a.payload[2] = String::new();
        b.payload[1] = "x".into();
        b.payload[2] = "y".into();
        // "u\0xy\0" vs "u\0x\0y" must differ.
        assert_ne!(a.signed_message(), b.signed_message());
    }

    #[test]
    fn json_shape_matches_wire_contract() {
        let o = obj("p1", WireType::AccInit, "https://ca.example", "alive?");
        let json = serde_json::to_string(&o).unwrap();
        assert!(json.contains("\"type\":\"acc_init\""));
        // Empty co-signer list and absent second signature stay off the wire.
        assert!(!json.contains("co_signers"));
        assert!(!json.contains("second_signature"));
        let back: GossipObject = serde_json::from_str(&json).unwrap();
        assert_eq!(back, o);
    }
}
