//! Attestation kinds, phases, and the ten concrete wire types.

use serde::{Deserialize, Serialize};

use crate::GossipError;

/// Logical attestation family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// Log-tree head.
    Sth,
    /// Revocation delta.
    Rev,
    /// Liveness accusation.
    Acc,
    /// Conflict/equivocation evidence.
    Con,
}

/// Lifecycle phase of an attestation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// A single authority's signed claim.
    Init,
    /// One peer's threshold-signature share over the claim.
    Frag,
    /// Aggregated threshold signature over enough shares.
    Full,
}

/// Concrete wire type: kind × phase. `Con` exists only in the `Init` phase,
/// giving ten variants in total.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireType {
    #[serde(rename = "sth_init")]
    SthInit,
    #[serde(rename = "rev_init")]
    RevInit,
    #[serde(rename = "acc_init")]
    AccInit,
    #[serde(rename = "con_init")]
    ConInit,
    #[serde(rename = "sth_frag")]
    SthFrag,
    #[serde(rename = "rev_frag")]
    RevFrag,
    #[serde(rename = "acc_frag")]
    AccFrag,
    #[serde(rename = "sth_full")]
    SthFull,
    #[serde(rename = "rev_full")]
    RevFull,
    #[serde(rename = "acc_full")]
    AccFull,
}

impl WireType {
    /// Every concrete wire type, in bucket order.
    pub const ALL: [WireType; 10] = [
        WireType::SthInit,
        WireType::RevInit,
        WireType::AccInit,
        WireType::ConInit,
        WireType::SthFrag,
        WireType::RevFrag,
        WireType::AccFrag,
        WireType::SthFull,
        WireType::RevFull,
        WireType::AccFull,
    ];

    /// Stable bucket index for this wire type.
    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|&w| w == self)
            .expect("WireType::ALL covers every variant")
    }

    pub fn kind(self) -> Kind {
        match self {
            WireType::SthInit | WireType::SthFrag | WireType::SthFull => Kind::Sth,
            WireType::RevInit | WireType::RevFrag | WireType::RevFull => Kind::Rev,
            WireType::AccInit | WireType::AccFrag | WireType::AccFull => Kind::Acc,
            WireType::ConInit => Kind::Con,
        }
    }

    pub fn phase(self) -> Phase {
        match self {
            WireType::SthInit | WireType::RevInit | WireType::AccInit | WireType::ConInit => {
                Phase::Init
            }
            WireType::SthFrag | WireType::RevFrag | WireType::AccFrag => Phase::Frag,
            WireType::SthFull | WireType::RevFull | WireType::AccFull => Phase::Full,
        }
    }

    /// The fragment variant for this family, if the family has one.
    pub fn frag_variant(self) -> Option<WireType> {
        match self.kind() {
            Kind::Sth => Some(WireType::SthFrag),
            Kind::Rev => Some(WireType::RevFrag),
            Kind::Acc => Some(WireType::AccFrag),
            Kind::Con => None,
        }
    }

    /// The full variant for this family, if the family has one.
    pub fn full_variant(self) -> Option<WireType> {
        match self.kind() {
            Kind::Sth => Some(WireType::SthFull),
            Kind::Rev => Some(WireType::RevFull),
            Kind::Acc => Some(WireType::AccFull),
            Kind::Con => None,
        }
    }

    /// The URL path suffix used on the wire for this type.
    pub fn path_suffix(self) -> &'static str {
        match self {
            WireType::SthInit => "sth_init",
            WireType::RevInit => "rev_init",
            WireType::AccInit => "acc_init",
            WireType::ConInit => "con_init",
            WireType::SthFrag => "sth_frag",
            WireType::RevFrag => "rev_frag",
            WireType::AccFrag => "acc_frag",
            WireType::SthFull => "sth_full",
            WireType::RevFull => "rev_full",
            WireType::AccFull => "acc_full",
        }
    }

    /// Parse a wire type from its URL path suffix.
    pub fn from_suffix(suffix: &str) -> Result<WireType, GossipError> {
        Self::ALL
            .iter()
            .copied()
            .find(|w| w.path_suffix() == suffix)
            .ok_or_else(|| GossipError::UnknownWireType(suffix.to_string()))
    }

    /// Whether the store holds a list of objects per identity (`Frag`) rather
    /// than a single object.
    pub fn is_list_bucket(self) -> bool {
        self.phase() == Phase::Frag
    }
}

impl std::fmt::Display for WireType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path_suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_dense_and_stable() {
        for (i, w) in WireType::ALL.iter().enumerate() {
            assert_eq!(w.index(), i);
        }
    }

    #[test]
    fn con_has_no_frag_or_full() {
        assert_eq!(WireType::ConInit.frag_variant(), None);
        assert_eq!(WireType::ConInit.full_variant(), None);
    }

    #[test]
    fn family_variants_line_up() {
        assert_eq!(WireType::SthInit.frag_variant(), Some(WireType::SthFrag));
        assert_eq!(WireType::SthFrag.full_variant(), Some(WireType::SthFull));
        assert_eq!(WireType::RevInit.full_variant(), Some(WireType::RevFull));
        assert_eq!(WireType::AccFrag.kind(), Kind::Acc);
    }

    #[test]
    fn suffix_round_trips() {
        for w in WireType::ALL {
            assert_eq!(WireType::from_suffix(w.path_suffix()).unwrap(), w);
        }
        assert!(WireType::from_suffix("sth_bogus").is_err());
    }

    #[test]
    fn serde_uses_path_suffix() {
        let json = serde_json::to_string(&WireType::RevFrag).unwrap();
        assert_eq!(json, "\"rev_frag\"");
        let parsed: WireType = serde_json::from_str("\"acc_full\"").unwrap();
        assert_eq!(parsed, WireType::AccFull);
    }
}
