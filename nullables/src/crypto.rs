//! Nullable crypto service — deterministic signatures, controllable verdicts.

use ctgossip_crypto::{CryptoError, CryptoService};
use ctgossip_types::GossipObject;

/// A crypto service whose verification verdict is fixed at construction and
/// whose shares and aggregates are deterministic strings.
///
/// Shares are `share:<self_id>:<message-as-lossy-utf8>`; aggregates join the
/// contributing signer identities, so tests can assert on exact values.
pub struct NullCrypto {
    self_id: String,
    accept_all: bool,
}

impl NullCrypto {
    /// A service that accepts every object.
    pub fn new(self_id: impl Into<String>) -> Self {
        Self {
            self_id: self_id.into(),
            accept_all: true,
        }
    }

    /// A service that rejects every object (for failure-path tests).
    pub fn rejecting(self_id: impl Into<String>) -> Self {
        Self {
            self_id: self_id.into(),
            accept_all: false,
        }
    }
}

impl CryptoService for NullCrypto {
    fn self_id(&self) -> &str {
        &self.self_id
    }

    fn verify(&self, obj: &GossipObject) -> Result<(), CryptoError> {
        if self.accept_all {
            Ok(())
        } else {
            Err(CryptoError::InvalidSignature(format!(
                "null crypto rejects {}",
                obj.wire_type
            )))
        }
    }

    fn sign_share(&self, message: &[u8]) -> Result<String, CryptoError> {
        Ok(format!(
            "share:{}:{}",
            self.self_id,
            String::from_utf8_lossy(message)
        ))
    }

    fn aggregate(
        &self,
        _message: &[u8],
        shares: &[(String, String)],
    ) -> Result<String, CryptoError> {
        let mut signers: Vec<&str> = shares.iter().map(|(s, _)| s.as_str()).collect();
        signers.sort_unstable();
        Ok(format!("aggregate:{}", signers.join("+")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctgossip_types::{SignatureScheme, WireType};

    fn obj() -> GossipObject {
        GossipObject {
            app: "ct".into(),
            period: "p1".into(),
            wire_type: WireType::SthInit,
            signer: "x".into(),
            co_signers: Vec::new(),
            signature: "s".into(),
            second_signature: None,
            timestamp: 0,
            scheme: SignatureScheme::Ed25519,
            payload: ["u".into(), String::new(), String::new()],
        }
    }

    #[test]
    fn verdict_is_fixed() {
        assert!(NullCrypto::new("g1").verify(&obj()).is_ok());
        assert!(NullCrypto::rejecting("g1").verify(&obj()).is_err());
    }

    #[test]
    fn shares_are_deterministic() {
        let c = NullCrypto::new("g1");
        assert_eq!(c.sign_share(b"m").unwrap(), "share:g1:m");
        assert_eq!(
            c.aggregate(b"m", &[("g2".into(), "s2".into()), ("g1".into(), "s1".into())])
                .unwrap(),
            "aggregate:g1+g2"
        );
    }
}
