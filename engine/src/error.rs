use ctgossip_crypto::CryptoError;
use ctgossip_types::WireType;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("{0} has no threshold phase")]
    NoThresholdPhase(WireType),

    #[error("cannot aggregate an empty fragment set")]
    NoFragments,

    #[error("invalid conflict evidence: {0}")]
    InvalidEvidence(&'static str),
}
