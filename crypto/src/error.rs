use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("no key registered for signer {0}")]
    UnknownSigner(String),

    #[error("signature verification failed: {0}")]
    InvalidSignature(String),

    #[error("malformed key material: {0}")]
    InvalidKey(String),

    #[error("malformed signature encoding: {0}")]
    InvalidEncoding(String),

    #[error("insufficient shares to aggregate: have {have}, need {need}")]
    InsufficientShares { have: usize, need: usize },

    #[error("conflict evidence is incomplete: {0}")]
    IncompleteEvidence(String),
}
