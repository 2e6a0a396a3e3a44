use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] ctgossip_crypto::CryptoError),

    #[error("gossip error: {0}")]
    Gossip(#[from] ctgossip_types::GossipError),

    #[error("relay error: {0}")]
    Relay(#[from] ctgossip_relay::RelayError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
