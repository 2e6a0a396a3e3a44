//! Shared error type for the data-model layer.

use thiserror::Error;

/// Errors produced by the shared type layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GossipError {
    #[error("unknown wire type: {0}")]
    UnknownWireType(String),

    #[error("invalid threshold params: threshold {threshold} of {total}")]
    InvalidParams { total: usize, threshold: usize },

    #[error("{0}")]
    Other(String),
}
