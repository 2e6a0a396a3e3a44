//! Nullable infrastructure for deterministic testing.
//!
//! External collaborators of the gossip core (the crypto service and the
//! relay) are abstracted behind traits. This crate provides implementations
//! that return deterministic values, can be controlled programmatically, and
//! never touch the network.
//!
//! Usage: swap real implementations for nullables in tests.

pub mod crypto;
pub mod relay;

pub use crypto::NullCrypto;
pub use relay::RecordingRelay;
