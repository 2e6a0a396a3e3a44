//! Cryptographic services for the ctgossip protocol.
//!
//! The gossip core treats cryptography as an opaque collaborator behind the
//! [`CryptoService`] trait: verify an object against its declared signer,
//! produce this node's threshold-signature share, and aggregate shares into a
//! full threshold signature. Single-authority claims use Ed25519; shares and
//! aggregates use BLS12-381 (min_pk, signatures on G2).

pub mod error;
pub mod keys;
pub mod service;
pub mod sign;
pub mod threshold;

pub use error::CryptoError;
pub use keys::{bls_keypair_from_seed, bls_public_from_hex, ed25519_keypair_from_seed,
    ed25519_public_from_hex, generate_bls_keypair, generate_ed25519_keypair};
pub use service::{CryptoService, Keyring};
pub use sign::{sign_message, verify_signature};
pub use threshold::{aggregate_shares, sign_share, verify_aggregate, verify_share};
