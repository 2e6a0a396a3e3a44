//! Fundamental types for the ctgossip protocol.
//!
//! This crate defines the data model shared across every other crate in the
//! workspace: attestation kinds and phases, the ten concrete wire types, the
//! gossip object itself, logical object identities, the compact payload
//! notification record, and the node-wide threshold parameters.

pub mod error;
pub mod notification;
pub mod object;
pub mod params;
pub mod wire;

pub use error::GossipError;
pub use notification::PayloadNotification;
pub use object::{derive_object_id, GossipObject, ObjectId, SignatureScheme};
pub use params::ThresholdParams;
pub use wire::{Kind, Phase, WireType};
