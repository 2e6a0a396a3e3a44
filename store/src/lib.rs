//! Typed, lock-protected storage of every attestation variant.
//!
//! One bucket per concrete wire type, each behind its own reader/writer lock,
//! plus the permanent entity blacklist and the convergence arrival log.

pub mod blacklist;
pub mod object_store;

pub use blacklist::Blacklist;
pub use object_store::{ArrivalRecord, ClaimOutcome, ObjectStore};
