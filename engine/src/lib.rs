//! The gossip engine: decides what happens to every received object.
//!
//! One [`Gossiper`] per node. It owns the protocol rules (what to store, what
//! to relay, when to co-sign, when to aggregate, when to raise conflict
//! evidence) and delegates verification to the crypto service, persistence to
//! the object store, and delivery to the relay.

pub mod aggregator;
pub mod convergence;
pub mod error;
pub mod gossiper;

pub use aggregator::{aggregate_fragments, build_conflict, sign_fragment};
pub use convergence::{ConvergenceTimes, ConvergenceTracker};
pub use error::EngineError;
pub use gossiper::Gossiper;

use std::time::{SystemTime, UNIX_EPOCH};

pub(crate) fn unix_now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
