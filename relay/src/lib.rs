//! Relay layer: broadcasts objects to connected peers and to the bound
//! owner, substituting compact notifications for oversized payloads.

pub mod http;
pub mod stats;

pub use http::{plan_broadcast, BroadcastPlan, HttpRelay, RelayError};
pub use stats::{TrafficSnapshot, TrafficStats};

use ctgossip_types::GossipObject;

/// Outbound side of the gossip engine.
///
/// Both methods are fire-and-forget: each peer send runs as an independent
/// concurrent unit, failures are logged and never propagated, and the caller
/// returns immediately.
pub trait Relay: Send + Sync {
    /// Send an object to every configured peer.
    fn broadcast(&self, obj: &GossipObject);

    /// Push an object to the node's bound owner (monitor).
    fn send_to_owner(&self, obj: &GossipObject);
}
