//! Nullable relay — record outbound objects without sending them.

use std::sync::Mutex;

use ctgossip_relay::Relay;
use ctgossip_types::GossipObject;

/// A relay that records every broadcast and owner push for assertions.
/// Thread-safe for use with tokio's multi-threaded runtime.
#[derive(Debug, Default)]
pub struct RecordingRelay {
    broadcasts: Mutex<Vec<GossipObject>>,
    owner_pushes: Mutex<Vec<GossipObject>>,
}

impl RecordingRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// All objects "broadcast" to peers, in order.
    pub fn broadcasts(&self) -> Vec<GossipObject> {
        self.broadcasts.lock().unwrap().clone()
    }

    /// All objects "pushed" to the owner, in order.
    pub fn owner_pushes(&self) -> Vec<GossipObject> {
        self.owner_pushes.lock().unwrap().clone()
    }

    pub fn broadcast_count(&self) -> usize {
        self.broadcasts.lock().unwrap().len()
    }

    /// Clear all recorded traffic.
    pub fn reset(&self) {
        self.broadcasts.lock().unwrap().clear();
        self.owner_pushes.lock().unwrap().clear();
    }
}

impl Relay for RecordingRelay {
    fn broadcast(&self, obj: &GossipObject) {
        self.broadcasts.lock().unwrap().push(obj.clone());
    }

    fn send_to_owner(&self, obj: &GossipObject) {
        self.owner_pushes.lock().unwrap().push(obj.clone());
    }
}
