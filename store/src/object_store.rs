//! The per-wire-type object store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use ctgossip_crypto::CryptoService;
use ctgossip_types::{GossipObject, ObjectId, Phase, ThresholdParams, WireType};

/// One entry in the convergence-timing log: when an INIT-phase object for an
/// entity first arrived.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArrivalRecord {
    pub wire_type: WireType,
    pub entity_url: String,
    pub at: u64,
}

type Bucket = RwLock<HashMap<ObjectId, Vec<GossipObject>>>;

/// Outcome of offering an authority claim to its singleton bucket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Stored; the claim should be relayed and co-signed.
    Accepted,
    /// Failed verification, already present, or not a claim type.
    Rejected,
    /// The stored claim for the same identity and signer carries a different
    /// signature; the stored one is returned as evidence material.
    Conflict(GossipObject),
}

/// Ten independent identity-keyed buckets, one per concrete wire type, each
/// guarded by its own reader/writer lock.
///
/// Invariants: a singleton bucket (INIT/FULL/CON) holds at most one object
/// per identity; a FRAG bucket holds at most one object per (identity,
/// signer) pair and never more than `threshold` fragments per identity.
pub struct ObjectStore {
    crypto: Arc<dyn CryptoService>,
    params: ThresholdParams,
    buckets: [Bucket; WireType::ALL.len()],
    blacklist: crate::Blacklist,
    arrivals: Mutex<Vec<ArrivalRecord>>,
}

fn unix_now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl ObjectStore {
    pub fn new(crypto: Arc<dyn CryptoService>, params: ThresholdParams) -> Self {
        Self {
            crypto,
            params,
            buckets: std::array::from_fn(|_| RwLock::new(HashMap::new())),
            blacklist: crate::Blacklist::new(),
            arrivals: Mutex::new(Vec::new()),
        }
    }

    fn bucket(&self, wire_type: WireType) -> &Bucket {
        &self.buckets[wire_type.index()]
    }

    pub fn params(&self) -> ThresholdParams {
        self.params
    }

    pub fn blacklist(&self) -> &crate::Blacklist {
        &self.blacklist
    }

    /// Store an object, returning whether it was accepted.
    ///
    /// Rejects without mutation when the signature fails verification or the
    /// object is already present in its bucket. The duplicate check and the
    /// insert happen under a single bucket write lock, so two concurrent
    /// arrivals for the same identity cannot both be accepted.
    pub fn store(&self, obj: &GossipObject) -> bool {
        if let Err(e) = self.crypto.verify(obj) {
            tracing::warn!(
                wire_type = %obj.wire_type,
                signer = %obj.signer,
                error = %e,
                "dropping object that failed signature verification"
            );
            return false;
        }

        let id = obj.object_id();
        let accepted = {
            let mut bucket = self.bucket(obj.wire_type).write().expect("bucket lock poisoned");
            let slot = bucket.entry(id).or_default();
            if obj.wire_type.is_list_bucket() {
                // One fragment per (identity, signer); stop appending once the
                // quorum is already reachable from what is stored.
                if slot.len() >= self.params.threshold {
                    false
                } else if slot.iter().any(|stored| stored.signer == obj.signer) {
                    false
                } else {
                    slot.push(obj.clone());
                    true
                }
            } else if slot.is_empty() {
                slot.push(obj.clone());
                true
            } else {
                false
            }
        };

        if accepted {
            if obj.wire_type.phase() == Phase::Init {
                let mut arrivals = self.arrivals.lock().expect("arrival log lock poisoned");
                arrivals.push(ArrivalRecord {
                    wire_type: obj.wire_type,
                    entity_url: obj.entity_url().to_string(),
                    at: unix_now_secs(),
                });
            }
            if matches!(obj.wire_type, WireType::AccFull | WireType::ConInit)
                && self.blacklist.insert(obj.entity_url())
            {
                tracing::info!(
                    entity = %obj.entity_url(),
                    wire_type = %obj.wire_type,
                    "entity blacklisted"
                );
            }
        }
        accepted
    }

    /// Offer an authority claim, detecting equivocation atomically.
    ///
    /// The equivocation check and the insert happen under the same bucket
    /// write lock, so two conflicting claims racing through separate handlers
    /// cannot both be accepted: one is stored, the other surfaces the stored
    /// one as [`ClaimOutcome::Conflict`].
    pub fn store_claim(&self, obj: &GossipObject) -> ClaimOutcome {
        if obj.wire_type.phase() != Phase::Init || obj.wire_type == WireType::ConInit {
            return ClaimOutcome::Rejected;
        }
        if let Err(e) = self.crypto.verify(obj) {
            tracing::warn!(
                wire_type = %obj.wire_type,
                signer = %obj.signer,
                error = %e,
                "dropping claim that failed signature verification"
            );
            return ClaimOutcome::Rejected;
        }

        let id = obj.object_id();
        let outcome = {
            let mut bucket = self.bucket(obj.wire_type).write().expect("bucket lock poisoned");
            let slot = bucket.entry(id).or_default();
            match slot.first() {
                None => {
                    slot.push(obj.clone());
                    ClaimOutcome::Accepted
                }
                Some(stored) if stored.signer == obj.signer && stored.signature != obj.signature => {
                    ClaimOutcome::Conflict(stored.clone())
                }
                Some(_) => ClaimOutcome::Rejected,
            }
        };

        if outcome == ClaimOutcome::Accepted {
            let mut arrivals = self.arrivals.lock().expect("arrival log lock poisoned");
            arrivals.push(ArrivalRecord {
                wire_type: obj.wire_type,
                entity_url: obj.entity_url().to_string(),
                at: unix_now_secs(),
            });
        }
        outcome
    }

    /// Store a fragment and return the bucket's post-insert size, or `None`
    /// if the fragment was rejected.
    ///
    /// The count is taken under the same write lock as the insert, so when
    /// two fragments race to complete a quorum exactly one caller observes
    /// the count crossing the threshold.
    pub fn store_fragment(&self, obj: &GossipObject) -> Option<usize> {
        if !obj.wire_type.is_list_bucket() {
            return None;
        }
        if let Err(e) = self.crypto.verify(obj) {
            tracing::warn!(
                wire_type = %obj.wire_type,
                signer = %obj.signer,
                error = %e,
                "dropping fragment that failed signature verification"
            );
            return None;
        }

        let id = obj.object_id();
        let mut bucket = self.bucket(obj.wire_type).write().expect("bucket lock poisoned");
        let slot = bucket.entry(id).or_default();
        if slot.len() >= self.params.threshold
            || slot.iter().any(|stored| stored.signer == obj.signer)
        {
            return None;
        }
        slot.push(obj.clone());
        Some(slot.len())
    }

    /// Whether this exact claim is already stored.
    ///
    /// For singleton phases: an object with the same identity exists and
    /// carries the same signature (a same-identity object with a *different*
    /// signature is a conflict, not a duplicate). For fragments: any stored
    /// fragment for the identity carries the same signature.
    pub fn is_duplicate(&self, obj: &GossipObject) -> bool {
        let id = obj.object_id();
        let bucket = self.bucket(obj.wire_type).read().expect("bucket lock poisoned");
        bucket
            .get(&id)
            .is_some_and(|stored| stored.iter().any(|s| s.signature == obj.signature))
    }

    /// The equivocation check: a previously stored INIT for the same identity
    /// carries a different signature from the same declared signer.
    pub fn is_malicious(&self, obj: &GossipObject) -> bool {
        if obj.wire_type.phase() != Phase::Init {
            return false;
        }
        let id = obj.object_id();
        let bucket = self.bucket(obj.wire_type).read().expect("bucket lock poisoned");
        bucket.get(&id).is_some_and(|stored| {
            stored
                .iter()
                .any(|s| s.signer == obj.signer && s.signature != obj.signature)
        })
    }

    /// The stored object for a singleton identity, if any.
    pub fn get(&self, wire_type: WireType, id: &ObjectId) -> Option<GossipObject> {
        let bucket = self.bucket(wire_type).read().expect("bucket lock poisoned");
        bucket.get(id).and_then(|slot| slot.first().cloned())
    }

    pub fn contains(&self, wire_type: WireType, id: &ObjectId) -> bool {
        let bucket = self.bucket(wire_type).read().expect("bucket lock poisoned");
        bucket.contains_key(id)
    }

    /// All stored fragments for an identity.
    pub fn fragments(&self, wire_type: WireType, id: &ObjectId) -> Vec<GossipObject> {
        let bucket = self.bucket(wire_type).read().expect("bucket lock poisoned");
        bucket.get(id).cloned().unwrap_or_default()
    }

    pub fn fragment_count(&self, wire_type: WireType, id: &ObjectId) -> usize {
        let bucket = self.bucket(wire_type).read().expect("bucket lock poisoned");
        bucket.get(id).map_or(0, Vec::len)
    }

    /// Number of distinct identities in a bucket.
    pub fn distinct_count(&self, wire_type: WireType) -> usize {
        let bucket = self.bucket(wire_type).read().expect("bucket lock poisoned");
        bucket.len()
    }

    /// Per-wire-type distinct identity counts, for snapshots and status.
    pub fn counts_snapshot(&self) -> Vec<(WireType, usize)> {
        WireType::ALL
            .iter()
            .map(|&w| (w, self.distinct_count(w)))
            .collect()
    }

    /// Snapshot of the convergence-timing log.
    pub fn arrivals(&self) -> Vec<ArrivalRecord> {
        self.arrivals.lock().expect("arrival log lock poisoned").clone()
    }

    /// Discard all period-scoped state. The permanent blacklist survives.
    pub fn sweep(&self) {
        for bucket in &self.buckets {
            bucket.write().expect("bucket lock poisoned").clear();
        }
        self.arrivals.lock().expect("arrival log lock poisoned").clear();
    }
}
