//! The per-node protocol state machine.

use std::sync::Arc;
use std::time::Duration;

use ctgossip_crypto::CryptoService;
use ctgossip_relay::Relay;
use ctgossip_store::{ClaimOutcome, ObjectStore};
use ctgossip_types::{derive_object_id, GossipObject, Phase, WireType};

use crate::aggregator::{aggregate_fragments, build_conflict, sign_fragment};
use crate::convergence::ConvergenceTracker;

/// One node's gossip engine.
///
/// `handle` is safe to call concurrently from any number of request handlers;
/// all state lives in the store behind its own locks. Objects are processed
/// idempotently, so duplicated and reordered delivery is harmless.
pub struct Gossiper {
    store: Arc<ObjectStore>,
    crypto: Arc<dyn CryptoService>,
    relay: Arc<dyn Relay>,
    convergence: ConvergenceTracker,
    gossip_wait: Duration,
}

impl Gossiper {
    pub fn new(
        store: Arc<ObjectStore>,
        crypto: Arc<dyn CryptoService>,
        relay: Arc<dyn Relay>,
        expected_sources: usize,
        gossip_wait: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            crypto,
            relay,
            convergence: ConvergenceTracker::new(expected_sources),
            gossip_wait,
        })
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn convergence(&self) -> &ConvergenceTracker {
        &self.convergence
    }

    /// Process one received object to completion.
    ///
    /// Must be called inside a tokio runtime: accepting a claim schedules a
    /// deferred co-signing task.
    pub fn handle(self: Arc<Self>, obj: GossipObject) {
        let blacklist = self.store.blacklist();
        if blacklist.contains(obj.entity_url()) || blacklist.contains(&obj.signer) {
            tracing::debug!(
                wire_type = %obj.wire_type,
                entity = %obj.entity_url(),
                "dropping object involving a blacklisted entity"
            );
            return;
        }
        if self.store.is_duplicate(&obj) {
            tracing::trace!(wire_type = %obj.wire_type, entity = %obj.entity_url(), "duplicate");
            return;
        }
        match obj.wire_type.phase() {
            Phase::Init if obj.wire_type == WireType::ConInit => self.handle_conflict(&obj),
            Phase::Init => {
                if self.handle_init(&obj) {
                    self.schedule_co_sign(obj);
                }
            }
            Phase::Frag => self.handle_fragment(obj),
            Phase::Full => self.handle_full(&obj),
        }
    }

    /// Accept, relay, and log a fresh authority claim. Returns whether the
    /// claim was accepted (and should therefore be co-signed).
    fn handle_init(&self, obj: &GossipObject) -> bool {
        let Some(full_type) = obj.wire_type.full_variant() else {
            return false;
        };
        let full_id = derive_object_id(&obj.period, full_type, obj.entity_url());
        if self.store.contains(full_type, &full_id) {
            tracing::debug!(entity = %obj.entity_url(), "claim arrived after certification, dropping");
            return false;
        }
        if let Some(frag_type) = obj.wire_type.frag_variant() {
            let frag_id = derive_object_id(&obj.period, frag_type, obj.entity_url());
            if self.store.fragment_count(frag_type, &frag_id) >= self.store.params().threshold {
                tracing::debug!(entity = %obj.entity_url(), "quorum already gathered, dropping claim");
                return false;
            }
        }
        // The store detects equivocation in the same lock acquisition that
        // refuses the claim, so racing conflicting claims cannot both land.
        match self.store.store_claim(obj) {
            ClaimOutcome::Rejected => return false,
            ClaimOutcome::Conflict(first) => {
                self.raise_conflict(&first, obj);
                return false;
            }
            ClaimOutcome::Accepted => {}
        }
        tracing::info!(wire_type = %obj.wire_type, entity = %obj.entity_url(), "claim accepted");
        self.relay.broadcast(obj);
        self.relay.send_to_owner(obj);
        self.convergence.observe(&self.store);
        true
    }

    /// An equivocating claim arrived: pair it with the stored one into
    /// conflict evidence and disseminate that instead.
    fn raise_conflict(&self, first: &GossipObject, second: &GossipObject) {
        match build_conflict(first, second) {
            Ok(con) => {
                tracing::warn!(
                    signer = %second.signer,
                    wire_type = %second.wire_type,
                    "equivocation detected, raising conflict evidence"
                );
                self.handle_conflict(&con);
            }
            Err(e) => {
                tracing::warn!(signer = %second.signer, error = %e, "could not build conflict evidence");
            }
        }
    }

    /// Conflict evidence: storing it blacklists the accused permanently.
    fn handle_conflict(&self, obj: &GossipObject) {
        if !self.store.store(obj) {
            return;
        }
        self.relay.broadcast(obj);
        self.relay.send_to_owner(obj);
        self.convergence.observe(&self.store);
    }

    fn handle_fragment(&self, mut obj: GossipObject) {
        // A content-stripped revocation fragment is only verifiable against
        // the claim it co-signs; restore its payload from the stored claim.
        if obj.wire_type == WireType::RevFrag && obj.payload[1].is_empty() {
            let init_id = derive_object_id(&obj.period, WireType::RevInit, obj.entity_url());
            match self.store.get(WireType::RevInit, &init_id) {
                Some(init) => obj.payload = init.payload,
                None => {
                    tracing::debug!(
                        entity = %obj.entity_url(),
                        "stripped fragment without a matching claim, dropping"
                    );
                    return;
                }
            }
        }
        let Some(full_type) = obj.wire_type.full_variant() else {
            return;
        };
        let full_id = derive_object_id(&obj.period, full_type, obj.entity_url());
        if self.store.contains(full_type, &full_id) {
            return;
        }
        let Some(count) = self.store.store_fragment(&obj) else {
            return;
        };
        // The quorum-completing fragment stays local: every peer still below
        // the threshold relays, so the fabric already carries enough copies.
        if count < self.store.params().threshold {
            self.relay.broadcast(&obj);
        }
        // Exactly one arrival observes the quorum-completing count.
        if count == self.store.params().threshold {
            let frags = self.store.fragments(obj.wire_type, &obj.object_id());
            match aggregate_fragments(self.crypto.as_ref(), &frags) {
                Ok(full) => self.handle_full(&full),
                Err(e) => {
                    tracing::error!(
                        entity = %obj.entity_url(),
                        wire_type = %obj.wire_type,
                        error = %e,
                        "quorum aggregation failed"
                    );
                }
            }
        }
    }

    /// A FULL certification goes to the owner, never back onto the gossip
    /// fabric: every correct peer derives its own from the fragments.
    fn handle_full(&self, obj: &GossipObject) {
        if !self.store.store(obj) {
            return;
        }
        tracing::info!(wire_type = %obj.wire_type, entity = %obj.entity_url(), "certification complete");
        self.relay.send_to_owner(obj);
        self.convergence.observe(&self.store);
    }

    /// Co-sign an accepted claim after the configured wait, unless the claim
    /// was certified or its parties blacklisted in the meantime.
    fn schedule_co_sign(self: Arc<Self>, init: GossipObject) {
        tokio::spawn(async move {
            tokio::time::sleep(self.gossip_wait).await;
            let blacklist = self.store.blacklist();
            if blacklist.contains(init.entity_url()) || blacklist.contains(&init.signer) {
                tracing::debug!(entity = %init.entity_url(), "skipping co-sign of a blacklisted entity");
                return;
            }
            let Some(full_type) = init.wire_type.full_variant() else {
                return;
            };
            let full_id = derive_object_id(&init.period, full_type, init.entity_url());
            if self.store.contains(full_type, &full_id) {
                return;
            }
            match sign_fragment(self.crypto.as_ref(), &init) {
                Ok(frag) => Arc::clone(&self).handle(frag),
                Err(e) => {
                    tracing::error!(entity = %init.entity_url(), error = %e, "could not produce signature share");
                }
            }
        });
    }

    /// Period boundary: drop all period-scoped state. The blacklist survives.
    pub fn sweep_period(&self) {
        self.store.sweep();
        self.convergence.reset();
        tracing::info!("period swept");
    }
}
