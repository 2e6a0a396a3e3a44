//! End-to-end gossip rounds over real key material: Ed25519 authority claims,
//! BLS threshold shares, and aggregation into verifiable certifications.

use std::sync::Arc;
use std::time::Duration;

use ctgossip_crypto::keys::{bls_keypair_from_seed, ed25519_keypair_from_seed};
use ctgossip_crypto::sign::sign_message;
use ctgossip_crypto::{CryptoService, Keyring};
use ctgossip_engine::Gossiper;
use ctgossip_nullables::RecordingRelay;
use ctgossip_store::ObjectStore;
use ctgossip_types::{GossipObject, SignatureScheme, ThresholdParams, WireType};

const LOG: &str = "https://log.example";
const G1: &str = "https://gossiper-1.example";
const G2: &str = "https://gossiper-2.example";

const WAIT: Duration = Duration::from_secs(1);

struct Node {
    gossiper: Arc<Gossiper>,
    relay: Arc<RecordingRelay>,
}

/// Two gossipers with T = 2, sharing the same authority and peer key sets.
fn deployment() -> (ed25519_dalek::SigningKey, Node, Node) {
    let (log_sk, log_pk) = ed25519_keypair_from_seed(&[1u8; 32]);
    let (g1_sk, g1_pk) = bls_keypair_from_seed(&[2u8; 32]).unwrap();
    let (g2_sk, g2_pk) = bls_keypair_from_seed(&[3u8; 32]).unwrap();
    let params = ThresholdParams::new(4, 2).unwrap();

    let node = |url: &str, sk| {
        let keyring: Arc<dyn CryptoService> = Arc::new(
            Keyring::new(url, params, sk)
                .with_authority(LOG, log_pk)
                .with_gossiper(G1, g1_pk.clone())
                .with_gossiper(G2, g2_pk.clone()),
        );
        let store = Arc::new(ObjectStore::new(keyring.clone(), params));
        let relay = Arc::new(RecordingRelay::new());
        Node {
            gossiper: Gossiper::new(store, keyring, relay.clone(), 1, WAIT),
            relay,
        }
    };
    (log_sk, node(G1, g1_sk), node(G2, g2_sk))
}

fn signed_claim(log_sk: &ed25519_dalek::SigningKey, content: &str) -> GossipObject {
    let mut obj = GossipObject {
        app: "ct".into(),
        period: "p1".into(),
        wire_type: WireType::SthInit,
        signer: LOG.into(),
        co_signers: Vec::new(),
        signature: String::new(),
        second_signature: None,
        timestamp: 1,
        scheme: SignatureScheme::Ed25519,
        payload: [LOG.into(), content.into(), String::new()],
    };
    obj.signature = sign_message(&obj.signed_message(), log_sk);
    obj
}

#[tokio::test(start_paused = true)]
async fn claim_is_certified_across_two_gossipers() {
    let (log_sk, n1, n2) = deployment();
    let claim = signed_claim(&log_sk, "tree-head-1");

    n1.gossiper.clone().handle(claim.clone());
    n2.gossiper.clone().handle(claim.clone());
    tokio::time::sleep(WAIT * 2).await;

    // Each node accepted the claim and contributed its own share.
    let frag1 = n1.relay.broadcasts().last().cloned().unwrap();
    let frag2 = n2.relay.broadcasts().last().cloned().unwrap();
    assert_eq!(frag1.wire_type, WireType::SthFrag);
    assert_eq!(frag1.signer, G1);
    assert_eq!(frag2.signer, G2);
    assert_ne!(frag1.signature, frag2.signature);

    // Cross-deliver the shares; each node reaches the quorum independently.
    n1.gossiper.clone().handle(frag2);
    n2.gossiper.clone().handle(frag1);

    let full1 = n1.relay.owner_pushes().last().cloned().unwrap();
    let full2 = n2.relay.owner_pushes().last().cloned().unwrap();
    assert_eq!(full1.wire_type, WireType::SthFull);
    assert_eq!(full1.co_signers, vec![G1.to_string(), G2.to_string()]);
    // BLS aggregation is deterministic: both nodes derive the same signature.
    assert_eq!(full1.signature, full2.signature);
    assert_eq!(full1.payload, claim.payload);

    // Both predicates held and were timestamped.
    let times = n1.gossiper.convergence().times();
    assert!(times.init_at.is_some());
    assert!(times.full_at.is_some());
}

#[tokio::test(start_paused = true)]
async fn tampered_claim_never_enters_the_system() {
    let (log_sk, n1, _) = deployment();
    let mut claim = signed_claim(&log_sk, "tree-head-1");
    claim.payload[1] = "tree-head-forged".into();

    n1.gossiper.clone().handle(claim);
    tokio::time::sleep(WAIT * 2).await;
    assert_eq!(n1.relay.broadcast_count(), 0);
    assert_eq!(n1.gossiper.store().distinct_count(WireType::SthInit), 0);
}

#[tokio::test(start_paused = true)]
async fn real_equivocation_produces_verifiable_evidence() {
    let (log_sk, n1, n2) = deployment();
    n1.gossiper.clone().handle(signed_claim(&log_sk, "tree-head-a"));
    n1.relay.reset();

    n1.gossiper.clone().handle(signed_claim(&log_sk, "tree-head-b"));

    let con = n1.relay.broadcasts().last().cloned().unwrap();
    assert_eq!(con.wire_type, WireType::ConInit);
    assert_eq!(con.entity_url(), LOG);
    assert!(n1.gossiper.store().blacklist().contains(LOG));

    // The evidence stands on its own: a peer that saw neither claim accepts
    // it and blacklists the equivocator too.
    n2.gossiper.clone().handle(con);
    assert!(n2.gossiper.store().blacklist().contains(LOG));

    // No share is produced for either conflicting claim.
    tokio::time::sleep(WAIT * 2).await;
    assert!(!n1
        .relay
        .broadcasts()
        .iter()
        .any(|o| o.wire_type == WireType::SthFrag));
}

#[tokio::test(start_paused = true)]
async fn forged_conflict_cannot_frame_an_honest_authority() {
    let (log_sk, n1, _) = deployment();
    n1.gossiper.clone().handle(signed_claim(&log_sk, "tree-head-a"));
    n1.relay.reset();

    // An attacker replays the claim with a garbage signature, hoping the
    // node synthesizes evidence against the honest authority.
    let mut forged = signed_claim(&log_sk, "tree-head-a");
    forged.signature = "00".repeat(64);
    n1.gossiper.clone().handle(forged);

    // The forged claim fails verification before any evidence is raised.
    assert_eq!(n1.relay.broadcast_count(), 0);
    assert!(!n1.gossiper.store().blacklist().contains(LOG));
    assert_eq!(n1.gossiper.store().distinct_count(WireType::ConInit), 0);
}
