//! HTTP POST + JSON relay over reqwest.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use ctgossip_types::{GossipObject, PayloadNotification, WireType};

use crate::stats::TrafficStats;
use crate::Relay;

/// Request timeout for outbound peer calls. There is no retry: a failed send
/// is logged and the epidemic protocol delivers via another path.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// How an object should go out on the wire, given the size threshold.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BroadcastPlan {
    /// POST the object to each peer's wire-type endpoint. For an oversized
    /// REV_FRAG this carries the object with content slots stripped
    /// (receivers correlate with the REV_INIT they already hold).
    Forward(GossipObject),
    /// The object is an oversized REV_INIT: send a compact notification and
    /// serve the payload on pull.
    Notify(PayloadNotification),
}

/// Decide how to broadcast `obj` under the configured size threshold.
pub fn plan_broadcast(obj: &GossipObject, self_url: &str, threshold: usize) -> BroadcastPlan {
    let size = serde_json::to_vec(obj).map(|b| b.len()).unwrap_or(0);
    if size <= threshold {
        return BroadcastPlan::Forward(obj.clone());
    }
    match obj.wire_type {
        WireType::RevInit => BroadcastPlan::Notify(PayloadNotification {
            sender: self_url.to_string(),
            period: obj.period.clone(),
            wire_type: obj.wire_type,
            entity_url: obj.entity_url().to_string(),
        }),
        WireType::RevFrag => {
            let mut stripped = obj.clone();
            stripped.payload[1] = String::new();
            stripped.payload[2] = String::new();
            BroadcastPlan::Forward(stripped)
        }
        _ => BroadcastPlan::Forward(obj.clone()),
    }
}

/// Relay implementation that POSTs JSON bodies to each peer's endpoints.
///
/// Every send is spawned as its own task so one slow or unreachable peer
/// cannot delay delivery to the others or block the handler.
pub struct HttpRelay {
    client: reqwest::Client,
    self_url: String,
    peers: Vec<String>,
    owner_url: String,
    payload_threshold: usize,
    latency_bounds_ms: Option<(u64, u64)>,
    stats: Arc<TrafficStats>,
}

impl HttpRelay {
    pub fn new(
        self_url: impl Into<String>,
        peers: Vec<String>,
        owner_url: impl Into<String>,
        payload_threshold: usize,
        stats: Arc<TrafficStats>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            self_url: self_url.into(),
            peers,
            owner_url: owner_url.into(),
            payload_threshold,
            latency_bounds_ms: None,
            stats,
        }
    }

    /// Inject a uniformly random delay before every outbound send, for
    /// fault testing.
    pub fn with_simulated_latency(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.latency_bounds_ms = Some((min_ms, max_ms.max(min_ms)));
        self
    }

    pub fn stats(&self) -> Arc<TrafficStats> {
        Arc::clone(&self.stats)
    }

    fn spawn_post(&self, url: String, body: Vec<u8>) {
        let client = self.client.clone();
        let stats = Arc::clone(&self.stats);
        let latency = self.latency_bounds_ms;
        tokio::spawn(async move {
            if let Some((min_ms, max_ms)) = latency {
                let delay = rand::thread_rng().gen_range(min_ms..=max_ms);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            let len = body.len() as u64;
            let result = client
                .post(&url)
                .header("content-type", "application/json")
                .body(body)
                .timeout(SEND_TIMEOUT)
                .send()
                .await;
            match result {
                Ok(resp) if resp.status().is_success() => stats.record_sent(len),
                Ok(resp) => {
                    tracing::warn!(url = %url, status = %resp.status(), "peer rejected relay message");
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "peer unreachable, no retry");
                }
            }
        });
    }

    /// Pull the full object behind a notification from its sender.
    pub async fn fetch_payload(
        &self,
        notification: &PayloadNotification,
    ) -> Result<GossipObject, RelayError> {
        let url = format!("{}/gossip/new_payload_request", notification.sender);
        let resp = self
            .client
            .post(&url)
            .json(notification)
            .timeout(SEND_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        let bytes = resp.bytes().await?;
        self.stats.record_received(bytes.len() as u64);
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl Relay for HttpRelay {
    fn broadcast(&self, obj: &GossipObject) {
        let (path, body) = match plan_broadcast(obj, &self.self_url, self.payload_threshold) {
            BroadcastPlan::Forward(forward) => {
                let body = match serde_json::to_vec(&forward) {
                    Ok(b) => b,
                    Err(e) => {
                        tracing::error!(wire_type = %forward.wire_type, error = %e, "object serialization failed");
                        return;
                    }
                };
                (format!("/gossip/{}", forward.wire_type.path_suffix()), body)
            }
            BroadcastPlan::Notify(notification) => {
                let body = match serde_json::to_vec(&notification) {
                    Ok(b) => b,
                    Err(e) => {
                        tracing::error!(error = %e, "notification serialization failed");
                        return;
                    }
                };
                ("/gossip/new_payload_notification".to_string(), body)
            }
        };
        for peer in &self.peers {
            self.spawn_post(format!("{peer}{path}"), body.clone());
        }
    }

    fn send_to_owner(&self, obj: &GossipObject) {
        let body = match serde_json::to_vec(obj) {
            Ok(b) => b,
            Err(e) => {
                tracing::error!(wire_type = %obj.wire_type, error = %e, "object serialization failed");
                return;
            }
        };
        let url = format!("{}/receive-gossip-from-gossiper", self.owner_url);
        self.spawn_post(url, body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctgossip_types::SignatureScheme;

    const SELF_URL: &str = "https://gossiper-1.example";

    fn obj(wire_type: WireType, content: &str) -> GossipObject {
        GossipObject {
            app: "ct".into(),
            period: "p1".into(),
            wire_type,
            signer: "https://ca.example".into(),
            co_signers: Vec::new(),
            signature: "aa".into(),
            second_signature: None,
            timestamp: 1,
            scheme: SignatureScheme::Ed25519,
            payload: ["https://ca.example".into(), content.into(), String::new()],
        }
    }

    #[test]
    fn small_objects_forward_unchanged() {
        let o = obj(WireType::RevInit, "small");
        match plan_broadcast(&o, SELF_URL, 1 << 20) {
            BroadcastPlan::Forward(f) => assert_eq!(f, o),
            other => panic!("expected Forward, got {other:?}"),
        }
    }

    #[test]
    fn oversized_rev_init_becomes_notification() {
        let o = obj(WireType::RevInit, &"x".repeat(4096));
        match plan_broadcast(&o, SELF_URL, 1024) {
            BroadcastPlan::Notify(n) => {
                assert_eq!(n.sender, SELF_URL);
                assert_eq!(n.period, "p1");
                assert_eq!(n.wire_type, WireType::RevInit);
                assert_eq!(n.entity_url, "https://ca.example");
            }
            other => panic!("expected Notify, got {other:?}"),
        }
    }

    #[test]
    fn oversized_rev_frag_is_stripped() {
        let o = obj(WireType::RevFrag, &"x".repeat(4096));
        match plan_broadcast(&o, SELF_URL, 1024) {
            BroadcastPlan::Forward(f) => {
                assert_eq!(f.payload[0], o.payload[0]);
                assert!(f.payload[1].is_empty());
                assert!(f.payload[2].is_empty());
                assert_eq!(f.signature, o.signature);
            }
            other => panic!("expected Forward, got {other:?}"),
        }
    }

    #[test]
    fn oversized_other_types_forward_in_full() {
        let o = obj(WireType::SthInit, &"x".repeat(4096));
        match plan_broadcast(&o, SELF_URL, 1024) {
            BroadcastPlan::Forward(f) => assert_eq!(f, o),
            other => panic!("expected Forward, got {other:?}"),
        }
    }
}
