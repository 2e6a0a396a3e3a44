//! The gossip HTTP surface.
//!
//! Peers POST objects to `/gossip/<wire_type>`, oversized-payload
//! notifications to `/gossip/new_payload_notification`, and pull requests to
//! `/gossip/new_payload_request`. `/status` exposes the node's period state
//! for operators and experiments.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use ctgossip_engine::{ConvergenceTimes, Gossiper};
use ctgossip_relay::{HttpRelay, TrafficSnapshot};
use ctgossip_types::{derive_object_id, GossipObject, PayloadNotification, WireType};

pub struct AppState {
    pub self_url: String,
    pub gossiper: Arc<Gossiper>,
    pub relay: Arc<HttpRelay>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/gossip/new_payload_notification", post(receive_notification))
        .route("/gossip/new_payload_request", post(serve_payload))
        .route("/gossip/:wire_type", post(receive_object))
        .route("/status", get(status))
        .with_state(state)
}

/// One inbound gossip object. The URL names the wire type; the body must
/// agree with it.
async fn receive_object(
    State(state): State<Arc<AppState>>,
    Path(suffix): Path<String>,
    body: Bytes,
) -> StatusCode {
    let Ok(wire_type) = WireType::from_suffix(&suffix) else {
        return StatusCode::NOT_FOUND;
    };
    let obj: GossipObject = match serde_json::from_slice(&body) {
        Ok(obj) => obj,
        Err(e) => {
            tracing::debug!(wire_type = %wire_type, error = %e, "unparseable gossip body");
            return StatusCode::BAD_REQUEST;
        }
    };
    if obj.wire_type != wire_type {
        tracing::debug!(
            url_type = %wire_type,
            body_type = %obj.wire_type,
            "wire type mismatch between URL and body"
        );
        return StatusCode::BAD_REQUEST;
    }
    state.relay.stats().record_received(body.len() as u64);
    state.gossiper.clone().handle(obj);
    StatusCode::OK
}

/// A peer holds an object too large to broadcast; pull it unless we already
/// have it.
async fn receive_notification(
    State(state): State<Arc<AppState>>,
    Json(notification): Json<PayloadNotification>,
) -> StatusCode {
    let id = derive_object_id(
        &notification.period,
        notification.wire_type,
        &notification.entity_url,
    );
    if state.gossiper.store().contains(notification.wire_type, &id) {
        return StatusCode::OK;
    }
    let relay = Arc::clone(&state.relay);
    let gossiper = Arc::clone(&state.gossiper);
    tokio::spawn(async move {
        match relay.fetch_payload(&notification).await {
            Ok(obj) => gossiper.handle(obj),
            Err(e) => {
                tracing::warn!(sender = %notification.sender, error = %e, "payload pull failed");
            }
        }
    });
    StatusCode::ACCEPTED
}

/// Serve a stored object to a peer pulling a notified payload.
async fn serve_payload(
    State(state): State<Arc<AppState>>,
    Json(notification): Json<PayloadNotification>,
) -> Result<Json<GossipObject>, StatusCode> {
    let id = derive_object_id(
        &notification.period,
        notification.wire_type,
        &notification.entity_url,
    );
    state
        .gossiper
        .store()
        .get(notification.wire_type, &id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub self_url: String,
    pub expected_sources: usize,
    pub init_convergent: bool,
    pub convergent: bool,
    pub convergence: ConvergenceTimes,
    pub counts: BTreeMap<String, usize>,
    pub blacklist: Vec<String>,
    pub traffic: TrafficSnapshot,
}

async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let store = state.gossiper.store();
    let convergence = state.gossiper.convergence();
    Json(StatusResponse {
        self_url: state.self_url.clone(),
        expected_sources: convergence.expected_sources(),
        init_convergent: convergence.is_init_convergent(store),
        convergent: convergence.is_convergent(store),
        convergence: convergence.times(),
        counts: store
            .counts_snapshot()
            .into_iter()
            .map(|(w, n)| (w.path_suffix().to_string(), n))
            .collect(),
        blacklist: store.blacklist().snapshot(),
        traffic: state.relay.stats().snapshot(),
    })
}
