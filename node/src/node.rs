//! Node wiring: config in, running gossiper out.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use ctgossip_crypto::CryptoService;
use ctgossip_engine::Gossiper;
use ctgossip_relay::{HttpRelay, Relay, TrafficStats};
use ctgossip_store::ObjectStore;

use crate::config::GossiperConfig;
use crate::server::{router, AppState};
use crate::snapshot::{self, SnapshotWriter};
use crate::NodeError;

/// One assembled gossiper node: engine, relay, and the periodic tasks around
/// them.
pub struct GossipNode {
    config: GossiperConfig,
    gossiper: Arc<Gossiper>,
    relay: Arc<HttpRelay>,
}

impl GossipNode {
    pub fn new(config: GossiperConfig) -> Result<Self, NodeError> {
        let params = config.params()?;
        let crypto: Arc<dyn CryptoService> = Arc::new(config.build_keyring()?);
        let store = Arc::new(ObjectStore::new(Arc::clone(&crypto), params));

        let mut relay = HttpRelay::new(
            &config.self_url,
            config.peers.clone(),
            &config.owner_url,
            config.payload_threshold_bytes,
            Arc::new(TrafficStats::new()),
        );
        if let Some((min_ms, max_ms)) = config.simulated_latency_ms {
            tracing::info!(min_ms, max_ms, "simulating send latency");
            relay = relay.with_simulated_latency(min_ms, max_ms);
        }
        let relay = Arc::new(relay);

        let gossiper = Gossiper::new(
            store,
            crypto,
            Arc::clone(&relay) as Arc<dyn Relay>,
            config.expected_sources,
            config.gossip_wait(),
        );
        Ok(Self {
            config,
            gossiper,
            relay,
        })
    }

    pub fn gossiper(&self) -> &Arc<Gossiper> {
        &self.gossiper
    }

    /// Serve the gossip API until interrupted.
    pub async fn run(&self) -> Result<(), NodeError> {
        self.spawn_period_sweep();
        self.spawn_snapshots();

        let app = router(Arc::new(AppState {
            self_url: self.config.self_url.clone(),
            gossiper: Arc::clone(&self.gossiper),
            relay: Arc::clone(&self.relay),
        }));
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(%addr, self_url = %self.config.self_url, "gossip server listening");
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("shutdown signal received");
            })
            .await?;
        Ok(())
    }

    fn spawn_period_sweep(&self) {
        let gossiper = Arc::clone(&self.gossiper);
        let period = Duration::from_secs(self.config.period_secs);
        tokio::spawn(async move {
            let mut ticks = tokio::time::interval(period);
            // The first tick completes immediately; the sweep starts one
            // period out.
            ticks.tick().await;
            loop {
                ticks.tick().await;
                gossiper.sweep_period();
            }
        });
    }

    fn spawn_snapshots(&self) {
        let Some(path) = self.config.snapshot_path.clone() else {
            return;
        };
        let writer = SnapshotWriter::new(path);
        let gossiper = Arc::clone(&self.gossiper);
        let stats = self.relay.stats();
        let interval = Duration::from_secs(self.config.snapshot_interval_secs);
        tokio::spawn(async move {
            let mut ticks = tokio::time::interval(interval);
            loop {
                ticks.tick().await;
                if let Err(e) = writer.append(&snapshot::capture(&gossiper, &stats)) {
                    tracing::warn!(error = %e, "snapshot write failed");
                }
            }
        });
    }
}
