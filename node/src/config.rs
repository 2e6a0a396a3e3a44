//! Gossiper configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use ctgossip_crypto::{bls_keypair_from_seed, bls_public_from_hex, ed25519_public_from_hex, Keyring};
use ctgossip_types::ThresholdParams;

use crate::NodeError;

/// Configuration for one gossiper node.
///
/// Can be loaded from a TOML file via [`GossiperConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GossiperConfig {
    /// This node's public base URL, used as its signer identity.
    pub self_url: String,

    /// Port the gossip HTTP server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Base URL of the owner this node reports certifications to.
    pub owner_url: String,

    /// Peer gossiper base URLs (excluding this node).
    #[serde(default)]
    pub peers: Vec<String>,

    /// Deployment size N.
    #[serde(default = "default_total")]
    pub total: usize,

    /// Quorum size T.
    #[serde(default = "default_threshold")]
    pub threshold: usize,

    /// Distinct claim sources expected per period, for the convergence
    /// predicates.
    #[serde(default = "default_expected_sources")]
    pub expected_sources: usize,

    /// Seconds to wait after accepting a claim before co-signing it, giving
    /// conflicting claims time to surface.
    #[serde(default = "default_gossip_wait_secs")]
    pub gossip_wait_secs: u64,

    /// Period length in seconds. Period-scoped state is swept on boundaries.
    #[serde(default = "default_period_secs")]
    pub period_secs: u64,

    /// Objects whose JSON encoding exceeds this many bytes are not broadcast
    /// in full.
    #[serde(default = "default_payload_threshold")]
    pub payload_threshold_bytes: usize,

    /// Optional [min_ms, max_ms] uniform artificial send delay, for fault
    /// testing.
    #[serde(default)]
    pub simulated_latency_ms: Option<(u64, u64)>,

    /// Snapshot file (JSON lines). Snapshots are disabled when unset.
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,

    #[serde(default = "default_snapshot_interval_secs")]
    pub snapshot_interval_secs: u64,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// This node's BLS secret seed, 32 bytes hex-encoded.
    pub bls_seed: String,

    /// Authorities whose claims this node accepts (Ed25519 public keys).
    #[serde(default)]
    pub authorities: Vec<KeyEntry>,

    /// Every gossiper in the deployment, this node included (BLS public
    /// keys).
    #[serde(default)]
    pub gossipers: Vec<KeyEntry>,
}

/// A (url, hex public key) registry entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyEntry {
    pub url: String,
    pub public_key: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_port() -> u16 {
    8080
}

fn default_total() -> usize {
    4
}

fn default_threshold() -> usize {
    2
}

fn default_expected_sources() -> usize {
    1
}

fn default_gossip_wait_secs() -> u64 {
    10
}

fn default_period_secs() -> u64 {
    86_400
}

fn default_payload_threshold() -> usize {
    10_240
}

fn default_snapshot_interval_secs() -> u64 {
    60
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl GossiperConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn params(&self) -> Result<ThresholdParams, NodeError> {
        Ok(ThresholdParams::new(self.total, self.threshold)?)
    }

    pub fn gossip_wait(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.gossip_wait_secs)
    }

    /// Assemble the keyring from the configured seed and key registries.
    pub fn build_keyring(&self) -> Result<Keyring, NodeError> {
        let params = self.params()?;
        let seed = hex::decode(&self.bls_seed)
            .map_err(|e| NodeError::Config(format!("bls_seed: {e}")))?;
        let seed: [u8; 32] = seed
            .try_into()
            .map_err(|_| NodeError::Config("bls_seed must be 32 bytes of hex".into()))?;
        let (secret, _) = bls_keypair_from_seed(&seed)?;

        let mut ring = Keyring::new(&self.self_url, params, secret);
        for entry in &self.authorities {
            ring = ring.with_authority(&entry.url, ed25519_public_from_hex(&entry.public_key)?);
        }
        for entry in &self.gossipers {
            ring = ring.with_gossiper(&entry.url, bls_public_from_hex(&entry.public_key)?);
        }
        Ok(ring)
    }
}

impl Default for GossiperConfig {
    fn default() -> Self {
        Self {
            self_url: "http://127.0.0.1:8080".to_string(),
            port: default_port(),
            owner_url: "http://127.0.0.1:9090".to_string(),
            peers: Vec::new(),
            total: default_total(),
            threshold: default_threshold(),
            expected_sources: default_expected_sources(),
            gossip_wait_secs: default_gossip_wait_secs(),
            period_secs: default_period_secs(),
            payload_threshold_bytes: default_payload_threshold(),
            simulated_latency_ms: None,
            snapshot_path: None,
            snapshot_interval_secs: default_snapshot_interval_secs(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            bls_seed: "11".repeat(32),
            authorities: Vec::new(),
            gossipers: Vec::new(),
        }
    }
}
