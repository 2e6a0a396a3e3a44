//! Periodic JSON-lines snapshots of the node's state, for measurement runs.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use ctgossip_engine::{ConvergenceTimes, Gossiper};
use ctgossip_relay::{TrafficSnapshot, TrafficStats};

use crate::NodeError;

/// One snapshot line.
#[derive(Debug, Serialize)]
pub struct SnapshotRecord {
    /// Capture time, unix seconds.
    pub at: u64,
    /// Distinct identities per wire type.
    pub counts: BTreeMap<String, usize>,
    pub blacklist: Vec<String>,
    pub convergence: ConvergenceTimes,
    pub traffic: TrafficSnapshot,
}

/// Capture the current state of a gossiper.
pub fn capture(gossiper: &Gossiper, stats: &TrafficStats) -> SnapshotRecord {
    let store = gossiper.store();
    SnapshotRecord {
        at: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
        counts: store
            .counts_snapshot()
            .into_iter()
            .map(|(w, n)| (w.path_suffix().to_string(), n))
            .collect(),
        blacklist: store.blacklist().snapshot(),
        convergence: gossiper.convergence().times(),
        traffic: stats.snapshot(),
    }
}

/// Appends snapshot records to a file, one JSON object per line.
pub struct SnapshotWriter {
    path: PathBuf,
}

impl SnapshotWriter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn append(&self, record: &SnapshotRecord) -> Result<(), NodeError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use ctgossip_nullables::{NullCrypto, RecordingRelay};
    use ctgossip_store::ObjectStore;
    use ctgossip_types::{GossipObject, SignatureScheme, ThresholdParams, WireType};

    fn gossiper() -> Arc<Gossiper> {
        let crypto = Arc::new(NullCrypto::new("https://g1.example"));
        let store = Arc::new(ObjectStore::new(
            crypto.clone(),
            ThresholdParams::new(4, 2).unwrap(),
        ));
        Gossiper::new(
            store,
            crypto,
            Arc::new(RecordingRelay::new()),
            1,
            Duration::from_secs(1),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn appended_lines_parse_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshots.jsonl");
        let writer = SnapshotWriter::new(path.clone());
        let g = gossiper();
        let stats = TrafficStats::new();

        writer.append(&capture(&g, &stats)).unwrap();

        g.clone().handle(GossipObject {
            app: "ct".into(),
            period: "p1".into(),
            wire_type: WireType::SthInit,
            signer: "https://log.example".into(),
            co_signers: Vec::new(),
            signature: "sig-1".into(),
            second_signature: None,
            timestamp: 1,
            scheme: SignatureScheme::Ed25519,
            payload: ["https://log.example".into(), "head".into(), String::new()],
        });
        stats.record_received(100);
        writer.append(&capture(&g, &stats)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["counts"]["sth_init"], 0);
        assert_eq!(lines[1]["counts"]["sth_init"], 1);
        assert_eq!(lines[1]["traffic"]["bytes_received"], 100);
        assert!(lines[1]["convergence"]["init_at"].is_u64());
    }
}
