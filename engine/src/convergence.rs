//! Convergence predicates over the object store.
//!
//! A node is INIT-convergent when it holds a claim from every expected source
//! for the period, and convergent when it holds a final verdict (a FULL
//! certification or conflict evidence) for every expected source. Crossing
//! times are recorded once per period for measurement.

use std::sync::Mutex;

use ctgossip_store::ObjectStore;
use ctgossip_types::WireType;

use crate::unix_now_secs;

const INIT_TYPES: [WireType; 3] = [WireType::SthInit, WireType::RevInit, WireType::AccInit];
const FINAL_TYPES: [WireType; 4] = [
    WireType::SthFull,
    WireType::RevFull,
    WireType::AccFull,
    WireType::ConInit,
];

/// First times (unix seconds) each convergence predicate held this period.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct ConvergenceTimes {
    pub init_at: Option<u64>,
    pub full_at: Option<u64>,
}

pub struct ConvergenceTracker {
    expected_sources: usize,
    times: Mutex<ConvergenceTimes>,
}

impl ConvergenceTracker {
    pub fn new(expected_sources: usize) -> Self {
        Self {
            expected_sources,
            times: Mutex::new(ConvergenceTimes::default()),
        }
    }

    pub fn expected_sources(&self) -> usize {
        self.expected_sources
    }

    fn distinct_over(store: &ObjectStore, types: &[WireType]) -> usize {
        types.iter().map(|&w| store.distinct_count(w)).sum()
    }

    /// Claims from at least `expected_sources` distinct identities are held.
    pub fn is_init_convergent(&self, store: &ObjectStore) -> bool {
        Self::distinct_over(store, &INIT_TYPES) >= self.expected_sources
    }

    /// Final verdicts for at least `expected_sources` distinct identities are
    /// held. A blacklisting conflict counts as a verdict.
    pub fn is_convergent(&self, store: &ObjectStore) -> bool {
        Self::distinct_over(store, &FINAL_TYPES) >= self.expected_sources
    }

    /// Re-evaluate both predicates, recording the first crossing times.
    /// Recorded times never move; convergence is monotone within a period.
    pub fn observe(&self, store: &ObjectStore) {
        let mut times = self.times.lock().expect("convergence lock poisoned");
        if times.init_at.is_none() && self.is_init_convergent(store) {
            times.init_at = Some(unix_now_secs());
            tracing::info!("all expected claims received");
        }
        if times.full_at.is_none() && self.is_convergent(store) {
            times.full_at = Some(unix_now_secs());
            tracing::info!("all expected verdicts reached");
        }
    }

    pub fn times(&self) -> ConvergenceTimes {
        *self.times.lock().expect("convergence lock poisoned")
    }

    /// Forget crossing times at a period boundary.
    pub fn reset(&self) {
        *self.times.lock().expect("convergence lock poisoned") = ConvergenceTimes::default();
    }
}
