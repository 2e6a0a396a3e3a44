//! Permanent blacklist of misbehaving entities.

use std::collections::HashSet;
use std::sync::RwLock;

/// A set of entity URLs that have equivocated or been accused by quorum.
///
/// Append-only: entries survive the epoch sweep. Once an entity is listed,
/// the node neither signs fragments on its behalf nor accepts further objects
/// naming it as origin.
#[derive(Debug, Default)]
pub struct Blacklist {
    entries: RwLock<HashSet<String>>,
}

impl Blacklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity URL. Returns `true` if it was newly added.
    pub fn insert(&self, entity_url: &str) -> bool {
        let mut entries = self.entries.write().expect("blacklist lock poisoned");
        entries.insert(entity_url.to_string())
    }

    pub fn contains(&self, entity_url: &str) -> bool {
        let entries = self.entries.read().expect("blacklist lock poisoned");
        entries.contains(entity_url)
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.read().expect("blacklist lock poisoned");
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the listed entities, sorted for stable output.
    pub fn snapshot(&self) -> Vec<String> {
        let entries = self.entries.read().expect("blacklist lock poisoned");
        let mut listed: Vec<String> = entries.iter().cloned().collect();
        listed.sort();
        listed
    }
}
