//! Edge store - directed adjacency between normalized keys plus the index version.

use serde::Serialize;
use std::collections::HashMap;

/// Outgoing edges of one key, targets in insertion order.
#[derive(Debug, Clone, Serialize)]
pub struct Adjacency {
    pub from: String,
    pub targets: Vec<String>,
}

/// The influence graph: `from -> to` means "from has influence over to".
///
/// Iteration follows insertion order of `from` keys and of targets, so
/// queries see the same order on every rebuild of unchanged data.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EdgeStore {
    adjacency: Vec<Adjacency>,

    #[serde(skip)]
    index: HashMap<String, usize>,

    /// Bumped once per rebuild.
    version: u64,
}

impl EdgeStore {
    /// Create an empty store at version 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `to` into the target set of `from`.
    pub(crate) fn add_edge(&mut self, from: String, to: String) {
        let slot = match self.index.get(&from) {
            Some(&slot) => slot,
            None => {
                self.adjacency.push(Adjacency {
                    from: from.clone(),
                    targets: Vec::new(),
                });
                self.index.insert(from, self.adjacency.len() - 1);
                self.adjacency.len() - 1
            }
        };

        let targets = &mut self.adjacency[slot].targets;
        if !targets.contains(&to) {
            targets.push(to);
        }
    }

    /// Drop every edge. The version is untouched.
    pub(crate) fn clear(&mut self) {
        self.adjacency.clear();
        self.index.clear();
    }

    pub(crate) fn bump_version(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    /// Current index version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Iterate adjacency lists in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Adjacency> {
        self.adjacency.iter()
    }

    /// Get the targets of an exact `from` key.
    pub fn targets(&self, from: &str) -> &[String] {
        self.index
            .get(from)
            .map(|&slot| self.adjacency[slot].targets.as_slice())
            .unwrap_or(&[])
    }

    /// Check for an exact edge, without substring matching.
    pub fn contains_edge(&self, from: &str, to: &str) -> bool {
        self.targets(from).iter().any(|t| t == to)
    }

    /// Get the total number of edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(|a| a.targets.len()).sum()
    }

    /// Check if the store has no edges.
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_edge_dedups_targets() {
        let mut store = EdgeStore::new();
        store.add_edge("beacon".into(), "legacy".into());
        store.add_edge("beacon".into(), "legacy".into());
        store.add_edge("beacon".into(), "warden".into());

        assert_eq!(store.targets("beacon"), ["legacy", "warden"]);
        assert_eq!(store.edge_count(), 2);
        assert!(store.contains_edge("beacon", "warden"));
        assert!(!store.contains_edge("legacy", "beacon"));
    }

    #[test]
    fn test_insertion_order() {
        let mut store = EdgeStore::new();
        store.add_edge("zed".into(), "a".into());
        store.add_edge("amy".into(), "b".into());
        store.add_edge("zed".into(), "c".into());

        let froms: Vec<_> = store.iter().map(|a| a.from.as_str()).collect();
        assert_eq!(froms, ["zed", "amy"]);
    }

    #[test]
    fn test_clear_keeps_version() {
        let mut store = EdgeStore::new();
        store.add_edge("beacon".into(), "legacy".into());
        store.bump_version();

        store.clear();

        assert!(store.is_empty());
        assert!(store.targets("beacon").is_empty());
        assert_eq!(store.version(), 1);
    }
}
