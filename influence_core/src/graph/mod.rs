//! Graph construction - full rescan of every character record into an [`EdgeStore`].
//!
//! For each character with a non-empty composite key, every named
//! relationship entry contributes up to two edges:
//! - `haveInfluenceOver` adds `self -> name`
//! - `hasInfluenceOver` adds `name -> self`
//!
//! Edges are never patched in place; every change goes through a rebuild.

mod edges;

pub use edges::*;

use sheet_records::RecordStore;
use tracing::debug;

use crate::names::{composite_key, normalize};

/// Counts from one rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RebuildStats {
    /// Characters that contributed to the graph.
    pub characters: usize,
    /// Characters skipped because their key was empty.
    pub skipped: usize,
    /// Edges in the store after the rebuild.
    pub edges: usize,
    /// Index version after the rebuild.
    pub version: u64,
}

/// Rebuilds an [`EdgeStore`] from the record store.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphBuilder;

impl GraphBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Clear `edges` and derive them again from every character record.
    ///
    /// Never fails: malformed relationship data reads as empty and records
    /// with no usable name are skipped. The version is bumped exactly once.
    pub fn rebuild(&self, store: &dyn RecordStore, edges: &mut EdgeStore) -> RebuildStats {
        edges.clear();
        let mut stats = RebuildStats::default();

        for record in store.list_records().iter().filter(|r| r.is_character()) {
            let self_key = composite_key(record, None);
            if self_key.is_empty() {
                stats.skipped += 1;
                continue;
            }
            stats.characters += 1;

            for entry in store.read_relationship_entries(record) {
                let name = normalize(&entry.name);
                if name.is_empty() {
                    continue;
                }

                if entry.have_influence_over {
                    edges.add_edge(self_key.clone(), name.clone());
                }
                if entry.has_influence_over {
                    edges.add_edge(name, self_key.clone());
                }
            }
        }

        stats.edges = edges.edge_count();
        stats.version = edges.bump_version();
        debug!(
            characters = stats.characters,
            skipped = stats.skipped,
            edges = stats.edges,
            version = stats.version,
            "influence graph rebuilt"
        );
        stats
    }
}
