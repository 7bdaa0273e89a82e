//! Edge queries and the per-token key cache.

use std::collections::HashMap;

use sheet_records::{RecordStore, Token, TokenId};
use tracing::trace;

use crate::graph::EdgeStore;
use crate::names::{composite_key, normalize};

/// Check whether `a_key` has influence over `b_key`.
///
/// Looks for a `from` key contained in `a_key` whose target set holds a key
/// contained in `b_key`. The first such pair in insertion order wins. Keys
/// that happen to be substrings of unrelated keys match too.
pub fn has_edge(edges: &EdgeStore, a_key: &str, b_key: &str) -> bool {
    if a_key.is_empty() || b_key.is_empty() {
        return false;
    }

    edges
        .iter()
        .filter(|adjacency| a_key.contains(adjacency.from.as_str()))
        .any(|adjacency| {
            adjacency
                .targets
                .iter()
                .any(|target| b_key.contains(target.as_str()))
        })
}

/// A cached composite key tagged with the index version it was computed at.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CachedKey {
    key: String,
    version: u64,
}

/// Resolves tokens to composite keys, caching per token until the index version moves.
#[derive(Debug, Default)]
pub struct QueryEngine {
    cache: HashMap<TokenId, CachedKey>,
    misses: u64,
}

impl QueryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the composite key for a token.
    ///
    /// A cached key is reused only while its version equals `version`. A token
    /// with no resolvable actor is keyed by its own name.
    pub fn key_for(&mut self, token: &Token, store: &dyn RecordStore, version: u64) -> String {
        if let Some(cached) = self.cache.get(&token.id) {
            if cached.version == version {
                return cached.key.clone();
            }
        }

        self.misses += 1;
        let key = match token.actor.and_then(|id| store.record(id)) {
            Some(record) => composite_key(&record, Some(&token.name)),
            None => normalize(&token.name),
        };
        trace!(token = %token.id, %key, version, "token key computed");

        self.cache.insert(
            token.id,
            CachedKey {
                key: key.clone(),
                version,
            },
        );
        key
    }

    /// Drop the cached key of one token.
    pub fn invalidate(&mut self, token_id: TokenId) {
        self.cache.remove(&token_id);
    }

    /// Drop every cached key.
    pub fn invalidate_all(&mut self) {
        self.cache.clear();
    }

    /// Number of key computations so far.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Number of tokens currently cached.
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}
