//! The influence service - one owned instance holding the edge store, the
//! token key cache and the synchronizer.

use std::sync::Arc;

use sheet_records::{EntityId, RecordStore, Token, TokenId};
use tracing::debug;

use crate::config::InfluenceConfig;
use crate::graph::{EdgeStore, GraphBuilder, RebuildStats};
use crate::query::{self, QueryEngine};
use crate::sync::{SymmetrySynchronizer, SyncReport};

/// Answers "does A have influence over B?" for characters named only by free text.
pub struct InfluenceService {
    store: Arc<dyn RecordStore>,
    config: InfluenceConfig,
    edges: EdgeStore,
    builder: GraphBuilder,
    query: QueryEngine,
    synchronizer: SymmetrySynchronizer,
}

impl InfluenceService {
    /// Create a service over `store`. The graph stays empty until [`init`](Self::init).
    pub fn new(store: Arc<dyn RecordStore>, config: InfluenceConfig) -> Self {
        Self {
            store,
            config,
            edges: EdgeStore::new(),
            builder: GraphBuilder::new(),
            query: QueryEngine::new(),
            synchronizer: SymmetrySynchronizer::new(),
        }
    }

    /// Build the graph for the first time.
    pub fn init(&mut self) -> RebuildStats {
        self.rebuild()
    }

    pub fn config(&self) -> &InfluenceConfig {
        &self.config
    }

    pub fn edges(&self) -> &EdgeStore {
        &self.edges
    }

    /// Current index version.
    pub fn version(&self) -> u64 {
        self.edges.version()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.edge_count()
    }

    /// Number of token keys computed so far (cache misses).
    pub fn key_misses(&self) -> u64 {
        self.query.misses()
    }

    /// Derive the whole graph again from the store.
    pub fn rebuild(&mut self) -> RebuildStats {
        self.builder.rebuild(self.store.as_ref(), &mut self.edges)
    }

    /// Check whether the entity keyed `a_key` has influence over `b_key`.
    pub fn has_edge(&self, a_key: &str, b_key: &str) -> bool {
        query::has_edge(&self.edges, a_key, b_key)
    }

    /// Get a token's composite key, cached until the next rebuild.
    pub fn key_for(&mut self, token: &Token) -> String {
        let version = self.edges.version();
        self.query.key_for(token, self.store.as_ref(), version)
    }

    /// Forget one token's cached key (e.g. after a rename).
    pub fn invalidate(&mut self, token_id: TokenId) {
        self.query.invalidate(token_id);
    }

    /// Forget every cached token key (e.g. after a scene change).
    pub fn invalidate_all(&mut self) {
        self.query.invalidate_all();
    }

    /// Check whether token `a` has influence over token `b`.
    pub fn has_edge_between_instances(&mut self, a: &Token, b: &Token) -> bool {
        let a_key = self.key_for(a);
        let b_key = self.key_for(b);
        self.has_edge(&a_key, &b_key)
    }

    /// Mirror a character's relationships onto its counterparts, then rebuild.
    ///
    /// Returns `None` when nothing ran: unknown record, not a character, no
    /// usable name, or a sync of it already in flight.
    pub async fn sync(&mut self, id: EntityId) -> Option<SyncReport> {
        let Some(record) = self.store.record(id) else {
            debug!(record = %id, "sync requested for unknown record");
            return None;
        };

        let report = self
            .synchronizer
            .sync(self.store.as_ref(), &record)
            .await?;
        self.rebuild();
        Some(report)
    }
}
