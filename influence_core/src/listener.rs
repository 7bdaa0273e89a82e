//! Glue from store change notifications to rebuilds, syncs and cache invalidation.

use sheet_records::{ChangeBus, ChangeEvent, Subscription, WriteOrigin};
use tracing::trace;

use crate::graph::RebuildStats;
use crate::service::InfluenceService;
use crate::sync::SyncReport;

/// What the listener did with one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Rebuilt(RebuildStats),
    Synced(SyncReport),
    Invalidated,
    Ignored,
}

/// A subscription to a store's change bus, dispatching into an [`InfluenceService`].
#[derive(Debug)]
pub struct ChangeListener {
    subscription: Subscription,
}

impl ChangeListener {
    /// Subscribe to `bus`.
    pub fn attach(bus: &ChangeBus) -> Self {
        Self {
            subscription: bus.subscribe(),
        }
    }

    /// Unsubscribe. Queued events are dropped.
    pub fn detach(self) {
        self.subscription.unsubscribe();
    }

    /// React to a single event.
    ///
    /// Notifications caused by the synchronizer's own writes are dropped here
    /// so they never start another sync.
    pub async fn handle(service: &mut InfluenceService, event: &ChangeEvent) -> Dispatch {
        let dispatch = match event {
            ChangeEvent::Ready => Dispatch::Rebuilt(service.rebuild()),
            ChangeEvent::ViewChanged => {
                service.invalidate_all();
                Dispatch::Invalidated
            }
            ChangeEvent::TokenUpdated { token_id } => {
                service.invalidate(*token_id);
                Dispatch::Invalidated
            }
            ChangeEvent::RecordUpdated {
                origin: WriteOrigin::Synchronizer,
                ..
            } => Dispatch::Ignored,
            ChangeEvent::RecordUpdated { record_id, .. } => {
                // Echoes of sync writes were filtered above by origin.
                let config = service.config();
                let relationships_changed = event.touches(&config.relationships_path);
                let names_changed = config.name_paths.iter().any(|p| event.touches(p));
                let symmetric = config.symmetric_sync;

                if relationships_changed && symmetric {
                    match service.sync(*record_id).await {
                        Some(report) => Dispatch::Synced(report),
                        None => Dispatch::Rebuilt(service.rebuild()),
                    }
                } else if relationships_changed || names_changed {
                    Dispatch::Rebuilt(service.rebuild())
                } else {
                    Dispatch::Ignored
                }
            }
        };

        trace!(?event, ?dispatch, "change dispatched");
        dispatch
    }

    /// Wait for the next event and handle it. `None` once the bus is gone.
    pub async fn next(&mut self, service: &mut InfluenceService) -> Option<Dispatch> {
        let event = self.subscription.recv().await?;
        Some(Self::handle(service, &event).await)
    }

    /// Handle every event already queued, without waiting for more.
    pub async fn pump(&mut self, service: &mut InfluenceService) -> Vec<Dispatch> {
        let mut dispatched = Vec::new();
        while let Some(event) = self.subscription.try_recv() {
            dispatched.push(Self::handle(service, &event).await);
        }
        dispatched
    }

    /// Handle events until the bus is dropped.
    pub async fn run(mut self, service: &mut InfluenceService) {
        while self.next(service).await.is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::InfluenceConfig;
    use sheet_records::{CharacterRecord, InMemoryStore, RecordStore, RelationshipEntry, Token};

    fn setup(config: InfluenceConfig) -> (Arc<InMemoryStore>, InfluenceService, ChangeListener) {
        let store = Arc::new(InMemoryStore::new());
        let service = InfluenceService::new(store.clone(), config);
        let listener = ChangeListener::attach(store.bus());
        (store, service, listener)
    }

    #[tokio::test]
    async fn test_ready_rebuilds() {
        let (store, mut service, mut listener) = setup(InfluenceConfig::default());
        store.publish_ready();

        let dispatched = listener.pump(&mut service).await;

        assert!(matches!(dispatched.as_slice(), [Dispatch::Rebuilt(_)]));
        assert_eq!(service.version(), 1);
    }

    #[tokio::test]
    async fn test_user_edit_syncs_once_without_echo() {
        let (store, mut service, mut listener) = setup(InfluenceConfig::default());
        let beacon = store.insert(CharacterRecord::new("Beacon"));
        let legacy = store.insert(CharacterRecord::new("Legacy"));
        listener.pump(&mut service).await;

        store
            .edit_relationships(
                beacon,
                &[RelationshipEntry::new("Legacy").with_have_influence_over(true)],
            )
            .unwrap();
        let dispatched = listener.pump(&mut service).await;

        // The counterpart write's own notification is queued behind the edit and dropped.
        match dispatched.as_slice() {
            [Dispatch::Synced(report), Dispatch::Ignored] => {
                assert_eq!(report.written, vec![legacy])
            }
            other => panic!("unexpected dispatch: {:?}", other),
        }
        assert_eq!(store.write_count(), 2);
        assert!(listener.pump(&mut service).await.is_empty());
        assert!(service.has_edge("beacon", "legacy"));
    }

    #[tokio::test]
    async fn test_dispatch_depends_on_origin_not_timing() {
        let (store, mut service, mut listener) = setup(InfluenceConfig::default());
        let beacon = store.insert(
            CharacterRecord::new("Beacon").with_relationships(&[
                RelationshipEntry::new("Legacy").with_have_influence_over(true)
            ]),
        );
        store.insert(CharacterRecord::new("Legacy"));
        listener.pump(&mut service).await;

        let changed = |origin| ChangeEvent::RecordUpdated {
            record_id: beacon,
            changed_paths: vec![relationships_path()],
            origin,
        };

        let echo = ChangeListener::handle(&mut service, &changed(WriteOrigin::Synchronizer)).await;
        assert_eq!(echo, Dispatch::Ignored);

        let edit = ChangeListener::handle(&mut service, &changed(WriteOrigin::User)).await;
        assert!(matches!(edit, Dispatch::Synced(_)));
    }

    fn relationships_path() -> String {
        InfluenceConfig::default().relationships_path
    }

    #[tokio::test]
    async fn test_sync_disabled_only_rebuilds() {
        let config = InfluenceConfig {
            symmetric_sync: false,
            ..InfluenceConfig::default()
        };
        let (store, mut service, mut listener) = setup(config);
        let beacon = store.insert(CharacterRecord::new("Beacon"));
        let legacy = store.insert(CharacterRecord::new("Legacy"));
        listener.pump(&mut service).await;

        store
            .edit_relationships(
                beacon,
                &[RelationshipEntry::new("Legacy").with_have_influence_over(true)],
            )
            .unwrap();
        let dispatched = listener.pump(&mut service).await;

        assert!(matches!(dispatched.as_slice(), [Dispatch::Rebuilt(_)]));
        assert!(store.record(legacy).unwrap().relationship_entries().is_empty());
        assert!(service.has_edge("beacon", "legacy"));
    }

    #[tokio::test]
    async fn test_rename_rebuilds() {
        let (store, mut service, mut listener) = setup(InfluenceConfig::default());
        let beacon = store.insert(
            CharacterRecord::new("Beacon").with_relationships(&[
                RelationshipEntry::new("Legacy").with_have_influence_over(true)
            ]),
        );
        listener.pump(&mut service).await;
        assert!(service.has_edge("beacon", "legacy"));

        store.rename(beacon, "Lantern").unwrap();
        let dispatched = listener.pump(&mut service).await;

        assert!(matches!(dispatched.as_slice(), [Dispatch::Rebuilt(_)]));
        assert!(service.has_edge("lantern", "legacy"));
        assert!(!service.has_edge("beacon", "legacy"));
    }

    #[tokio::test]
    async fn test_view_and_token_changes_invalidate() {
        let (store, mut service, mut listener) = setup(InfluenceConfig::default());
        let beacon = CharacterRecord::new("Beacon");
        let token = Token::placed(&beacon);
        store.insert(beacon);
        listener.pump(&mut service).await;

        service.key_for(&token);
        let misses = service.key_misses();

        store.bus().publish(ChangeEvent::TokenUpdated { token_id: token.id });
        store.bus().publish(ChangeEvent::ViewChanged);
        let dispatched = listener.pump(&mut service).await;

        assert_eq!(dispatched, vec![Dispatch::Invalidated, Dispatch::Invalidated]);
        service.key_for(&token);
        assert_eq!(service.key_misses(), misses + 1);
    }

    #[tokio::test]
    async fn test_run_stops_when_bus_dropped() {
        let store = InMemoryStore::new();
        let listener = ChangeListener::attach(store.bus());
        store.publish_ready();
        let mut service = InfluenceService::new(Arc::new(InMemoryStore::new()), InfluenceConfig::default());
        drop(store);

        listener.run(&mut service).await;

        assert_eq!(service.version(), 1);
    }

    #[test]
    fn test_detach() {
        let store = InMemoryStore::new();
        let listener = ChangeListener::attach(store.bus());
        assert_eq!(store.bus().subscriber_count(), 1);

        listener.detach();
        assert_eq!(store.bus().subscriber_count(), 0);
    }
}
