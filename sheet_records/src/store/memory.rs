//! In-memory record store, used by embedders without a backend and by tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use tracing::debug;

use super::{RecordStore, StoreError, WriteOrigin};
use crate::entities::{CharacterRecord, EntityId, RelationshipEntry};
use crate::events::{ChangeBus, ChangeEvent};

/// Dotted path under which relationship entries are stored.
pub const RELATIONSHIPS_PATH: &str = "flags.influence.relationships";

/// Records held in memory, publishing a [`ChangeEvent`] for every mutation.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<Vec<CharacterRecord>>,
    failing: Mutex<HashSet<EntityId>>,
    writes: AtomicUsize,
    bus: ChangeBus,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `records`, without publishing anything.
    pub fn with_records(records: impl IntoIterator<Item = CharacterRecord>) -> Self {
        Self {
            records: RwLock::new(records.into_iter().collect()),
            ..Self::default()
        }
    }

    /// The bus this store publishes on.
    pub fn bus(&self) -> &ChangeBus {
        &self.bus
    }

    /// Add or replace a record.
    pub fn insert(&self, record: CharacterRecord) -> EntityId {
        let id = record.id;
        {
            let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
            match records.iter_mut().find(|r| r.id == id) {
                Some(existing) => *existing = record,
                None => records.push(record),
            }
        }
        self.bus.publish(ChangeEvent::RecordUpdated {
            record_id: id,
            changed_paths: vec!["name".into(), RELATIONSHIPS_PATH.into()],
            origin: WriteOrigin::User,
        });
        id
    }

    /// Rename a record.
    pub fn rename(&self, id: EntityId, name: impl Into<String>) -> Result<(), StoreError> {
        self.mutate(id, |record| record.name = name.into())?;
        self.bus.publish(ChangeEvent::RecordUpdated {
            record_id: id,
            changed_paths: vec!["name".into()],
            origin: WriteOrigin::User,
        });
        Ok(())
    }

    /// Replace relationship entries as a user edit would.
    pub fn edit_relationships(
        &self,
        id: EntityId,
        entries: &[RelationshipEntry],
    ) -> Result<(), StoreError> {
        self.apply_write(id, entries, WriteOrigin::User)
    }

    /// Make every later write to `id` fail.
    pub fn fail_writes_for(&self, id: EntityId) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
    }

    /// Number of successful relationship writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Announce that loading finished.
    pub fn publish_ready(&self) {
        self.bus.publish(ChangeEvent::Ready);
    }

    fn mutate(
        &self,
        id: EntityId,
        change: impl FnOnce(&mut CharacterRecord),
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::RecordNotFound(id))?;
        change(record);
        Ok(())
    }

    fn apply_write(
        &self,
        id: EntityId,
        entries: &[RelationshipEntry],
        origin: WriteOrigin,
    ) -> Result<(), StoreError> {
        let rejected = self
            .failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id);
        if rejected {
            return Err(StoreError::WriteRejected {
                record: id,
                reason: "writes disabled for this record".into(),
            });
        }

        let value = RelationshipEntry::list_to_value(entries)?;
        self.mutate(id, |record| record.relationships = value)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        debug!(record = %id, entries = entries.len(), ?origin, "relationships written");

        self.bus.publish(ChangeEvent::RecordUpdated {
            record_id: id,
            changed_paths: vec![RELATIONSHIPS_PATH.into()],
            origin,
        });
        Ok(())
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    fn list_records(&self) -> Vec<CharacterRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn write_relationship_entries(
        &self,
        id: EntityId,
        entries: Vec<RelationshipEntry>,
        origin: WriteOrigin,
    ) -> Result<(), StoreError> {
        self.apply_write(id, &entries, origin)
    }
}
