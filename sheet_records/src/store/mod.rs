//! The record store collaborator: listing, lenient reads, and tagged writes.

mod memory;

pub use memory::*;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entities::{CharacterRecord, EntityId, RelationshipEntry};

/// Who issued a write. The store stamps it onto the resulting change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WriteOrigin {
    /// A person editing a sheet.
    #[default]
    User,
    /// The symmetry synchronizer writing a counterpart.
    Synchronizer,
}

/// Errors raised by store writes.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    RecordNotFound(EntityId),

    #[error("Write rejected for {record}: {reason}")]
    WriteRejected { record: EntityId, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Access to the externally persisted actor records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Snapshot of every actor record, in store order.
    fn list_records(&self) -> Vec<CharacterRecord>;

    /// Look up a single record.
    fn record(&self, id: EntityId) -> Option<CharacterRecord> {
        self.list_records().into_iter().find(|r| r.id == id)
    }

    /// Read a record's relationship entries. Never fails; malformed data reads as empty.
    fn read_relationship_entries(&self, record: &CharacterRecord) -> Vec<RelationshipEntry> {
        record.relationship_entries()
    }

    /// Replace a record's relationship entries.
    async fn write_relationship_entries(
        &self,
        id: EntityId,
        entries: Vec<RelationshipEntry>,
        origin: WriteOrigin,
    ) -> Result<(), StoreError>;
}
