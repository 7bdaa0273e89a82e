//! Symmetry sync - mirrors one character's declared influence onto the
//! counterparts it names, so both sheets agree.
//!
//! Counterpart writes are tagged [`WriteOrigin::Synchronizer`] and their ids
//! are held in a [`SuppressionContext`] until the whole batch settles.

use std::collections::{HashMap, HashSet};

use futures::future::join_all;
use sheet_records::{CharacterRecord, EntityId, RecordStore, RelationshipEntry, WriteOrigin};
use tracing::{debug, info, warn};

use crate::names::{candidate_names, composite_key, normalize};

/// Ids of records with a sync write in flight.
///
/// `SymmetrySynchronizer::sync` holds `&mut self` for the whole pass, so the
/// context is empty whenever no sync is running. Echo suppression for change
/// listeners comes from [`WriteOrigin::Synchronizer`], not from this context.
#[derive(Debug, Default)]
pub struct SuppressionContext {
    active: HashSet<EntityId>,
}

impl SuppressionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start suppressing `id`. Returns false if it already was.
    pub fn enter(&mut self, id: EntityId) -> bool {
        self.active.insert(id)
    }

    /// Stop suppressing `id`.
    pub fn leave(&mut self, id: EntityId) {
        self.active.remove(&id);
    }

    /// Check if `id` is suppressed.
    pub fn is_suppressed(&self, id: EntityId) -> bool {
        self.active.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

/// Outcome of one sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Counterparts whose entries were written.
    pub written: Vec<EntityId>,
    /// Counterparts whose write failed; they stay unsynced until the next change.
    pub failed: Vec<EntityId>,
    /// Named entries with no resolvable counterpart.
    pub unresolved: usize,
}

impl SyncReport {
    /// Total counterparts that needed a write.
    pub fn dirty_count(&self) -> usize {
        self.written.len() + self.failed.len()
    }
}

/// A counterpart's entries, read once and edited in place.
struct CounterpartBatch {
    record: CharacterRecord,
    original: Vec<RelationshipEntry>,
    entries: Vec<RelationshipEntry>,
}

impl CounterpartBatch {
    fn is_dirty(&self) -> bool {
        self.entries != self.original
    }
}

/// Keeps relationship entries reciprocal between paired characters.
#[derive(Debug, Default)]
pub struct SymmetrySynchronizer {
    suppression: SuppressionContext,
}

impl SymmetrySynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn suppression(&self) -> &SuppressionContext {
        &self.suppression
    }

    /// Mirror `record`'s relationship entries onto their counterparts.
    ///
    /// Returns `None` without touching anything when the record is not a
    /// character, has no usable name, or is itself being written by a sync.
    /// Write failures are logged per counterpart and never abort siblings.
    pub async fn sync(
        &mut self,
        store: &dyn RecordStore,
        record: &CharacterRecord,
    ) -> Option<SyncReport> {
        if !record.is_character() || self.suppression.is_suppressed(record.id) {
            return None;
        }
        if composite_key(record, None).is_empty() {
            return None;
        }

        let mut report = SyncReport::default();
        // Display names paired with their keys; blank-normalizing names can never be matched again.
        let usable: Vec<(String, String)> = candidate_names(record, None)
            .into_iter()
            .map(|name| (normalize(&name), name))
            .filter(|(key, _)| !key.is_empty())
            .collect();
        let label = usable.first().map(|(_, name)| name.clone())?;
        let self_names: Vec<String> = usable.into_iter().map(|(key, _)| key).collect();
        let others: Vec<CharacterRecord> = store
            .list_records()
            .into_iter()
            .filter(|r| r.is_character() && r.id != record.id)
            .collect();

        let mut batches: Vec<CounterpartBatch> = Vec::new();
        let mut slots: HashMap<EntityId, usize> = HashMap::new();

        for entry in store.read_relationship_entries(record) {
            let target = normalize(&entry.name);
            if target.is_empty() {
                continue;
            }
            let Some(counterpart) = resolve_counterpart(&target, &others) else {
                report.unresolved += 1;
                continue;
            };

            let slot = *slots.entry(counterpart.id).or_insert_with(|| {
                let original = store.read_relationship_entries(counterpart);
                batches.push(CounterpartBatch {
                    record: counterpart.clone(),
                    entries: original.clone(),
                    original,
                });
                batches.len() - 1
            });

            mirror_entry(&mut batches[slot].entries, &label, &self_names, &entry);
        }

        let dirty: Vec<CounterpartBatch> = batches.into_iter().filter(|b| b.is_dirty()).collect();
        for batch in &dirty {
            self.suppression.enter(batch.record.id);
        }

        let writes = dirty.iter().map(|batch| {
            store.write_relationship_entries(
                batch.record.id,
                batch.entries.clone(),
                WriteOrigin::Synchronizer,
            )
        });
        let results = join_all(writes).await;

        for (batch, result) in dirty.iter().zip(results) {
            match result {
                Ok(()) => report.written.push(batch.record.id),
                Err(e) => {
                    warn!(
                        counterpart = %batch.record.id,
                        name = %batch.record.name,
                        error = %e,
                        "failed to write reciprocal relationships"
                    );
                    report.failed.push(batch.record.id);
                }
            }
        }

        for batch in &dirty {
            self.suppression.leave(batch.record.id);
        }

        if report.dirty_count() > 0 {
            info!(
                source = %record.id,
                written = report.written.len(),
                failed = report.failed.len(),
                "relationship symmetry synced"
            );
        } else {
            debug!(source = %record.id, unresolved = report.unresolved, "relationships already symmetric");
        }
        Some(report)
    }
}

/// Find the character `target` refers to: an exact normalized name first,
/// then the first composite key containing it.
fn resolve_counterpart<'a>(
    target: &str,
    others: &'a [CharacterRecord],
) -> Option<&'a CharacterRecord> {
    others
        .iter()
        .find(|other| {
            candidate_names(other, None)
                .iter()
                .any(|name| normalize(name) == target)
        })
        .or_else(|| {
            others
                .iter()
                .find(|other| composite_key(other, None).contains(target))
        })
}

/// Apply one of the source's entries to the counterpart's list.
///
/// A created entry is named `label`, which normalizes to one of `source_names`.
fn mirror_entry(
    entries: &mut Vec<RelationshipEntry>,
    label: &str,
    source_names: &[String],
    declared: &RelationshipEntry,
) {
    let position = entries
        .iter()
        .position(|e| {
            let name = normalize(&e.name);
            source_names.iter().any(|n| *n == name)
        })
        .unwrap_or_else(|| {
            entries.push(RelationshipEntry::new(label));
            entries.len() - 1
        });

    let a_over_b = declared.have_influence_over;
    let b_over_a = declared.has_influence_over;
    let reciprocal = &mut entries[position];

    if !a_over_b && !b_over_a {
        reciprocal.has_influence_over = false;
        reciprocal.have_influence_over = false;
    } else {
        reciprocal.has_influence_over = a_over_b || reciprocal.has_influence_over;
        reciprocal.have_influence_over = b_over_a || reciprocal.have_influence_over;
    }

    if reciprocal.is_empty_relation() && !reciprocal.locked {
        entries.remove(position);
    }
}
