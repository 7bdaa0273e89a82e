//! Character record definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{EntityId, RecordKind, RelationshipEntry, TokenId};

/// An actor record as the external store holds it.
///
/// Relationship entries are kept as raw JSON because the store does not
/// validate them; read them through [`CharacterRecord::relationship_entries`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterRecord {
    pub id: EntityId,
    #[serde(default)]
    pub kind: RecordKind,
    pub name: String,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub token_name: Option<String>,
    #[serde(default)]
    pub relationships: Value,
}

impl CharacterRecord {
    /// Create a new character record with the given name and no relationships.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            kind: RecordKind::Character,
            name: name.into(),
            real_name: None,
            token_name: None,
            relationships: Value::Array(Vec::new()),
        }
    }

    /// Set the record kind.
    pub fn with_kind(mut self, kind: RecordKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the secondary "real name".
    pub fn with_real_name(mut self, real_name: impl Into<String>) -> Self {
        self.real_name = Some(real_name.into());
        self
    }

    /// Set the prototype token name.
    pub fn with_token_name(mut self, token_name: impl Into<String>) -> Self {
        self.token_name = Some(token_name.into());
        self
    }

    /// Replace the relationship entries.
    ///
    /// Entries hold only strings and booleans, so serialization cannot fail;
    /// a failure would leave the relationships empty.
    pub fn with_relationships(mut self, entries: &[RelationshipEntry]) -> Self {
        self.relationships = RelationshipEntry::list_to_value(entries).unwrap_or_default();
        self
    }

    /// Replace the relationships with arbitrary raw data.
    pub fn with_raw_relationships(mut self, raw: Value) -> Self {
        self.relationships = raw;
        self
    }

    /// Check if this record is a player character.
    pub fn is_character(&self) -> bool {
        self.kind == RecordKind::Character
    }

    /// Read the relationship entries, skipping anything malformed.
    pub fn relationship_entries(&self) -> Vec<RelationshipEntry> {
        RelationshipEntry::list_from_value(&self.relationships)
    }
}

/// A placed token: a presented instance of an actor with its own display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub name: String,
    pub actor: Option<EntityId>,
}

impl Token {
    /// Create a token presenting the given actor under `name`.
    pub fn new(name: impl Into<String>, actor: EntityId) -> Self {
        Self {
            id: TokenId::new(),
            name: name.into(),
            actor: Some(actor),
        }
    }

    /// Create a token with no linked actor.
    pub fn unlinked(name: impl Into<String>) -> Self {
        Self {
            id: TokenId::new(),
            name: name.into(),
            actor: None,
        }
    }

    /// Place a token for a record, using its prototype token name when set.
    pub fn placed(record: &CharacterRecord) -> Self {
        let name = record
            .token_name
            .clone()
            .unwrap_or_else(|| record.name.clone());
        Self::new(name, record.id)
    }
}
