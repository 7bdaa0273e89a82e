//! Relationship entries - free-text references from one sheet to another.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Opaque identifier of a relationship entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub String);

impl EntryId {
    /// Create a fresh random entry ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named relationship with two directional influence flags.
///
/// `have_influence_over` means the owning character influences `name`;
/// `has_influence_over` means `name` influences the owning character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipEntry {
    pub id: EntryId,
    pub name: String,
    pub has_influence_over: bool,
    pub have_influence_over: bool,
    pub locked: bool,
}

impl RelationshipEntry {
    /// Create an entry for `name` with all flags cleared.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: EntryId::new(),
            name: name.into(),
            has_influence_over: false,
            have_influence_over: false,
            locked: false,
        }
    }

    /// Set whether `name` has influence over the owner.
    pub fn with_has_influence_over(mut self, value: bool) -> Self {
        self.has_influence_over = value;
        self
    }

    /// Set whether the owner has influence over `name`.
    pub fn with_have_influence_over(mut self, value: bool) -> Self {
        self.have_influence_over = value;
        self
    }

    /// Set the lock flag.
    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    /// Check if neither direction is declared.
    pub fn is_empty_relation(&self) -> bool {
        !self.has_influence_over && !self.have_influence_over
    }

    /// Read one entry from untrusted JSON.
    ///
    /// Returns `None` for non-objects. Missing or mistyped flags read as
    /// `false`, a numeric name is stringified, and a missing id is generated.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;

        let id = match object.get("id") {
            Some(Value::String(s)) if !s.is_empty() => EntryId(s.clone()),
            Some(Value::Number(n)) => EntryId(n.to_string()),
            _ => EntryId::new(),
        };

        Some(Self {
            id,
            name: text_of(object.get("name")),
            has_influence_over: flag_of(object, "hasInfluenceOver"),
            have_influence_over: flag_of(object, "haveInfluenceOver"),
            locked: flag_of(object, "locked"),
        })
    }

    /// Read an entry list from untrusted JSON. Anything but an array is empty.
    pub fn list_from_value(value: &Value) -> Vec<Self> {
        match value {
            Value::Array(items) => items.iter().filter_map(Self::from_value).collect(),
            _ => Vec::new(),
        }
    }

    /// Write an entry list back to the JSON shape the store keeps.
    pub fn list_to_value(entries: &[Self]) -> serde_json::Result<Value> {
        serde_json::to_value(entries)
    }
}

fn text_of(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn flag_of(object: &Map<String, Value>, key: &str) -> bool {
    matches!(object.get(key), Some(Value::Bool(true)))
}
