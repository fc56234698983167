//! Entity profiles referenced by generations.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A persistent reference subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityProfile {
    /// Unique identifier, also the key of the reference embedding.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Type of entity.
    pub kind: EntityKind,

    /// Free-text description of the entity's expected appearance.
    pub description: String,

    /// Named attributes (hair color, era, palette, ...).
    #[serde(default)]
    pub attributes: IndexMap<String, String>,
}

impl EntityProfile {
    /// Create a new entity profile.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: EntityKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            description: description.into(),
            attributes: IndexMap::new(),
        }
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Type of entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A person or creature.
    Character,
    /// A place or setting.
    Location,
    /// A prop or item.
    Object,
    /// A visual or narrative style.
    Style,
}

impl EntityKind {
    /// Get a display name for this entity kind.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Character => "Character",
            Self::Location => "Location",
            Self::Object => "Object",
            Self::Style => "Style",
        }
    }
}
