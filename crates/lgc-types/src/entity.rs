//! Host entity identifiers and typed references.
//!
//! Layer group metadata names the elements it depends on either by their
//! host unique id (a GUID-like string) or by their integer element id. Both
//! spellings appear in the same documents, so [`EntityId`] keeps them as one
//! sum type and lets a single lookup capability resolve either.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Opaque identifier of an entity in the host document.
///
/// Numeric strings are normalized to [`EntityId::ElementId`] so that `"42"`
/// and `42` name the same entity. The format of unique ids is not validated
/// beyond being non-empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityId {
    /// Stable unique id string (GUID-like).
    UniqueId(String),
    /// Integer element id.
    ElementId(i64),
}

impl EntityId {
    /// Parse an identifier from its string encoding.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(TypeError::InvalidEntityId(s.to_string()));
        }
        match trimmed.parse::<i64>() {
            Ok(n) => Ok(Self::ElementId(n)),
            Err(_) => Ok(Self::UniqueId(trimmed.to_string())),
        }
    }

    /// Returns `true` if this is an integer element id.
    pub fn is_element_id(&self) -> bool {
        matches!(self, Self::ElementId(_))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UniqueId(s) => f.write_str(s),
            Self::ElementId(n) => write!(f, "{n}"),
        }
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        Self::ElementId(n)
    }
}

impl std::str::FromStr for EntityId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::UniqueId(s) => serializer.serialize_str(s),
            Self::ElementId(n) => serializer.serialize_i64(*n),
        }
    }
}

struct EntityIdVisitor;

impl<'de> Visitor<'de> for EntityIdVisitor {
    type Value = EntityId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a unique id string or an integer element id")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<EntityId, E> {
        EntityId::parse(v).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<EntityId, E> {
        Ok(EntityId::ElementId(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<EntityId, E> {
        i64::try_from(v)
            .map(EntityId::ElementId)
            .map_err(|_| E::custom(format!("element id out of range: {v}")))
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(EntityIdVisitor)
    }
}

/// The relationship a referenced entity has to its layer group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    Opening,
    Perforator,
}

impl RefKind {
    /// All kinds, in the order they are attached to the root node.
    pub const ALL: [RefKind; 2] = [RefKind::Opening, RefKind::Perforator];

    /// Detachable relationship key on the layer group node.
    pub fn relationship_key(&self) -> &'static str {
        match self {
            Self::Opening => "@openings",
            Self::Perforator => "@perforators",
        }
    }
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Opening => f.write_str("opening"),
            Self::Perforator => f.write_str("perforator"),
        }
    }
}

/// An entity identifier tagged with its relationship kind.
///
/// Equality and hashing consider the identifier only: an entity referenced
/// as both an opening and a perforator is still one entity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: EntityId,
    pub kind: RefKind,
}

impl EntityRef {
    pub fn new(id: EntityId, kind: RefKind) -> Self {
        Self { id, kind }
    }

    pub fn opening(id: EntityId) -> Self {
        Self::new(id, RefKind::Opening)
    }

    pub fn perforator(id: EntityId) -> Self {
        Self::new(id, RefKind::Perforator)
    }
}

impl PartialEq for EntityRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EntityRef {}

impl Hash for EntityRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}
