#![forbid(unsafe_code)]

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel stored in the tag reverse-lookup table for tags that are not live.
pub const NO_BOND: u32 = u32::MAX;

/// Stable identity of a bond, independent of its dense storage slot.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(pub u32);
/// Bond type index in `[0, n_types)`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(pub u32);
/// Identifier of a bonded entity (particle tag), managed outside the table.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u32);

/// A typed, unordered pairing of two entities.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Bond {
    pub ty: TypeId,
    pub a: EntityId,
    pub b: EntityId,
}

impl Bond {
    pub fn new(ty: u32, a: u32, b: u32) -> Self {
        Self {
            ty: TypeId(ty),
            a: EntityId(a),
            b: EntityId(b),
        }
    }

    /// Participants ordered low-to-high, for comparisons that ignore orientation.
    pub fn unordered(&self) -> (EntityId, EntityId) {
        if self.a <= self.b {
            (self.a, self.b)
        } else {
            (self.b, self.a)
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum BondError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("bond type {ty} out of range (n_types = {n_types})")]
    InvalidType { ty: u32, n_types: u32 },
    #[error("immutable: {0}")]
    ImmutableViolation(&'static str),
    #[error("entity {entity} out of range (entity_count = {entity_count})")]
    EntityOutOfRange { entity: u32, entity_count: u32 },
    #[error("index {index} out of range (count = {count})")]
    IndexOutOfRange { index: usize, count: usize },
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BondError>;

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Bond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.ty, self.a, self.b)
    }
}

impl From<u32> for Tag {
    fn from(value: u32) -> Self {
        Tag(value)
    }
}

impl From<Tag> for u32 {
    fn from(value: Tag) -> Self {
        value.0
    }
}

impl From<u32> for TypeId {
    fn from(value: u32) -> Self {
        TypeId(value)
    }
}

impl From<TypeId> for u32 {
    fn from(value: TypeId) -> Self {
        value.0
    }
}

impl From<u32> for EntityId {
    fn from(value: u32) -> Self {
        EntityId(value)
    }
}

impl From<EntityId> for u32 {
    fn from(value: EntityId) -> Self {
        value.0
    }
}
