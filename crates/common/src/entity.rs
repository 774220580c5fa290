//! Typed entity identifiers and committed versions.

use quarry_keys::TimeUuid;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies an entity: a UUID plus the entity kind (`"user"`,
/// `"message"`, ...). Two entities of different kinds never collide even
/// if their UUIDs do.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId {
    uuid: Uuid,
    kind: String,
}

impl EntityId {
    pub fn new(uuid: Uuid, kind: impl Into<String>) -> Self {
        Self {
            uuid,
            kind: kind.into(),
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.uuid)
    }
}

/// One durably committed version of an entity.
///
/// The version is a time-ordered UUID assigned at write time, so versions
/// of the same entity sort chronologically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityVersion {
    id: EntityId,
    version: TimeUuid,
}

impl EntityVersion {
    pub fn new(id: EntityId, version: TimeUuid) -> Self {
        Self { id, version }
    }

    /// Stamp a fresh version for `id` from the system clock.
    pub fn next(id: EntityId) -> Self {
        Self::new(id, TimeUuid::now())
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn version(&self) -> TimeUuid {
        self.version
    }
}

impl fmt::Display for EntityVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.version)
    }
}
