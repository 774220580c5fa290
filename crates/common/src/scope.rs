//! Multi-tenant collection addressing.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Addresses one named collection inside one application.
///
/// `owner` is the entity the collection hangs off; for an application's
/// top-level collections the owner is the application itself. Listener
/// registrations and notifications are keyed by the full triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionScope {
    application: Uuid,
    owner: Uuid,
    name: String,
}

impl CollectionScope {
    pub fn new(application: Uuid, owner: Uuid, name: impl Into<String>) -> Self {
        Self {
            application,
            owner,
            name: name.into(),
        }
    }

    /// A collection owned directly by the application.
    pub fn application_collection(application: Uuid, name: impl Into<String>) -> Self {
        Self::new(application, application, name)
    }

    pub fn application(&self) -> Uuid {
        self.application
    }

    pub fn owner(&self) -> Uuid {
        self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for CollectionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.application, self.owner, self.name)
    }
}
