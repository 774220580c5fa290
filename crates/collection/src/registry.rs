//! Scope-keyed listener membership.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use quarry_common::CollectionScope;

use crate::listener::EntityVersionCreated;

/// Listener membership per collection scope.
///
/// Mutation happens only through [`register`](ListenerRegistry::register)
/// and [`unregister`](ListenerRegistry::unregister); readers take an
/// immutable snapshot of one scope's membership, so an in-flight
/// notification never observes a half-updated set and registry changes
/// never invalidate an iteration already underway.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: RwLock<HashMap<CollectionScope, Vec<Arc<dyn EntityVersionCreated>>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener for one scope. The same `Arc` may be registered
    /// under any number of scopes.
    pub fn register(&self, scope: CollectionScope, listener: Arc<dyn EntityVersionCreated>) {
        self.listeners.write().entry(scope).or_default().push(listener);
    }

    /// Remove a listener by `Arc` identity. Returns whether anything was
    /// removed; the scope's entry disappears with its last listener.
    pub fn unregister(
        &self,
        scope: &CollectionScope,
        listener: &Arc<dyn EntityVersionCreated>,
    ) -> bool {
        let mut listeners = self.listeners.write();
        let Some(registered) = listeners.get_mut(scope) else {
            return false;
        };
        let before = registered.len();
        registered.retain(|existing| !Arc::ptr_eq(existing, listener));
        let removed = registered.len() < before;
        if registered.is_empty() {
            listeners.remove(scope);
        }
        removed
    }

    /// A stable copy of one scope's membership at this instant.
    pub fn snapshot(&self, scope: &CollectionScope) -> Vec<Arc<dyn EntityVersionCreated>> {
        self.listeners.read().get(scope).cloned().unwrap_or_default()
    }

    pub fn listener_count(&self, scope: &CollectionScope) -> usize {
        self.listeners.read().get(scope).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_common::EntityVersion;
    use uuid::Uuid;

    struct NullListener;

    impl EntityVersionCreated for NullListener {
        fn version_created(&self, _scope: &CollectionScope, _entity: &EntityVersion) {}
    }

    fn scope(name: &str) -> CollectionScope {
        CollectionScope::application_collection(Uuid::nil(), name)
    }

    #[test]
    fn test_register_and_snapshot() {
        let registry = ListenerRegistry::new();
        let listener: Arc<dyn EntityVersionCreated> = Arc::new(NullListener);

        registry.register(scope("users"), listener.clone());
        registry.register(scope("users"), Arc::new(NullListener));

        assert_eq!(registry.listener_count(&scope("users")), 2);
        assert_eq!(registry.snapshot(&scope("users")).len(), 2);
        assert!(registry.snapshot(&scope("groups")).is_empty());
    }

    #[test]
    fn test_unregister_by_identity() {
        let registry = ListenerRegistry::new();
        let first: Arc<dyn EntityVersionCreated> = Arc::new(NullListener);
        let second: Arc<dyn EntityVersionCreated> = Arc::new(NullListener);

        registry.register(scope("users"), first.clone());
        registry.register(scope("users"), second.clone());

        assert!(registry.unregister(&scope("users"), &first));
        assert_eq!(registry.listener_count(&scope("users")), 1);

        // Already removed; nothing left matching this instance.
        assert!(!registry.unregister(&scope("users"), &first));

        assert!(registry.unregister(&scope("users"), &second));
        assert_eq!(registry.listener_count(&scope("users")), 0);
        assert!(!registry.unregister(&scope("users"), &second));
    }

    #[test]
    fn test_snapshot_is_stable_across_mutation() {
        let registry = ListenerRegistry::new();
        let listener: Arc<dyn EntityVersionCreated> = Arc::new(NullListener);
        registry.register(scope("users"), listener.clone());

        let snapshot = registry.snapshot(&scope("users"));
        registry.unregister(&scope("users"), &listener);
        registry.register(scope("users"), Arc::new(NullListener));
        registry.register(scope("users"), Arc::new(NullListener));

        // The earlier snapshot still holds exactly the membership from
        // when it was taken.
        assert_eq!(snapshot.len(), 1);
        assert!(Arc::ptr_eq(&snapshot[0], &listener));
    }
}
