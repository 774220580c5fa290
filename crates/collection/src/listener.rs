//! The post-commit observer interface.

use quarry_common::{CollectionScope, EntityVersion};

/// Observer of durably committed entity versions.
///
/// Invoked on notifier worker threads after the write is already durable,
/// so nothing a listener does can affect the write's outcome.
/// Implementations must be thread-safe. A panicking listener is isolated:
/// it is logged and counted, and the remaining listeners of the same
/// notification still run. A slow listener delays only its own
/// notification task.
pub trait EntityVersionCreated: Send + Sync {
    fn version_created(&self, scope: &CollectionScope, entity: &EntityVersion);
}
