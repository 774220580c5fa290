//! Quarry Collection - post-commit listener notification
//!
//! This crate defines:
//! - The [`EntityVersionCreated`] listener interface and the scope-keyed
//!   [`ListenerRegistry`] behind explicit register/unregister
//! - [`VersionCommitNotifier`]: turns each durable commit into a one-shot
//!   notification task on a bounded pool, isolating listener faults and
//!   surfacing pool saturation through counters instead of the write path

mod listener;
mod notifier;
mod registry;

pub use listener::EntityVersionCreated;
pub use notifier::{EntityVersionCreatedTask, NotifierStats, VersionCommitNotifier};
pub use registry::ListenerRegistry;
