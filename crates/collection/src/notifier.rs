//! Post-commit notification scheduling.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use quarry_common::{CollectionScope, EntityVersion};
use quarry_task::{Submission, Task, TaskExecutor};

use crate::listener::EntityVersionCreated;
use crate::registry::ListenerRegistry;

/// Delivery counters for the notification path. The write path never
/// sees a notification failure; these counters are where rejections and
/// listener faults become visible.
#[derive(Debug, Default)]
pub struct NotifierStats {
    submitted: AtomicU64,
    rejected: AtomicU64,
    listener_failures: AtomicU64,
}

impl NotifierStats {
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn listener_failures(&self) -> u64 {
        self.listener_failures.load(Ordering::Relaxed)
    }

    fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    fn record_listener_failure(&self) {
        self.listener_failures.fetch_add(1, Ordering::Relaxed);
    }
}

/// One-shot notification for a single committed entity version.
///
/// Carries the listener snapshot taken at construction time; listeners
/// registered afterwards do not see this version.
pub struct EntityVersionCreatedTask {
    scope: CollectionScope,
    entity: EntityVersion,
    listeners: Vec<Arc<dyn EntityVersionCreated>>,
    stats: Arc<NotifierStats>,
}

impl EntityVersionCreatedTask {
    pub fn new(
        scope: CollectionScope,
        entity: EntityVersion,
        listeners: Vec<Arc<dyn EntityVersionCreated>>,
        stats: Arc<NotifierStats>,
    ) -> Self {
        Self {
            scope,
            entity,
            listeners,
            stats,
        }
    }
}

impl Task for EntityVersionCreatedTask {
    fn run(self: Box<Self>) {
        // Most writes have zero listeners; nothing to do.
        if self.listeners.is_empty() {
            return;
        }
        for listener in &self.listeners {
            let invoked = std::panic::catch_unwind(AssertUnwindSafe(|| {
                listener.version_created(&self.scope, &self.entity)
            }));
            if invoked.is_err() {
                self.stats.record_listener_failure();
                tracing::warn!(
                    "listener panicked handling version {} in scope {}",
                    self.entity,
                    self.scope
                );
            }
        }
    }

    fn rejected(self: Box<Self>) {
        self.stats.record_rejected();
        tracing::warn!(
            "notification pool saturated, dropping notification for version {} in scope {}",
            self.entity,
            self.scope
        );
    }
}

/// Schedules listener notification after durable commits.
///
/// [`on_version_committed`](Self::on_version_committed) is fire-and-forget
/// for the writer: it snapshots the scope's listeners, hands the executor
/// a task, and returns without waiting for any listener. A saturated pool
/// rejects the task, which is counted and logged but never retried on the
/// caller thread.
pub struct VersionCommitNotifier {
    executor: TaskExecutor,
    registry: Arc<ListenerRegistry>,
    stats: Arc<NotifierStats>,
}

impl VersionCommitNotifier {
    pub fn new(workers: usize, queue_capacity: usize) -> Self {
        Self {
            executor: TaskExecutor::new("version-commit", workers, queue_capacity),
            registry: Arc::new(ListenerRegistry::new()),
            stats: Arc::new(NotifierStats::default()),
        }
    }

    pub fn registry(&self) -> &ListenerRegistry {
        &self.registry
    }

    pub fn register(&self, scope: CollectionScope, listener: Arc<dyn EntityVersionCreated>) {
        self.registry.register(scope, listener);
    }

    pub fn unregister(
        &self,
        scope: &CollectionScope,
        listener: &Arc<dyn EntityVersionCreated>,
    ) -> bool {
        self.registry.unregister(scope, listener)
    }

    pub fn stats(&self) -> &NotifierStats {
        &self.stats
    }

    /// The write path's sole trigger, called immediately after a durable
    /// commit. Returns the scheduling outcome, which callers are free to
    /// ignore: the write is already durable either way.
    pub fn on_version_committed(
        &self,
        scope: CollectionScope,
        entity: EntityVersion,
    ) -> Submission {
        let listeners = self.registry.snapshot(&scope);
        self.stats.record_submitted();
        self.executor.submit(Box::new(EntityVersionCreatedTask::new(
            scope,
            entity,
            listeners,
            Arc::clone(&self.stats),
        )))
    }

    /// Stop accepting notifications and let in-flight ones finish.
    pub fn shutdown(&self) {
        self.executor.shutdown();
    }

    /// Wait for the notification workers to exit after
    /// [`shutdown`](Self::shutdown).
    pub fn join(&self) {
        self.executor.join();
    }
}
