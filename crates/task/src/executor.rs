//! A named worker pool with a bounded queue and non-blocking admission.

use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};

use crate::task::{Submission, Task};

/// Pool lifecycle. Transitions are forward-only:
/// `Created → Running → ShuttingDown → Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    /// Constructed, workers not yet accepting work.
    Created,
    /// Accepting and running tasks.
    Running,
    /// No longer accepting; draining already-accepted tasks.
    ShuttingDown,
    /// All workers exited.
    Terminated,
}

/// Fixed-size pool of named worker threads draining one shared bounded
/// queue.
///
/// [`submit`](TaskExecutor::submit) never waits for capacity: it decides
/// accept-or-reject under the queue lock and returns. With a queue
/// capacity of zero the pool degenerates to run-or-reject. Workers catch
/// panics from task bodies, so a misbehaving task cannot take a worker
/// down with it.
pub struct TaskExecutor {
    name: String,
    queue_capacity: usize,
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

struct Shared {
    name: String,
    inner: Mutex<Inner>,
    work_ready: Condvar,
}

struct Inner {
    queue: VecDeque<Box<dyn Task>>,
    /// Workers currently between tasks. Admission compares the queue
    /// depth against `capacity + idle`, which caps accepted-but-
    /// unfinished tasks at exactly `workers + capacity` no matter how
    /// submissions interleave with pickups.
    idle_workers: usize,
    live_workers: usize,
    state: ExecutorState,
}

impl TaskExecutor {
    /// Spawn a pool of `workers` named OS threads with room for
    /// `queue_capacity` waiting tasks.
    pub fn new(name: impl Into<String>, workers: usize, queue_capacity: usize) -> Self {
        let name = name.into();
        let shared = Arc::new(Shared {
            name: name.clone(),
            inner: Mutex::new(Inner {
                queue: VecDeque::new(),
                idle_workers: workers,
                live_workers: workers,
                state: ExecutorState::Created,
            }),
            work_ready: Condvar::new(),
        });

        let mut handles = Vec::with_capacity(workers);
        for index in 0..workers {
            let shared = Arc::clone(&shared);
            let handle = std::thread::Builder::new()
                .name(format!("{name}-{index}"))
                .spawn(move || worker_loop(shared))
                .expect("failed to spawn executor worker thread");
            handles.push(handle);
        }

        shared.inner.lock().state = ExecutorState::Running;
        Self {
            name,
            queue_capacity,
            shared,
            workers: Mutex::new(handles),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ExecutorState {
        self.shared.inner.lock().state
    }

    /// Submit a task: accepted if a worker is free or the queue has room,
    /// rejected otherwise. On rejection the task's `rejected` hook runs
    /// on this thread before the call returns.
    pub fn submit(&self, task: Box<dyn Task>) -> Submission {
        {
            let mut inner = self.shared.inner.lock();
            if inner.state == ExecutorState::Running
                && inner.live_workers > 0
                && inner.queue.len() < self.queue_capacity + inner.idle_workers
            {
                inner.queue.push_back(task);
                drop(inner);
                self.shared.work_ready.notify_one();
                return Submission::Accepted;
            }
        }
        tracing::debug!("executor {} rejected a task", self.name);
        task.rejected();
        Submission::Rejected
    }

    /// Stop accepting new tasks. Already-accepted tasks still run to
    /// completion; workers exit once the queue drains. Idempotent.
    pub fn shutdown(&self) {
        let mut inner = self.shared.inner.lock();
        match inner.state {
            ExecutorState::ShuttingDown | ExecutorState::Terminated => return,
            ExecutorState::Created | ExecutorState::Running => {}
        }
        inner.state = if inner.live_workers == 0 {
            ExecutorState::Terminated
        } else {
            ExecutorState::ShuttingDown
        };
        drop(inner);
        tracing::debug!("executor {} shutting down", self.name);
        self.shared.work_ready.notify_all();
    }

    /// Wait for every worker to exit. Only meaningful after
    /// [`shutdown`](TaskExecutor::shutdown).
    pub fn join(&self) {
        let handles: Vec<_> = self.workers.lock().drain(..).collect();
        for handle in handles {
            let _ = handle.join();
        }
    }
}

fn worker_loop(shared: Arc<Shared>) {
    let mut inner = shared.inner.lock();
    loop {
        if let Some(task) = inner.queue.pop_front() {
            inner.idle_workers -= 1;
            drop(inner);
            run_caught(&shared.name, task);
            inner = shared.inner.lock();
            inner.idle_workers += 1;
            continue;
        }
        match inner.state {
            ExecutorState::ShuttingDown | ExecutorState::Terminated => break,
            ExecutorState::Created | ExecutorState::Running => {}
        }
        shared.work_ready.wait(&mut inner);
    }
    inner.live_workers -= 1;
    if inner.live_workers == 0 && inner.state == ExecutorState::ShuttingDown {
        inner.state = ExecutorState::Terminated;
    }
}

fn run_caught(executor: &str, task: Box<dyn Task>) {
    if let Err(payload) = std::panic::catch_unwind(AssertUnwindSafe(move || task.run())) {
        tracing::error!(
            "executor {} task panicked: {}",
            executor,
            panic_message(payload.as_ref())
        );
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
