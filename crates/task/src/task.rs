//! The unit of work the executor runs.

/// A one-shot unit of work with an explicit rejection path.
///
/// Exactly one of [`run`](Task::run) or [`rejected`](Task::rejected) is
/// invoked, exactly once; both consume the task.
pub trait Task: Send {
    /// Execute on a worker thread. Panics are caught by the worker; the
    /// task counts as complete regardless of outcome, and nothing retries
    /// it automatically.
    fn run(self: Box<Self>);

    /// Invoked synchronously on the submitting thread when the executor
    /// cannot accept the task. `run` will never be called afterwards.
    fn rejected(self: Box<Self>);
}

/// Outcome of a submission attempt. Saturation is an ordinary outcome
/// here, not an error: the rejected task has already had its
/// [`Task::rejected`] hook run by the time the caller sees this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Accepted,
    Rejected,
}

impl Submission {
    pub fn is_accepted(self) -> bool {
        self == Submission::Accepted
    }

    pub fn is_rejected(self) -> bool {
        self == Submission::Rejected
    }
}
