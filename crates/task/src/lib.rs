//! Quarry Task - bounded named worker pool
//!
//! This crate defines:
//! - The [`Task`] trait: one-shot work with a required rejection hook
//! - [`TaskExecutor`]: fixed worker threads draining one bounded queue,
//!   deciding accept-or-reject at submission time without ever blocking
//!   the submitter on capacity
//!
//! It carries no domain logic; higher layers decide what a task does and
//! what its rejection means.

pub mod executor;
pub mod task;

pub use executor::{ExecutorState, TaskExecutor};
pub use task::{Submission, Task};
