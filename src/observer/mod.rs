//! Lifecycle hooks the host calls while builds execute.
//!
//! Each hook runs synchronously on the host's calling thread. Checkout and
//! task-start hooks only append to the shared [`Observations`]; the
//! completion hook joins, evicts and dispatches.
//!
//! [`Observations`]: crate::store::Observations

pub mod checkout;
pub mod completion;
pub mod task_start;

pub use checkout::CheckoutObserver;
pub use completion::CompletionObserver;
pub use task_start::TaskStartObserver;

use tracing::debug;

use crate::error::Result;
use crate::host::{Executor, Run, ScmEnvironment, Task};

/// Called after a source-control checkout for a run.
pub trait OnCheckout: Send + Sync {
    /// Best effort: never fails the checkout.
    fn on_checkout(&self, run: &dyn Run, scm: &dyn ScmEnvironment);
}

/// Called when an executor starts a task.
pub trait OnTaskStart: Send + Sync {
    fn on_task_started(&self, executor: &dyn Executor, task: &dyn Task) -> Result<()>;
}

/// Called at run lifecycle transitions.
pub trait OnRunCompleted: Send + Sync {
    /// The run has a result. Must be called after every task-start and
    /// checkout hook of the run has returned.
    fn on_completed(&self, run: &dyn Run) -> Result<()>;

    fn on_initialize(&self, run: &dyn Run) {
        debug!(run = %run.id(), "run initialized");
    }

    fn on_started(&self, run: &dyn Run) {
        debug!(run = %run.id(), "run started");
    }

    fn on_finalized(&self, run: &dyn Run) {
        debug!(run = %run.id(), "run finalized");
    }
}
