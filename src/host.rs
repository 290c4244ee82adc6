//! Seams to the host that executes builds.
//!
//! The host owns runs, executors and source-control checkouts; the engine
//! only reads from them through these traits. Implementations are expected
//! to be cheap except for environment resolution, which may block on I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{EnvVars, RunId, StageResult};

/// Why the host could not produce something the engine asked for.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("interrupted")]
    Interrupted,
}

/// Read-only view of one build execution.
pub trait Run: Send + Sync {
    fn id(&self) -> RunId;

    /// Build number within its job.
    fn number(&self) -> i32;

    fn queue_id(&self) -> i64;

    /// Canonical absolute URL.
    fn url(&self) -> String;

    /// Result name, if the run settled one.
    fn result(&self) -> Option<String>;

    fn started_at(&self) -> DateTime<Utc>;

    fn duration_millis(&self) -> i64;

    /// Full environment of the run. May block.
    fn environment(&self) -> Result<EnvVars, HostError>;

    /// Build parameters, for parameterized runs.
    fn parameters(&self) -> Option<EnvVars> {
        None
    }
}

/// Where an executor lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorKind {
    /// The controller process itself.
    Controller,
    /// A remote agent.
    Agent,
}

/// An executor slot on some host machine.
pub trait Executor: Send + Sync {
    fn kind(&self) -> ExecutorKind;

    /// Display name of the owning machine.
    fn display_name(&self) -> String;

    /// Full system environment of the owning machine. May block.
    fn environment(&self) -> Result<EnvVars, HostError>;
}

/// A unit of work handed to an executor.
pub trait Task: Send + Sync {
    /// The run this task belongs to, if its owner is a run at all.
    fn owning_run(&self) -> Option<RunId>;
}

/// A source-control checkout's contribution to the build environment.
pub trait ScmEnvironment: Send + Sync {
    fn build_environment(&self, run: &dyn Run) -> Result<EnvVars, HostError>;
}

/// Walks a run's execution graph and reports its stages in graph order.
pub trait StageExtractor: Send + Sync {
    fn stages_of(&self, run: &dyn Run) -> Result<Vec<StageResult>, HostError>;
}
