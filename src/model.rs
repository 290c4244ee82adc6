//! Core data model.
//!
//! A run accumulates partial observations (agents, checkouts) while it
//! executes. On completion they are joined with the run's own metadata into
//! a single [`BuildSummary`], which is the event sent to the collector.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Environment variables as reported by the host, sorted by name.
pub type EnvVars = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Run identity
// ---------------------------------------------------------------------------

/// Externally stable identity of one build execution (e.g. `"app/main#42"`).
///
/// The only correlation key. Unique across concurrently executing runs and
/// never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RunId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RunId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ---------------------------------------------------------------------------
// Observations
// ---------------------------------------------------------------------------

/// An execution host that ran some portion of a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentObservation {
    /// Display name of the agent.
    pub name: String,

    /// The agent's full system environment at task start.
    #[serde(rename = "systemEnvVars")]
    pub environment: EnvVars,
}

impl AgentObservation {
    pub fn new(name: impl Into<String>, environment: EnvVars) -> Self {
        Self {
            name: name.into(),
            environment,
        }
    }
}

/// Environment contributed by one source-control checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutObservation {
    #[serde(rename = "scmEnvVars")]
    pub environment: EnvVars,
}

impl CheckoutObservation {
    pub fn new(environment: EnvVars) -> Self {
        Self { environment }
    }
}

/// A pipeline stage's display name and terminal status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageResult {
    pub name: String,
    pub status: String,
}

impl StageResult {
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: status.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Build summary
// ---------------------------------------------------------------------------

/// The consolidated event for one completed run.
///
/// Built exactly once per run by the assembler and dropped after dispatch.
/// Optional fields serialize as explicit `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSummary {
    /// Build number within its job.
    pub id: i32,

    /// Queue item id the run was scheduled from.
    pub queue_id: i64,

    /// Run start, epoch millis.
    pub timestamp: i64,

    /// Run duration in millis.
    pub duration: i64,

    /// Canonical absolute URL of the run.
    pub url: String,

    /// Result name (`SUCCESS`, `FAILURE`, ...). None if the run never settled one.
    pub status: Option<String>,

    pub build_env: EnvVars,

    pub build_parameters: Option<EnvVars>,

    /// Stages in graph order, as returned by the stage extractor.
    pub stages: Vec<StageResult>,

    /// Agents in task-start order. None if no agent ran any task of the run.
    pub agents: Option<Vec<AgentObservation>>,

    /// Checkouts in checkout order. None if the run checked nothing out.
    pub checkouts: Option<Vec<CheckoutObservation>>,
}
