//! Stage filtering over a run's flow graph.
//!
//! The host's graph walker yields every node (stages, parallel branches,
//! steps). Only stage nodes make it into a summary.

use serde::{Deserialize, Serialize};

use crate::host::{HostError, Run, StageExtractor};
use crate::model::StageResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Stage,
    Parallel,
    Step,
}

/// Terminal result of a flow node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeResult {
    Success,
    Unstable,
    Failure,
    NotBuilt,
    Aborted,
    Unknown,
}

impl NodeResult {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeResult::Success => "SUCCESS",
            NodeResult::Unstable => "UNSTABLE",
            NodeResult::Failure => "FAILURE",
            NodeResult::NotBuilt => "NOT_BUILT",
            NodeResult::Aborted => "ABORTED",
            NodeResult::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for NodeResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One node of a run's flow graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowNode {
    pub kind: NodeKind,
    pub display_name: String,
    pub result: NodeResult,
}

impl FlowNode {
    pub fn stage(display_name: impl Into<String>, result: NodeResult) -> Self {
        Self {
            kind: NodeKind::Stage,
            display_name: display_name.into(),
            result,
        }
    }
}

/// Keep stage nodes only, preserving graph order.
pub fn stage_results(nodes: &[FlowNode]) -> Vec<StageResult> {
    nodes
        .iter()
        .filter(|node| node.kind == NodeKind::Stage)
        .map(|node| StageResult::new(&node.display_name, node.result.as_str()))
        .collect()
}

/// Adapts a flow-graph walker into a [`StageExtractor`].
pub struct FlowGraphStageExtractor<F> {
    walk: F,
}

impl<F> FlowGraphStageExtractor<F>
where
    F: Fn(&dyn Run) -> Result<Vec<FlowNode>, HostError> + Send + Sync,
{
    pub fn new(walk: F) -> Self {
        Self { walk }
    }
}

impl<F> StageExtractor for FlowGraphStageExtractor<F>
where
    F: Fn(&dyn Run) -> Result<Vec<FlowNode>, HostError> + Send + Sync,
{
    fn stages_of(&self, run: &dyn Run) -> Result<Vec<StageResult>, HostError> {
        let nodes = (self.walk)(run)?;
        Ok(stage_results(&nodes))
    }
}
