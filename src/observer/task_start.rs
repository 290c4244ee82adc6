use std::sync::Arc;

use opentelemetry::KeyValue;
use tracing::{debug, error};

use super::OnTaskStart;
use crate::error::{Error, Result};
use crate::host::{Executor, ExecutorKind, Task};
use crate::model::AgentObservation;
use crate::store::Observations;
use crate::telemetry::metrics;
use crate::telemetry::run::{record_hook_outcome, start_hook_span};

/// Records which agents execute tasks of which run.
///
/// Tasks on the controller, and tasks not owned by a run, are ignored.
pub struct TaskStartObserver {
    observations: Arc<Observations>,
}

impl TaskStartObserver {
    pub fn new(observations: Arc<Observations>) -> Self {
        Self { observations }
    }
}

impl OnTaskStart for TaskStartObserver {
    fn on_task_started(&self, executor: &dyn Executor, task: &dyn Task) -> Result<()> {
        if executor.kind() != ExecutorKind::Agent {
            metrics::observations_skipped().add(1, &[KeyValue::new("reason", "controller")]);
            return Ok(());
        }
        let Some(run_id) = task.owning_run() else {
            metrics::observations_skipped().add(1, &[KeyValue::new("reason", "not_a_run")]);
            return Ok(());
        };

        let span = start_hook_span("task_started", &run_id);
        let _enter = span.enter();

        let agent = executor.display_name();
        let environment = executor.environment().map_err(|source| {
            record_hook_outcome(&span, "failed");
            error!(run = %run_id, agent = %agent, "agent environment resolution failed: {source}");
            Error::AgentEnvironment {
                agent: agent.clone(),
                run: run_id.clone(),
                source,
            }
        })?;

        self.observations
            .agents
            .append(&run_id, AgentObservation::new(&agent, environment));
        metrics::observations_recorded().add(1, &[KeyValue::new("channel", "agents")]);
        record_hook_outcome(&span, "recorded");
        debug!(run = %run_id, agent = %agent, "agent recorded");
        Ok(())
    }
}
