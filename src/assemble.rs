//! Joins a completed run's metadata with its accumulated observations.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::error::{Error, Result};
use crate::host::{Run, StageExtractor};
use crate::model::BuildSummary;
use crate::store::Observations;
use crate::telemetry::metrics;

/// Builds the one [`BuildSummary`] of a run and releases its observations.
pub struct SummaryAssembler {
    observations: Arc<Observations>,
    stages: Arc<dyn StageExtractor>,
}

impl SummaryAssembler {
    pub fn new(observations: Arc<Observations>, stages: Arc<dyn StageExtractor>) -> Self {
        Self {
            observations,
            stages,
        }
    }

    /// Assemble the summary of a completed run.
    ///
    /// The run's observations are evicted before any fallible step, so they
    /// are released even when assembly fails. Failures to resolve the run
    /// environment or its stages abort assembly; no partial summary is
    /// produced.
    pub fn assemble(&self, run: &dyn Run) -> Result<BuildSummary> {
        let started = Instant::now();
        let run_id = run.id();

        let (agents, checkouts) = self.observations.take_run(&run_id);

        let build_env = run.environment().map_err(|source| Error::RunEnvironment {
            run: run_id.clone(),
            source,
        })?;

        let stages = self
            .stages
            .stages_of(run)
            .map_err(|source| Error::StageExtraction {
                run: run_id.clone(),
                source,
            })?;

        let summary = BuildSummary {
            id: run.number(),
            queue_id: run.queue_id(),
            timestamp: run.started_at().timestamp_millis(),
            duration: run.duration_millis(),
            url: run.url(),
            status: run.result(),
            build_env,
            build_parameters: run.parameters(),
            stages,
            agents: non_empty(agents),
            checkouts: non_empty(checkouts),
        };

        metrics::summaries_assembled().add(1, &[]);
        metrics::assembly_duration_ms().record(started.elapsed().as_secs_f64() * 1000.0, &[]);
        debug!(
            run = %run_id,
            agents = summary.agents.as_ref().map_or(0, Vec::len),
            checkouts = summary.checkouts.as_ref().map_or(0, Vec::len),
            stages = summary.stages.len(),
            "summary assembled"
        );
        Ok(summary)
    }
}

fn non_empty<T>(values: Vec<T>) -> Option<Vec<T>> {
    if values.is_empty() { None } else { Some(values) }
}
