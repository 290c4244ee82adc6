//! Replays a recorded host lifecycle through the engine.
//!
//! Input is newline-delimited JSON, one [`LifecycleEvent`] per line, in the
//! order the host emitted them. Events of one run are applied in file
//! order; different runs are replayed concurrently, each hook call running
//! on a blocking thread the way host callbacks do.

use std::collections::HashMap;
use std::io::BufRead;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Deserialize;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::config::EndpointProvider;
use crate::dispatch::EventSink;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::host::{Executor, ExecutorKind, HostError, Run, ScmEnvironment, Task};
use crate::model::{EnvVars, RunId};
use crate::observer::{OnCheckout, OnRunCompleted, OnTaskStart};
use crate::stages::{FlowGraphStageExtractor, FlowNode};

// ---------------------------------------------------------------------------
// Recorded host objects
// ---------------------------------------------------------------------------

/// A run as captured from the host. Only `id` is required; earlier events
/// of a run usually carry nothing else.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordedRun {
    pub id: RunId,
    #[serde(default)]
    pub number: i32,
    #[serde(default)]
    pub queue_id: i64,
    /// Host root URL, e.g. `"https://ci.example.com/"`.
    #[serde(default)]
    pub root_url: String,
    /// Run URL relative to the root, e.g. `"job/app/42/"`.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_millis: i64,
    /// None means the host failed to resolve it.
    #[serde(default)]
    pub env: Option<EnvVars>,
    #[serde(default)]
    pub parameters: Option<EnvVars>,
    /// Flow graph in walk order.
    #[serde(default)]
    pub nodes: Vec<FlowNode>,
}

impl Run for RecordedRun {
    fn id(&self) -> RunId {
        self.id.clone()
    }

    fn number(&self) -> i32 {
        self.number
    }

    fn queue_id(&self) -> i64 {
        self.queue_id
    }

    fn url(&self) -> String {
        format!("{}{}", self.root_url, self.url)
    }

    fn result(&self) -> Option<String> {
        self.result.clone()
    }

    fn started_at(&self) -> DateTime<Utc> {
        self.started_at.unwrap_or_default()
    }

    fn duration_millis(&self) -> i64 {
        self.duration_millis
    }

    fn environment(&self) -> std::result::Result<EnvVars, HostError> {
        self.env.clone().ok_or_else(|| not_recorded("run environment"))
    }

    fn parameters(&self) -> Option<EnvVars> {
        self.parameters.clone()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordedExecutor {
    pub name: String,
    pub kind: ExecutorKind,
    #[serde(default)]
    pub env: Option<EnvVars>,
}

impl Executor for RecordedExecutor {
    fn kind(&self) -> ExecutorKind {
        self.kind
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn environment(&self) -> std::result::Result<EnvVars, HostError> {
        self.env.clone().ok_or_else(|| not_recorded("agent environment"))
    }
}

struct RecordedTask {
    run: Option<RunId>,
}

impl Task for RecordedTask {
    fn owning_run(&self) -> Option<RunId> {
        self.run.clone()
    }
}

struct RecordedScm {
    env: Option<EnvVars>,
}

impl ScmEnvironment for RecordedScm {
    fn build_environment(&self, _run: &dyn Run) -> std::result::Result<EnvVars, HostError> {
        self.env.clone().ok_or_else(|| not_recorded("scm environment"))
    }
}

fn not_recorded(what: &str) -> HostError {
    HostError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("{what} not recorded"),
    ))
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// One host callback, as recorded.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    Started {
        run: RecordedRun,
    },
    Checkout {
        run: RecordedRun,
        #[serde(default)]
        scm_env: Option<EnvVars>,
    },
    TaskStarted {
        /// Owning run; None for tasks owned by something else.
        #[serde(default)]
        run: Option<RunId>,
        executor: RecordedExecutor,
    },
    Completed {
        run: RecordedRun,
    },
}

impl LifecycleEvent {
    fn run_id(&self) -> Option<&RunId> {
        match self {
            LifecycleEvent::Started { run }
            | LifecycleEvent::Checkout { run, .. }
            | LifecycleEvent::Completed { run } => Some(&run.id),
            LifecycleEvent::TaskStarted { run, .. } => run.as_ref(),
        }
    }
}

/// Parse newline-delimited events. Blank lines are skipped.
pub fn parse_events(reader: impl BufRead) -> Result<Vec<LifecycleEvent>> {
    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event = serde_json::from_str(&line).map_err(|source| Error::Replay {
            line: index + 1,
            source,
        })?;
        events.push(event);
    }
    Ok(events)
}

// ---------------------------------------------------------------------------
// Replayer
// ---------------------------------------------------------------------------

/// What happened during a replay.
#[derive(Debug, Default)]
pub struct ReplayReport {
    /// Runs whose completion hook succeeded.
    pub completed: usize,
    /// Hook invocations that failed, with their error.
    pub failures: Vec<String>,
}

impl ReplayReport {
    fn merge(&mut self, other: ReplayReport) {
        self.completed += other.completed;
        self.failures.extend(other.failures);
    }
}

/// Drives an [`Engine`] from recorded events.
pub struct Replayer {
    engine: Engine,
    graphs: Arc<DashMap<RunId, Vec<FlowNode>>>,
}

impl Replayer {
    pub fn new(sink: Arc<dyn EventSink>, endpoints: Arc<dyn EndpointProvider>) -> Self {
        let graphs: Arc<DashMap<RunId, Vec<FlowNode>>> = Arc::new(DashMap::new());
        let walker_graphs = Arc::clone(&graphs);
        let stages = FlowGraphStageExtractor::new(move |run: &dyn Run| {
            Ok(walker_graphs
                .remove(&run.id())
                .map(|(_, nodes)| nodes)
                .unwrap_or_default())
        });
        Self {
            engine: Engine::new(Arc::new(stages), sink, endpoints),
            graphs,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Replay `events`, at most `concurrency` runs at a time.
    pub async fn replay(
        self: &Arc<Self>,
        events: Vec<LifecycleEvent>,
        concurrency: usize,
    ) -> ReplayReport {
        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        let mut handles = Vec::new();

        for group in group_by_run(events) {
            let replayer = Arc::clone(self);
            let semaphore = Arc::clone(&semaphore);
            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                tokio::task::spawn_blocking(move || replayer.apply_all(group)).await
            }));
        }

        let mut report = ReplayReport::default();
        for handle in handles {
            match handle.await {
                Ok(Ok(outcome)) => report.merge(outcome),
                Ok(Err(e)) | Err(e) => report.failures.push(format!("replay task failed: {e}")),
            }
        }
        info!(
            completed = report.completed,
            failures = report.failures.len(),
            "replay finished"
        );
        report
    }

    /// Apply events in order on the calling thread.
    pub fn apply_all(&self, events: Vec<LifecycleEvent>) -> ReplayReport {
        let mut report = ReplayReport::default();
        for event in events {
            self.apply(event, &mut report);
        }
        report
    }

    fn apply(&self, event: LifecycleEvent, report: &mut ReplayReport) {
        match event {
            LifecycleEvent::Started { run } => {
                self.engine.on_initialize(&run);
                self.engine.on_started(&run);
            }
            LifecycleEvent::Checkout { run, scm_env } => {
                self.engine.on_checkout(&run, &RecordedScm { env: scm_env });
            }
            LifecycleEvent::TaskStarted { run, executor } => {
                if let Err(e) = self
                    .engine
                    .on_task_started(&executor, &RecordedTask { run })
                {
                    report.failures.push(e.to_string());
                }
            }
            LifecycleEvent::Completed { run } => {
                self.graphs.insert(run.id.clone(), run.nodes.clone());
                match self.engine.on_completed(&run) {
                    Ok(()) => report.completed += 1,
                    Err(e) => {
                        warn!(run = %run.id, "completion hook failed: {e}");
                        report.failures.push(e.to_string());
                    }
                }
                // Unconsumed when assembly failed before walking the graph.
                self.graphs.remove(&run.id);
                self.engine.on_finalized(&run);
            }
        }
    }
}

/// Split events into per-run sequences, keeping file order within each run
/// and first-appearance order across runs. Events without a run form their
/// own group.
fn group_by_run(events: Vec<LifecycleEvent>) -> Vec<Vec<LifecycleEvent>> {
    let mut index: HashMap<Option<RunId>, usize> = HashMap::new();
    let mut groups: Vec<Vec<LifecycleEvent>> = Vec::new();
    for event in events {
        let key = event.run_id().cloned();
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(event);
    }
    groups
}
