//! Core engine. Wires the observers to one shared set of observations.
//!
//! The engine is what a host registers: it implements all three hook
//! capabilities by delegating to the observers it owns. Each engine owns
//! its own [`Observations`], so independent engines never share state.

use std::sync::Arc;

use crate::assemble::SummaryAssembler;
use crate::config::EndpointProvider;
use crate::dispatch::{DispatchService, EventSink};
use crate::error::Result;
use crate::host::{Executor, Run, ScmEnvironment, StageExtractor, Task};
use crate::observer::{
    CheckoutObserver, CompletionObserver, OnCheckout, OnRunCompleted, OnTaskStart,
    TaskStartObserver,
};
use crate::store::Observations;

/// The build-events engine.
pub struct Engine {
    observations: Arc<Observations>,
    checkout: CheckoutObserver,
    task_start: TaskStartObserver,
    completion: CompletionObserver,
}

impl Engine {
    pub fn new(
        stages: Arc<dyn StageExtractor>,
        sink: Arc<dyn EventSink>,
        endpoints: Arc<dyn EndpointProvider>,
    ) -> Self {
        let observations = Arc::new(Observations::new());
        let assembler = SummaryAssembler::new(Arc::clone(&observations), stages);
        let dispatcher = DispatchService::new(sink, endpoints);
        Self {
            checkout: CheckoutObserver::new(Arc::clone(&observations)),
            task_start: TaskStartObserver::new(Arc::clone(&observations)),
            completion: CompletionObserver::new(assembler, dispatcher),
            observations,
        }
    }

    /// Observations of runs that have not completed yet.
    pub fn observations(&self) -> &Observations {
        &self.observations
    }
}

impl OnCheckout for Engine {
    fn on_checkout(&self, run: &dyn Run, scm: &dyn ScmEnvironment) {
        self.checkout.on_checkout(run, scm);
    }
}

impl OnTaskStart for Engine {
    fn on_task_started(&self, executor: &dyn Executor, task: &dyn Task) -> Result<()> {
        self.task_start.on_task_started(executor, task)
    }
}

impl OnRunCompleted for Engine {
    fn on_completed(&self, run: &dyn Run) -> Result<()> {
        self.completion.on_completed(run)
    }

    fn on_initialize(&self, run: &dyn Run) {
        self.completion.on_initialize(run);
    }

    fn on_started(&self, run: &dyn Run) {
        self.completion.on_started(run);
    }

    fn on_finalized(&self, run: &dyn Run) {
        self.completion.on_finalized(run);
    }
}
