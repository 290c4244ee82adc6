use tracing::error;

use super::OnRunCompleted;
use crate::assemble::SummaryAssembler;
use crate::dispatch::DispatchService;
use crate::error::Result;
use crate::host::Run;
use crate::telemetry::run::{record_hook_outcome, start_hook_span};

/// Assembles and dispatches the summary of each completed run.
///
/// Assembly errors propagate to the host. Delivery errors do not: by the
/// time the event is sent the run's observations are already released.
pub struct CompletionObserver {
    assembler: SummaryAssembler,
    dispatcher: DispatchService,
}

impl CompletionObserver {
    pub fn new(assembler: SummaryAssembler, dispatcher: DispatchService) -> Self {
        Self {
            assembler,
            dispatcher,
        }
    }
}

impl OnRunCompleted for CompletionObserver {
    fn on_completed(&self, run: &dyn Run) -> Result<()> {
        let run_id = run.id();
        let span = start_hook_span("completed", &run_id);
        let _enter = span.enter();

        let summary = match self.assembler.assemble(run) {
            Ok(summary) => summary,
            Err(e) => {
                record_hook_outcome(&span, "failed");
                error!(run = %run_id, "cannot assemble build summary: {e}");
                return Err(e);
            }
        };

        self.dispatcher.dispatch(&summary);
        record_hook_outcome(&span, "dispatched");
        Ok(())
    }
}
