use std::sync::Arc;

use opentelemetry::KeyValue;
use tracing::{debug, warn};

use super::OnCheckout;
use crate::host::{Run, ScmEnvironment};
use crate::model::CheckoutObservation;
use crate::store::Observations;
use crate::telemetry::metrics;
use crate::telemetry::run::{record_hook_outcome, start_hook_span};

/// Records the SCM environment of every checkout a run performs.
pub struct CheckoutObserver {
    observations: Arc<Observations>,
}

impl CheckoutObserver {
    pub fn new(observations: Arc<Observations>) -> Self {
        Self { observations }
    }
}

impl OnCheckout for CheckoutObserver {
    fn on_checkout(&self, run: &dyn Run, scm: &dyn ScmEnvironment) {
        let run_id = run.id();
        let span = start_hook_span("checkout", &run_id);
        let _enter = span.enter();

        match scm.build_environment(run) {
            Ok(environment) => {
                self.observations
                    .checkouts
                    .append(&run_id, CheckoutObservation::new(environment));
                metrics::observations_recorded().add(1, &[KeyValue::new("channel", "checkouts")]);
                record_hook_outcome(&span, "recorded");
                debug!(run = %run_id, "checkout recorded");
            }
            Err(e) => {
                metrics::observations_skipped()
                    .add(1, &[KeyValue::new("reason", "scm_env_unavailable")]);
                record_hook_outcome(&span, "skipped");
                warn!(run = %run_id, "checkout environment unavailable, not recorded: {e}");
            }
        }
    }
}
