//! Span helpers for lifecycle hook invocations.

use tracing::Span;

use crate::model::RunId;

/// Start a span for one hook invocation against `run`.
///
/// The `hook.outcome` field is declared empty and can be filled via
/// [`record_hook_outcome`].
pub fn start_hook_span(hook: &str, run: &RunId) -> Span {
    tracing::info_span!(
        "buildevents.hook",
        "hook.name" = hook,
        "run.id" = %run,
        "hook.outcome" = tracing::field::Empty,
    )
}

/// Record how the hook ended ("recorded", "skipped", "dispatched", "failed").
pub fn record_hook_outcome(span: &Span, outcome: &str) {
    span.record("hook.outcome", outcome);
}
