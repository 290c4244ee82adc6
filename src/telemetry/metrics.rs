//! Metric instrument factories for buildevents.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! Without a provider the instruments are no-ops.

use opentelemetry::metrics::{Counter, Histogram, Meter};

fn meter() -> Meter {
    opentelemetry::global::meter("buildevents")
}

/// Counter: observations appended to a correlation store.
/// Labels: `channel` ("agents" | "checkouts").
pub fn observations_recorded() -> Counter<u64> {
    meter()
        .u64_counter("buildevents.observations.recorded")
        .with_description("Observations recorded for running builds")
        .build()
}

/// Counter: hook invocations that recorded nothing.
/// Labels: `reason` ("controller" | "not_a_run" | "scm_env_unavailable").
pub fn observations_skipped() -> Counter<u64> {
    meter()
        .u64_counter("buildevents.observations.skipped")
        .with_description("Hook invocations that recorded no observation")
        .build()
}

/// Counter: build summaries assembled.
pub fn summaries_assembled() -> Counter<u64> {
    meter()
        .u64_counter("buildevents.summaries.assembled")
        .with_description("Build summaries assembled on run completion")
        .build()
}

/// Counter: delivery attempts.
/// Labels: `result` ("ok" | "rejected" | "error").
pub fn deliveries() -> Counter<u64> {
    meter()
        .u64_counter("buildevents.deliveries")
        .with_description("Build summary deliveries to the collector")
        .build()
}

/// Histogram: time spent assembling a summary, in milliseconds.
pub fn assembly_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("buildevents.assembly.duration_ms")
        .with_description("Summary assembly duration in milliseconds")
        .with_unit("ms")
        .build()
}
