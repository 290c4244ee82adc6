//! # buildevents
//!
//! Correlates the lifecycle hooks of concurrently executing CI runs into one
//! consolidated build event per run, posted to an external collector.
//!
//! Checkout and task-start hooks accumulate partial observations keyed by
//! run identity; the completion hook joins them with the run's metadata and
//! stage list, releases them, and dispatches the summary over HTTP.

pub mod assemble;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod host;
pub mod model;
pub mod observer;
pub mod replay;
pub mod stages;
pub mod store;
pub mod telemetry;
