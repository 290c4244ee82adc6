//! Error types for buildevents.

use thiserror::Error;

use crate::host::HostError;
use crate::model::RunId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("cannot resolve environment of agent {agent} for run {run}: {source}")]
    AgentEnvironment {
        agent: String,
        run: RunId,
        #[source]
        source: HostError,
    },

    #[error("cannot resolve environment of run {run}: {source}")]
    RunEnvironment {
        run: RunId,
        #[source]
        source: HostError,
    },

    #[error("cannot extract stages of run {run}: {source}")]
    StageExtraction {
        run: RunId,
        #[source]
        source: HostError,
    },

    #[error("collector rejected event with status {status}")]
    Delivery { status: u16 },

    #[error("bad lifecycle event on line {line}: {source}")]
    Replay {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("telemetry error: {0}")]
    Telemetry(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Errors that abort the hook invocation and must reach the host.
    ///
    /// Delivery failures are not among them: they are logged and dropped.
    pub fn is_fatal_to_hook(&self) -> bool {
        matches!(
            self,
            Error::AgentEnvironment { .. }
                | Error::RunEnvironment { .. }
                | Error::StageExtraction { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
