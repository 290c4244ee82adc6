//! Test doubles for the host collaborators.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use buildevents::config::{EndpointConfig, EndpointProvider, StaticEndpoint};
use buildevents::dispatch::EventSink;
use buildevents::error::{Error, Result};
use buildevents::host::{Executor, ExecutorKind, HostError, Run, ScmEnvironment, StageExtractor, Task};
use buildevents::model::{EnvVars, RunId, StageResult};
use chrono::{DateTime, TimeZone, Utc};

pub fn env(pairs: &[(&str, &str)]) -> EnvVars {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

pub struct FakeRun {
    pub id: RunId,
    pub number: i32,
    pub queue_id: i64,
    pub url: String,
    pub result: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration_millis: i64,
    pub env: Option<EnvVars>,
    pub parameters: Option<EnvVars>,
}

impl FakeRun {
    pub fn new(id: &str) -> Self {
        Self {
            id: RunId::new(id),
            number: 42,
            queue_id: 9001,
            url: "https://ci.example.com/job/app/42/".to_string(),
            result: Some("SUCCESS".to_string()),
            started_at: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
            duration_millis: 12_345,
            env: Some(env(&[("BUILD_NUMBER", "42"), ("JOB_NAME", "app")])),
            parameters: None,
        }
    }

    /// Environment resolution fails like an interrupted host call.
    pub fn without_env(mut self) -> Self {
        self.env = None;
        self
    }

    pub fn unsettled(mut self) -> Self {
        self.result = None;
        self
    }
}

impl Run for FakeRun {
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
        self.url.clone()
    }

    fn result(&self) -> Option<String> {
        self.result.clone()
    }

    fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    fn duration_millis(&self) -> i64 {
        self.duration_millis
    }

    fn environment(&self) -> std::result::Result<EnvVars, HostError> {
        self.env.clone().ok_or(HostError::Interrupted)
    }

    fn parameters(&self) -> Option<EnvVars> {
        self.parameters.clone()
    }
}

// ---------------------------------------------------------------------------
// Executors, tasks, checkouts
// ---------------------------------------------------------------------------

pub struct FakeExecutor {
    pub name: String,
    pub kind: ExecutorKind,
    pub env: Option<EnvVars>,
}

impl FakeExecutor {
    pub fn agent(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ExecutorKind::Agent,
            env: Some(env(&[("NODE_NAME", name)])),
        }
    }

    pub fn controller() -> Self {
        Self {
            name: "built-in".to_string(),
            kind: ExecutorKind::Controller,
            env: Some(env(&[("NODE_NAME", "built-in")])),
        }
    }

    pub fn broken_agent(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ExecutorKind::Agent,
            env: None,
        }
    }
}

impl Executor for FakeExecutor {
    fn kind(&self) -> ExecutorKind {
        self.kind
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn environment(&self) -> std::result::Result<EnvVars, HostError> {
        self.env.clone().ok_or_else(|| {
            HostError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "channel closed",
            ))
        })
    }
}

pub struct FakeTask(pub Option<RunId>);

impl FakeTask {
    pub fn of(run: &str) -> Self {
        Self(Some(RunId::new(run)))
    }

    pub fn orphan() -> Self {
        Self(None)
    }
}

impl Task for FakeTask {
    fn owning_run(&self) -> Option<RunId> {
        self.0.clone()
    }
}

pub struct FakeScm(pub Option<EnvVars>);

impl FakeScm {
    pub fn commit(sha: &str) -> Self {
        Self(Some(env(&[("GIT_COMMIT", sha), ("GIT_BRANCH", "main")])))
    }

    pub fn unavailable() -> Self {
        Self(None)
    }
}

impl ScmEnvironment for FakeScm {
    fn build_environment(&self, _run: &dyn Run) -> std::result::Result<EnvVars, HostError> {
        self.0.clone().ok_or(HostError::Interrupted)
    }
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

pub struct FixedStages(pub Vec<StageResult>);

impl FixedStages {
    pub fn none() -> Self {
        Self(Vec::new())
    }
}

impl StageExtractor for FixedStages {
    fn stages_of(&self, _run: &dyn Run) -> std::result::Result<Vec<StageResult>, HostError> {
        Ok(self.0.clone())
    }
}

pub struct FailingStages;

impl StageExtractor for FailingStages {
    fn stages_of(&self, _run: &dyn Run) -> std::result::Result<Vec<StageResult>, HostError> {
        Err(HostError::Interrupted)
    }
}

// ---------------------------------------------------------------------------
// Sinks and endpoints
// ---------------------------------------------------------------------------

/// Records every payload; answers with `status` (200 = success).
pub struct RecordingSink {
    pub status: u16,
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            status: 200,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn rejecting(status: u16) -> Arc<Self> {
        Arc::new(Self {
            status,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn payloads(&self) -> Vec<serde_json::Value> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(payload, _)| serde_json::from_str(payload).unwrap())
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn send(&self, payload: &str, endpoint: &EndpointConfig) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((payload.to_string(), endpoint.url.clone()));
        if self.status == 200 {
            Ok(())
        } else {
            Err(Error::Delivery {
                status: self.status,
            })
        }
    }
}

pub fn endpoint() -> Arc<StaticEndpoint> {
    Arc::new(StaticEndpoint::new(
        EndpointConfig::new("https://collector.example.com/events", "test-token").unwrap(),
    ))
}

/// Endpoint storage that has not been configured yet.
pub struct MissingEndpoint;

impl EndpointProvider for MissingEndpoint {
    fn endpoint(&self) -> Result<EndpointConfig> {
        Err(Error::Config("collector url is not configured".to_string()))
    }
}
