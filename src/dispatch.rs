//! Serializes build summaries and posts them to the collector.
//!
//! Fire and forget: a failed delivery is logged and the event is lost.

use std::sync::Arc;

use opentelemetry::KeyValue;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use secrecy::ExposeSecret;
use tracing::{info, warn};

use crate::config::{EndpointConfig, EndpointProvider};
use crate::error::{Error, Result};
use crate::model::BuildSummary;
use crate::telemetry::metrics;

/// Header carrying the collector API token.
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// Serialize a summary to its wire form. Absent fields become `null`.
pub fn to_payload(summary: &BuildSummary) -> Result<String> {
    Ok(serde_json::to_string(summary)?)
}

/// Transport for serialized summaries.
pub trait EventSink: Send + Sync {
    /// Deliver `payload`. Anything but HTTP 200 is an error.
    fn send(&self, payload: &str, endpoint: &EndpointConfig) -> Result<()>;
}

/// Posts JSON payloads over HTTP.
///
/// Uses a blocking client: hooks run on host threads, not inside an async
/// runtime.
#[derive(Debug, Clone)]
pub struct HttpEventSink {
    client: reqwest::blocking::Client,
}

impl HttpEventSink {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: reqwest::blocking::Client::builder().build()?,
        })
    }

    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl EventSink for HttpEventSink {
    fn send(&self, payload: &str, endpoint: &EndpointConfig) -> Result<()> {
        let response = self
            .client
            .post(&endpoint.url)
            .header(CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, endpoint.token.expose_secret())
            .body(payload.to_owned())
            .send()?;

        let status = response.status();
        if status == StatusCode::OK {
            Ok(())
        } else {
            Err(Error::Delivery {
                status: status.as_u16(),
            })
        }
    }
}

/// Hands assembled summaries to an [`EventSink`].
pub struct DispatchService {
    sink: Arc<dyn EventSink>,
    endpoints: Arc<dyn EndpointProvider>,
}

impl DispatchService {
    pub fn new(sink: Arc<dyn EventSink>, endpoints: Arc<dyn EndpointProvider>) -> Self {
        Self { sink, endpoints }
    }

    /// Send `summary`, logging the outcome. Never fails the caller.
    pub fn dispatch(&self, summary: &BuildSummary) {
        match self.try_dispatch(summary) {
            Ok(()) => {
                metrics::deliveries().add(1, &[KeyValue::new("result", "ok")]);
                info!(build = summary.id, url = %summary.url, "build event delivered");
            }
            Err(e @ Error::Delivery { .. }) => {
                metrics::deliveries().add(1, &[KeyValue::new("result", "rejected")]);
                warn!(build = summary.id, url = %summary.url, "build event dropped: {e}");
            }
            Err(e) => {
                metrics::deliveries().add(1, &[KeyValue::new("result", "error")]);
                warn!(build = summary.id, url = %summary.url, "build event dropped: {e}");
            }
        }
    }

    /// Serialize, resolve the endpoint, and send.
    pub fn try_dispatch(&self, summary: &BuildSummary) -> Result<()> {
        let payload = to_payload(summary)?;
        let endpoint = self.endpoints.endpoint()?;
        self.sink.send(&payload, &endpoint)
    }
}
