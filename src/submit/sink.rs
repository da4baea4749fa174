use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extract::record::JobRecord;

pub const JOB_APPLICATION_SUBMITTED: &str = "JOB_APPLICATION_SUBMITTED";

/// Message handed to the backend that records applications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: JobRecord,
}

impl SinkMessage {
    pub fn job_submitted(record: JobRecord) -> Self {
        Self {
            kind: JOB_APPLICATION_SUBMITTED.to_string(),
            payload: record,
        }
    }
}

/// Backend reply. Only `ok` drives behaviour; `error` is carried for logs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SinkResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SinkResponse {
    pub fn ok() -> Self {
        Self { ok: true, error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink transport failed: {0}")]
    Transport(String),

    #[error("sink returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("sink reply could not be decoded: {0}")]
    Decode(String),
}

/// The external collaborator that durably records a finished application.
pub trait RecordSink {
    fn submit(&mut self, message: &SinkMessage) -> Result<SinkResponse, SinkError>;
}

// ============================================================================
// In-memory sink
// ============================================================================

/// Shared view of the messages a [`MemorySink`] received.
#[derive(Debug, Clone, Default)]
pub struct SinkLog {
    messages: Rc<RefCell<Vec<SinkMessage>>>,
}

impl SinkLog {
    pub fn len(&self) -> usize {
        self.messages.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.borrow().is_empty()
    }

    pub fn messages(&self) -> Vec<SinkMessage> {
        self.messages.borrow().clone()
    }

    pub fn records(&self) -> Vec<JobRecord> {
        self.messages
            .borrow()
            .iter()
            .map(|m| m.payload.clone())
            .collect()
    }
}

/// Records every message and answers from a script of replies, falling
/// back to a fixed default once the script runs out.
#[derive(Debug, Default)]
pub struct MemorySink {
    log: SinkLog,
    scripted: VecDeque<SinkResponse>,
    fallback: SinkResponse,
    unreachable: bool,
}

impl MemorySink {
    /// Accepts everything with `{ ok: true }`.
    pub fn new() -> Self {
        Self {
            fallback: SinkResponse::ok(),
            ..Self::default()
        }
    }

    /// Answers every message with `{ ok: false, error }`.
    pub fn rejecting(error: &str) -> Self {
        Self {
            fallback: SinkResponse::failed(error),
            ..Self::default()
        }
    }

    /// Fails every call at the transport level.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    /// Append to an existing log, so messages survive the sink being
    /// replaced on reload.
    pub fn with_log(mut self, log: SinkLog) -> Self {
        self.log = log;
        self
    }

    pub fn with_responses(mut self, responses: impl IntoIterator<Item = SinkResponse>) -> Self {
        self.scripted.extend(responses);
        self
    }

    pub fn log(&self) -> SinkLog {
        self.log.clone()
    }
}

impl RecordSink for MemorySink {
    fn submit(&mut self, message: &SinkMessage) -> Result<SinkResponse, SinkError> {
        self.log.messages.borrow_mut().push(message.clone());
        if self.unreachable {
            return Err(SinkError::Transport("receiving end does not exist".into()));
        }
        Ok(self
            .scripted
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone()))
    }
}

// ============================================================================
// HTTP sink
// ============================================================================

/// POSTs each message as JSON and reads a [`SinkResponse`] back.
pub struct HttpSink {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpSink {
    pub fn new(endpoint: &str) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self {
            endpoint: endpoint.to_string(),
            client,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl RecordSink for HttpSink {
    fn submit(&mut self, message: &SinkMessage) -> Result<SinkResponse, SinkError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(message)
            .send()
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(SinkError::Http {
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<SinkResponse>()
            .map_err(|e| SinkError::Decode(e.to_string()))
    }
}
