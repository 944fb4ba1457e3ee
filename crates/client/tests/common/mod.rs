//! Shared test transport for the client integration tests.
//!
//! [`ScriptedTransport`] answers submissions per endpoint and polls per
//! task id from pre-loaded queues, and records every call it receives.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rankgraph_client::messages::SubmitRequest;
use rankgraph_client::transport::{PollReply, Transport, TransportError};
use rankgraph_core::types::{ImageFile, TaskId};
use serde_json::{json, Value};

/// One scripted answer to a long-poll request.
#[derive(Debug, Clone)]
pub enum Poll {
    Timeout,
    Ready(Value),
    Status(u16),
}

/// One recorded transport call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Submit(&'static str),
    Poll(TaskId),
    Heartbeat,
}

#[derive(Default)]
pub struct ScriptedTransport {
    submissions: Mutex<HashMap<&'static str, VecDeque<Result<Value, u16>>>>,
    polls: Mutex<HashMap<TaskId, VecDeque<Poll>>>,
    calls: Mutex<Vec<Call>>,
    submitted: Mutex<Vec<SubmitRequest>>,
    heartbeat_down: AtomicBool,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue the response body for the next submission to `endpoint`.
    pub fn on_submit(&self, endpoint: &'static str, body: Value) {
        self.submissions
            .lock()
            .unwrap()
            .entry(endpoint)
            .or_default()
            .push_back(Ok(body));
    }

    /// Make the next submission to `endpoint` fail with `status`.
    pub fn fail_submit(&self, endpoint: &'static str, status: u16) {
        self.submissions
            .lock()
            .unwrap()
            .entry(endpoint)
            .or_default()
            .push_back(Err(status));
    }

    /// Queue poll answers for `task_id`, consumed in order.
    pub fn on_poll(&self, task_id: &str, replies: impl IntoIterator<Item = Poll>) {
        self.polls
            .lock()
            .unwrap()
            .entry(TaskId::from(task_id))
            .or_default()
            .extend(replies);
    }

    pub fn set_heartbeat(&self, up: bool) {
        self.heartbeat_down.store(!up, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn submitted(&self) -> Vec<SubmitRequest> {
        self.submitted.lock().unwrap().clone()
    }

    /// Number of poll requests issued for `task_id`.
    pub fn poll_count(&self, task_id: &str) -> usize {
        let id = TaskId::from(task_id);
        self.calls()
            .iter()
            .filter(|call| **call == Call::Poll(id.clone()))
            .count()
    }

    /// Position of the first recorded call equal to `call`.
    pub fn position(&self, call: &Call) -> Option<usize> {
        self.calls().iter().position(|c| c == call)
    }

    /// Position of the last recorded call equal to `call`.
    pub fn last_position(&self, call: &Call) -> Option<usize> {
        self.calls().iter().rposition(|c| c == call)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn submit(&self, request: &SubmitRequest) -> Result<Value, TransportError> {
        let endpoint = request.endpoint();
        self.calls.lock().unwrap().push(Call::Submit(endpoint));
        self.submitted.lock().unwrap().push(request.clone());

        let next = self
            .submissions
            .lock()
            .unwrap()
            .get_mut(endpoint)
            .and_then(VecDeque::pop_front);
        match next {
            Some(Ok(body)) => Ok(body),
            Some(Err(status)) => Err(TransportError::Status {
                status,
                body: "scripted failure".into(),
            }),
            None => Err(TransportError::Status {
                status: 404,
                body: format!("no submission scripted for {endpoint}"),
            }),
        }
    }

    async fn check_task_result(&self, task_id: &TaskId) -> Result<PollReply, TransportError> {
        self.calls.lock().unwrap().push(Call::Poll(task_id.clone()));
        tokio::task::yield_now().await;

        let next = self
            .polls
            .lock()
            .unwrap()
            .get_mut(task_id)
            .and_then(VecDeque::pop_front);
        match next {
            Some(Poll::Timeout) => Ok(PollReply::GatewayTimeout),
            Some(Poll::Ready(body)) => Ok(PollReply::Ready(body)),
            Some(Poll::Status(status)) => Err(TransportError::Status {
                status,
                body: "scripted failure".into(),
            }),
            None => Err(TransportError::Status {
                status: 404,
                body: format!("no poll scripted for {task_id}"),
            }),
        }
    }

    async fn heartbeat(&self) -> Result<bool, TransportError> {
        self.calls.lock().unwrap().push(Call::Heartbeat);
        Ok(!self.heartbeat_down.load(Ordering::SeqCst))
    }
}

/// A `{"result": ...}` poll body.
pub fn ready(result: Value) -> Poll {
    Poll::Ready(json!({ "result": result }))
}

/// A small PNG-named image; the bytes are never decoded.
pub fn image(name: &str) -> ImageFile {
    ImageFile::new(name, vec![0x89, b'P', b'N', b'G']).unwrap()
}
