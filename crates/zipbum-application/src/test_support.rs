//! Scripted transport and helpers shared by the controller tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;

use zipbum_core::transport::{FormRequest, Method, Transport, TransportError};
use zipbum_core::view::ViewEvent;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub endpoint: String,
    pub body: Option<Value>,
    /// Form fields, for submissions made through `submit`.
    pub form: Option<Vec<(String, String)>>,
}

type Queues<T> = Mutex<HashMap<String, VecDeque<Result<T, TransportError>>>>;

fn next_answer<T: Clone>(queues: &Queues<T>, endpoint: &str) -> Result<T, TransportError> {
    let mut queues = queues.lock().unwrap();
    match queues.get_mut(endpoint) {
        Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
        Some(queue) if !queue.is_empty() => queue[0].clone(),
        _ => Err(TransportError::network(format!("no scripted answer for {endpoint}"))),
    }
}

/// Transport answering from per-endpoint queues.
///
/// The last queued answer for an endpoint repeats; an endpoint with no
/// answers fails with a network error. Form submissions answer with the
/// page they land on, scripted through `land`.
#[derive(Default)]
pub struct MockTransport {
    responses: Queues<Value>,
    landings: Queues<String>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, endpoint: &str, result: Result<Value, TransportError>) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .entry(endpoint.to_string())
            .or_default()
            .push_back(result);
        self
    }

    pub fn land(&self, endpoint: &str, result: Result<String, TransportError>) -> &Self {
        self.landings
            .lock()
            .unwrap()
            .entry(endpoint.to_string())
            .or_default()
            .push_back(result);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, endpoint: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.endpoint == endpoint)
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn call(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<Value, TransportError> {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            endpoint: endpoint.to_string(),
            body,
            form: None,
        });
        next_answer(&self.responses, endpoint)
    }

    async fn submit(&self, request: FormRequest) -> Result<String, TransportError> {
        self.calls.lock().unwrap().push(RecordedCall {
            method: request.method,
            endpoint: request.endpoint.clone(),
            body: None,
            form: Some(request.fields),
        });
        next_answer(&self.landings, &request.endpoint)
    }
}

/// Collects every event published so far.
pub fn drain(events: &mut UnboundedReceiver<ViewEvent>) -> Vec<ViewEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}
