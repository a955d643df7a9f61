//! Nullable transport: scripted JSON-RPC endpoints.

use reclaim_network::{JsonRpcTransport, UpstreamError};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

type Reply = Result<Value, UpstreamError>;

/// One recorded call.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedCall {
    pub endpoint: String,
    pub method: String,
    pub params: Value,
}

/// A JSON-RPC transport whose endpoints answer from a script.
///
/// Lookup order for a call to `(endpoint, method)`:
/// 1. the next one-shot reply queued with [`NullTransport::reply_once`];
/// 2. the standing reply set with [`NullTransport::reply`];
/// 3. the standing reply set for the whole endpoint with
///    [`NullTransport::reply_all`];
/// 4. otherwise a transport error.
#[derive(Default)]
pub struct NullTransport {
    once: Mutex<HashMap<(String, String), VecDeque<Reply>>>,
    standing: Mutex<HashMap<(String, String), Reply>>,
    endpoint_wide: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl NullTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, endpoint: &str, method: &str, reply: Reply) {
        self.standing
            .lock()
            .unwrap()
            .insert((endpoint.to_string(), method.to_string()), reply);
    }

    pub fn reply_once(&self, endpoint: &str, method: &str, reply: Reply) {
        self.once
            .lock()
            .unwrap()
            .entry((endpoint.to_string(), method.to_string()))
            .or_default()
            .push_back(reply);
    }

    pub fn reply_all(&self, endpoint: &str, reply: Reply) {
        self.endpoint_wide
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), reply);
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Endpoints hit so far, in order.
    pub fn endpoints_called(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.endpoint).collect()
    }

    fn answer(&self, endpoint: &str, method: &str) -> Reply {
        let key = (endpoint.to_string(), method.to_string());
        if let Some(reply) = self
            .once
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
        {
            return reply;
        }
        if let Some(reply) = self.standing.lock().unwrap().get(&key) {
            return reply.clone();
        }
        if let Some(reply) = self.endpoint_wide.lock().unwrap().get(endpoint) {
            return reply.clone();
        }
        Err(UpstreamError::Transport(format!(
            "no scripted reply for {method} on {endpoint}"
        )))
    }
}

impl JsonRpcTransport for NullTransport {
    async fn call(&self, endpoint: &str, method: &str, params: Value) -> Result<Value, UpstreamError> {
        self.calls.lock().unwrap().push(RecordedCall {
            endpoint: endpoint.to_string(),
            method: method.to_string(),
            params,
        });
        self.answer(endpoint, method)
    }
}
