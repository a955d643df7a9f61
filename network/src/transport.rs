//! JSON-RPC transport.
//!
//! Both Solana RPC and DAS endpoints speak JSON-RPC 2.0 over HTTP POST.
//! The transport only moves one request to one endpoint; choosing the
//! endpoint and retrying belong to [`crate::failover`].

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::UpstreamError;

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Upstream error bodies are truncated to this many bytes.
const MAX_ERROR_BODY: usize = 512;

/// Sends a single JSON-RPC call to an endpoint and returns its `result`.
pub trait JsonRpcTransport: Send + Sync + 'static {
    fn call(
        &self,
        endpoint: &str,
        method: &str,
        params: Value,
    ) -> impl Future<Output = Result<Value, UpstreamError>> + Send;
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    #[serde(default)]
    message: String,
}

/// Production transport over `reqwest`.
pub struct HttpTransport {
    /// HTTP client (reusable connection pool).
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| UpstreamError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            next_id: AtomicU64::new(1),
        })
    }
}

impl JsonRpcTransport for HttpTransport {
    async fn call(
        &self,
        endpoint: &str,
        method: &str,
        params: Value,
    ) -> Result<Value, UpstreamError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self.http.post(endpoint).json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Transport(format!("request timed out: {e}"))
            } else if e.is_connect() {
                UpstreamError::Transport(format!("connection failed: {e}"))
            } else {
                UpstreamError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let mut text = response.text().await.unwrap_or_default();
            truncate_utf8(&mut text, MAX_ERROR_BODY);
            return Err(UpstreamError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let envelope: RpcEnvelope = response
            .json()
            .await
            .map_err(|e| UpstreamError::InvalidResponse(format!("{method}: {e}")))?;

        if let Some(err) = envelope.error {
            return Err(UpstreamError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        envelope
            .result
            .ok_or_else(|| UpstreamError::InvalidResponse(format!("{method}: missing result")))
    }
}

fn truncate_utf8(text: &mut String, max: usize) {
    if text.len() <= max {
        return;
    }
    let mut cut = max;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_char_boundaries() {
        let mut s = "ééé".to_string(); // 6 bytes
        truncate_utf8(&mut s, 3);
        assert_eq!(s, "é");

        let mut short = "ok".to_string();
        truncate_utf8(&mut short, 10);
        assert_eq!(short, "ok");
    }

    #[test]
    fn envelope_with_error_object_parses() {
        let env: RpcEnvelope = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": 403, "message": "Forbidden"}
        }))
        .unwrap();
        assert!(env.result.is_none());
        assert_eq!(env.error.unwrap().code, 403);
    }
}
