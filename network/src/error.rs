use thiserror::Error;

/// A single failed upstream call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl UpstreamError {
    /// Authorization / rate-limit class. These put the endpoint into
    /// cooldown and are always retried on another endpoint.
    pub fn is_access_denied(&self) -> bool {
        match self {
            UpstreamError::Http { status, body } => {
                *status == 403 || *status == 429 || mentions_denial(body)
            }
            UpstreamError::Rpc { code, message } => *code == 403 || mentions_denial(message),
            UpstreamError::Transport(msg) | UpstreamError::InvalidResponse(msg) => {
                mentions_denial(msg)
            }
        }
    }
}

fn mentions_denial(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    lower.contains("forbidden") || lower.contains("rate limit")
}

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("no endpoints configured for {0}")]
    NoEndpointsConfigured(String),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("all {attempts} attempts failed, last error: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}
