use thiserror::Error;

/// Validation errors for the fundamental types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("invalid transaction signature: {0}")]
    InvalidSignature(String),
}
