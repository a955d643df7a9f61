use thiserror::Error;

/// Failures surfaced by a [`crate::ReferralStore`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("already recorded: {0}")]
    Duplicate(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database is corrupted: {0}")]
    Corruption(String),

    #[error("amount overflow: {0}")]
    Overflow(String),
}
