use reclaim_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The burn already has an earning on the ledger.
    #[error("burn {0} already recorded")]
    AlreadyRecorded(String),

    #[error("persistence error: {0}")]
    Persistence(StoreError),
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(burn_tx) => LedgerError::AlreadyRecorded(burn_tx),
            other => LedgerError::Persistence(other),
        }
    }
}
