//! HTTP API for the rent reclaim front-end.
//!
//! Provides endpoints for:
//! - Closable token account discovery
//! - Token metadata enrichment
//! - Latest blockhash for transaction building
//! - Fee quotes and burn fee settlement
//! - Referral earnings: record, list, claim

pub mod error;
pub mod handlers;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use server::{router, RpcServer};
pub use state::AppState;
