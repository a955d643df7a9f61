//! Fundamental types for the rent reclaim service.
//!
//! This crate defines the types shared across every other crate in the
//! workspace: wallet addresses, transaction signatures, lamport amounts,
//! timestamps and the clock abstraction.

pub mod address;
pub mod error;
pub mod signature;
pub mod time;

pub use address::WalletAddress;
pub use error::TypeError;
pub use signature::TxSignature;
pub use time::{Clock, SystemClock, Timestamp};

/// Smallest unit of the native currency.
pub type Lamports = u64;

/// Lamports per SOL.
pub const LAMPORTS_PER_SOL: Lamports = 1_000_000_000;
