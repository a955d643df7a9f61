//! Nullable infrastructure for deterministic testing.
//!
//! All external dependencies (clock, referral storage, JSON-RPC endpoints)
//! are abstracted behind traits. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod store;
pub mod transport;

pub use clock::NullClock;
pub use store::NullReferralStore;
pub use transport::NullTransport;
