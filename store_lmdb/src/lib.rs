//! LMDB storage backend for the referral ledger.
//!
//! Implements [`reclaim_store::ReferralStore`] using the `heed` LMDB
//! bindings. Each logical table maps to one LMDB database within a single
//! environment. LMDB allows one write transaction at a time, which is what
//! serializes concurrent claims for the same wallet.

pub mod environment;
pub mod error;
pub mod referral;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use referral::LmdbReferralStore;
