//! Abstract storage traits for the referral ledger.
//!
//! Every storage backend (LMDB, in-memory for testing) implements
//! [`ReferralStore`]. The rest of the codebase depends only on the trait.

pub mod error;
pub mod referral;

pub use error::StoreError;
pub use referral::{NewEarning, ReferralEarning, ReferralStat, ReferralStore};
