//! Fee ledger for the rent reclaim service.
//!
//! - [`split_fee`] divides the flat service fee of a burn between the
//!   protocol treasury and an optional referrer.
//! - [`FeeLedger`] records the referrer's share as a claimable earning and
//!   settles claims, delegating atomicity to a [`reclaim_store::ReferralStore`].

pub mod config;
pub mod error;
pub mod fee;
pub mod fee_ledger;

pub use config::FeeConfig;
pub use error::LedgerError;
pub use fee::{split_fee, FeeSplit};
pub use fee_ledger::{Attribution, BurnSettlement, FeeLedger, FeeQuote};
