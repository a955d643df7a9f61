//! Referral earnings and per-referrer statistics.
//!
//! Two record kinds are persisted:
//! - [`ReferralEarning`]: one row per burn that carried a referral. The only
//!   mutation ever applied is the claim transition.
//! - [`ReferralStat`]: one aggregate row per referrer wallet, created on the
//!   first earning and updated on every earning and claim.
//!
//! Backends must apply each trait method as a single atomic transaction.

use reclaim_types::{Lamports, Timestamp, TxSignature, WalletAddress};
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// A referrer's share of the service fee from one burn transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralEarning {
    pub id: u64,
    pub referrer_wallet: WalletAddress,
    pub amount: Lamports,
    pub burn_tx: TxSignature,
    pub claimed: bool,
    pub claim_tx: Option<TxSignature>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ReferralEarning {
    pub fn new(id: u64, earning: &NewEarning, now: Timestamp) -> Self {
        Self {
            id,
            referrer_wallet: earning.referrer_wallet.clone(),
            amount: earning.amount,
            burn_tx: earning.burn_tx.clone(),
            claimed: false,
            claim_tx: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Flip to claimed. `claimed` and `claim_tx` always change together.
    pub fn mark_claimed(&mut self, claim_tx: &TxSignature, now: Timestamp) {
        self.claimed = true;
        self.claim_tx = Some(claim_tx.clone());
        self.updated_at = now;
    }
}

/// Input for [`ReferralStore::record_earning`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewEarning {
    pub referrer_wallet: WalletAddress,
    pub amount: Lamports,
    pub burn_tx: TxSignature,
}

/// Aggregate referral statistics for one wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralStat {
    pub referrer_wallet: WalletAddress,
    pub total_earned: Lamports,
    pub total_claimed: Lamports,
    pub total_burns: u64,
    pub last_updated: Timestamp,
}

impl ReferralStat {
    /// Stat row for a wallet's first earning.
    pub fn first(earning: &NewEarning, now: Timestamp) -> Self {
        Self {
            referrer_wallet: earning.referrer_wallet.clone(),
            total_earned: earning.amount,
            total_claimed: 0,
            total_burns: 1,
            last_updated: now,
        }
    }

    /// Upsert step: the stat row after `earning` is recorded.
    pub fn upsert(
        existing: Option<Self>,
        earning: &NewEarning,
        now: Timestamp,
    ) -> Result<Self, StoreError> {
        match existing {
            None => Ok(Self::first(earning, now)),
            Some(mut stat) => {
                stat.total_earned = stat
                    .total_earned
                    .checked_add(earning.amount)
                    .ok_or_else(|| StoreError::Overflow(format!("total earned for {}", stat.referrer_wallet)))?;
                stat.total_burns += 1;
                stat.last_updated = now;
                Ok(stat)
            }
        }
    }

    /// Apply a claim of `claimed` lamports.
    pub fn apply_claim(&mut self, claimed: Lamports, now: Timestamp) -> Result<(), StoreError> {
        self.total_claimed = self
            .total_claimed
            .checked_add(claimed)
            .ok_or_else(|| StoreError::Overflow(format!("total claimed for {}", self.referrer_wallet)))?;
        self.last_updated = now;
        Ok(())
    }

    /// Lamports earned but not yet claimed.
    pub fn unclaimed(&self) -> Lamports {
        self.total_earned.saturating_sub(self.total_claimed)
    }
}

/// Persistent referral ledger.
pub trait ReferralStore: Send + Sync {
    /// Insert an unclaimed earning and upsert the referrer's stat row in
    /// one transaction.
    ///
    /// Returns [`StoreError::Duplicate`] if this burn signature was already
    /// recorded for the referrer.
    fn record_earning(
        &self,
        earning: &NewEarning,
        now: Timestamp,
    ) -> Result<ReferralEarning, StoreError>;

    /// Mark every unclaimed earning of `referrer` as claimed by `claim_tx`
    /// and credit the stat row, in one transaction.
    ///
    /// Returns the claimed total; `0` (with no writes) when nothing was
    /// unclaimed.
    fn claim_earnings(
        &self,
        referrer: &WalletAddress,
        claim_tx: &TxSignature,
        now: Timestamp,
    ) -> Result<Lamports, StoreError>;

    /// All earnings of `referrer`, oldest first.
    fn earnings_for(&self, referrer: &WalletAddress) -> Result<Vec<ReferralEarning>, StoreError>;

    /// The stat row of `referrer`, if it ever earned.
    fn stats_for(&self, referrer: &WalletAddress) -> Result<Option<ReferralStat>, StoreError>;
}
