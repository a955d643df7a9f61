//! Nullable store: thread-safe in-memory referral ledger for testing.

use reclaim_store::{NewEarning, ReferralEarning, ReferralStat, ReferralStore, StoreError};
use reclaim_types::{Lamports, Timestamp, TxSignature, WalletAddress};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct Ledger {
    earnings: Vec<ReferralEarning>,
    stats: HashMap<WalletAddress, ReferralStat>,
    next_id: u64,
}

/// An in-memory referral store.
///
/// A single mutex guards both tables, so every trait method is atomic just
/// like a backend transaction. [`NullReferralStore::set_unavailable`]
/// simulates an unreachable database.
#[derive(Default)]
pub struct NullReferralStore {
    ledger: Mutex<Ledger>,
    unavailable: AtomicBool,
}

impl NullReferralStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a backend error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("store unavailable".into()));
        }
        Ok(())
    }
}

impl ReferralStore for NullReferralStore {
    fn record_earning(
        &self,
        earning: &NewEarning,
        now: Timestamp,
    ) -> Result<ReferralEarning, StoreError> {
        self.check_available()?;
        let mut ledger = self.ledger.lock().unwrap();

        let duplicate = ledger.earnings.iter().any(|e| {
            e.referrer_wallet == earning.referrer_wallet && e.burn_tx == earning.burn_tx
        });
        if duplicate {
            return Err(StoreError::Duplicate(earning.burn_tx.to_string()));
        }

        let existing = ledger.stats.get(&earning.referrer_wallet).cloned();
        let stat = ReferralStat::upsert(existing, earning, now)?;

        ledger.next_id += 1;
        let record = ReferralEarning::new(ledger.next_id, earning, now);
        ledger.earnings.push(record.clone());
        ledger.stats.insert(earning.referrer_wallet.clone(), stat);
        Ok(record)
    }

    fn claim_earnings(
        &self,
        referrer: &WalletAddress,
        claim_tx: &TxSignature,
        now: Timestamp,
    ) -> Result<Lamports, StoreError> {
        self.check_available()?;
        let mut ledger = self.ledger.lock().unwrap();

        let total: Lamports = ledger
            .earnings
            .iter()
            .filter(|e| &e.referrer_wallet == referrer && !e.claimed)
            .map(|e| e.amount)
            .sum();
        let any_unclaimed = ledger
            .earnings
            .iter()
            .any(|e| &e.referrer_wallet == referrer && !e.claimed);
        if !any_unclaimed {
            return Ok(0);
        }

        let mut stat = ledger
            .stats
            .get(referrer)
            .cloned()
            .ok_or_else(|| StoreError::Corruption(format!("no stat row for {referrer}")))?;
        stat.apply_claim(total, now)?;

        for e in ledger
            .earnings
            .iter_mut()
            .filter(|e| &e.referrer_wallet == referrer && !e.claimed)
        {
            e.mark_claimed(claim_tx, now);
        }
        ledger.stats.insert(referrer.clone(), stat);
        Ok(total)
    }

    fn earnings_for(&self, referrer: &WalletAddress) -> Result<Vec<ReferralEarning>, StoreError> {
        self.check_available()?;
        Ok(self
            .ledger
            .lock()
            .unwrap()
            .earnings
            .iter()
            .filter(|e| &e.referrer_wallet == referrer)
            .cloned()
            .collect())
    }

    fn stats_for(&self, referrer: &WalletAddress) -> Result<Option<ReferralStat>, StoreError> {
        self.check_available()?;
        Ok(self.ledger.lock().unwrap().stats.get(referrer).cloned())
    }
}
