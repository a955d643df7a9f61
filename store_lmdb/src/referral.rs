//! LMDB implementation of ReferralStore.
//!
//! Key format for earnings: `wallet_bytes ++ id.to_be_bytes()`. Wallet
//! public keys are always 32 bytes, so a prefix scan on the wallet returns
//! exactly that wallet's earnings, ordered by id (oldest first).

use heed::types::Bytes;
use heed::{Database, Env, RoTxn, RwTxn};
use tracing::debug;

use reclaim_store::{NewEarning, ReferralEarning, ReferralStat, ReferralStore, StoreError};
use reclaim_types::{Lamports, Timestamp, TxSignature, WalletAddress};

use crate::LmdbError;

const NEXT_EARNING_ID_KEY: &[u8] = b"next_earning_id";

pub struct LmdbReferralStore {
    pub(crate) env: Env,
    pub(crate) earnings_db: Database<Bytes, Bytes>,
    pub(crate) stats_db: Database<Bytes, Bytes>,
    pub(crate) burns_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

fn earning_key(wallet: &WalletAddress, id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(32 + 8);
    key.extend_from_slice(wallet.as_bytes());
    key.extend_from_slice(&id.to_be_bytes());
    key
}

fn burn_key(wallet: &WalletAddress, burn_tx: &TxSignature) -> Vec<u8> {
    let sig = burn_tx.as_str().as_bytes();
    let mut key = Vec::with_capacity(32 + sig.len());
    key.extend_from_slice(wallet.as_bytes());
    key.extend_from_slice(sig);
    key
}

impl LmdbReferralStore {
    /// Allocate the next earning id inside `wtxn`.
    fn next_earning_id(&self, wtxn: &mut RwTxn) -> Result<u64, LmdbError> {
        let id = match self.meta_db.get(wtxn, NEXT_EARNING_ID_KEY)? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes
                    .try_into()
                    .map_err(|_| LmdbError::Serialization("earning id counter".into()))?;
                u64::from_be_bytes(arr)
            }
            None => 1,
        };
        self.meta_db
            .put(wtxn, NEXT_EARNING_ID_KEY, &(id + 1).to_be_bytes())?;
        Ok(id)
    }

    fn read_stat(
        &self,
        txn: &RoTxn,
        wallet: &WalletAddress,
    ) -> Result<Option<ReferralStat>, LmdbError> {
        match self.stats_db.get(txn, wallet.as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
            None => Ok(None),
        }
    }

    fn read_earnings(
        &self,
        txn: &RoTxn,
        wallet: &WalletAddress,
    ) -> Result<Vec<(Vec<u8>, ReferralEarning)>, LmdbError> {
        let mut out = Vec::new();
        for item in self.earnings_db.prefix_iter(txn, wallet.as_bytes())? {
            let (key, val) = item?;
            let earning: ReferralEarning = bincode::deserialize(val)?;
            out.push((key.to_vec(), earning));
        }
        Ok(out)
    }
}

impl ReferralStore for LmdbReferralStore {
    fn record_earning(
        &self,
        earning: &NewEarning,
        now: Timestamp,
    ) -> Result<ReferralEarning, StoreError> {
        let wallet = &earning.referrer_wallet;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        let dedup = burn_key(wallet, &earning.burn_tx);
        if self
            .burns_db
            .get(&wtxn, &dedup)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate(earning.burn_tx.to_string()));
        }

        let id = self.next_earning_id(&mut wtxn)?;
        let record = ReferralEarning::new(id, earning, now);
        let bytes = bincode::serialize(&record).map_err(LmdbError::from)?;
        self.earnings_db
            .put(&mut wtxn, &earning_key(wallet, id), &bytes)
            .map_err(LmdbError::from)?;
        self.burns_db
            .put(&mut wtxn, &dedup, &id.to_be_bytes())
            .map_err(LmdbError::from)?;

        let stat = ReferralStat::upsert(self.read_stat(&wtxn, wallet)?, earning, now)?;
        let stat_bytes = bincode::serialize(&stat).map_err(LmdbError::from)?;
        self.stats_db
            .put(&mut wtxn, wallet.as_bytes(), &stat_bytes)
            .map_err(LmdbError::from)?;

        wtxn.commit().map_err(LmdbError::from)?;
        debug!(id, referrer = %wallet, amount = earning.amount, "earning recorded");
        Ok(record)
    }

    fn claim_earnings(
        &self,
        referrer: &WalletAddress,
        claim_tx: &TxSignature,
        now: Timestamp,
    ) -> Result<Lamports, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        let unclaimed: Vec<_> = self
            .read_earnings(&wtxn, referrer)?
            .into_iter()
            .filter(|(_, e)| !e.claimed)
            .collect();
        if unclaimed.is_empty() {
            // Dropping the transaction aborts it: nothing is written.
            return Ok(0);
        }

        let total = unclaimed
            .iter()
            .try_fold(0 as Lamports, |acc, (_, e)| acc.checked_add(e.amount))
            .ok_or_else(|| StoreError::Overflow(format!("claim total for {referrer}")))?;

        for (key, mut earning) in unclaimed {
            earning.mark_claimed(claim_tx, now);
            let bytes = bincode::serialize(&earning).map_err(LmdbError::from)?;
            self.earnings_db
                .put(&mut wtxn, &key, &bytes)
                .map_err(LmdbError::from)?;
        }

        let mut stat = self.read_stat(&wtxn, referrer)?.ok_or_else(|| {
            StoreError::Corruption(format!("earnings without a stat row for {referrer}"))
        })?;
        stat.apply_claim(total, now)?;
        let stat_bytes = bincode::serialize(&stat).map_err(LmdbError::from)?;
        self.stats_db
            .put(&mut wtxn, referrer.as_bytes(), &stat_bytes)
            .map_err(LmdbError::from)?;

        wtxn.commit().map_err(LmdbError::from)?;
        Ok(total)
    }

    fn earnings_for(&self, referrer: &WalletAddress) -> Result<Vec<ReferralEarning>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let earnings = self.read_earnings(&rtxn, referrer)?;
        Ok(earnings.into_iter().map(|(_, e)| e).collect())
    }

    fn stats_for(&self, referrer: &WalletAddress) -> Result<Option<ReferralStat>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.read_stat(&rtxn, referrer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::DEFAULT_MAP_SIZE;
    use crate::LmdbEnvironment;

    fn temp_env() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = LmdbEnvironment::open(dir.path(), 64 * 1024 * 1024).expect("open env");
        (dir, env)
    }

    fn wallet(seed: u8) -> WalletAddress {
        WalletAddress::from_bytes(&[seed; 32])
    }

    fn sig(seed: u8) -> TxSignature {
        TxSignature::from_bytes(&[seed; 64])
    }

    fn new_earning(w: &WalletAddress, amount: Lamports, burn: u8) -> NewEarning {
        NewEarning {
            referrer_wallet: w.clone(),
            amount,
            burn_tx: sig(burn),
        }
    }

    #[test]
    fn record_then_claim_is_idempotent() {
        let (_dir, env) = temp_env();
        let store = env.referral_store();
        let w = wallet(1);

        store.record_earning(&new_earning(&w, 100, 1), Timestamp::new(10)).unwrap();
        store.record_earning(&new_earning(&w, 50, 2), Timestamp::new(20)).unwrap();

        assert_eq!(store.claim_earnings(&w, &sig(3), Timestamp::new(30)).unwrap(), 150);
        assert_eq!(store.claim_earnings(&w, &sig(4), Timestamp::new(40)).unwrap(), 0);

        let stat = store.stats_for(&w).unwrap().unwrap();
        assert_eq!(stat.total_earned, 150);
        assert_eq!(stat.total_claimed, 150);
        assert_eq!(stat.total_burns, 2);
        // the no-op claim must not touch the stat row
        assert_eq!(stat.last_updated, Timestamp::new(30));

        let earnings = store.earnings_for(&w).unwrap();
        assert!(earnings.iter().all(|e| e.claimed && e.claim_tx == Some(sig(3))));
    }

    #[test]
    fn ids_increase_and_earnings_are_oldest_first() {
        let (_dir, env) = temp_env();
        let store = env.referral_store();
        let w = wallet(1);
        let a = store.record_earning(&new_earning(&w, 1, 1), Timestamp::new(1)).unwrap();
        let b = store.record_earning(&new_earning(&wallet(2), 1, 2), Timestamp::new(2)).unwrap();
        let c = store.record_earning(&new_earning(&w, 1, 3), Timestamp::new(3)).unwrap();
        assert!(a.id < b.id && b.id < c.id);

        let ids: Vec<u64> = store.earnings_for(&w).unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a.id, c.id]);
    }

    #[test]
    fn wallets_are_isolated() {
        let (_dir, env) = temp_env();
        let store = env.referral_store();
        store.record_earning(&new_earning(&wallet(1), 100, 1), Timestamp::new(1)).unwrap();
        store.record_earning(&new_earning(&wallet(2), 7, 2), Timestamp::new(1)).unwrap();

        assert_eq!(store.claim_earnings(&wallet(1), &sig(9), Timestamp::new(2)).unwrap(), 100);
        let other = store.earnings_for(&wallet(2)).unwrap();
        assert_eq!(other.len(), 1);
        assert!(!other[0].claimed);
        assert!(store.stats_for(&wallet(3)).unwrap().is_none());
    }

    #[test]
    fn duplicate_burn_is_rejected_without_side_effects() {
        let (_dir, env) = temp_env();
        let store = env.referral_store();
        let w = wallet(1);
        store.record_earning(&new_earning(&w, 100, 1), Timestamp::new(1)).unwrap();
        let err = store
            .record_earning(&new_earning(&w, 100, 1), Timestamp::new(2))
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));

        let stat = store.stats_for(&w).unwrap().unwrap();
        assert_eq!((stat.total_earned, stat.total_burns), (100, 1));
        assert_eq!(store.earnings_for(&w).unwrap().len(), 1);
    }

    #[test]
    fn second_claim_batch_accumulates() {
        let (_dir, env) = temp_env();
        let store = env.referral_store();
        let w = wallet(1);
        store.record_earning(&new_earning(&w, 100, 1), Timestamp::new(1)).unwrap();
        store.claim_earnings(&w, &sig(10), Timestamp::new(2)).unwrap();
        store.record_earning(&new_earning(&w, 40, 2), Timestamp::new(3)).unwrap();
        assert_eq!(store.claim_earnings(&w, &sig(11), Timestamp::new(4)).unwrap(), 40);

        let stat = store.stats_for(&w).unwrap().unwrap();
        assert_eq!(stat.total_claimed, 140);
        assert_eq!(stat.total_claimed, stat.total_earned);

        let earnings = store.earnings_for(&w).unwrap();
        assert_eq!(earnings[0].claim_tx, Some(sig(10)));
        assert_eq!(earnings[1].claim_tx, Some(sig(11)));
    }

    #[test]
    fn ledger_survives_reopen() {
        let dir = tempfile::tempdir().expect("temp dir");
        let w = wallet(5);
        {
            let env = LmdbEnvironment::open(dir.path(), DEFAULT_MAP_SIZE).unwrap();
            let store = env.referral_store();
            store.record_earning(&new_earning(&w, 25, 1), Timestamp::new(1)).unwrap();
        }
        let env = LmdbEnvironment::open(dir.path(), DEFAULT_MAP_SIZE).unwrap();
        let store = env.referral_store();
        assert_eq!(store.stats_for(&w).unwrap().unwrap().total_earned, 25);
        let next = store.record_earning(&new_earning(&w, 5, 2), Timestamp::new(2)).unwrap();
        assert_eq!(next.id, 2);
    }

    #[test]
    fn concurrent_claims_credit_once() {
        let (_dir, env) = temp_env();
        let store = std::sync::Arc::new(env.referral_store());
        let w = wallet(1);
        for burn in 1..=10 {
            store.record_earning(&new_earning(&w, 10, burn), Timestamp::new(1)).unwrap();
        }

        let handles: Vec<_> = (0..4u8)
            .map(|i| {
                let store = store.clone();
                let w = w.clone();
                std::thread::spawn(move || {
                    store.claim_earnings(&w, &sig(100 + i), Timestamp::new(2)).unwrap()
                })
            })
            .collect();
        let claimed: Vec<Lamports> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(claimed.iter().sum::<Lamports>(), 100);
        assert_eq!(claimed.iter().filter(|c| **c > 0).count(), 1);
        assert_eq!(store.stats_for(&w).unwrap().unwrap().total_claimed, 100);
    }
}
